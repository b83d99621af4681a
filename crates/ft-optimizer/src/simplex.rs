//! Simplex construction and the Nelder-Mead geometric moves.

use ft_types::{config_error, FtResult, Simplex, Vertex};

/// Build the n+1 unscored vertices of the initial simplex.
///
/// Vertex `i` (for `i < n`) is `initial` stepped along axis `i` by `step_sizes[i]`;
/// the last vertex is `initial` itself.
pub fn initial_vertices(initial: &[f64], step_sizes: Option<&[f64]>) -> FtResult<Vec<Vertex>> {
    let dim = initial.len();
    if dim == 0 {
        return Err(config_error!("initial vertex must have at least one axis"));
    }
    let steps = match step_sizes {
        Some(steps) if steps.len() != dim => {
            return Err(config_error!(
                "step sizes have {} axes but the initial vertex has {}",
                steps.len(),
                dim
            ));
        }
        Some(steps) => steps.to_vec(),
        None => vec![1.0; dim],
    };

    let mut vertices = Vec::with_capacity(dim + 1);
    for (axis, step) in steps.iter().enumerate() {
        let mut vertex = initial.to_vec();
        vertex[axis] += step;
        vertices.push(vertex);
    }
    vertices.push(initial.to_vec());
    Ok(vertices)
}

/// Per-axis mean of every vertex except the last (worst) one of an ordered simplex.
pub fn centroid(simplex: &Simplex) -> Vertex {
    let kept = &simplex.points()[..simplex.len() - 1];
    let mut center = vec![0.0; simplex.dimension()];
    for point in kept {
        for (c, x) in center.iter_mut().zip(&point.vertex) {
            *c += x;
        }
    }
    let count = kept.len() as f64;
    center.iter_mut().for_each(|c| *c /= count);
    center
}

/// Mirror the worst vertex through the centroid: `2c - worst`.
pub fn reflect(simplex: &Simplex, center: &[f64]) -> Vertex {
    center
        .iter()
        .zip(&simplex.worst().vertex)
        .map(|(c, w)| 2.0 * c - w)
        .collect()
}

/// `reflected - center`.
pub fn expand(reflected: &[f64], center: &[f64]) -> Vertex {
    reflected.iter().zip(center).map(|(r, c)| r - c).collect()
}

/// Midpoint of the centroid and the worst vertex.
pub fn contract(simplex: &Simplex, center: &[f64]) -> Vertex {
    center
        .iter()
        .zip(&simplex.worst().vertex)
        .map(|(c, w)| 0.5 * c + 0.5 * w)
        .collect()
}

/// Move every vertex but the best halfway toward the best. Objectives are left
/// stale; the caller re-scores the moved points.
pub fn shrink(simplex: &mut Simplex) {
    let points = simplex.points_mut();
    let Some((best, rest)) = points.split_first_mut() else {
        return;
    };
    for point in rest {
        for (x, b) in point.vertex.iter_mut().zip(&best.vertex) {
            *x = 0.5 * b + 0.5 * *x;
        }
    }
}
