use thiserror::Error;

/// Main error type for forktune
#[derive(Error, Debug)]
pub enum FtError {
    /// Invalid run setup, detected before any evaluation.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The pipe, fork or descriptor plumbing for an isolated trial failed.
    #[error("Isolation error: {0}")]
    Isolation(String),

    /// The trial body did not print a number as its final line.
    #[error("Evaluation parse error: no numeric final line in trial output {output:?}")]
    EvaluationParse { output: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for forktune operations
pub type FtResult<T> = Result<T, FtError>;

/// Macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::FtError::Configuration(format!($($arg)*))
    };
}

/// Macro for creating isolation errors
#[macro_export]
macro_rules! isolation_error {
    ($($arg:tt)*) => {
        $crate::FtError::Isolation(format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = FtError::EvaluationParse {
            output: "hello\nworld\n".to_string(),
        };
        assert!(error.to_string().contains("no numeric final line"));
        assert!(error.to_string().contains("world"));
    }

    #[test]
    fn test_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let ft_error: FtError = io.into();

        match ft_error {
            FtError::Io(_) => (),
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_macros() {
        let config_err = config_error!("step sizes have {} axes, vertex has {}", 3, 2);
        assert!(matches!(config_err, FtError::Configuration(ref m) if m.contains("3 axes")));

        let isolation_err = isolation_error!("fork failed: {}", "EAGAIN");
        assert!(isolation_err.to_string().starts_with("Isolation error"));
    }
}
