pub mod config;
pub mod errors;
pub mod simplex;

pub use config::*;
pub use errors::*;
pub use simplex::*;
