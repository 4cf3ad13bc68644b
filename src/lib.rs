pub mod bands;
pub mod error;
pub mod geometry;
pub mod intersect;
pub mod math;
pub mod topology;

pub use error::{OrisphereError, Result};
