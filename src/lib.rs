pub mod contour;
pub mod error;
pub mod lattice;
pub mod math;
pub mod region;
pub mod support;
pub mod tessellation;

pub use error::{LatticeError, Result};
