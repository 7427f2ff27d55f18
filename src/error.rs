use thiserror::Error;

/// Top-level error type for lattice planning.
#[derive(Debug, Error)]
pub enum LatticeError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Region(#[from] RegionError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Voxel(#[from] VoxelError),
}

/// Errors related to geometric primitives.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("zero-length vector")]
    ZeroVector,
}

/// Errors raised when a region cannot answer a request.
#[derive(Debug, Error)]
pub enum RegionError {
    #[error("region has no layers")]
    Empty,

    #[error("no layer found for offset {0:.3} mm")]
    NoLayerForOffset(f64),

    #[error("could not compute region centroid/bounds")]
    NoCentroid,
}

/// Errors raised by the sphere generation pipeline.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("invalid generation parameter {parameter} = {value}")]
    InvalidParameter { parameter: &'static str, value: f64 },

    #[error("no lattice point landed inside the region")]
    NoPointsInside,

    #[error("failed to compute lattice centroid")]
    NoLatticeCentroid,
}

/// Errors related to voxel boxes and masks.
#[derive(Debug, Error)]
pub enum VoxelError {
    #[error("invalid voxel dimensions {0}x{1}x{2}")]
    InvalidDimensions(usize, usize, usize),

    #[error("mask length {actual} does not match box volume {expected}")]
    MaskLength { expected: usize, actual: usize },
}

/// Convenience type alias for results using [`LatticeError`].
pub type Result<T> = std::result::Result<T, LatticeError>;
