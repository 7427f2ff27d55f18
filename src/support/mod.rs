//! Voxel shells around the union of primary spheres.

mod grid;
mod shells;

pub use grid::{VoxelBox, VoxelGrid};
pub use shells::{BuildSupportShells, ShellThickness, ShellVolumes, SupportShells};
