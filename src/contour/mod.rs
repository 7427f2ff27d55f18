//! Planar contours for export: traced mask boundaries and sphere
//! cross-sections.

mod section;
mod trace;

pub use section::{shell_slice_loops, sphere_cross_section, MIN_CIRCLE_SEGMENTS};
pub use trace::{mask_to_edge_loops, simplify_grid_loop, GridCorner, MAX_LOOP_POINTS};
