//! Compositing pipeline.
//!
//! The render loop reads sources from the registry and draws them onto a
//! surface, which the output manager samples into the outgoing capture:
//!
//! ```text
//! Registry → FrameCompositor → Surface → OutputStreamManager
//!                 ↑
//!          DragController (region position)
//! ```
//!
//! - **Surface**: RGBA buffer with scaled, alpha-blended frame drawing
//! - **Layout**: Grid cell computation for multi-source mode
//! - **Segment**: Background removal heuristic for single-source modes
//! - **Compositor**: The refresh-driven loop tying it together

mod compositor;
mod layout;
mod segment;
mod surface;

pub(crate) use compositor::spawn_compositor;
pub use layout::{grid_cells, grid_side, GridLayout};
pub use segment::Segmenter;
pub use surface::{Surface, SurfaceState};
