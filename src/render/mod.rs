//! Rasterization of traced segments.
//!
//! # Algorithms
//!
//! - **Bresenham's Line**: integer line drawing, one pixel per major-axis step
//!
//! # References
//!
//! - Bresenham, J. E. (1965). "Algorithm for computer control of a digital plotter."

mod primitives;

pub use primitives::{draw_line, FramebufferSink};
