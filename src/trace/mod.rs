//! Line-tracing engine.
//!
//! Turns a [`ScalarField`](crate::field::ScalarField) into segments along
//! families of parallel rays:
//!
//! - [`intersect`]: slab clipping of a ray against the unit square
//! - [`LineTracer::trace_ray`]: fixed-step threshold marching along one ray
//! - [`LineTracer::trace_pattern`]: center ray plus perpendicular offsets
//!
//! Segments leave the engine only through a [`LineSink`].

mod intersect;
mod sink;
mod tracer;

pub use intersect::{intersect, Span};
pub use sink::{FnSink, LineSink, SegmentCounter};
pub use tracer::{
    LineTracer, PatternConfig, PatternStats, RayStats, ScanMode, TraceConfig,
    DEFAULT_MARCH_STEP, DEFAULT_OFFSET_STEP, MAX_OFFSET_RAYS, MAX_RAY_STEPS,
};
