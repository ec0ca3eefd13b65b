//! # Trueno-Lineart
//!
//! Line-art tracing of raster images, built on the
//! [trueno](https://crates.io/crates/trueno) SIMD core.
//!
//! An image becomes a brightness [`ScalarField`](field::ScalarField). Families
//! of parallel rays are marched across the unit square and every run where the
//! brightness exceeds a threshold becomes a line segment. Several thresholds,
//! each with its own direction, stack into a hatched rendition of the image.
//!
//! ## Features
//!
//! - **Pure Rust**: PNG in, SVG or PNG out, no browser or canvas involved
//! - **Sink-based engine**: segments stream into any [`LineSink`](trace::LineSink)
//! - **Layer cascade**: thresholds and angles derived from a single layer count
//! - **Hardware Acceleration**: channel averaging and statistics through trueno
//!
//! ## Quick Start
//!
//! ```rust
//! use trueno_lineart::prelude::*;
//!
//! let field = ScalarField::uniform(16, 16, 100.0)?;
//! let tracer = LineTracer::default();
//!
//! let mut segments: Vec<Segment> = Vec::new();
//! let ray = Ray::new(Point::CENTER, Point::new(1.0, 0.0));
//! let hit = tracer.trace_ray(&field, 50.0, ray, &mut segments)?;
//!
//! assert!(hit);
//! assert_eq!(segments.len(), 1);
//! # Ok::<(), trueno_lineart::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `parallel`: Trace layers concurrently with rayon
//! - `cli`: Build the `trueno-lineart` binary
//! - `full`: All features enabled

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
// Allow unwrap()/expect() in tests only - banned in production code
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]
// Allow common patterns in graphics code
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Core Modules
// ============================================================================

/// Color type and hex parsing.
pub mod color;

/// Geometric primitives (points, segments, boxes, rays).
pub mod geometry;

/// Brightness fields sampled by normalized coordinates.
pub mod field;

/// Line-tracing engine.
pub mod trace;

/// Layers and the layer cascade.
pub mod layer;

/// YAML configuration.
pub mod config;

// ============================================================================
// Raster & I/O Modules
// ============================================================================

/// Core framebuffer for pixel rendering.
pub mod framebuffer;

/// Rasterization of traced segments.
pub mod render;

/// Output encoders (PNG, SVG).
pub mod output;

/// PNG input decoding.
pub mod decode;

// ============================================================================
// Error Types
// ============================================================================

/// Error types for trueno-lineart operations.
pub mod error;

pub use error::{Error, Result};

// ============================================================================
// Prelude
// ============================================================================

/// Commonly used types and traits for convenient imports.
///
/// ```rust
/// use trueno_lineart::prelude::*;
/// ```
pub mod prelude {
    pub use crate::color::Rgba;
    pub use crate::config::Config;
    pub use crate::decode::{decode_png, load_png};
    pub use crate::error::{Error, Result};
    pub use crate::field::ScalarField;
    pub use crate::framebuffer::Framebuffer;
    pub use crate::geometry::{BoundingBox, Point, Ray, Segment};
    pub use crate::layer::{Layer, LayerSet, TracedLayer};
    pub use crate::output::{PngEncoder, SvgEncoder, SvgSink};
    pub use crate::render::FramebufferSink;
    pub use crate::trace::{
        intersect, LineSink, LineTracer, PatternConfig, ScanMode, TraceConfig,
    };
}

// ============================================================================
// Re-exports
// ============================================================================

/// Re-export trueno for direct access to SIMD operations.
pub use trueno;
