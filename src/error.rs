//! Error types for trueno-lineart operations.

use std::io;
use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building fields, tracing, or writing output.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error (file operations, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// PNG encoding error.
    #[error("PNG encoding error: {0}")]
    PngEncoding(#[from] png::EncodingError),

    /// PNG decoding error.
    #[error("PNG decoding error: {0}")]
    PngDecoding(#[from] png::DecodingError),

    /// Zero-area scalar field or framebuffer.
    #[error("Invalid field dimensions: {width}x{height}")]
    InvalidField {
        /// Width value.
        width: u32,
        /// Height value.
        height: u32,
    },

    /// Pixel buffer does not match the declared dimensions.
    #[error("Buffer length mismatch: expected {expected} bytes, got {actual}")]
    BufferLengthMismatch {
        /// Length implied by width, height and channel count.
        expected: usize,
        /// Length actually supplied.
        actual: usize,
    },

    /// Ray direction is the zero vector or not finite.
    #[error("Degenerate ray direction ({dx}, {dy})")]
    DegenerateDirection {
        /// X component.
        dx: f32,
        /// Y component.
        dy: f32,
    },

    /// Sample requested outside the half-open unit square.
    #[error("Sample coordinate ({x}, {y}) outside [0, 1)")]
    OutOfRangeSample {
        /// X coordinate.
        x: f32,
        /// Y coordinate.
        y: f32,
    },

    /// Tracing would take more iterations than the engine allows.
    #[error("Trace limit exceeded: {required} {what} needed, at most {limit} allowed")]
    TraceLimit {
        /// What was being counted.
        what: &'static str,
        /// Iterations the parameters call for.
        required: f64,
        /// Configured ceiling.
        limit: u64,
    },

    /// Invalid tracing, layer, or render parameter.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file was not found or not readable.
    #[error("Configuration file not found: {0}")]
    ConfigNotFound(String),

    /// Configuration file could not be parsed.
    #[error("Configuration parse error at line {line}: {message}")]
    ConfigParse {
        /// Line of the offending YAML (0 when unknown).
        line: usize,
        /// Parser message.
        message: String,
    },

    /// Input image uses a layout the decoder does not handle.
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),
}
