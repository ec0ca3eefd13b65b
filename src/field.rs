//! Brightness field sampled by normalized coordinates.
//!
//! A [`ScalarField`] holds one intensity per pixel, the mean of the red,
//! green and blue channels in `[0, 255]`. Channel averaging runs through
//! trueno vectors so it dispatches to the best SIMD backend available.
//!
//! Coordinates map to pixels as `floor(x * width)`, `floor(y * height)`.
//! The checked [`ScalarField::sample`] accepts the half-open square `[0, 1)`
//! only; [`ScalarField::sample_clamped`] accepts anything and pins the
//! coordinate `1.0` to the last row/column instead of reading past it.

use crate::error::{Error, Result};
use crate::framebuffer::Framebuffer;
use crate::geometry::Point;
use trueno::Vector;

/// Immutable grid of brightness samples.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarField {
    /// Width in pixels.
    width: u32,
    /// Height in pixels.
    height: u32,
    /// Row-major intensities, `width * height` entries.
    values: Vec<f32>,
}

/// Summary statistics of a field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldStats {
    /// Darkest sample.
    pub min: f32,
    /// Brightest sample.
    pub max: f32,
    /// Mean intensity.
    pub mean: f32,
}

impl ScalarField {
    /// Build a field from precomputed intensities in row-major order.
    ///
    /// # Errors
    ///
    /// Returns an error if either dimension is zero or the buffer length
    /// differs from `width * height`.
    pub fn from_intensities(width: u32, height: u32, values: Vec<f32>) -> Result<Self> {
        check_dimensions(width, height)?;
        let expected = (width as usize) * (height as usize);
        if values.len() != expected {
            return Err(Error::BufferLengthMismatch {
                expected,
                actual: values.len(),
            });
        }
        Ok(Self {
            width,
            height,
            values,
        })
    }

    /// Build a field of one constant intensity.
    ///
    /// # Errors
    ///
    /// Returns an error if either dimension is zero.
    pub fn uniform(width: u32, height: u32, value: f32) -> Result<Self> {
        check_dimensions(width, height)?;
        Self::from_intensities(width, height, vec![value; (width as usize) * (height as usize)])
    }

    /// Build a field from tightly packed 8-bit RGBA pixels.
    ///
    /// # Errors
    ///
    /// Returns an error on zero dimensions or a short/long buffer.
    pub fn from_rgba(width: u32, height: u32, data: &[u8]) -> Result<Self> {
        Self::from_channels(width, height, data, 4)
    }

    /// Build a field from tightly packed 8-bit RGB pixels.
    ///
    /// # Errors
    ///
    /// Returns an error on zero dimensions or a short/long buffer.
    pub fn from_rgb(width: u32, height: u32, data: &[u8]) -> Result<Self> {
        Self::from_channels(width, height, data, 3)
    }

    /// Build a field from the visible pixels of a framebuffer.
    ///
    /// # Errors
    ///
    /// Propagates dimension errors (a valid framebuffer never has any).
    pub fn from_framebuffer(fb: &Framebuffer) -> Result<Self> {
        Self::from_rgba(fb.width(), fb.height(), &fb.to_compact_pixels())
    }

    fn from_channels(width: u32, height: u32, data: &[u8], channels: usize) -> Result<Self> {
        check_dimensions(width, height)?;
        let count = (width as usize) * (height as usize);
        let expected = count * channels;
        if data.len() != expected {
            return Err(Error::BufferLengthMismatch {
                expected,
                actual: data.len(),
            });
        }

        let channel = |offset: usize| -> Vec<f32> {
            data.chunks_exact(channels)
                .map(|px| f32::from(px[offset]))
                .collect()
        };
        let (r, g, b) = (channel(0), channel(1), channel(2));

        let values = channel_mean_simd(&r, &g, &b).unwrap_or_else(|| {
            r.iter()
                .zip(&g)
                .zip(&b)
                .map(|((r, g), b)| (r + g + b) / 3.0)
                .collect()
        });

        Self::from_intensities(width, height, values)
    }

    /// Get the width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Get the height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Raw intensities in row-major order.
    #[must_use]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Intensity at a pixel, or `None` outside the grid.
    #[must_use]
    pub fn pixel(&self, px: u32, py: u32) -> Option<f32> {
        if px >= self.width || py >= self.height {
            return None;
        }
        Some(self.values[self.index(px, py)])
    }

    /// Sample at normalized coordinates in the half-open square `[0, 1)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRangeSample`] for coordinates outside `[0, 1)`,
    /// including exactly `1.0`, and for NaN.
    pub fn sample(&self, x: f32, y: f32) -> Result<f32> {
        let in_range = |v: f32| (0.0..1.0).contains(&v);
        if !in_range(x) || !in_range(y) {
            return Err(Error::OutOfRangeSample { x, y });
        }
        Ok(self.values[self.index(to_pixel(x, self.width), to_pixel(y, self.height))])
    }

    /// Sample with coordinates clamped into the grid.
    ///
    /// `1.0` maps to the last column/row. NaN maps to the first.
    #[must_use]
    pub fn sample_clamped(&self, x: f32, y: f32) -> f32 {
        let px = to_pixel(x.clamp(0.0, 1.0), self.width);
        let py = to_pixel(y.clamp(0.0, 1.0), self.height);
        self.values[self.index(px, py)]
    }

    /// [`sample_clamped`](Self::sample_clamped) at a point.
    #[must_use]
    pub fn sample_point(&self, point: Point) -> f32 {
        self.sample_clamped(point.x, point.y)
    }

    /// Min, max and mean intensity.
    #[must_use]
    pub fn stats(&self) -> FieldStats {
        let vec = Vector::from_slice(&self.values);
        FieldStats {
            min: vec.min().unwrap_or(0.0),
            max: vec.max().unwrap_or(255.0),
            mean: vec.mean().unwrap_or(127.5),
        }
    }

    #[inline]
    fn index(&self, px: u32, py: u32) -> usize {
        (py as usize) * (self.width as usize) + (px as usize)
    }
}

fn check_dimensions(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidField { width, height });
    }
    Ok(())
}

/// `floor(v * size)`, never past the last index.
#[inline]
fn to_pixel(v: f32, size: u32) -> u32 {
    ((v * size as f32).floor() as u32).min(size - 1)
}

/// `(r + g + b) / 3` with trueno vector ops; `None` if the backend refuses.
fn channel_mean_simd(r: &[f32], g: &[f32], b: &[f32]) -> Option<Vec<f32>> {
    let third = Vector::from_vec(vec![1.0 / 3.0; r.len()]);
    let sum = Vector::from_slice(r)
        .add(&Vector::from_slice(g))
        .ok()?
        .add(&Vector::from_slice(b))
        .ok()?;
    let mean = sum.mul(&third).ok()?;
    Some(mean.as_slice().to_vec())
}
