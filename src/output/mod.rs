//! Output encoders (PNG, SVG).
//!
//! [`render_svg`] and [`render_raster`] turn traced layers into a finished
//! document using the canvas settings of a [`RenderSection`].

mod png_encoder;
mod svg;

pub use png_encoder::PngEncoder;
pub use svg::{SvgElement, SvgEncoder, SvgSink};

use crate::config::RenderSection;
use crate::error::{Error, Result};
use crate::field::ScalarField;
use crate::framebuffer::Framebuffer;
use crate::layer::TracedLayer;
use crate::render::FramebufferSink;
use crate::trace::LineSink;
use std::path::Path;

/// Output file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Vector lines.
    Svg,
    /// Rasterized lines.
    Png,
}

impl OutputFormat {
    /// Format selected by a path's extension (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] for any other extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("svg") => Ok(Self::Svg),
            Some("png") => Ok(Self::Png),
            _ => Err(Error::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// SVG document for traced layers.
///
/// With `render.underlay` set, `field` is embedded under the lines.
///
/// # Errors
///
/// Returns an error for an unparsable background or a failed underlay encode.
pub fn render_svg(
    render: &RenderSection,
    field: &ScalarField,
    layers: &[TracedLayer],
) -> Result<SvgEncoder> {
    let encoder = SvgEncoder::from_layers(render.width, render.height, layers, render.stroke_width)
        .background(render.background_color()?);
    if render.underlay {
        let fb = Framebuffer::from_field(field, render.width, render.height)?;
        return encoder.underlay(&fb);
    }
    Ok(encoder)
}

/// Raster image of traced layers, one-pixel strokes.
///
/// # Errors
///
/// Returns an error for a zero-sized canvas or an unparsable background.
pub fn render_raster(render: &RenderSection, layers: &[TracedLayer]) -> Result<Framebuffer> {
    let mut fb = Framebuffer::new(render.width, render.height)?;
    if let Some(bg) = render.background_color()? {
        fb.clear(bg);
    }

    for layer in layers {
        let mut sink = FramebufferSink::new(&mut fb, layer.stroke);
        for segment in &layer.segments {
            sink.emit(*segment);
        }
    }
    Ok(fb)
}
