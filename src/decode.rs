//! PNG input decoding.
//!
//! Any 8- or 16-bit PNG becomes a [`ScalarField`]. Palettes and low bit
//! depths are expanded by the `png` crate, 16-bit samples are stripped to
//! their high byte, and alpha is ignored.

use crate::error::{Error, Result};
use crate::field::ScalarField;
use log::debug;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Decode a PNG from any reader.
///
/// # Errors
///
/// Returns an error if the stream is not a valid PNG or decodes to a color
/// layout without brightness channels.
pub fn decode_png<R: Read>(reader: R) -> Result<ScalarField> {
    let mut decoder = png::Decoder::new(reader);
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);

    let mut reader = decoder.read_info()?;
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf)?;
    let data = &buf[..info.buffer_size()];
    let (width, height) = (info.width, info.height);

    debug!(
        "decoded {}x{} png ({:?}, {:?})",
        width, height, info.color_type, info.bit_depth
    );

    match info.color_type {
        png::ColorType::Rgba => ScalarField::from_rgba(width, height, data),
        png::ColorType::Rgb => ScalarField::from_rgb(width, height, data),
        png::ColorType::Grayscale => ScalarField::from_intensities(
            width,
            height,
            data.iter().map(|&v| f32::from(v)).collect(),
        ),
        png::ColorType::GrayscaleAlpha => ScalarField::from_intensities(
            width,
            height,
            data.chunks_exact(2).map(|px| f32::from(px[0])).collect(),
        ),
        other => Err(Error::UnsupportedFormat(format!(
            "png color type {other:?} after expansion"
        ))),
    }
}

/// Decode PNG bytes held in memory.
///
/// # Errors
///
/// See [`decode_png`].
pub fn decode_png_bytes(bytes: &[u8]) -> Result<ScalarField> {
    decode_png(bytes)
}

/// Load a PNG file.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or decoded.
pub fn load_png<P: AsRef<Path>>(path: P) -> Result<ScalarField> {
    let file = File::open(path)?;
    decode_png(BufReader::new(file))
}
