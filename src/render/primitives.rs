//! Rasterizing traced segments.

use crate::color::Rgba;
use crate::framebuffer::Framebuffer;
use crate::geometry::{Point, Segment};
use crate::trace::LineSink;

/// Draw a line using Bresenham's algorithm (non-antialiased).
///
/// Pixels outside the framebuffer are skipped.
pub fn draw_line(fb: &mut Framebuffer, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgba) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;

    loop {
        if x >= 0 && y >= 0 {
            fb.blend_pixel(x as u32, y as u32, color);
        }

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Sink that rasterizes normalized segments onto a framebuffer.
///
/// The unit square maps onto the whole framebuffer, so `(1, 1)` lands on
/// the last pixel rather than one past it.
#[derive(Debug)]
pub struct FramebufferSink<'a> {
    fb: &'a mut Framebuffer,
    color: Rgba,
    drawn: usize,
}

impl<'a> FramebufferSink<'a> {
    /// Create a sink drawing in `color`.
    pub fn new(fb: &'a mut Framebuffer, color: Rgba) -> Self {
        Self { fb, color, drawn: 0 }
    }

    /// Change the stroke color for subsequent segments.
    pub fn set_color(&mut self, color: Rgba) {
        self.color = color;
    }

    /// Segments drawn so far.
    #[must_use]
    pub const fn drawn(&self) -> usize {
        self.drawn
    }

    fn to_pixel(&self, point: Point) -> (i32, i32) {
        let max_x = (self.fb.width() - 1) as f32;
        let max_y = (self.fb.height() - 1) as f32;
        (
            (point.x * max_x).round() as i32,
            (point.y * max_y).round() as i32,
        )
    }
}

impl LineSink for FramebufferSink<'_> {
    fn emit(&mut self, segment: Segment) {
        let (x0, y0) = self.to_pixel(segment.start);
        let (x1, y1) = self.to_pixel(segment.end);
        draw_line(self.fb, x0, y0, x1, y1, self.color);
        self.drawn += 1;
    }
}
