//! Destinations for traced segments.
//!
//! The tracer only ever calls [`LineSink::emit`]; what happens to a segment
//! afterwards (collecting, counting, rasterizing, SVG output) belongs to the
//! sink.

use crate::geometry::Segment;

/// Consumer of segments produced by the tracer.
pub trait LineSink {
    /// Receive one segment in normalized coordinates.
    fn emit(&mut self, segment: Segment);
}

impl LineSink for Vec<Segment> {
    fn emit(&mut self, segment: Segment) {
        self.push(segment);
    }
}

impl<S: LineSink + ?Sized> LineSink for &mut S {
    fn emit(&mut self, segment: Segment) {
        (**self).emit(segment);
    }
}

impl<S: LineSink + ?Sized> LineSink for Box<S> {
    fn emit(&mut self, segment: Segment) {
        (**self).emit(segment);
    }
}

/// Adapts a closure into a sink.
///
/// ```
/// use trueno_lineart::trace::{FnSink, LineSink};
/// use trueno_lineart::geometry::Segment;
///
/// let mut longest = 0.0_f32;
/// let mut sink = FnSink(|s: Segment| longest = longest.max(s.length()));
/// sink.emit(Segment::from_coords(0.0, 0.0, 0.0, 1.0));
/// drop(sink);
/// assert_eq!(longest, 1.0);
/// ```
pub struct FnSink<F>(pub F);

impl<F: FnMut(Segment)> LineSink for FnSink<F> {
    fn emit(&mut self, segment: Segment) {
        (self.0)(segment);
    }
}

/// Sink that keeps only a count and the summed length.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SegmentCounter {
    /// Segments received.
    pub count: usize,
    /// Sum of segment lengths.
    pub total_length: f32,
}

impl LineSink for SegmentCounter {
    fn emit(&mut self, segment: Segment) {
        self.count += 1;
        self.total_length += segment.length();
    }
}
