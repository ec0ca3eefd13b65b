//! Ray / axis-aligned box clipping with the slab method.
//!
//! The test runs over the whole line through the ray, so `t_enter` is
//! negative when the origin sits inside the box.

use crate::geometry::{BoundingBox, Ray};

/// Parametric interval where a ray lies inside a box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    /// Where the ray enters the box.
    pub t_enter: f32,
    /// Where the ray leaves the box.
    pub t_exit: f32,
}

impl Span {
    /// Parametric length of the span.
    #[must_use]
    pub fn length(&self) -> f32 {
        self.t_exit - self.t_enter
    }
}

/// Clip a ray against a box.
///
/// Returns `None` when the line misses the box or the direction is the zero
/// vector. Touching an edge or corner counts as a hit.
#[must_use]
pub fn intersect(bounds: &BoundingBox, ray: &Ray) -> Option<Span> {
    if ray.is_degenerate() {
        return None;
    }

    let (txmin, txmax) = axis_span(bounds.x1, bounds.x2, ray.origin.x, ray.direction.x)?;
    let (tymin, tymax) = axis_span(bounds.y1, bounds.y2, ray.origin.y, ray.direction.y)?;

    let t_enter = txmin.max(tymin);
    let t_exit = txmax.min(tymax);

    if t_enter <= t_exit {
        Some(Span { t_enter, t_exit })
    } else {
        None
    }
}

/// Slab interval along one axis.
///
/// A zero component never crosses the slab: the ray is either inside it for
/// every `t` or for none. Handled explicitly since `(lo - c) / 0` is NaN when
/// the origin lies on the boundary.
fn axis_span(lo: f32, hi: f32, c: f32, d: f32) -> Option<(f32, f32)> {
    if d == 0.0 {
        return (lo <= c && c <= hi).then_some((f32::NEG_INFINITY, f32::INFINITY));
    }

    let ta = (lo - c) / d;
    let tb = (hi - c) / d;
    Some((ta.min(tb), ta.max(tb)))
}
