//! Geometric primitives for line tracing.
//!
//! All coordinates handled by the tracer are normalized: the unit square
//! `(0,0)-(1,1)` covers the whole source image.

/// A 2D point (or displacement) with floating-point coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
}

impl Point {
    /// Origin point (0, 0).
    pub const ORIGIN: Self = Self::new(0.0, 0.0);

    /// Center of the unit square.
    pub const CENTER: Self = Self::new(0.5, 0.5);

    /// Create a new point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Calculate the distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Whether both coordinates are finite.
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// A straight run between two domain points.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Segment {
    /// Start point.
    pub start: Point,
    /// End point.
    pub end: Point,
}

impl Segment {
    /// Create a new segment.
    #[must_use]
    pub const fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// Create a segment from coordinates.
    #[must_use]
    pub const fn from_coords(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self::new(Point::new(x0, y0), Point::new(x1, y1))
    }

    /// Get the length of the segment.
    #[must_use]
    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }

    /// The same segment with its endpoints swapped.
    #[must_use]
    pub const fn reversed(self) -> Self {
        Self::new(self.end, self.start)
    }
}

/// Axis-aligned clipping box given by its two corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Left edge.
    pub x1: f32,
    /// Top edge.
    pub y1: f32,
    /// Right edge.
    pub x2: f32,
    /// Bottom edge.
    pub y2: f32,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::UNIT
    }
}

impl BoundingBox {
    /// The unit square `(0,0)-(1,1)`.
    pub const UNIT: Self = Self {
        x1: 0.0,
        y1: 0.0,
        x2: 1.0,
        y2: 1.0,
    };

    /// Create a box, requiring `x1 < x2` and `y1 < y2`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`](crate::Error::InvalidConfig) for an
    /// empty, inverted or non-finite box.
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> crate::Result<Self> {
        // Negated so NaN corners are rejected too.
        if !(x1 < x2 && y1 < y2) || ![x1, y1, x2, y2].iter().all(|v| v.is_finite()) {
            return Err(crate::Error::InvalidConfig(format!(
                "bounding box ({x1}, {y1})-({x2}, {y2}) is empty"
            )));
        }
        Ok(Self { x1, y1, x2, y2 })
    }

    /// Check if a point is inside the box (edges included).
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x1 && point.x <= self.x2 && point.y >= self.y1 && point.y <= self.y2
    }

    /// Clamp each coordinate against its own axis bounds.
    #[must_use]
    pub fn clamp(&self, point: Point) -> Point {
        Point::new(
            point.x.clamp(self.x1, self.x2),
            point.y.clamp(self.y1, self.y2),
        )
    }
}

/// A parametric line `origin + t * direction`.
///
/// The direction need not be unit length; tracing distances are measured in
/// units of `t`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Point at `t = 0`.
    pub origin: Point,
    /// Displacement per unit of `t`.
    pub direction: Point,
}

impl Ray {
    /// Create a new ray from origin and direction.
    #[must_use]
    pub const fn new(origin: Point, direction: Point) -> Self {
        Self { origin, direction }
    }

    /// Compute the point at parameter `t`.
    #[must_use]
    pub fn at(&self, t: f32) -> Point {
        Point::new(
            self.origin.x + self.direction.x * t,
            self.origin.y + self.direction.y * t,
        )
    }

    /// Compute the point at parameter `t`, evaluated in double precision.
    ///
    /// Keeps far parameters of short directions from collapsing onto the
    /// same `f32` position.
    #[must_use]
    pub fn at_precise(&self, t: f64) -> Point {
        Point::new(
            (f64::from(self.origin.x) + f64::from(self.direction.x) * t) as f32,
            (f64::from(self.origin.y) + f64::from(self.direction.y) * t) as f32,
        )
    }

    /// Whether the direction cannot be marched along.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        !self.direction.is_finite() || (self.direction.x == 0.0 && self.direction.y == 0.0)
    }
}
