//! Threshold marching along rays and parallel ray patterns.
//!
//! # Algorithm
//!
//! A ray is clipped to the unit square, then a cursor walks from the entry
//! point in fixed steps of `direction * march_step`. Every step samples the
//! field and compares against the threshold:
//!
//! - rising edge: the pending segment starts at the cursor,
//! - falling edge: the segment from the pending start to the cursor is emitted.
//!
//! Crossings snap to step positions; nothing is interpolated. A run still
//! open when the cursor leaves the square is closed at the exact exit point.
//!
//! A pattern is the center ray plus rays offset by multiples of the direction
//! rotated 90 degrees and scaled by `offset_step`, walked outward on both
//! sides until they stop hitting the square.
//!
//! Both loops run over integer indices with fixed ceilings
//! ([`MAX_RAY_STEPS`], [`MAX_OFFSET_RAYS`]); parameters that would exceed
//! them fail with [`Error::TraceLimit`] before any segment is emitted.

use crate::error::{Error, Result};
use crate::field::ScalarField;
use crate::geometry::{BoundingBox, Point, Ray, Segment};
use crate::trace::intersect::intersect;
use crate::trace::sink::LineSink;
use log::{debug, trace};
use serde::{Deserialize, Serialize};

/// Default distance, in units of `t`, between samples along a ray.
pub const DEFAULT_MARCH_STEP: f32 = 0.005;

/// Default spacing between neighbouring rays of a pattern.
pub const DEFAULT_OFFSET_STEP: f32 = 0.01;

/// Most samples a single ray may take.
///
/// Short directions stretch the parametric span, so a ray whose
/// `span / march_step` exceeds this fails with [`Error::TraceLimit`].
pub const MAX_RAY_STEPS: u64 = 1 << 24;

/// Most offset rays a pattern may trace on each side of its center ray.
pub const MAX_OFFSET_RAYS: u64 = 1 << 20;

/// Shortest direction vector accepted for tracing.
const MIN_DIRECTION_LENGTH: f32 = f32::EPSILON;

/// Tracing domain.
const DOMAIN: BoundingBox = BoundingBox::UNIT;

/// How a pattern decides when to stop adding offset rays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    /// Walk both sides in lockstep and stop as soon as either side misses.
    ///
    /// The positive side is not traced once the negative side has missed.
    #[default]
    Joint,
    /// Walk each side until that side misses.
    Independent,
}

/// Engine-wide tracing parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceConfig {
    march_step: f32,
    scan_mode: ScanMode,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TraceConfig {
    /// Create a config with the default march step and joint scanning.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            march_step: DEFAULT_MARCH_STEP,
            scan_mode: ScanMode::Joint,
        }
    }

    /// Set the march step.
    #[must_use]
    pub fn march_step(mut self, step: f32) -> Self {
        self.march_step = step;
        self
    }

    /// Set the scan mode.
    #[must_use]
    pub fn scan_mode(mut self, mode: ScanMode) -> Self {
        self.scan_mode = mode;
        self
    }

    /// Validate the config.
    ///
    /// # Errors
    ///
    /// Returns an error unless the march step is finite and positive.
    pub fn build(self) -> Result<Self> {
        if !(self.march_step.is_finite() && self.march_step > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "march step must be positive, got {}",
                self.march_step
            )));
        }
        Ok(self)
    }

    /// Current march step.
    #[must_use]
    pub const fn get_march_step(&self) -> f32 {
        self.march_step
    }

    /// Current scan mode.
    #[must_use]
    pub const fn get_scan_mode(&self) -> ScanMode {
        self.scan_mode
    }
}

/// One direction/threshold combination to trace over a field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternConfig {
    /// Samples strictly brighter than this are drawn.
    pub threshold: f32,
    /// Ray direction (any nonzero length).
    pub direction: Point,
    /// Perpendicular spacing factor between rays.
    pub offset_step: f32,
}

impl PatternConfig {
    /// Create a pattern with the default offset step.
    #[must_use]
    pub const fn new(threshold: f32, dx: f32, dy: f32) -> Self {
        Self {
            threshold,
            direction: Point::new(dx, dy),
            offset_step: DEFAULT_OFFSET_STEP,
        }
    }

    /// Create a pattern whose direction is `(cos angle, sin angle)`.
    #[must_use]
    pub fn from_angle(threshold: f32, angle: f32) -> Self {
        Self::new(threshold, angle.cos(), angle.sin())
    }

    /// Set the offset step.
    #[must_use]
    pub fn offset_step(mut self, step: f32) -> Self {
        self.offset_step = step;
        self
    }

    /// Validate the pattern.
    ///
    /// # Errors
    ///
    /// - [`Error::DegenerateDirection`] for a zero, tiny or non-finite direction.
    /// - [`Error::InvalidConfig`] for a threshold outside `[0, 255]` or a
    ///   non-positive offset step.
    pub fn build(self) -> Result<Self> {
        check_direction(self.direction)?;
        check_threshold(self.threshold)?;
        if !(self.offset_step.is_finite() && self.offset_step > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "offset step must be positive, got {}",
                self.offset_step
            )));
        }
        Ok(self)
    }

    /// Displacement between neighbouring rays.
    #[must_use]
    pub fn offset(&self) -> Point {
        Point::new(
            self.direction.y * self.offset_step,
            -self.direction.x * self.offset_step,
        )
    }
}

/// What marching one ray did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RayStats {
    /// Samples taken inside the domain after the entry sample.
    pub steps: usize,
    /// Segments emitted.
    pub segments: usize,
}

/// What tracing one pattern did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatternStats {
    /// Rays that hit the domain.
    pub rays: usize,
    /// Segments emitted over all rays.
    pub segments: usize,
    /// Marching steps over all rays.
    pub steps: usize,
}

impl PatternStats {
    fn record(&mut self, ray: RayStats) {
        self.rays += 1;
        self.segments += ray.segments;
        self.steps += ray.steps;
    }
}

/// Extracts above-threshold runs of a field as segments.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LineTracer {
    config: TraceConfig,
}

impl LineTracer {
    /// Create a tracer.
    ///
    /// # Errors
    ///
    /// Returns an error if the config does not validate.
    pub fn new(config: TraceConfig) -> Result<Self> {
        Ok(Self {
            config: config.build()?,
        })
    }

    /// The tracer's config.
    #[must_use]
    pub const fn config(&self) -> &TraceConfig {
        &self.config
    }

    /// Trace one ray, emitting every above-threshold run to `sink`.
    ///
    /// Returns `Ok(false)` when the line misses the unit square. A hit that
    /// never exceeds the threshold returns `Ok(true)` and emits nothing.
    ///
    /// # Errors
    ///
    /// Fails on a degenerate direction, a non-finite origin or a NaN
    /// threshold. A direction so short that the clipped span needs more than
    /// [`MAX_RAY_STEPS`] samples fails with [`Error::TraceLimit`].
    pub fn trace_ray<S: LineSink + ?Sized>(
        &self,
        field: &ScalarField,
        threshold: f32,
        ray: Ray,
        sink: &mut S,
    ) -> Result<bool> {
        Ok(self.march_ray(field, threshold, ray, sink)?.is_some())
    }

    /// [`trace_ray`](Self::trace_ray), reporting step and segment counts.
    ///
    /// # Errors
    ///
    /// Same as [`trace_ray`](Self::trace_ray).
    pub fn march_ray<S: LineSink + ?Sized>(
        &self,
        field: &ScalarField,
        threshold: f32,
        ray: Ray,
        sink: &mut S,
    ) -> Result<Option<RayStats>> {
        check_direction(ray.direction)?;
        if !ray.origin.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "ray origin ({}, {}) is not finite",
                ray.origin.x, ray.origin.y
            )));
        }
        if threshold.is_nan() {
            return Err(Error::InvalidConfig("threshold is NaN".to_string()));
        }

        let Some(span) = intersect(&DOMAIN, &ray) else {
            trace!("ray from ({}, {}) misses domain", ray.origin.x, ray.origin.y);
            return Ok(None);
        };

        let march_step = f64::from(self.config.march_step);
        let required = (f64::from(span.length()) / march_step).ceil();
        let last_step = step_limit("marching steps", required, MAX_RAY_STEPS)? + 1;

        let mut stats = RayStats::default();
        let mut start = ray.at(span.t_enter);
        let mut was_above = field.sample_point(DOMAIN.clamp(start)) > threshold;

        // Positions come from the step index in f64, so short directions with
        // far parameters still advance every step.
        let t_enter = f64::from(span.t_enter);
        for k in 1..=last_step {
            let cursor = ray.at_precise(t_enter + k as f64 * march_step);
            if !DOMAIN.contains(cursor) {
                break;
            }
            stats.steps += 1;

            let is_above = field.sample_point(cursor) > threshold;
            if is_above && !was_above {
                start = cursor;
            } else if !is_above && was_above {
                sink.emit(Segment::new(start, cursor));
                stats.segments += 1;
            }
            was_above = is_above;
        }

        if was_above {
            sink.emit(Segment::new(start, ray.at(span.t_exit)));
            stats.segments += 1;
        }

        trace!(
            "ray from ({}, {}): {} steps, {} segments",
            ray.origin.x,
            ray.origin.y,
            stats.steps,
            stats.segments
        );
        Ok(Some(stats))
    }

    /// Trace the center ray and its parallel offsets.
    ///
    /// # Errors
    ///
    /// Fails if the pattern does not validate or `center` is not finite, and
    /// with [`Error::TraceLimit`] when the offset spacing is so small that one
    /// side would need more than [`MAX_OFFSET_RAYS`] rays.
    pub fn trace_pattern<S: LineSink + ?Sized>(
        &self,
        field: &ScalarField,
        pattern: &PatternConfig,
        center: Point,
        sink: &mut S,
    ) -> Result<PatternStats> {
        let pattern = pattern.build()?;
        if !center.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "pattern center ({}, {}) is not finite",
                center.x, center.y
            )));
        }

        let threshold = pattern.threshold;
        let direction = pattern.direction;
        let offset = pattern.offset();
        let side_rays = offset_ray_limit(&pattern, center)?;
        let ray_at = |k: f32| {
            Ray::new(
                Point::new(center.x + offset.x * k, center.y + offset.y * k),
                direction,
            )
        };

        let mut stats = PatternStats::default();
        if let Some(ray) = self.march_ray(field, threshold, ray_at(0.0), sink)? {
            stats.record(ray);
        }

        match self.config.scan_mode {
            ScanMode::Joint => {
                for k in 1..=side_rays {
                    let k = k as f32;
                    let Some(minus) = self.march_ray(field, threshold, ray_at(-k), sink)? else {
                        break;
                    };
                    stats.record(minus);
                    let Some(plus) = self.march_ray(field, threshold, ray_at(k), sink)? else {
                        break;
                    };
                    stats.record(plus);
                }
            }
            ScanMode::Independent => {
                for side in [-1.0_f32, 1.0] {
                    for k in 1..=side_rays {
                        let ray = ray_at(side * k as f32);
                        let Some(ray) = self.march_ray(field, threshold, ray, sink)? else {
                            break;
                        };
                        stats.record(ray);
                    }
                }
            }
        }

        debug!(
            "pattern threshold={} direction=({:.3}, {:.3}) {:?}: {} rays, {} segments",
            threshold,
            direction.x,
            direction.y,
            self.config.scan_mode,
            stats.rays,
            stats.segments
        );
        Ok(stats)
    }

    /// Trace a pattern into a fresh vector.
    ///
    /// # Errors
    ///
    /// Same as [`trace_pattern`](Self::trace_pattern).
    pub fn collect_pattern(
        &self,
        field: &ScalarField,
        pattern: &PatternConfig,
        center: Point,
    ) -> Result<Vec<Segment>> {
        let mut segments = Vec::new();
        self.trace_pattern(field, pattern, center, &mut segments)?;
        Ok(segments)
    }
}

/// Offset rays per side that can still reach the domain from `center`.
///
/// Rays farther from the center line than its farthest domain corner miss,
/// so `floor(reach / |offset|) + 1` bounds each side.
fn offset_ray_limit(pattern: &PatternConfig, center: Point) -> Result<u64> {
    let spacing = f64::from(pattern.direction.x).hypot(f64::from(pattern.direction.y))
        * f64::from(pattern.offset_step);
    let reach = [
        (DOMAIN.x1, DOMAIN.y1),
        (DOMAIN.x2, DOMAIN.y1),
        (DOMAIN.x1, DOMAIN.y2),
        (DOMAIN.x2, DOMAIN.y2),
    ]
    .into_iter()
    .map(|(x, y)| {
        (f64::from(x) - f64::from(center.x)).hypot(f64::from(y) - f64::from(center.y))
    })
    .fold(0.0_f64, f64::max);
    step_limit("offset rays per side", (reach / spacing).floor() + 1.0, MAX_OFFSET_RAYS)
}

/// Convert a required iteration count to an integer bound, or fail past `limit`.
fn step_limit(what: &'static str, required: f64, limit: u64) -> Result<u64> {
    if !required.is_finite() || required > limit as f64 {
        return Err(Error::TraceLimit {
            what,
            required,
            limit,
        });
    }
    Ok(required.max(0.0) as u64)
}

fn check_direction(direction: Point) -> Result<()> {
    let length = direction.x.hypot(direction.y);
    if !direction.is_finite() || length < MIN_DIRECTION_LENGTH {
        return Err(Error::DegenerateDirection {
            dx: direction.x,
            dy: direction.y,
        });
    }
    Ok(())
}

fn check_threshold(threshold: f32) -> Result<()> {
    if !(0.0..=255.0).contains(&threshold) {
        return Err(Error::InvalidConfig(format!(
            "threshold must be within [0, 255], got {threshold}"
        )));
    }
    Ok(())
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::trace::intersect::intersect;
    use proptest::prelude::*;

    fn direction() -> impl Strategy<Value = (f32, f32)> {
        (0.0f32..std::f32::consts::TAU, 0.2f32..3.0).prop_map(|(a, len)| (a.cos() * len, a.sin() * len))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// A uniformly dark field never produces segments.
        #[test]
        fn prop_below_threshold_emits_nothing(
            (dx, dy) in direction(),
            cx in -0.5f32..1.5,
            cy in -0.5f32..1.5,
            threshold in 10.0f32..255.0,
        ) {
            let field = ScalarField::uniform(5, 7, threshold - 5.0).unwrap();
            let ray = Ray::new(Point::new(cx, cy), Point::new(dx, dy));
            let mut segments = Vec::new();
            let hit = LineTracer::default().trace_ray(&field, threshold, ray, &mut segments).unwrap();

            prop_assert_eq!(hit, intersect(&BoundingBox::UNIT, &ray).is_some());
            prop_assert!(segments.is_empty());
        }

        /// A uniformly bright field yields exactly the clipped chord.
        #[test]
        fn prop_above_threshold_single_chord(
            (dx, dy) in direction(),
            cx in 0.0f32..1.0,
            cy in 0.0f32..1.0,
            threshold in 0.0f32..250.0,
        ) {
            let field = ScalarField::uniform(5, 7, threshold + 5.0).unwrap();
            let ray = Ray::new(Point::new(cx, cy), Point::new(dx, dy));
            let span = intersect(&BoundingBox::UNIT, &ray).unwrap();
            let mut segments = Vec::new();
            LineTracer::default().trace_ray(&field, threshold, ray, &mut segments).unwrap();

            prop_assert_eq!(segments.len(), 1);
            prop_assert_eq!(segments[0], Segment::new(ray.at(span.t_enter), ray.at(span.t_exit)));
        }

        /// Reversing the direction over a uniform field reverses the chord.
        #[test]
        fn prop_reversal_reverses_segments(
            (dx, dy) in direction(),
            cx in 0.0f32..1.0,
            cy in 0.0f32..1.0,
        ) {
            let field = ScalarField::uniform(3, 3, 200.0).unwrap();
            let tracer = LineTracer::default();
            let mut forward = Vec::new();
            let mut backward = Vec::new();
            tracer.trace_ray(&field, 100.0, Ray::new(Point::new(cx, cy), Point::new(dx, dy)), &mut forward).unwrap();
            tracer.trace_ray(&field, 100.0, Ray::new(Point::new(cx, cy), Point::new(-dx, -dy)), &mut backward).unwrap();

            prop_assert_eq!(forward.len(), 1);
            prop_assert_eq!(backward.len(), 1);
            let reversed = backward[0].reversed();
            prop_assert!((forward[0].start.x - reversed.start.x).abs() < 1e-5);
            prop_assert!((forward[0].start.y - reversed.start.y).abs() < 1e-5);
            prop_assert!((forward[0].end.x - reversed.end.x).abs() < 1e-5);
            prop_assert!((forward[0].end.y - reversed.end.y).abs() < 1e-5);
        }

        /// Marching takes at most ceil(span / step) + 1 steps.
        #[test]
        fn prop_march_terminates_within_bound(
            (dx, dy) in direction(),
            cx in 0.0f32..1.0,
            cy in 0.0f32..1.0,
            march_step in 0.001f32..0.2,
        ) {
            let field = ScalarField::uniform(4, 4, 0.0).unwrap();
            let ray = Ray::new(Point::new(cx, cy), Point::new(dx, dy));
            let span = intersect(&BoundingBox::UNIT, &ray).unwrap();
            let tracer = LineTracer::new(TraceConfig::new().march_step(march_step)).unwrap();
            let mut counter = crate::trace::sink::SegmentCounter::default();
            let stats = tracer.march_ray(&field, 1.0, ray, &mut counter).unwrap().unwrap();

            let bound = (span.length() / march_step).ceil() as usize + 1;
            prop_assert!(stats.steps <= bound, "{} > {}", stats.steps, bound);
        }

        /// Reversing the direction over a mirrored banded field reverses the
        /// run sequence, each endpoint within one snap per direction.
        #[test]
        fn prop_reversal_on_mirrored_bands(
            half in prop::collection::vec(0.0f32..255.0, 5),
            threshold in 0.0f32..255.0,
            cx in 0.0f32..1.0,
            cy in 0.0f32..1.0,
        ) {
            let mut values = half.clone();
            values.extend(half.iter().rev());
            let field = ScalarField::from_intensities(10, 1, values).unwrap();
            let tracer = LineTracer::default();
            let mut forward = Vec::new();
            let mut backward = Vec::new();
            tracer.trace_ray(&field, threshold, Ray::new(Point::new(cx, cy), Point::new(1.0, 0.0)), &mut forward).unwrap();
            tracer.trace_ray(&field, threshold, Ray::new(Point::new(cx, cy), Point::new(-1.0, 0.0)), &mut backward).unwrap();

            prop_assert_eq!(forward.len(), backward.len());
            let snap = 2.0 * DEFAULT_MARCH_STEP + 1e-4;
            for (a, b) in forward.iter().zip(backward.iter().rev()) {
                let b = b.reversed();
                prop_assert!((a.start.x - b.start.x).abs() <= snap, "{:?} vs {:?}", a, b);
                prop_assert!((a.end.x - b.end.x).abs() <= snap, "{:?} vs {:?}", a, b);
                prop_assert_eq!(a.start.y, b.start.y);
            }
        }

        /// Directions and steps across many orders of magnitude either march
        /// within ceil(span / step) + 1 steps or fail fast with a trace limit.
        #[test]
        fn prop_march_extremes_terminate(
            angle in 0.0f32..std::f32::consts::TAU,
            length_exp in -22.0f32..10.0,
            step_exp in -20.0f32..0.0,
            cx in 0.0f32..1.0,
            cy in 0.0f32..1.0,
        ) {
            let length = length_exp.exp2();
            let march_step = step_exp.exp2();
            let ray = Ray::new(Point::new(cx, cy), Point::new(angle.cos() * length, angle.sin() * length));
            let span = intersect(&BoundingBox::UNIT, &ray).unwrap();
            let required = (f64::from(span.length()) / f64::from(march_step)).ceil();
            let tracer = LineTracer::new(TraceConfig::new().march_step(march_step)).unwrap();
            let field = ScalarField::uniform(4, 4, 0.0).unwrap();
            let mut counter = crate::trace::sink::SegmentCounter::default();

            // Step counts between the two bands are covered by the unit tests.
            if required > MAX_RAY_STEPS as f64 {
                let result = tracer.march_ray(&field, 1.0, ray, &mut counter);
                prop_assert!(matches!(result, Err(Error::TraceLimit { .. })), "{:?}", result);
            } else if required <= f64::from(1_u32 << 16) {
                let stats = tracer.march_ray(&field, 1.0, ray, &mut counter).unwrap().unwrap();
                prop_assert!(stats.steps as f64 <= required + 1.0, "{} > {}", stats.steps, required + 1.0);
            }
        }

        /// A pattern never traces more rays than fit between its center and
        /// the farthest corner, and tiny spacings fail with a trace limit.
        #[test]
        fn prop_pattern_ray_count_bounded(
            angle in 0.0f32..std::f32::consts::TAU,
            offset_exp in -30.0f32..-1.0,
            cx in 0.0f32..1.0,
            cy in 0.0f32..1.0,
            independent in any::<bool>(),
        ) {
            let pattern = PatternConfig::from_angle(0.0, angle).offset_step(offset_exp.exp2());
            let spacing = f64::from(pattern.direction.x).hypot(f64::from(pattern.direction.y))
                * f64::from(pattern.offset_step);
            let reach = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)]
                .iter()
                .map(|&(x, y): &(f64, f64)| (x - f64::from(cx)).hypot(y - f64::from(cy)))
                .fold(0.0_f64, f64::max);
            let per_side = (reach / spacing).ceil();

            let mode = if independent { ScanMode::Independent } else { ScanMode::Joint };
            let tracer = LineTracer::new(TraceConfig::new().march_step(0.25).scan_mode(mode)).unwrap();
            let field = ScalarField::uniform(4, 4, 255.0).unwrap();
            let mut counter = crate::trace::sink::SegmentCounter::default();
            let center = Point::new(cx, cy);

            if per_side > MAX_OFFSET_RAYS as f64 + 1.0 {
                let result = tracer.trace_pattern(&field, &pattern, center, &mut counter);
                prop_assert!(matches!(result, Err(Error::TraceLimit { .. })), "{:?}", result);
            } else if per_side <= 4096.0 {
                let stats = tracer.trace_pattern(&field, &pattern, center, &mut counter).unwrap();
                prop_assert!(stats.rays as f64 <= 2.0 * per_side + 1.0, "{} rays, {} per side", stats.rays, per_side);
                prop_assert_eq!(counter.count, stats.rays);
            }
        }

        /// Every segment endpoint lies in the (slightly padded) unit square.
        #[test]
        fn prop_segments_inside_domain(
            values in prop::collection::vec(0.0f32..255.0, 36),
            angle in 0.0f32..std::f32::consts::TAU,
            threshold in 0.0f32..255.0,
        ) {
            let field = ScalarField::from_intensities(6, 6, values).unwrap();
            let pattern = PatternConfig::from_angle(threshold, angle).offset_step(0.05);
            let segments = LineTracer::default().collect_pattern(&field, &pattern, Point::CENTER).unwrap();

            let padded = BoundingBox::new(-1e-4, -1e-4, 1.0 + 1e-4, 1.0 + 1e-4).unwrap();
            for segment in segments {
                prop_assert!(padded.contains(segment.start));
                prop_assert!(padded.contains(segment.end));
            }
        }
    }
}
