//! Layers: one field, one pattern, one stroke color each.
//!
//! A [`LayerSet`] owns the tracer settings and the layers traced with them.
//! Layers never share mutable state, so with the `parallel` feature
//! [`LayerSet::trace_all`] spreads them over the rayon thread pool. Results
//! come back in layer order either way.

use crate::color::Rgba;
use crate::error::{Error, Result};
use crate::field::ScalarField;
use crate::geometry::{Point, Segment};
use crate::trace::{LineSink, LineTracer, PatternConfig, PatternStats, DEFAULT_OFFSET_STEP};
use log::info;
use std::sync::Arc;

/// Default number of layers in a cascade.
pub const DEFAULT_CASCADE_LAYERS: usize = 5;

/// A field traced with one pattern around one center.
#[derive(Debug, Clone)]
pub struct Layer {
    field: Arc<ScalarField>,
    pattern: PatternConfig,
    center: Point,
    stroke: Rgba,
}

impl Layer {
    /// Create a layer centered on the unit square with black strokes.
    #[must_use]
    pub fn new(field: Arc<ScalarField>, pattern: PatternConfig) -> Self {
        Self {
            field,
            pattern,
            center: Point::CENTER,
            stroke: Rgba::BLACK,
        }
    }

    /// Set the pattern center.
    #[must_use]
    pub fn center(mut self, center: Point) -> Self {
        self.center = center;
        self
    }

    /// Set the stroke color used by renderers.
    #[must_use]
    pub fn stroke(mut self, stroke: Rgba) -> Self {
        self.stroke = stroke;
        self
    }

    /// The layer's field.
    #[must_use]
    pub fn field(&self) -> &ScalarField {
        &self.field
    }

    /// The layer's pattern.
    #[must_use]
    pub const fn pattern(&self) -> &PatternConfig {
        &self.pattern
    }

    /// The pattern center.
    #[must_use]
    pub const fn get_center(&self) -> Point {
        self.center
    }

    /// The stroke color.
    #[must_use]
    pub const fn get_stroke(&self) -> Rgba {
        self.stroke
    }

    /// Trace this layer into `sink`.
    ///
    /// # Errors
    ///
    /// Propagates pattern validation errors.
    pub fn trace<S: LineSink + ?Sized>(
        &self,
        tracer: &LineTracer,
        sink: &mut S,
    ) -> Result<PatternStats> {
        tracer.trace_pattern(&self.field, &self.pattern, self.center, sink)
    }
}

/// Segments produced by one layer.
#[derive(Debug, Clone, PartialEq)]
pub struct TracedLayer {
    /// Segments in emission order.
    pub segments: Vec<Segment>,
    /// Ray and segment counts.
    pub stats: PatternStats,
    /// Stroke color of the source layer.
    pub stroke: Rgba,
}

/// Layers traced with a shared tracer.
#[derive(Debug, Clone, Default)]
pub struct LayerSet {
    tracer: LineTracer,
    layers: Vec<Layer>,
}

impl LayerSet {
    /// Create an empty set.
    #[must_use]
    pub fn new(tracer: LineTracer) -> Self {
        Self {
            tracer,
            layers: Vec::new(),
        }
    }

    /// The cascade: `count` layers over one field with rising thresholds
    /// `(255 / count) * i` and directions `(cos i, sin i)`, `i` in radians.
    ///
    /// # Errors
    ///
    /// Returns an error for `count == 0` or an invalid offset step.
    pub fn cascade(
        tracer: LineTracer,
        field: Arc<ScalarField>,
        count: usize,
        offset_step: f32,
    ) -> Result<Self> {
        if count == 0 {
            return Err(Error::InvalidConfig(
                "cascade needs at least one layer".to_string(),
            ));
        }

        let mut set = Self::new(tracer);
        let band = 255.0 / count as f32;
        for i in 0..count {
            let pattern = PatternConfig::from_angle(band * i as f32, i as f32)
                .offset_step(offset_step)
                .build()?;
            set.push(Layer::new(Arc::clone(&field), pattern));
        }
        Ok(set)
    }

    /// [`cascade`](Self::cascade) with five layers and the default offset step.
    ///
    /// # Errors
    ///
    /// Never fails for a valid tracer; kept fallible for symmetry.
    pub fn default_cascade(tracer: LineTracer, field: Arc<ScalarField>) -> Result<Self> {
        Self::cascade(tracer, field, DEFAULT_CASCADE_LAYERS, DEFAULT_OFFSET_STEP)
    }

    /// Add a layer.
    pub fn push(&mut self, layer: Layer) {
        self.layers.push(layer);
    }

    /// Add a layer (builder style).
    #[must_use]
    pub fn with_layer(mut self, layer: Layer) -> Self {
        self.push(layer);
        self
    }

    /// The layers in trace order.
    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Mutable access, e.g. to restyle cascade layers.
    pub fn layers_mut(&mut self) -> &mut [Layer] {
        &mut self.layers
    }

    /// Number of layers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether the set has no layers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// The shared tracer.
    #[must_use]
    pub const fn tracer(&self) -> &LineTracer {
        &self.tracer
    }

    /// Trace one layer into a caller-provided sink.
    ///
    /// # Errors
    ///
    /// Returns an error for an out-of-range index or an invalid pattern.
    pub fn trace_into<S: LineSink + ?Sized>(
        &self,
        index: usize,
        sink: &mut S,
    ) -> Result<PatternStats> {
        let layer = self.layers.get(index).ok_or_else(|| {
            Error::InvalidConfig(format!(
                "layer {index} out of range ({} layers)",
                self.layers.len()
            ))
        })?;
        layer.trace(&self.tracer, sink)
    }

    /// Trace every layer into its own segment list.
    ///
    /// # Errors
    ///
    /// Returns the first pattern error encountered.
    pub fn trace_all(&self) -> Result<Vec<TracedLayer>> {
        let trace_one = |layer: &Layer| -> Result<TracedLayer> {
            let mut segments = Vec::new();
            let stats = layer.trace(&self.tracer, &mut segments)?;
            Ok(TracedLayer {
                segments,
                stats,
                stroke: layer.stroke,
            })
        };

        #[cfg(feature = "parallel")]
        let traced: Vec<TracedLayer> = {
            use rayon::prelude::*;
            self.layers
                .par_iter()
                .map(trace_one)
                .collect::<Result<_>>()?
        };
        #[cfg(not(feature = "parallel"))]
        let traced: Vec<TracedLayer> = self
            .layers
            .iter()
            .map(trace_one)
            .collect::<Result<_>>()?;

        let total: usize = traced.iter().map(|t| t.stats.segments).sum();
        info!("traced {} layers, {} segments", traced.len(), total);
        Ok(traced)
    }
}
