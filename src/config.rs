//! YAML configuration for tracing, layers and rendering.
//!
//! Precedence is CLI > file > defaults; the binary applies its flags on top
//! of a loaded [`Config`]. Missing keys take their defaults, so an empty
//! document is a valid configuration (the five-layer cascade).

use crate::color::Rgba;
use crate::error::{Error, Result};
use crate::field::ScalarField;
use crate::geometry::Point;
use crate::layer::{Layer, LayerSet, DEFAULT_CASCADE_LAYERS};
use crate::trace::{
    LineTracer, PatternConfig, ScanMode, TraceConfig, DEFAULT_MARCH_STEP, DEFAULT_OFFSET_STEP,
};
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Marching settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceSection {
    /// Distance between samples along a ray, in units of `t`.
    #[serde(default = "default_march_step")]
    pub march_step: f32,

    /// Offset scan termination rule.
    #[serde(default)]
    pub scan_mode: ScanMode,
}

fn default_march_step() -> f32 {
    DEFAULT_MARCH_STEP
}

impl Default for TraceSection {
    fn default() -> Self {
        Self {
            march_step: default_march_step(),
            scan_mode: ScanMode::default(),
        }
    }
}

/// Output canvas settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSection {
    /// Output width in pixels.
    #[serde(default = "default_size")]
    pub width: u32,

    /// Output height in pixels.
    #[serde(default = "default_size")]
    pub height: u32,

    /// Stroke width in pixels (SVG only).
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f32,

    /// Background color, `null` for transparent.
    #[serde(default = "default_background")]
    pub background: Option<String>,

    /// Embed the source image under the lines (SVG only).
    #[serde(default)]
    pub underlay: bool,
}

fn default_size() -> u32 {
    800
}
fn default_stroke_width() -> f32 {
    1.0
}
fn default_background() -> Option<String> {
    Some("#ffffff".to_string())
}

impl Default for RenderSection {
    fn default() -> Self {
        Self {
            width: default_size(),
            height: default_size(),
            stroke_width: default_stroke_width(),
            background: default_background(),
            underlay: false,
        }
    }
}

impl RenderSection {
    /// Parsed background color.
    ///
    /// # Errors
    ///
    /// Returns an error if the color string does not parse.
    pub fn background_color(&self) -> Result<Option<Rgba>> {
        self.background.as_deref().map(Rgba::from_hex).transpose()
    }
}

/// One explicitly configured layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    /// Brightness cutoff in `[0, 255]`.
    pub threshold: f32,

    /// Direction as an angle in radians.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<f32>,

    /// Direction as a vector; exclusive with `angle`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<[f32; 2]>,

    /// Perpendicular spacing between rays.
    #[serde(default = "default_offset_step")]
    pub offset_step: f32,

    /// Stroke color.
    #[serde(default = "default_stroke")]
    pub stroke: String,

    /// Per-layer center overriding the global one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<[f32; 2]>,
}

fn default_offset_step() -> f32 {
    DEFAULT_OFFSET_STEP
}
fn default_stroke() -> String {
    "#000000".to_string()
}

impl LayerSpec {
    /// Layer at `angle` radians with default spacing and stroke.
    #[must_use]
    pub fn at_angle(threshold: f32, angle: f32) -> Self {
        Self {
            threshold,
            angle: Some(angle),
            direction: None,
            offset_step: default_offset_step(),
            stroke: default_stroke(),
            center: None,
        }
    }

    /// Validated pattern for this layer.
    ///
    /// # Errors
    ///
    /// Returns an error when neither or both of `angle`/`direction` are set,
    /// or the pattern does not validate.
    pub fn pattern(&self) -> Result<PatternConfig> {
        let pattern = match (self.angle, self.direction) {
            (Some(angle), None) => PatternConfig::from_angle(self.threshold, angle),
            (None, Some([dx, dy])) => PatternConfig::new(self.threshold, dx, dy),
            (None, None) => {
                return Err(Error::InvalidConfig(
                    "layer needs an angle or a direction".to_string(),
                ))
            }
            (Some(_), Some(_)) => {
                return Err(Error::InvalidConfig(
                    "layer sets both angle and direction".to_string(),
                ))
            }
        };
        pattern.offset_step(self.offset_step).build()
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Configuration version.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Marching settings.
    #[serde(default)]
    pub trace: TraceSection,

    /// Pattern center shared by all layers.
    #[serde(default = "default_center")]
    pub center: [f32; 2],

    /// Output canvas settings.
    #[serde(default)]
    pub render: RenderSection,

    /// Explicit layers; empty selects the cascade.
    #[serde(default)]
    pub layers: Vec<LayerSpec>,

    /// Layer count of the cascade.
    #[serde(default = "default_cascade_count")]
    pub cascade_count: usize,

    /// Offset step of the cascade layers.
    #[serde(default = "default_offset_step")]
    pub cascade_offset_step: f32,
}

fn default_version() -> u32 {
    1
}
fn default_center() -> [f32; 2] {
    [0.5, 0.5]
}
fn default_cascade_count() -> usize {
    DEFAULT_CASCADE_LAYERS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            trace: TraceSection::default(),
            center: default_center(),
            render: RenderSection::default(),
            layers: Vec::new(),
            cascade_count: default_cascade_count(),
            cascade_offset_step: default_offset_step(),
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .map_err(|_| Error::ConfigNotFound(path.display().to_string()))?;

        Self::parse(&content)
    }

    /// Parses configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error with line number if parsing fails.
    pub fn parse(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml_ng::from_str(yaml).map_err(|e| {
            let line = e.location().map(|l| l.line()).unwrap_or(0);
            Error::ConfigParse {
                line,
                message: e.to_string(),
            }
        })
    }

    /// Loads configuration with fallback to defaults.
    #[must_use]
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        Self::load(path).unwrap_or_else(|e| {
            warn!("using default configuration: {e}");
            Self::default()
        })
    }

    /// Serializes the configuration to YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml_ng::to_string(self).map_err(|e| Error::ConfigParse {
            line: 0,
            message: e.to_string(),
        })
    }

    /// Check every value that tracing or rendering would reject later.
    ///
    /// # Errors
    ///
    /// Returns the first invalid value found.
    pub fn validate(&self) -> Result<()> {
        self.tracer()?;
        self.render.background_color()?;
        if self.render.width == 0 || self.render.height == 0 {
            return Err(Error::InvalidField {
                width: self.render.width,
                height: self.render.height,
            });
        }
        if !(self.render.stroke_width.is_finite() && self.render.stroke_width > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "stroke width must be positive, got {}",
                self.render.stroke_width
            )));
        }
        if !self.center().is_finite() {
            return Err(Error::InvalidConfig("center is not finite".to_string()));
        }
        for spec in &self.layers {
            spec.pattern()?;
            Rgba::from_hex(&spec.stroke)?;
        }
        if self.layers.is_empty() && self.cascade_count == 0 {
            return Err(Error::InvalidConfig(
                "no layers and cascade_count is 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Shared pattern center.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.center[0], self.center[1])
    }

    /// Tracer built from the trace section.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid march step.
    pub fn tracer(&self) -> Result<LineTracer> {
        LineTracer::new(
            TraceConfig::new()
                .march_step(self.trace.march_step)
                .scan_mode(self.trace.scan_mode),
        )
    }

    /// Layers over `field`: the explicit list, or the cascade when empty.
    ///
    /// # Errors
    ///
    /// Returns the first invalid layer or tracer setting.
    pub fn layer_set(&self, field: Arc<ScalarField>) -> Result<LayerSet> {
        let tracer = self.tracer()?;
        let center = self.center();

        if self.layers.is_empty() {
            let mut set =
                LayerSet::cascade(tracer, field, self.cascade_count, self.cascade_offset_step)?;
            for layer in set.layers_mut() {
                *layer = layer.clone().center(center);
            }
            return Ok(set);
        }

        let mut set = LayerSet::new(tracer);
        for spec in &self.layers {
            let center = spec.center.map_or(center, |[x, y]| Point::new(x, y));
            set.push(
                Layer::new(Arc::clone(&field), spec.pattern()?)
                    .center(center)
                    .stroke(Rgba::from_hex(&spec.stroke)?),
            );
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field() -> Arc<ScalarField> {
        Arc::new(ScalarField::uniform(4, 4, 128.0).unwrap())
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.version, 1);
        assert_eq!(config.trace.march_step, DEFAULT_MARCH_STEP);
        assert_eq!(config.trace.scan_mode, ScanMode::Joint);
        assert_eq!(config.cascade_count, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_empty_is_default() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
        assert_eq!(Config::parse("version: 1\n").unwrap(), Config::default());
    }

    #[test]
    fn test_parse_full() {
        let yaml = r##"
trace:
  march_step: 0.01
  scan_mode: independent
center: [0.4, 0.6]
render:
  width: 320
  height: 240
  background: null
layers:
  - threshold: 30
    angle: 0.0
  - threshold: 90
    direction: [0.0, 1.0]
    offset_step: 0.02
    stroke: "#ff0000"
    center: [0.1, 0.1]
"##;
        let config = Config::parse(yaml).unwrap();
        assert_eq!(config.trace.scan_mode, ScanMode::Independent);
        assert_eq!(config.render.width, 320);
        assert_eq!(config.render.background_color().unwrap(), None);
        assert!(config.validate().is_ok());

        let set = config.layer_set(field()).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.layers()[0].get_center(), Point::new(0.4, 0.6));
        assert_eq!(set.layers()[1].get_center(), Point::new(0.1, 0.1));
        assert_eq!(set.layers()[1].get_stroke(), Rgba::RED);
        assert_eq!(set.layers()[1].pattern().offset_step, 0.02);
        assert_eq!(set.tracer().config().get_march_step(), 0.01);
    }

    #[test]
    fn test_cascade_when_no_layers() {
        let config = Config::parse("cascade_count: 3\ncenter: [0.3, 0.3]\n").unwrap();
        let set = config.layer_set(field()).unwrap();
        assert_eq!(set.len(), 3);
        assert!(set
            .layers()
            .iter()
            .all(|l| l.get_center() == Point::new(0.3, 0.3)));
    }

    #[test]
    fn test_parse_error_has_line() {
        let result = Config::parse("trace:\n  march_step: [oops\n");
        assert!(matches!(result, Err(Error::ConfigParse { .. })));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.trace.march_step = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.render.background = Some("blue".to_string());
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.layers.push(LayerSpec {
            angle: None,
            ..LayerSpec::at_angle(10.0, 0.0)
        });
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.layers.push(LayerSpec {
            direction: Some([1.0, 0.0]),
            ..LayerSpec::at_angle(10.0, 0.0)
        });
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.cascade_count = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_yaml_roundtrip() {
        let mut config = Config::default();
        config.layers.push(LayerSpec::at_angle(64.0, 0.5));
        let yaml = config.to_yaml().unwrap();
        assert_eq!(Config::parse(&yaml).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/lineart.yaml");
        assert!(matches!(result, Err(Error::ConfigNotFound(_))));
        assert_eq!(
            Config::load_or_default("/nonexistent/lineart.yaml"),
            Config::default()
        );
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lineart.yaml");
        std::fs::write(&path, "cascade_count: 2\n").unwrap();
        assert_eq!(Config::load(&path).unwrap().cascade_count, 2);
    }
}
