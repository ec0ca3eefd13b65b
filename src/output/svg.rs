//! SVG output encoder.
//!
//! Traced segments are written as `<line>` elements in pixel space, one
//! `<g>` group per layer carrying the layer's stroke. The source image can
//! be embedded underneath as a base64 PNG.

use crate::color::Rgba;
use crate::error::Result;
use crate::framebuffer::Framebuffer;
use crate::geometry::Segment;
use crate::layer::TracedLayer;
use crate::trace::LineSink;
use base64::{engine::general_purpose::STANDARD, Engine};
use std::fmt::Write as FmtWrite;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// SVG encoder for traced line art.
#[derive(Debug, Clone)]
pub struct SvgEncoder {
    /// SVG width
    width: u32,
    /// SVG height
    height: u32,
    /// Background color (None for transparent)
    background: Option<Rgba>,
    /// SVG elements
    elements: Vec<SvgElement>,
}

/// An SVG element.
///
/// Field names match SVG attribute names.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum SvgElement {
    /// Line; `None` stroke attributes inherit from the enclosing group.
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        stroke: Option<Rgba>,
        stroke_width: Option<f32>,
    },
    /// Group sharing one stroke
    Group {
        id: Option<String>,
        stroke: Rgba,
        stroke_width: f32,
        children: Vec<SvgElement>,
    },
    /// Embedded raster image (base64 PNG)
    Image {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        data: String,
    },
}

impl Default for SvgEncoder {
    fn default() -> Self {
        Self::new(800, 800)
    }
}

impl SvgEncoder {
    /// Create a new SVG encoder with given dimensions.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            background: Some(Rgba::WHITE),
            elements: Vec::new(),
        }
    }

    /// One group per traced layer, scaled to `width` x `height`.
    #[must_use]
    pub fn from_layers(width: u32, height: u32, layers: &[TracedLayer], stroke_width: f32) -> Self {
        let mut encoder = Self::new(width, height);
        for (i, layer) in layers.iter().enumerate() {
            encoder.add_layer(i, layer, stroke_width);
        }
        encoder
    }

    /// Set background color (None for transparent).
    #[must_use]
    pub fn background(mut self, color: Option<Rgba>) -> Self {
        self.background = color;
        self
    }

    /// Embed a framebuffer as a raster image covering the whole canvas.
    ///
    /// Drawn after the background and before any element added so far.
    ///
    /// # Errors
    ///
    /// Returns an error if PNG encoding fails.
    pub fn underlay(mut self, fb: &Framebuffer) -> Result<Self> {
        let png_bytes = super::PngEncoder::to_bytes(fb)?;
        let data_uri = format!("data:image/png;base64,{}", STANDARD.encode(&png_bytes));

        self.elements.insert(
            0,
            SvgElement::Image {
                x: 0.0,
                y: 0.0,
                width: self.width as f32,
                height: self.height as f32,
                data: data_uri,
            },
        );
        Ok(self)
    }

    /// Add a line.
    #[must_use]
    pub fn line(
        mut self,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        stroke: Rgba,
        stroke_width: f32,
    ) -> Self {
        self.elements.push(SvgElement::Line {
            x1,
            y1,
            x2,
            y2,
            stroke: Some(stroke),
            stroke_width: Some(stroke_width),
        });
        self
    }

    /// Add a traced layer as group `layer-{index}`.
    pub fn add_layer(&mut self, index: usize, layer: &TracedLayer, stroke_width: f32) {
        let mut sink = SvgSink::new(self.width, self.height);
        for segment in &layer.segments {
            sink.emit(*segment);
        }
        self.add_element(sink.into_group(
            Some(format!("layer-{index}")),
            layer.stroke,
            stroke_width,
        ));
    }

    /// Add a raw element, such as a group built from an [`SvgSink`].
    pub fn add_element(&mut self, element: SvgElement) {
        self.elements.push(element);
    }

    /// Top-level elements.
    #[must_use]
    pub fn elements(&self) -> &[SvgElement] {
        &self.elements
    }

    /// Render to SVG string.
    #[must_use]
    pub fn render(&self) -> String {
        let mut svg = String::with_capacity(4096);

        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{}" height="{}" viewBox="0 0 {} {}">"#,
            self.width, self.height, self.width, self.height
        );

        if let Some(bg) = self.background {
            let _ = writeln!(
                svg,
                r#"  <rect width="100%" height="100%" fill="{}"/>"#,
                bg.to_css()
            );
        }

        for element in &self.elements {
            write_element(&mut svg, element, 1);
        }

        svg.push_str("</svg>\n");
        svg
    }

    /// Write to a file.
    ///
    /// # Errors
    ///
    /// Returns an error if file writing fails.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(self.render().as_bytes())?;
        Ok(())
    }
}

fn write_element(svg: &mut String, element: &SvgElement, depth: usize) {
    let indent = "  ".repeat(depth);
    match element {
        SvgElement::Line {
            x1,
            y1,
            x2,
            y2,
            stroke,
            stroke_width,
        } => {
            let stroke_attr = stroke
                .map(|s| format!(r#" stroke="{}""#, s.to_css()))
                .unwrap_or_default();
            let width_attr = stroke_width
                .map(|w| format!(r#" stroke-width="{w}""#))
                .unwrap_or_default();
            let _ = writeln!(
                svg,
                r#"{indent}<line x1="{x1}" y1="{y1}" x2="{x2}" y2="{y2}"{stroke_attr}{width_attr}/>"#
            );
        }
        SvgElement::Group {
            id,
            stroke,
            stroke_width,
            children,
        } => {
            let id_attr = id
                .as_ref()
                .map(|id| format!(r#" id="{}""#, escape_attr(id)))
                .unwrap_or_default();
            let _ = writeln!(
                svg,
                r#"{indent}<g{id_attr} stroke="{}" stroke-width="{stroke_width}" stroke-linecap="round" fill="none">"#,
                stroke.to_css()
            );
            for child in children {
                write_element(svg, child, depth + 1);
            }
            let _ = writeln!(svg, "{indent}</g>");
        }
        SvgElement::Image {
            x,
            y,
            width,
            height,
            data,
        } => {
            let _ = writeln!(
                svg,
                r#"{indent}<image x="{x}" y="{y}" width="{width}" height="{height}" xlink:href="{data}"/>"#
            );
        }
    }
}

fn escape_attr(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Sink collecting segments as SVG lines scaled to a canvas.
#[derive(Debug, Clone)]
pub struct SvgSink {
    width: f32,
    height: f32,
    lines: Vec<SvgElement>,
}

impl SvgSink {
    /// Sink for a `width` x `height` canvas.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width as f32,
            height: height as f32,
            lines: Vec::new(),
        }
    }

    /// Lines collected so far.
    #[must_use]
    pub fn lines(&self) -> &[SvgElement] {
        &self.lines
    }

    /// Wrap the collected lines in a group.
    #[must_use]
    pub fn into_group(self, id: Option<String>, stroke: Rgba, stroke_width: f32) -> SvgElement {
        SvgElement::Group {
            id,
            stroke,
            stroke_width,
            children: self.lines,
        }
    }
}

impl LineSink for SvgSink {
    fn emit(&mut self, segment: Segment) {
        self.lines.push(SvgElement::Line {
            x1: segment.start.x * self.width,
            y1: segment.start.y * self.height,
            x2: segment.end.x * self.width,
            y2: segment.end.y * self.height,
            stroke: None,
            stroke_width: None,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::PatternStats;

    fn traced(segments: Vec<Segment>, stroke: Rgba) -> TracedLayer {
        TracedLayer {
            stats: PatternStats::default(),
            segments,
            stroke,
        }
    }

    #[test]
    fn test_svg_encoder_new() {
        let svg = SvgEncoder::new(800, 600).render();

        assert!(svg.contains("width=\"800\""));
        assert!(svg.contains("height=\"600\""));
        assert!(svg.contains("<svg"));
        assert!(svg.contains("</svg>"));
        assert!(svg.contains("fill=\"rgb(255,255,255)\""));
    }

    #[test]
    fn test_svg_transparent_background() {
        let svg = SvgEncoder::new(10, 10).background(None).render();
        assert!(!svg.contains("<rect"));
    }

    #[test]
    fn test_svg_line() {
        let svg = SvgEncoder::new(100, 100)
            .line(0.0, 0.0, 100.0, 100.0, Rgba::BLACK, 2.0)
            .render();

        assert!(svg.contains("<line"));
        assert!(svg.contains("x1=\"0\""));
        assert!(svg.contains("x2=\"100\""));
        assert!(svg.contains("stroke=\"rgb(0,0,0)\""));
        assert!(svg.contains("stroke-width=\"2\""));
    }

    #[test]
    fn test_sink_scales_to_canvas() {
        let mut sink = SvgSink::new(800, 400);
        sink.emit(Segment::from_coords(0.0, 0.5, 1.0, 0.5));

        assert_eq!(
            sink.lines(),
            &[SvgElement::Line {
                x1: 0.0,
                y1: 200.0,
                x2: 800.0,
                y2: 200.0,
                stroke: None,
                stroke_width: None,
            }]
        );
    }

    #[test]
    fn test_layers_become_groups() {
        let layers = vec![
            traced(vec![Segment::from_coords(0.0, 0.5, 1.0, 0.5)], Rgba::RED),
            traced(Vec::new(), Rgba::BLUE),
        ];
        let encoder = SvgEncoder::from_layers(100, 100, &layers, 1.5);
        assert_eq!(encoder.elements().len(), 2);

        let svg = encoder.render();
        assert!(svg.contains(r#"<g id="layer-0" stroke="rgb(255,0,0)" stroke-width="1.5""#));
        assert!(svg.contains(r#"<g id="layer-1" stroke="rgb(0,0,255)""#));
        assert!(svg.contains(r#"<line x1="0" y1="50" x2="100" y2="50"/>"#));
        assert_eq!(svg.matches("<line").count(), 1);
        assert_eq!(svg.matches("</g>").count(), 2);
    }

    #[test]
    fn test_streamed_group_added_as_element() {
        use crate::field::ScalarField;
        use crate::geometry::Point;
        use crate::trace::{LineTracer, PatternConfig};

        let field = ScalarField::uniform(4, 4, 255.0).unwrap();
        let pattern = PatternConfig::new(0.0, 0.0, 1.0).offset_step(0.25);
        let mut sink = SvgSink::new(100, 100);
        let stats = LineTracer::default()
            .trace_pattern(&field, &pattern, Point::CENTER, &mut sink)
            .unwrap();
        assert_eq!(sink.lines().len(), stats.segments);

        let mut encoder = SvgEncoder::new(100, 100).background(None);
        let group = sink.into_group(Some("a<b".to_string()), Rgba::rgb(0, 255, 0), 2.0);
        encoder.add_element(group);

        assert!(matches!(
            &encoder.elements()[0],
            SvgElement::Group { children, .. } if children.len() == stats.segments
        ));
        let svg = encoder.render();
        assert!(svg.contains(r#"<g id="a&lt;b" stroke="rgb(0,255,0)" stroke-width="2""#));
        assert!(svg.contains(r#"<line x1="50" y1="0" x2="50" y2="100"/>"#));
        assert_eq!(svg.matches("<line").count(), stats.segments);
    }

    #[test]
    fn test_underlay_goes_first() {
        let fb = Framebuffer::new(4, 4).unwrap();
        let encoder = SvgEncoder::new(40, 40)
            .line(0.0, 0.0, 40.0, 40.0, Rgba::BLACK, 1.0)
            .underlay(&fb)
            .unwrap();

        assert!(matches!(encoder.elements()[0], SvgElement::Image { .. }));
        let svg = encoder.render();
        assert!(svg.contains("data:image/png;base64,"));
        assert!(svg.find("<image").unwrap() < svg.find("<line").unwrap());
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.svg");
        let encoder = SvgEncoder::new(10, 10);
        encoder.write_to_file(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), encoder.render());
    }
}
