//! ttf-parser backed [`OutlineProvider`].
//!
//! [`Font`] adapts a parsed face to the provider seam: outlines are reported
//! as tagged control points at "no scale" (design units), and all metrics
//! come from the font's stored tables, never from the points themselves.

use crate::curves::{Rect, Vec2};
use crate::outline::{ControlPoint, OutlineError, OutlineProvider, PointTag, RawOutline};
use std::sync::Arc;
use thiserror::Error;
use ttf_parser::{Face, FaceParsingError, GlyphId, OutlineBuilder};

/// Errors that can occur when parsing a font.
#[derive(Debug, Error)]
pub enum FontError {
    #[error("failed to parse font: {0}")]
    Parse(#[from] FaceParsingError),
}

/// A handle to a parsed font.
///
/// `Font` is cheap to clone (wraps an `Arc`) and thread-safe.
#[derive(Clone)]
pub struct Font<'a> {
    face: Arc<Face<'a>>,
}

/// Metrics describing the font's vertical layout.
#[derive(Debug, Clone, Copy)]
pub struct FontMetrics {
    /// The number of font units per em square.
    pub units_per_em: u16,
    /// Distance from the baseline to the top of the highest glyph.
    pub ascent: i16,
    /// Distance from the baseline to the bottom of the lowest glyph.
    pub descent: i16,
    /// Recommended extra vertical distance between lines.
    pub line_gap: i16,
}

impl FontMetrics {
    /// Baseline-to-baseline distance, in font units.
    pub fn line_height(&self) -> i32 {
        self.ascent as i32 - self.descent as i32 + self.line_gap as i32
    }
}

impl<'a> Font<'a> {
    /// Creates a new `Font` from raw TTF/OTF byte data.
    pub fn from_bytes(data: &'a [u8]) -> Result<Self, FontError> {
        let face = Face::parse(data, 0)?;
        Ok(Self { face: Arc::new(face) })
    }

    /// Returns the global metrics for this font.
    pub fn metrics(&self) -> FontMetrics {
        FontMetrics {
            units_per_em: self.face.units_per_em(),
            ascent: self.face.ascender(),
            descent: self.face.descender(),
            line_gap: self.face.line_gap(),
        }
    }

    fn glyph_id(&self, codepoint: char) -> GlyphId {
        // Unmapped codepoints fall back to the font's .notdef glyph.
        self.face.glyph_index(codepoint).unwrap_or(GlyphId(0))
    }
}

impl OutlineProvider for Font<'_> {
    fn outline(&self, codepoint: char) -> Result<RawOutline, OutlineError> {
        let glyph = self.glyph_id(codepoint);

        let mut builder = TaggedBuilder::default();
        let _ = self.face.outline_glyph(glyph, &mut builder);
        builder.finish_contour();

        let (bounds, bearing) = match self.face.glyph_bounding_box(glyph) {
            Some(r) => (
                Rect::new(
                    Vec2::new(r.x_min as f32, r.y_min as f32),
                    Vec2::new(r.x_max as f32, r.y_max as f32),
                ),
                Vec2::new(r.x_min as f32, r.y_max as f32),
            ),
            None => (Rect::default(), Vec2::ZERO),
        };

        Ok(RawOutline {
            contours: builder.contours,
            bounds,
            bearing,
            advance: self.face.glyph_hor_advance(glyph).unwrap_or(0) as f32,
        })
    }

    fn units_per_em(&self) -> u16 {
        self.face.units_per_em()
    }
}

/// Collects ttf-parser's segment callbacks back into tagged point runs.
#[derive(Default)]
struct TaggedBuilder {
    contours: Vec<Vec<ControlPoint>>,
    current: Vec<ControlPoint>,
}

impl TaggedBuilder {
    fn finish_contour(&mut self) {
        if self.current.is_empty() {
            return;
        }
        // Some fonts close with an explicit line back to the start point;
        // the cyclic walk closes implicitly, so drop the duplicate.
        if self.current.len() > 1 {
            let first = self.current[0];
            if let Some(last) = self.current.last() {
                if last.tag == PointTag::On && last.pos == first.pos {
                    self.current.pop();
                }
            }
        }
        self.contours.push(std::mem::take(&mut self.current));
    }
}

impl OutlineBuilder for TaggedBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        self.finish_contour();
        self.current.push(ControlPoint::on(x, y));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.current.push(ControlPoint::on(x, y));
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.current.push(ControlPoint::conic(x1, y1));
        self.current.push(ControlPoint::on(x, y));
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.current.push(ControlPoint::cubic(x1, y1));
        self.current.push(ControlPoint::cubic(x2, y2));
        self.current.push(ControlPoint::on(x, y));
    }

    fn close(&mut self) {
        self.finish_contour();
    }
}
