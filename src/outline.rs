//! Outline extraction: walking tagged control points into a flat run of
//! quadratic curves, normalized to the glyph's metric box.
//!
//! The walk follows TrueType contour semantics: two consecutive off-curve
//! (conic) points imply an on-curve point at their midpoint, two consecutive
//! on-curve points produce a straight segment (a quadratic whose control is
//! the midpoint of its endpoints), and cubic control pairs are lowered to
//! quadratics by [`cubic_to_quadratics`]. Traversal order, and with it the
//! filled side of each curve, is preserved from the source.

use crate::curves::{cubic_to_quadratics, Quadratic, Rect, Vec2};
use thiserror::Error;

/// Classification of one outline control point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointTag {
    /// The point lies on the curve.
    On,
    /// Off-curve control of a quadratic arc.
    Conic,
    /// Off-curve control of a cubic arc; these come in pairs.
    Cubic,
}

/// One control point of a contour.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControlPoint {
    pub pos: Vec2,
    pub tag: PointTag,
}

impl ControlPoint {
    pub fn on(x: f32, y: f32) -> Self {
        Self { pos: Vec2::new(x, y), tag: PointTag::On }
    }

    pub fn conic(x: f32, y: f32) -> Self {
        Self { pos: Vec2::new(x, y), tag: PointTag::Conic }
    }

    pub fn cubic(x: f32, y: f32) -> Self {
        Self { pos: Vec2::new(x, y), tag: PointTag::Cubic }
    }
}

/// A glyph's outline and horizontal metrics as reported by a font backend,
/// in unscaled font units.
///
/// `bounds` must come from the font's stored metrics rather than be
/// recomputed from the points: the normalized outline is later mapped onto a
/// unit quad, and both sides have to agree on the box.
#[derive(Clone, Debug, Default)]
pub struct RawOutline {
    /// Closed contours; each is a cyclic point sequence.
    pub contours: Vec<Vec<ControlPoint>>,
    /// Stored bounding box of the outline.
    pub bounds: Rect,
    /// Horizontal bearing: x of the left edge, y of the top edge, relative
    /// to the pen position on the baseline.
    pub bearing: Vec2,
    /// Horizontal advance.
    pub advance: f32,
}

/// Errors surfaced by an [`OutlineProvider`].
#[derive(Debug, Error)]
pub enum OutlineError {
    #[error("font backend: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// A source of glyph outlines, abstracted over the concrete font library.
///
/// Implementations report geometry at "no scale" (design units) and supply
/// the stored metric box, bearing, and advance alongside the points.
pub trait OutlineProvider {
    /// The outline for `codepoint`. A codepoint the font cannot map should
    /// resolve to the font's fallback glyph; a glyph without contours (for
    /// example whitespace) returns an empty `contours` list with metrics
    /// still populated.
    fn outline(&self, codepoint: char) -> Result<RawOutline, OutlineError>;

    /// Design units per em square.
    fn units_per_em(&self) -> u16;
}

/// A flattened glyph: quadratics over `[0, size.x] × [0, size.y]`.
#[derive(Clone, Debug, Default)]
pub struct Outline {
    /// All contours' curves, in traversal order.
    pub curves: Vec<Quadratic>,
    /// Width and height of the metric box.
    pub size: Vec2,
    /// Pen-relative position of the box's minimum corner.
    pub offset: Vec2,
    /// Horizontal advance.
    pub advance: f32,
}

/// Flatten `raw` into quadratics and translate so the metric box's minimum
/// corner is the origin. Cubic arcs are approximated within
/// `cubic_tolerance` (font units).
pub fn extract(raw: &RawOutline, cubic_tolerance: f32) -> Outline {
    let mut curves = Vec::new();
    for contour in &raw.contours {
        flatten_contour(contour, cubic_tolerance, &mut curves);
    }

    let origin = raw.bounds.min;
    for q in &mut curves {
        *q = q.translate(-origin);
    }

    Outline {
        curves,
        size: raw.bounds.size(),
        offset: Vec2::new(raw.bearing.x, raw.bearing.y - raw.bounds.height()),
        advance: raw.advance,
    }
}

/// Emit the segment from `from` to `to` given the pending off-curve state.
fn emit_segment(
    out: &mut Vec<Quadratic>,
    from: Vec2,
    to: Vec2,
    conic: Option<Vec2>,
    cubics: &[Vec2],
    tolerance: f32,
) {
    if let Some(ctrl) = conic {
        out.push(Quadratic::new(from, ctrl, to));
    } else if cubics.len() == 2 {
        cubic_to_quadratics(from, cubics[0], cubics[1], to, tolerance, out);
    } else if cubics.len() == 1 {
        // Malformed lone cubic control; read it as a conic.
        out.push(Quadratic::new(from, cubics[0], to));
    } else if from != to {
        out.push(Quadratic::line(from, to));
    }
}

fn flatten_contour(points: &[ControlPoint], tolerance: f32, out: &mut Vec<Quadratic>) {
    let n = points.len();
    if n < 2 {
        return;
    }

    // The walk starts at the first on-curve point; a contour made entirely
    // of conic points gets a synthetic start at the midpoint of its last
    // and first points.
    let (start, first, visits) = match points.iter().position(|p| p.tag == PointTag::On) {
        Some(i) => (points[i].pos, i + 1, n - 1),
        None => (Vec2::midpoint(points[n - 1].pos, points[0].pos), 0, n),
    };

    let mut current = start;
    let mut conic: Option<Vec2> = None;
    let mut cubics = [Vec2::ZERO; 2];
    let mut n_cubics = 0usize;

    for k in 0..visits {
        let p = points[(first + k) % n];
        match p.tag {
            PointTag::On => {
                emit_segment(out, current, p.pos, conic.take(), &cubics[..n_cubics], tolerance);
                n_cubics = 0;
                current = p.pos;
            }
            PointTag::Conic => {
                if let Some(prev) = conic.replace(p.pos) {
                    let mid = Vec2::midpoint(prev, p.pos);
                    out.push(Quadratic::new(current, prev, mid));
                    current = mid;
                }
            }
            PointTag::Cubic => {
                if n_cubics < 2 {
                    cubics[n_cubics] = p.pos;
                    n_cubics += 1;
                }
            }
        }
    }

    // Close the loop back to the start point.
    emit_segment(out, current, start, conic.take(), &cubics[..n_cubics], tolerance);
}
