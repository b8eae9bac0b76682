//! Shared synthetic outline provider for integration tests.
//!
//! Builds glyphs from hand-placed control points so the suite runs without
//! font assets.

#![allow(dead_code)]

use glyph_grid::{ControlPoint, OutlineError, OutlineProvider, RawOutline, Rect, Vec2};
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

pub struct StubFont {
    glyphs: HashMap<char, RawOutline>,
    upem: u16,
    failing: Option<char>,
}

impl StubFont {
    pub fn new(upem: u16) -> Self {
        Self {
            glyphs: HashMap::new(),
            upem,
            failing: None,
        }
    }

    pub fn with_outline(mut self, cp: char, raw: RawOutline) -> Self {
        self.glyphs.insert(cp, raw);
        self
    }

    /// A single closed rectangle with an explicit metric box.
    pub fn with_rect(self, cp: char, min: Vec2, max: Vec2, advance: f32) -> Self {
        let contour = vec![
            ControlPoint::on(min.x, min.y),
            ControlPoint::on(max.x, min.y),
            ControlPoint::on(max.x, max.y),
            ControlPoint::on(min.x, max.y),
        ];
        self.with_outline(
            cp,
            RawOutline {
                contours: vec![contour],
                bounds: Rect::new(min, max),
                bearing: Vec2::new(min.x, max.y),
                advance,
            },
        )
    }

    /// Metrics without geometry, like a space.
    pub fn with_blank(self, cp: char, advance: f32) -> Self {
        self.with_outline(
            cp,
            RawOutline {
                advance,
                ..RawOutline::default()
            },
        )
    }

    /// Make one codepoint fail at the backend.
    pub fn failing_on(mut self, cp: char) -> Self {
        self.failing = Some(cp);
        self
    }
}

impl OutlineProvider for StubFont {
    fn outline(&self, codepoint: char) -> Result<RawOutline, OutlineError> {
        if self.failing == Some(codepoint) {
            return Err(OutlineError::Backend("stub backend failure".into()));
        }
        Ok(self.glyphs.get(&codepoint).cloned().unwrap_or_default())
    }

    fn units_per_em(&self) -> u16 {
        self.upem
    }
}

/// Wraps a provider and counts outline requests.
pub struct CountingFont<P> {
    inner: P,
    calls: Rc<Cell<usize>>,
}

impl<P> CountingFont<P> {
    pub fn new(inner: P) -> (Self, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        (
            Self {
                inner,
                calls: Rc::clone(&calls),
            },
            calls,
        )
    }
}

impl<P: OutlineProvider> OutlineProvider for CountingFont<P> {
    fn outline(&self, codepoint: char) -> Result<RawOutline, OutlineError> {
        self.calls.set(self.calls.get() + 1);
        self.inner.outline(codepoint)
    }

    fn units_per_em(&self) -> u16 {
        self.inner.units_per_em()
    }
}

/// A rounded-box ring: outer and inner contours of four conic arcs each,
/// like a chunky 'O'.
pub fn ring_outline() -> RawOutline {
    fn rounded_box(lo: f32, hi: f32) -> Vec<ControlPoint> {
        let mid = (lo + hi) * 0.5;
        vec![
            ControlPoint::on(mid, lo),
            ControlPoint::conic(hi, lo),
            ControlPoint::on(hi, mid),
            ControlPoint::conic(hi, hi),
            ControlPoint::on(mid, hi),
            ControlPoint::conic(lo, hi),
            ControlPoint::on(lo, mid),
            ControlPoint::conic(lo, lo),
        ]
    }
    RawOutline {
        contours: vec![rounded_box(8.0, 92.0), rounded_box(31.0, 71.0)],
        bounds: Rect::new(Vec2::new(8.0, 8.0), Vec2::new(92.0, 92.0)),
        bearing: Vec2::new(8.0, 92.0),
        advance: 100.0,
    }
}
