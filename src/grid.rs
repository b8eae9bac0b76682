//! The per-glyph spatial index.
//!
//! A glyph's em-box is divided into a fixed grid of cells. Each cell lists
//! the curves that pass through its rectangle (at most four) and records
//! whether the cell's geometric center lies inside the filled outline. The
//! fragment shader reads one RGBA texel per cell: byte values `0` and `1`
//! mean "empty slot", a real curve index `i` is stored as `i + 2`, and the
//! ordering of the first two bytes carries the center-inside bit
//! (`s0 > s1` iff inside). Curve order within a cell is otherwise free, so
//! the encoder swaps the first two slots when needed.

use crate::curves::{Quadratic, Rect, Vec2};
use thiserror::Error;

/// A cell texel has four byte slots, so at most four curves per cell.
pub const MAX_CURVES_PER_CELL: usize = 4;

/// Slot bytes 0 and 1 are reserved, so cell slots can address curve indices
/// `0..=253`: at most 254 curves per glyph.
pub const MAX_CURVES_PER_GLYPH: usize = 254;

/// Value stored for curve index 0; reserved values live below it.
const FIRST_CURVE_SLOT: u8 = 2;

/// Failure to index one glyph's curves.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("cell ({x}, {y}) touches {count} curves; a cell holds at most 4")]
    TooManyCurvesInCell { x: u16, y: u16, count: usize },
    #[error("glyph has {0} curves; cell slots can address at most 254")]
    TooManyCurves(usize),
}

/// One grid cell: the curves passing through it, plus the inside bit for
/// its center.
#[derive(Clone, Debug, Default)]
pub struct GridCell {
    curves: [u8; MAX_CURVES_PER_CELL],
    len: u8,
    mid_inside: bool,
}

impl GridCell {
    /// Indices into the glyph's curve list, in traversal order.
    pub fn curve_indices(&self) -> &[u8] {
        &self.curves[..self.len as usize]
    }

    /// Whether the cell's geometric center is inside the filled region.
    pub fn mid_inside(&self) -> bool {
        self.mid_inside
    }

    fn push(&mut self, index: u8) -> bool {
        if self.len as usize == MAX_CURVES_PER_CELL {
            return false;
        }
        self.curves[self.len as usize] = index;
        self.len += 1;
        true
    }

    /// The cell's RGBA texel (see module docs for the slot scheme).
    pub fn texel(&self) -> [u8; 4] {
        let mut px = [0u8; 4];
        let n = self.len as usize;
        for k in 0..n {
            px[k] = self.curves[k] + FIRST_CURVE_SLOT;
        }
        // Unused slots carry the reserved pair, ordered by the inside bit;
        // any further slots stay 0.
        let (first, second) = if self.mid_inside { (1, 0) } else { (0, 1) };
        if n < MAX_CURVES_PER_CELL {
            px[n] = first;
        }
        if n + 1 < MAX_CURVES_PER_CELL {
            px[n + 1] = second;
        }
        // The shader tests s0 > s1; reorder the front pair if the natural
        // layout disagrees with the computed bit.
        if (px[0] > px[1]) != self.mid_inside {
            px.swap(0, 1);
        }
        px
    }
}

/// A fixed `width × height` cell index over one glyph's em-box.
#[derive(Clone, Debug)]
pub struct CurveGrid {
    width: u16,
    height: u16,
    cells: Vec<GridCell>,
}

impl CurveGrid {
    /// Index `curves` (normalized to `[0, size.x] × [0, size.y]`) into a
    /// `width × height` grid.
    ///
    /// Fails when any cell would exceed its four slots or when the glyph has
    /// more curves than a slot byte can address.
    pub fn build(
        curves: &[Quadratic],
        size: Vec2,
        width: u16,
        height: u16,
    ) -> Result<Self, GridError> {
        if curves.len() > MAX_CURVES_PER_GLYPH {
            return Err(GridError::TooManyCurves(curves.len()));
        }

        let mut cells = vec![GridCell::default(); width as usize * height as usize];
        let cell_w = size.x / width as f32;
        let cell_h = size.y / height as f32;

        for (index, q) in curves.iter().enumerate() {
            let bb = q.bounding_box();
            let x0 = (bb.min.x / cell_w).floor() as i32;
            let mut x1 = (bb.max.x / cell_w).ceil() as i32 - 1;
            let y0 = (bb.min.y / cell_h).floor() as i32;
            let mut y1 = (bb.max.y / cell_h).ceil() as i32 - 1;
            // An axis-aligned segment sitting exactly on a cell boundary has
            // a zero-extent range here; snap it to its containing cell so it
            // stays indexed.
            if x1 < x0 {
                x1 = x0;
            }
            if y1 < y0 {
                y1 = y0;
            }
            let x0 = x0.clamp(0, width as i32 - 1) as u16;
            let x1 = x1.clamp(0, width as i32 - 1) as u16;
            let y0 = y0.clamp(0, height as i32 - 1) as u16;
            let y1 = y1.clamp(0, height as i32 - 1) as u16;

            for cy in y0..=y1 {
                for cx in x0..=x1 {
                    let rect = Rect::new(
                        Vec2::new(cx as f32 * cell_w, cy as f32 * cell_h),
                        Vec2::new((cx + 1) as f32 * cell_w, (cy + 1) as f32 * cell_h),
                    );
                    if !curve_touches_cell(q, rect) {
                        continue;
                    }
                    let cell = &mut cells[cy as usize * width as usize + cx as usize];
                    if !cell.push(index as u8) {
                        return Err(GridError::TooManyCurvesInCell {
                            x: cx,
                            y: cy,
                            count: MAX_CURVES_PER_CELL + 1,
                        });
                    }
                }
            }
        }

        for cy in 0..height {
            for cx in 0..width {
                let center = Vec2::new(
                    (cx as f32 + 0.5) * cell_w,
                    (cy as f32 + 0.5) * cell_h,
                );
                cells[cy as usize * width as usize + cx as usize].mid_inside =
                    ray_parity(curves, center);
            }
        }

        Ok(Self { width, height, cells })
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn cell(&self, x: u16, y: u16) -> &GridCell {
        &self.cells[y as usize * self.width as usize + x as usize]
    }
}

/// Whether `q` intersects `rect`: either endpoint inside, or a crossing of
/// one of the four edge lines that lands within the edge's span.
fn curve_touches_cell(q: &Quadratic, rect: Rect) -> bool {
    if rect.contains(q.e0) || rect.contains(q.e1) {
        return true;
    }
    let mut roots = [0.0f32; 2];
    for x in [rect.min.x, rect.max.x] {
        let n = q.solve_x(x, &mut roots);
        for &t in &roots[..n] {
            if (0.0..=1.0).contains(&t) {
                let y = q.eval(t).y;
                if y >= rect.min.y && y <= rect.max.y {
                    return true;
                }
            }
        }
    }
    for y in [rect.min.y, rect.max.y] {
        let n = q.solve_y(y, &mut roots);
        for &t in &roots[..n] {
            if (0.0..=1.0).contains(&t) {
                let x = q.eval(t).x;
                if x >= rect.min.x && x <= rect.max.x {
                    return true;
                }
            }
        }
    }
    false
}

/// Even-odd test: parity of crossings of a rightward ray from `origin`
/// against the whole outline. Roots count on `t ∈ [0, 1)` so a crossing at a
/// shared segment endpoint counts once.
fn ray_parity(curves: &[Quadratic], origin: Vec2) -> bool {
    let mut crossings = 0u32;
    let mut roots = [0.0f32; 2];
    for q in curves {
        let n = q.solve_y(origin.y, &mut roots);
        for &t in &roots[..n] {
            if t >= 0.0 && t < 1.0 && q.eval(t).x > origin.x {
                crossings += 1;
            }
        }
    }
    crossings % 2 == 1
}
