//! GPU-facing atlas groups.
//!
//! An [`AtlasGroup`] pairs two CPU-side byte buffers that back two GPU
//! resources:
//!
//! * **glyph data**: a linear RGBA8 texel buffer ([`GLYPH_DATA_SIZE`]²
//!   texels). Each texel carries two little-endian 16-bit values (x in RG,
//!   y in BA). A glyph occupies two header texels, `(gridX, gridY)` then
//!   `(gridW, gridH)`, followed by three texels per curve (`e0`, `c`, `e1`),
//!   coordinates quantized to `round(coord * 65535 / size.axis)`.
//! * **grid atlas**: a [`GRID_ATLAS_SIZE`]² RGBA8 image. Each glyph's grid
//!   is a [`GRID_SIZE`]-strided region of cell texels, placed left to right,
//!   then top to bottom.
//!
//! Both buffers are append-only: cursors advance on successful inserts and
//! are never rewound, so offsets handed out stay valid for the life of the
//! group. A failed insert leaves both cursors untouched and marks the group
//! full; the caller opens the next group.

use crate::curves::{Quadratic, Vec2};
use crate::grid::CurveGrid;
use log::debug;

/// Cells per glyph axis; also the grid atlas placement stride.
pub const GRID_SIZE: u16 = 20;
/// Side of the square grid atlas, in texels.
pub const GRID_ATLAS_SIZE: u16 = 256;
/// Side of the (conceptually square) glyph-data buffer, in texels.
pub const GLYPH_DATA_SIZE: u16 = 256;
/// RGBA.
pub const ATLAS_CHANNELS: usize = 4;
/// Total texel capacity of the glyph-data buffer.
pub const GLYPH_DATA_TEXELS: u32 = GLYPH_DATA_SIZE as u32 * GLYPH_DATA_SIZE as u32;

/// Texels one glyph occupies in the data buffer: two header texels plus
/// three per curve.
pub fn glyph_data_len(curve_count: usize) -> u32 {
    2 + 3 * curve_count as u32
}

/// Quantize a coordinate in `[0, extent]` onto the full 16-bit range.
pub fn quantize(coord: f32, extent: f32) -> u16 {
    if extent <= 0.0 {
        return 0;
    }
    (coord * 65535.0 / extent).round().clamp(0.0, 65535.0) as u16
}

/// Receiver for dirty atlas buffers, the GPU side of the cache.
///
/// `glyph_data` is uploaded as a [`GLYPH_DATA_TEXELS`]-texel RGBA8 buffer
/// texture and `grid_atlas` as a [`GRID_ATLAS_SIZE`]² RGBA8 2D texture; the
/// byte layouts above are the wire format.
pub trait AtlasUploader {
    fn upload(&mut self, group: usize, glyph_data: &[u8], grid_atlas: &[u8]);
}

/// One pair of atlas buffers and their cursors.
pub struct AtlasGroup {
    glyph_data: Vec<u8>,
    grid_atlas: Vec<u8>,
    glyph_data_offset: u32,
    next_grid_pos: (u16, u16),
    full: bool,
    uploaded: bool,
}

impl AtlasGroup {
    pub fn new() -> Self {
        Self {
            glyph_data: vec![0; GLYPH_DATA_TEXELS as usize * ATLAS_CHANNELS],
            grid_atlas: vec![
                0;
                GRID_ATLAS_SIZE as usize * GRID_ATLAS_SIZE as usize * ATLAS_CHANNELS
            ],
            glyph_data_offset: 0,
            next_grid_pos: (0, 0),
            full: false,
            // Nothing to upload until the first insert.
            uploaded: true,
        }
    }

    /// Whether one of the cursors has run out of room.
    pub fn is_full(&self) -> bool {
        self.full
    }

    /// Whether the CPU buffers have changed since the last upload.
    pub fn needs_upload(&self) -> bool {
        !self.uploaded
    }

    pub(crate) fn mark_uploaded(&mut self) {
        self.uploaded = true;
    }

    /// Current glyph-data cursor, in texels.
    pub fn data_cursor(&self) -> u32 {
        self.glyph_data_offset
    }

    /// Current grid placement cursor.
    pub fn grid_cursor(&self) -> (u16, u16) {
        self.next_grid_pos
    }

    /// Raw glyph-data bytes (the full buffer, including unwritten tail).
    pub fn glyph_data(&self) -> &[u8] {
        &self.glyph_data
    }

    /// Raw grid-atlas bytes.
    pub fn grid_atlas(&self) -> &[u8] {
        &self.grid_atlas
    }

    /// Insert one glyph's curves and grid.
    ///
    /// Returns the glyph's data-buffer texel offset, or `None` after marking
    /// the group full. Placement is validated for both buffers before any
    /// byte is written, so a refused insert leaves the group exactly as it
    /// was.
    pub fn insert(&mut self, curves: &[Quadratic], size: Vec2, grid: &CurveGrid) -> Option<u32> {
        debug_assert!(grid.width() <= GRID_SIZE && grid.height() <= GRID_SIZE);

        let needed = glyph_data_len(curves.len());
        if self.glyph_data_offset + needed > GLYPH_DATA_TEXELS {
            debug!("atlas group out of glyph-data room");
            self.full = true;
            return None;
        }

        let (mut gx, mut gy) = self.next_grid_pos;
        if gx + GRID_SIZE > GRID_ATLAS_SIZE {
            gx = 0;
            gy += GRID_SIZE;
        }
        if gy + GRID_SIZE > GRID_ATLAS_SIZE {
            debug!("atlas group out of grid room");
            self.full = true;
            return None;
        }

        let offset = self.glyph_data_offset;
        self.write_glyph_data(offset, gx, gy, grid, curves, size);
        self.write_grid(gx, gy, grid);

        self.glyph_data_offset = offset + needed;
        self.next_grid_pos = (gx + GRID_SIZE, gy);
        self.uploaded = false;
        Some(offset)
    }

    fn write_glyph_data(
        &mut self,
        offset: u32,
        gx: u16,
        gy: u16,
        grid: &CurveGrid,
        curves: &[Quadratic],
        size: Vec2,
    ) {
        let base = offset as usize * ATLAS_CHANNELS;
        let buf = &mut self.glyph_data[base..];
        put_pair(&mut buf[0..4], gx, gy);
        put_pair(&mut buf[4..8], grid.width(), grid.height());
        for (i, q) in curves.iter().enumerate() {
            let at = 8 + i * 3 * ATLAS_CHANNELS;
            put_point(&mut buf[at..at + 4], q.e0, size);
            put_point(&mut buf[at + 4..at + 8], q.c, size);
            put_point(&mut buf[at + 8..at + 12], q.e1, size);
        }
    }

    fn write_grid(&mut self, gx: u16, gy: u16, grid: &CurveGrid) {
        for cy in 0..grid.height() {
            for cx in 0..grid.width() {
                let texel = grid.cell(cx, cy).texel();
                let at = ((gy + cy) as usize * GRID_ATLAS_SIZE as usize + (gx + cx) as usize)
                    * ATLAS_CHANNELS;
                self.grid_atlas[at..at + ATLAS_CHANNELS].copy_from_slice(&texel);
            }
        }
    }
}

impl Default for AtlasGroup {
    fn default() -> Self {
        Self::new()
    }
}

fn put_pair(dst: &mut [u8], a: u16, b: u16) {
    dst[0..2].copy_from_slice(&a.to_le_bytes());
    dst[2..4].copy_from_slice(&b.to_le_bytes());
}

fn put_point(dst: &mut [u8], p: Vec2, size: Vec2) {
    put_pair(dst, quantize(p.x, size.x), quantize(p.y, size.y));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_pair(src: &[u8]) -> (u16, u16) {
        (
            u16::from_le_bytes([src[0], src[1]]),
            u16::from_le_bytes([src[2], src[3]]),
        )
    }

    fn small_glyph() -> (Vec<Quadratic>, Vec2) {
        let size = Vec2::new(1024.0, 2048.0);
        let curves = vec![
            Quadratic::line(Vec2::new(100.0, 100.0), Vec2::new(900.0, 100.0)),
            Quadratic::line(Vec2::new(900.0, 100.0), Vec2::new(900.0, 1900.0)),
            Quadratic::line(Vec2::new(900.0, 1900.0), Vec2::new(100.0, 1900.0)),
            Quadratic::line(Vec2::new(100.0, 1900.0), Vec2::new(100.0, 100.0)),
        ];
        (curves, size)
    }

    #[test]
    fn test_quantize_half_and_full() {
        // (w/2, h) of a 1024×2048 box lands on (32768, 65535).
        assert_eq!(quantize(512.0, 1024.0), 32768);
        assert_eq!(quantize(2048.0, 2048.0), 65535);
        assert_eq!(quantize(0.0, 1024.0), 0);
        assert_eq!(quantize(5.0, 0.0), 0);
    }

    #[test]
    fn test_insert_writes_header_and_curves() {
        let (curves, size) = small_glyph();
        let grid = CurveGrid::build(&curves, size, GRID_SIZE, GRID_SIZE).unwrap();
        let mut group = AtlasGroup::new();

        let offset = group.insert(&curves, size, &grid).unwrap();
        assert_eq!(offset, 0);
        assert_eq!(group.data_cursor(), glyph_data_len(curves.len()));
        assert_eq!(group.grid_cursor(), (GRID_SIZE, 0));
        assert!(group.needs_upload());

        let data = group.glyph_data();
        assert_eq!(read_pair(&data[0..4]), (0, 0));
        assert_eq!(read_pair(&data[4..8]), (GRID_SIZE, GRID_SIZE));
        // First curve, e0 = (100, 100).
        let (qx, qy) = read_pair(&data[8..12]);
        assert_eq!(qx, quantize(100.0, size.x));
        assert_eq!(qy, quantize(100.0, size.y));
        // Control of the first edge is the midpoint.
        let (cx, cy) = read_pair(&data[12..16]);
        assert_eq!(cx, quantize(500.0, size.x));
        assert_eq!(cy, quantize(100.0, size.y));

        // Round-trip error stays within one quantum.
        let back = cx as f32 * size.x / 65535.0;
        assert!((back - 500.0).abs() <= size.x / 65535.0);
    }

    #[test]
    fn test_grid_region_lands_at_cursor() {
        let (curves, size) = small_glyph();
        let grid = CurveGrid::build(&curves, size, GRID_SIZE, GRID_SIZE).unwrap();
        let mut group = AtlasGroup::new();
        group.insert(&curves, size, &grid).unwrap();
        group.insert(&curves, size, &grid).unwrap();

        // Second copy starts at x = GRID_SIZE; spot-check one cell texel.
        let (cx, cy) = (5u16, 7u16);
        let expect = grid.cell(cx, cy).texel();
        let at = ((cy as usize) * GRID_ATLAS_SIZE as usize + (GRID_SIZE + cx) as usize)
            * ATLAS_CHANNELS;
        assert_eq!(&group.grid_atlas()[at..at + 4], &expect);
    }

    #[test]
    fn test_grid_room_runs_out_after_144_inserts() {
        let (curves, size) = small_glyph();
        let grid = CurveGrid::build(&curves, size, GRID_SIZE, GRID_SIZE).unwrap();
        let mut group = AtlasGroup::new();

        for i in 0..144 {
            assert!(group.insert(&curves, size, &grid).is_some(), "insert {i}");
        }
        let data_cursor = group.data_cursor();
        let grid_cursor = group.grid_cursor();

        assert!(group.insert(&curves, size, &grid).is_none());
        assert!(group.is_full());
        // The refused insert changed nothing.
        assert_eq!(group.data_cursor(), data_cursor);
        assert_eq!(group.grid_cursor(), grid_cursor);
        assert_eq!(data_cursor, 144 * glyph_data_len(curves.len()));
    }

    #[test]
    fn test_data_room_checked_before_writes() {
        // 200 tiny segments, one per cell, keeps the grid sparse while each
        // insert eats 602 data texels; the 109th no longer fits.
        let size = Vec2::new(100.0, 100.0);
        let curves: Vec<Quadratic> = (0..200)
            .map(|k| {
                let x = (k % 20) as f32 * 5.0 + 1.0;
                let y = (k / 20) as f32 * 5.0 + 1.0;
                Quadratic::line(Vec2::new(x, y), Vec2::new(x + 2.0, y + 2.0))
            })
            .collect();
        let grid = CurveGrid::build(&curves, size, GRID_SIZE, GRID_SIZE).unwrap();
        let mut group = AtlasGroup::new();

        let per_glyph = glyph_data_len(curves.len());
        let fits = GLYPH_DATA_TEXELS / per_glyph;
        assert_eq!(fits, 108);
        for _ in 0..fits {
            assert!(group.insert(&curves, size, &grid).is_some());
        }
        let data_cursor = group.data_cursor();
        let grid_cursor = group.grid_cursor();

        assert!(group.insert(&curves, size, &grid).is_none());
        assert!(group.is_full());
        assert_eq!(group.data_cursor(), data_cursor);
        assert_eq!(group.grid_cursor(), grid_cursor);
    }
}
