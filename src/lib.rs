//! glyph-grid: resolution-independent glyph atlases for analytic GPU text
//! rendering.
//!
//! Glyphs are never rasterized to bitmaps. Each outline is lowered to
//! quadratic Béziers, spatially indexed by a small per-glyph grid, and
//! packed into a pair of shared atlases that a fragment shader samples
//! directly, so text can be scaled, rotated, or repositioned without any
//! loss of quality.
//!
//! ```ignore
//! use glyph_grid::{Font, GlyphCache};
//!
//! let data = std::fs::read("font.ttf")?;
//! let mut cache = GlyphCache::new();
//! let font = cache.add_font(Font::from_bytes(&data)?);
//!
//! let glyph = cache.glyph(font, 'Q')?;
//! // ... emit the glyph quad using glyph.vertex_payload(..) per corner ...
//! cache.flush_uploads(&mut gpu);   // hand dirty atlas bytes to the driver
//! ```

pub mod atlas;
pub mod cache;
pub mod config;
pub mod curves;
pub mod font;
pub mod grid;
pub mod outline;

pub use atlas::{AtlasGroup, AtlasUploader, GLYPH_DATA_SIZE, GRID_ATLAS_SIZE, GRID_SIZE};
pub use cache::{CacheError, FontId, GlyphCache, GlyphEntry};
pub use config::Config;
pub use curves::{Quadratic, Rect, Vec2};
pub use font::{Font, FontError, FontMetrics};
pub use grid::{CurveGrid, GridCell, GridError};
pub use outline::{
    extract, ControlPoint, Outline, OutlineError, OutlineProvider, PointTag, RawOutline,
};
