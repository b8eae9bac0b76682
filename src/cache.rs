//! The glyph cache: one explicit owner for fonts, atlas groups, and the
//! per-codepoint records the renderer draws from.
//!
//! The cache is monotonic (records are never evicted and atlas offsets
//! never move) and strictly sequential: every lookup either returns an
//! existing record or runs the whole extract → grid → pack pipeline before
//! returning. Per-glyph failures degrade to a metrics-only record and leave
//! the atlases exactly as they were; only backend errors propagate.

use crate::atlas::{glyph_data_len, AtlasGroup, AtlasUploader, GLYPH_DATA_TEXELS, GRID_SIZE};
use crate::config::Config;
use crate::curves::Vec2;
use crate::grid::CurveGrid;
use crate::outline::{extract, Outline, OutlineError, OutlineProvider};
use log::{debug, warn};
use std::collections::HashMap;
use thiserror::Error;

/// Handle to a font registered with a [`GlyphCache`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FontId(usize);

/// Errors a glyph lookup can surface to the caller.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("font {0:?} is not registered with this cache")]
    UnknownFont(FontId),
    #[error(transparent)]
    Outline(#[from] OutlineError),
}

/// A cached glyph.
///
/// Entries are plain values: the atlas data is addressed by group index and
/// texel offset, never by reference, so a record never pins cache memory.
/// `has_curves == false` marks a degenerate record (whitespace, or a glyph
/// that would not fit); its metrics stay valid but there is nothing to draw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphEntry {
    /// Index of the atlas group holding the glyph.
    pub group: u16,
    /// Texel offset of the glyph's header in that group's data buffer.
    pub data_offset: u32,
    /// Em-box size, font units.
    pub size: Vec2,
    /// Pen-relative position of the em-box minimum corner.
    pub offset: Vec2,
    /// Horizontal advance, font units.
    pub advance: f32,
    /// Whether the glyph has geometry in the atlases.
    pub has_curves: bool,
}

impl GlyphEntry {
    /// Pack the per-vertex attribute for one corner of the glyph quad:
    /// `(data_offset << 2) | (norm_x << 1) | norm_y`, where the norm bits
    /// select the corner in normalized glyph space.
    ///
    /// Meaningless for degenerate entries; callers skip those quads.
    pub fn vertex_payload(&self, norm_x: bool, norm_y: bool) -> u32 {
        (self.data_offset << 2) | ((norm_x as u32) << 1) | norm_y as u32
    }
}

/// Owner of fonts, atlas groups, and glyph records.
pub struct GlyphCache<P> {
    config: Config,
    fonts: Vec<P>,
    groups: Vec<AtlasGroup>,
    entries: HashMap<(FontId, char), GlyphEntry>,
}

impl<P: OutlineProvider> GlyphCache<P> {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(mut config: Config) -> Self {
        if config.grid_width == 0
            || config.grid_width > GRID_SIZE
            || config.grid_height == 0
            || config.grid_height > GRID_SIZE
        {
            warn!(
                "grid {}x{} outside 1..={}, clamping",
                config.grid_width, config.grid_height, GRID_SIZE
            );
            config.grid_width = config.grid_width.clamp(1, GRID_SIZE);
            config.grid_height = config.grid_height.clamp(1, GRID_SIZE);
        }
        Self {
            config,
            fonts: Vec::new(),
            groups: Vec::new(),
            entries: HashMap::new(),
        }
    }

    /// Register a font and get a handle for lookups.
    pub fn add_font(&mut self, font: P) -> FontId {
        self.fonts.push(font);
        FontId(self.fonts.len() - 1)
    }

    pub fn font(&self, id: FontId) -> Option<&P> {
        self.fonts.get(id.0)
    }

    /// The atlas groups built so far; entries index into this slice.
    pub fn groups(&self) -> &[AtlasGroup] {
        &self.groups
    }

    /// Look up (building if needed) the record for `codepoint`.
    pub fn glyph(&mut self, font: FontId, codepoint: char) -> Result<GlyphEntry, CacheError> {
        if let Some(entry) = self.entries.get(&(font, codepoint)) {
            return Ok(*entry);
        }

        let provider = self.fonts.get(font.0).ok_or(CacheError::UnknownFont(font))?;
        // Backend errors propagate without storing anything, so a later
        // call retries.
        let raw = provider.outline(codepoint)?;
        let tolerance = self.config.cubic_tolerance_em * provider.units_per_em() as f32;
        let outline = extract(&raw, tolerance);

        let entry = self.build_entry(codepoint, &outline);
        self.entries.insert((font, codepoint), entry);
        Ok(entry)
    }

    /// Warm the cache with the fallback glyph and printable ASCII.
    pub fn preload_ascii(&mut self, font: FontId) -> Result<(), CacheError> {
        for cp in std::iter::once('\0').chain((32u8..128).map(char::from)) {
            match self.glyph(font, cp) {
                Ok(_) => {}
                Err(CacheError::UnknownFont(id)) => return Err(CacheError::UnknownFont(id)),
                // Per-glyph failures stay local during a warmup sweep.
                Err(err) => debug!("preload U+{:04X}: {err}", cp as u32),
            }
        }
        Ok(())
    }

    /// Hand every dirty group's buffers to `uploader`, then mark it clean.
    pub fn flush_uploads<U: AtlasUploader>(&mut self, uploader: &mut U) {
        for (index, group) in self.groups.iter_mut().enumerate() {
            if group.needs_upload() {
                uploader.upload(index, group.glyph_data(), group.grid_atlas());
                group.mark_uploaded();
            }
        }
    }

    fn build_entry(&mut self, codepoint: char, outline: &Outline) -> GlyphEntry {
        if outline.curves.is_empty() {
            // Whitespace and other blank glyphs: metrics only.
            return degenerate_entry(outline);
        }
        if outline.size.x <= 0.0 || outline.size.y <= 0.0 {
            warn!(
                "glyph U+{:04X}: curves present but the metric box is empty",
                codepoint as u32
            );
            return degenerate_entry(outline);
        }
        if glyph_data_len(outline.curves.len()) > GLYPH_DATA_TEXELS {
            warn!(
                "glyph U+{:04X}: {} curves exceed the data buffer",
                codepoint as u32,
                outline.curves.len()
            );
            return degenerate_entry(outline);
        }

        let grid = match CurveGrid::build(
            &outline.curves,
            outline.size,
            self.config.grid_width,
            self.config.grid_height,
        ) {
            Ok(grid) => grid,
            Err(err) => {
                warn!("glyph U+{:04X}: {err}", codepoint as u32);
                return degenerate_entry(outline);
            }
        };

        match self.pack(outline, &grid) {
            Some((group, data_offset)) => GlyphEntry {
                group: group as u16,
                data_offset,
                size: outline.size,
                offset: outline.offset,
                advance: outline.advance,
                has_curves: true,
            },
            None => {
                warn!("glyph U+{:04X}: atlas insert failed", codepoint as u32);
                degenerate_entry(outline)
            }
        }
    }

    /// Insert into the open group, rolling over to a fresh one when it
    /// fills. The glyph's budget was checked against an empty buffer, so
    /// the retry cannot fail for lack of room.
    fn pack(&mut self, outline: &Outline, grid: &CurveGrid) -> Option<(usize, u32)> {
        if self.groups.last().map_or(true, |g| g.is_full()) {
            debug!("opening atlas group {}", self.groups.len());
            self.groups.push(AtlasGroup::new());
        }
        let index = self.groups.len() - 1;
        if let Some(offset) = self.groups[index].insert(&outline.curves, outline.size, grid) {
            return Some((index, offset));
        }

        debug!("atlas group {} full, opening {}", index, index + 1);
        self.groups.push(AtlasGroup::new());
        let index = index + 1;
        self.groups[index]
            .insert(&outline.curves, outline.size, grid)
            .map(|offset| (index, offset))
    }
}

impl<P: OutlineProvider> Default for GlyphCache<P> {
    fn default() -> Self {
        Self::new()
    }
}

fn degenerate_entry(outline: &Outline) -> GlyphEntry {
    GlyphEntry {
        group: 0,
        data_offset: 0,
        size: outline.size,
        offset: outline.offset,
        advance: outline.advance,
        has_curves: false,
    }
}
