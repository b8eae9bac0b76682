//! Build-time tunables, owned explicitly and passed to the cache.

use crate::atlas::GRID_SIZE;
use serde::{Deserialize, Serialize};

/// Knobs for outline conversion and grid construction.
///
/// Values deserialize from an application's config file; missing fields
/// take their defaults.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Maximum cubic-approximation error, as a fraction of the em square.
    /// Resolved against the font's `units_per_em` at extraction time.
    pub cubic_tolerance_em: f32,
    /// Grid cells per glyph in x, at most [`GRID_SIZE`].
    pub grid_width: u16,
    /// Grid cells per glyph in y, at most [`GRID_SIZE`].
    pub grid_height: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cubic_tolerance_em: 1.0 / 1024.0,
            grid_width: GRID_SIZE,
            grid_height: GRID_SIZE,
        }
    }
}
