use std::ops::Range;

use crate::config::{MAX_ZOOM, MIN_ZOOM, TILE_SIZE};
use crate::map::transform::Viewport;

/// One raster tile of the `2^zoom × 2^zoom` grid
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileDescriptor {
    pub zoom: u8,
    pub col: u32,
    pub row: u32,
}

impl TileDescriptor {
    /// Slippy-map path `"{zoom}/{col}/{row}"`
    pub fn path(&self) -> String {
        format!("{}/{}/{}", self.zoom, self.col, self.row)
    }

    pub fn url(&self, base: &str) -> String {
        format!("{}/{}.png", base.trim_end_matches('/'), self.path())
    }
}

/// Where a tile image goes in map-local coordinates:
/// `translate(x, y) scale(scale)` applied to a `tile_size` image
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TilePlacement {
    pub x: f64,
    pub y: f64,
    pub scale: f64,
}

/// The half-open rectangle of tiles covering a viewport at one zoom level
#[derive(Clone, Debug, PartialEq)]
pub struct TilePlan {
    pub zoom: u8,
    /// Edge of one tile in unscaled map-local pixels
    pub tile_edge: f64,
    pub tile_size: f64,
    pub cols: Range<u32>,
    pub rows: Range<u32>,
}

impl TilePlan {
    pub fn is_empty(&self) -> bool {
        self.cols.is_empty() || self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cols.len() * self.rows.len()
    }

    /// Row-major enumeration of the plan
    pub fn tiles(&self) -> impl Iterator<Item = TileDescriptor> + '_ {
        let zoom = self.zoom;
        self.rows.clone().flat_map(move |row| {
            self.cols
                .clone()
                .map(move |col| TileDescriptor { zoom, col, row })
        })
    }

    pub fn placement(&self, tile: &TileDescriptor) -> TilePlacement {
        TilePlacement {
            x: tile.col as f64 * self.tile_edge,
            y: tile.row as f64 * self.tile_edge,
            scale: self.tile_edge / self.tile_size,
        }
    }
}

/// Picks a zoom level and the tile set for a viewport
#[derive(Clone, Debug)]
pub struct TilePlanner {
    pub tile_size: f64,
    pub min_zoom: u8,
    pub max_zoom: u8,
}

impl Default for TilePlanner {
    fn default() -> Self {
        Self::new(TILE_SIZE, MIN_ZOOM, MAX_ZOOM)
    }
}

impl TilePlanner {
    pub fn new(tile_size: f64, min_zoom: u8, max_zoom: u8) -> Self {
        // 2^zoom tile indices must fit a u32
        let max_zoom = max_zoom.min(31);
        Self {
            tile_size,
            min_zoom: min_zoom.min(max_zoom),
            max_zoom,
        }
    }

    /// Discrete zoom whose tile grid is close to, but not below, the screen's
    /// tile-fit count. The -3 keeps fractional scales from over-fetching.
    pub fn zoom_for(&self, viewport: &Viewport) -> u8 {
        let tiles_across = (viewport.map_size * viewport.scale / self.tile_size).floor();
        let z = (tiles_across - 3.0).log2().ceil();
        if z.is_finite() {
            z.clamp(self.min_zoom as f64, self.max_zoom as f64) as u8
        } else if z == f64::INFINITY {
            self.max_zoom
        } else {
            // NaN or -inf: fewer than four tiles across
            self.min_zoom
        }
    }

    pub fn plan(&self, viewport: &Viewport) -> TilePlan {
        let zoom = self.zoom_for(viewport);
        let divider = 2f64.powi(zoom as i32);
        let tile_edge = viewport.map_size / divider;

        let (cols, rows) = if viewport.is_empty() || !tile_edge.is_finite() || tile_edge <= 0.0 {
            (0..0, 0..0)
        } else {
            (
                span(viewport.x, viewport.width, tile_edge, divider),
                span(viewport.y, viewport.height, tile_edge, divider),
            )
        };

        TilePlan {
            zoom,
            tile_edge,
            tile_size: self.tile_size,
            cols,
            rows,
        }
    }
}

/// Tile indices covering `[start, start + len)` on one axis
fn span(start: f64, len: f64, tile_edge: f64, divider: f64) -> Range<u32> {
    let first = (start / tile_edge).floor();
    let end = ((start + len) / tile_edge).ceil().clamp(0.0, divider);
    if !(first.is_finite() && end.is_finite()) || end <= first {
        return 0..0;
    }
    first.max(0.0) as u32..end as u32
}
