use glam::DVec2;

use crate::config::{MAX_SCALE, MIN_SCALE};

/// Affine placement of the virtual map surface on screen.
///
/// `x`/`y` is the screen position of the map's top-left corner, `scale` the
/// uniform zoom factor. Only the input controller mutates it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub x: f64,
    pub y: f64,
    pub scale: f64,
}

impl Transform {
    pub fn new(x: f64, y: f64, scale: f64) -> Self {
        Self {
            x,
            y,
            scale: scale.clamp(MIN_SCALE, MAX_SCALE),
        }
    }

    /// Map centered on a screen at the given scale
    pub fn centered(screen: DVec2, map_size: f64, scale: f64) -> Self {
        let scale = scale.clamp(MIN_SCALE, MAX_SCALE);
        Self {
            x: screen.x / 2.0 - map_size * scale / 2.0,
            y: screen.y / 2.0 - map_size * scale / 2.0,
            scale,
        }
    }

    #[inline]
    pub fn translate(&self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }

    #[inline]
    pub fn set_translate(&mut self, t: DVec2) {
        self.x = t.x;
        self.y = t.y;
    }

    /// Screen position -> unscaled map-local position
    #[inline]
    pub fn screen_to_map(&self, screen: DVec2) -> DVec2 {
        (screen - self.translate()) / self.scale
    }

    /// Unscaled map-local position -> screen position
    #[inline]
    pub fn map_to_screen(&self, map: DVec2) -> DVec2 {
        map * self.scale + self.translate()
    }

    /// Derive the visible rectangle of the map for a screen of `screen` pixels.
    pub fn viewport(&self, screen: DVec2, map_size: f64) -> Viewport {
        let scale = self.scale;

        // Bounding rectangle of the transformed map, back in map-local units
        let left = self.x / scale;
        let top = self.y / scale;
        let right = left + map_size;
        let bottom = top + map_size;

        let width = right.min(screen.x / scale) - left.max(0.0);
        let height = bottom.min(screen.y / scale) - top.max(0.0);

        Viewport {
            x: (-left).max(0.0),
            y: (-top).max(0.0),
            width: width.max(0.0),
            height: height.max(0.0),
            map_size,
            scale,
            screen_x: self.x.max(0.0),
            screen_y: self.y.max(0.0),
        }
    }
}

/// Immutable snapshot of the visible part of the map.
///
/// Everything except `scale` and the screen origin is in unscaled map-local
/// units. A fresh value is produced on every transform change.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub map_size: f64,
    pub scale: f64,
    /// Screen position of the viewport's top-left corner (non-zero only when
    /// the map edge is inside the screen)
    pub screen_x: f64,
    pub screen_y: f64,
}

impl Viewport {
    /// True when nothing of the map is on screen
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Map-local center of the visible rectangle
    pub fn center(&self) -> DVec2 {
        DVec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Map pixel at `map_size * scale` -> screen pixel
    #[inline]
    pub fn scaled_to_screen(&self, p: DVec2) -> DVec2 {
        DVec2::new(
            p.x - self.x * self.scale + self.screen_x,
            p.y - self.y * self.scale + self.screen_y,
        )
    }

    /// Unscaled map-local pixel -> screen pixel
    #[inline]
    pub fn map_to_screen(&self, p: DVec2) -> DVec2 {
        self.scaled_to_screen(p * self.scale)
    }
}
