use glam::DVec2;

use crate::config::{MAX_SCALE, MIN_SCALE, WHEEL_SPEED};
use crate::map::{Transform, Viewport};

/// Pointer moves shorter than this (screen pixels) are not applied
const MIN_MOVE: f64 = 0.5;

/// Wheel direction, already mapped from the platform's scroll convention
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WheelDirection {
    ZoomIn,
    ZoomOut,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Gesture {
    Idle,
    Panning {
        /// Pointer position relative to the pan origin at press time
        grab: DVec2,
        /// Set once a move actually changed the translate
        dragged: bool,
    },
}

/// A press/release without any applied move, in map-local pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Click {
    pub x: f64,
    pub y: f64,
    pub viewport: Viewport,
}

/// Sole owner and writer of the [`Transform`].
///
/// Every mutating call returns whether the transform changed (or, for the
/// wheel, whether a recompute should be scheduled); callers turn that into a
/// frame request and read a fresh [`Viewport`] at the frame boundary.
#[derive(Clone, Debug)]
pub struct InputController {
    transform: Transform,
    screen: DVec2,
    map_size: f64,
    gesture: Gesture,
}

impl InputController {
    /// Controller for a screen of `screen` pixels, map centered at minimum scale
    pub fn new(screen: DVec2, map_size: f64) -> Self {
        Self {
            transform: Transform::centered(screen, map_size, MIN_SCALE),
            screen,
            map_size,
            gesture: Gesture::Idle,
        }
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn screen(&self) -> DVec2 {
        self.screen
    }

    pub fn map_size(&self) -> f64 {
        self.map_size
    }

    pub fn is_panning(&self) -> bool {
        matches!(self.gesture, Gesture::Panning { .. })
    }

    /// Current viewport snapshot
    pub fn viewport(&self) -> Viewport {
        self.transform.viewport(self.screen, self.map_size)
    }

    pub fn pointer_down(&mut self, pos: DVec2) {
        self.gesture = Gesture::Panning {
            grab: pos - self.transform.translate(),
            dragged: false,
        };
    }

    /// Returns true when the move changed the translate. Duplicate and
    /// sub-pixel moves are dropped and do not count as dragging.
    pub fn pointer_move(&mut self, pos: DVec2) -> bool {
        let Gesture::Panning { grab, dragged } = &mut self.gesture else {
            return false;
        };
        let next = pos - *grab;
        if next.distance(self.transform.translate()) < MIN_MOVE {
            return false;
        }
        self.transform.set_translate(next);
        *dragged = true;
        true
    }

    /// Ends a press. Reports a click only if no move was applied since the
    /// matching `pointer_down`.
    pub fn pointer_up(&mut self, pos: DVec2) -> Option<Click> {
        let gesture = std::mem::replace(&mut self.gesture, Gesture::Idle);
        match gesture {
            Gesture::Panning { dragged: false, .. } => {
                let map = self.transform.screen_to_map(pos);
                Some(Click {
                    x: map.x,
                    y: map.y,
                    viewport: self.viewport(),
                })
            }
            _ => None,
        }
    }

    /// Zoom one wheel tick about `cursor`. Always requests a recompute, even
    /// when the scale is already at a bound.
    pub fn wheel(&mut self, cursor: DVec2, direction: WheelDirection) -> bool {
        let factor = match direction {
            WheelDirection::ZoomIn => WHEEL_SPEED,
            WheelDirection::ZoomOut => 1.0 / WHEEL_SPEED,
        };
        self.zoom_about(cursor, factor);
        true
    }

    /// Scale by `factor` keeping the screen point `cursor` fixed
    pub fn zoom_about(&mut self, cursor: DVec2, factor: f64) {
        let scale = self.transform.scale;
        let new_scale = (scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        let ratio = new_scale / scale;

        self.transform.scale = new_scale;
        let t = cursor - (cursor - self.transform.translate()) * ratio;
        self.transform.set_translate(t);
    }

    /// Keyboard pan by a screen-pixel delta
    pub fn pan_by(&mut self, delta: DVec2) -> bool {
        if delta == DVec2::ZERO {
            return false;
        }
        let t = self.transform.translate() + delta;
        self.transform.set_translate(t);
        true
    }

    /// New screen size: reset to the centered view at minimum scale
    pub fn resize(&mut self, screen: DVec2) {
        self.screen = screen;
        self.reset();
    }

    pub fn reset(&mut self) {
        self.transform = Transform::centered(self.screen, self.map_size, MIN_SCALE);
        self.gesture = Gesture::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAP: f64 = 262_144.0;

    fn controller() -> InputController {
        InputController::new(DVec2::new(800.0, 600.0), MAP)
    }

    fn assert_close(a: DVec2, b: DVec2) {
        assert!(a.abs_diff_eq(b, 1e-6), "expected {b}, got {a}");
    }

    #[test]
    fn test_starts_centered_at_min_scale() {
        let c = controller();
        let t = c.transform();
        assert_eq!(t.scale, MIN_SCALE);
        let center = t.map_to_screen(DVec2::splat(MAP / 2.0));
        assert_close(center, DVec2::new(400.0, 300.0));
    }

    #[test]
    fn test_click_fires_once() {
        let mut c = controller();
        let pos = DVec2::new(400.0, 300.0);
        c.pointer_down(pos);
        let click = c.pointer_up(pos).expect("click");
        assert_close(DVec2::new(click.x, click.y), DVec2::splat(MAP / 2.0));
        assert_eq!(click.viewport, c.viewport());

        // A stray release without a press is not a click
        assert!(c.pointer_up(pos).is_none());
    }

    #[test]
    fn test_drag_suppresses_click() {
        let mut c = controller();
        let before = c.transform().translate();
        c.pointer_down(DVec2::new(100.0, 100.0));
        assert!(c.pointer_move(DVec2::new(110.0, 100.0)));
        assert!(c.pointer_move(DVec2::new(130.0, 90.0)));
        assert!(c.pointer_move(DVec2::new(150.0, 80.0)));
        assert!(c.pointer_up(DVec2::new(150.0, 80.0)).is_none());
        assert_close(c.transform().translate(), before + DVec2::new(50.0, -20.0));
    }

    #[test]
    fn test_unchanged_move_is_ignored() {
        let mut c = controller();
        let pos = DVec2::new(200.0, 200.0);
        c.pointer_down(pos);
        assert!(!c.pointer_move(pos));
        assert!(!c.pointer_move(pos + DVec2::new(0.2, -0.1)));
        assert!(c.pointer_up(pos).is_some());
    }

    #[test]
    fn test_move_without_press() {
        let mut c = controller();
        let before = *c.transform();
        assert!(!c.pointer_move(DVec2::new(10.0, 10.0)));
        assert_eq!(*c.transform(), before);
    }

    #[test]
    fn test_zoom_keeps_cursor_point_fixed() {
        let mut c = controller();
        let cursor = DVec2::new(123.0, 456.0);
        for direction in [WheelDirection::ZoomIn, WheelDirection::ZoomOut] {
            for _ in 0..25 {
                let before = c.transform().screen_to_map(cursor);
                assert!(c.wheel(cursor, direction));
                let after = c.transform().map_to_screen(before);
                assert_close(after, cursor);
            }
        }
    }

    #[test]
    fn test_zoom_in_increases_scale() {
        let mut c = controller();
        c.wheel(DVec2::ZERO, WheelDirection::ZoomIn);
        assert!((c.transform().scale - MIN_SCALE * WHEEL_SPEED).abs() < 1e-12);
    }

    #[test]
    fn test_zoom_clamped_at_bounds() {
        let mut c = controller();
        let before = *c.transform();
        // Already at minimum: still a recompute, but nothing moves
        assert!(c.wheel(DVec2::new(50.0, 50.0), WheelDirection::ZoomOut));
        assert_eq!(c.transform().scale, before.scale);
        assert_close(c.transform().translate(), before.translate());

        for _ in 0..2000 {
            c.wheel(DVec2::new(400.0, 300.0), WheelDirection::ZoomIn);
        }
        assert_eq!(c.transform().scale, MAX_SCALE);
    }

    #[test]
    fn test_resize_recenters() {
        let mut c = controller();
        c.pointer_down(DVec2::ZERO);
        c.pointer_move(DVec2::new(-500.0, 40.0));
        c.wheel(DVec2::new(10.0, 10.0), WheelDirection::ZoomIn);

        c.resize(DVec2::new(1000.0, 500.0));
        assert!(!c.is_panning());
        assert_eq!(c.transform().scale, MIN_SCALE);
        let center = c.transform().map_to_screen(DVec2::splat(MAP / 2.0));
        assert_close(center, DVec2::new(500.0, 250.0));
    }

    #[test]
    fn test_pan_by() {
        let mut c = controller();
        let before = c.transform().translate();
        assert!(!c.pan_by(DVec2::ZERO));
        assert!(c.pan_by(DVec2::new(-10.0, 6.0)));
        assert_close(c.transform().translate(), before + DVec2::new(-10.0, 6.0));
    }
}
