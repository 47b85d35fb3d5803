use glam::DVec2;

use crate::braille::BrailleCanvas;

/// Clip a segment to the rectangle `[0, w] × [0, h]` (Liang-Barsky).
/// Returns `None` when the segment misses it entirely.
pub fn clip_segment(a: DVec2, b: DVec2, w: f64, h: f64) -> Option<(DVec2, DVec2)> {
    if !(a.is_finite() && b.is_finite()) {
        return None;
    }
    let d = b - a;
    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;

    for (p, q) in [(-d.x, a.x), (d.x, w - a.x), (-d.y, a.y), (d.y, h - a.y)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    Some((a + d * t0, a + d * t1))
}

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;

    loop {
        canvas.set_pixel_signed(x, y);

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;

        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }

        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}

/// Draw a segment given in float screen pixels, clipped to the canvas first
/// so far off-screen endpoints cost nothing
pub fn draw_segment(canvas: &mut BrailleCanvas, a: DVec2, b: DVec2) {
    let w = canvas.pixel_width() as f64 - 1.0;
    let h = canvas.pixel_height() as f64 - 1.0;
    if w < 0.0 || h < 0.0 {
        return;
    }
    if let Some((a, b)) = clip_segment(a, b, w, h) {
        draw_line(
            canvas,
            a.x.round() as i32,
            a.y.round() as i32,
            b.x.round() as i32,
            b.y.round() as i32,
        );
    }
}

/// Draw a filled circle
pub fn draw_circle(canvas: &mut BrailleCanvas, cx: i32, cy: i32, radius: i32) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                canvas.set_pixel_signed(cx + dx, cy + dy);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_line() {
        let mut canvas = BrailleCanvas::new(5, 1);
        draw_line(&mut canvas, 0, 0, 9, 0);
        assert_eq!(canvas.count(), 10);
        assert!(canvas.is_set(9, 0));
    }

    #[test]
    fn test_vertical_line() {
        let mut canvas = BrailleCanvas::new(1, 2);
        draw_line(&mut canvas, 0, 0, 0, 7);
        assert_eq!(canvas.count(), 8);
    }

    #[test]
    fn test_clip_inside_untouched() {
        let a = DVec2::new(1.0, 1.0);
        let b = DVec2::new(5.0, 3.0);
        assert_eq!(clip_segment(a, b, 10.0, 10.0), Some((a, b)));
    }

    #[test]
    fn test_clip_crossing() {
        let (a, b) =
            clip_segment(DVec2::new(-10.0, 5.0), DVec2::new(20.0, 5.0), 10.0, 10.0).unwrap();
        assert!(a.abs_diff_eq(DVec2::new(0.0, 5.0), 1e-9));
        assert!(b.abs_diff_eq(DVec2::new(10.0, 5.0), 1e-9));
    }

    #[test]
    fn test_clip_outside() {
        let behind = clip_segment(DVec2::new(-5.0, -5.0), DVec2::new(-1.0, 20.0), 10.0, 10.0);
        assert!(behind.is_none());
        let nan = clip_segment(DVec2::new(f64::NAN, 0.0), DVec2::new(1.0, 1.0), 10.0, 10.0);
        assert!(nan.is_none());
    }

    #[test]
    fn test_huge_segment_is_cheap() {
        let mut canvas = BrailleCanvas::new(10, 5);
        draw_segment(&mut canvas, DVec2::new(-1e9, 10.0), DVec2::new(1e9, 10.0));
        assert_eq!(canvas.count(), 20);
    }

    #[test]
    fn test_circle() {
        let mut canvas = BrailleCanvas::new(4, 2);
        draw_circle(&mut canvas, 3, 3, 1);
        assert_eq!(canvas.count(), 5);
    }
}
