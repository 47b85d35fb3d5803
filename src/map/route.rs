use glam::DVec2;
use rayon::prelude::*;

use crate::braille::BrailleCanvas;
use crate::map::geometry::{draw_circle, draw_segment};
use crate::map::projection::{lat_lng_to_pixel, planar_distance, GeoPoint};
use crate::map::transform::Viewport;

/// Routes at least this long are projected on the rayon pool
const PARALLEL_THRESHOLD: usize = 2048;

/// 2D raster target for route drawing
pub trait RenderSurface {
    /// Drawable size in pixels
    fn size(&self) -> DVec2;
    fn clear(&mut self);
    fn stroke_polyline(&mut self, points: &[DVec2]);
    fn fill_circle(&mut self, center: DVec2, radius: f64);
    /// Text centered on `center`
    fn fill_text(&mut self, center: DVec2, text: &str);
}

/// A recorded draw primitive
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Clear,
    Polyline(Vec<DVec2>),
    Circle { center: DVec2, radius: f64 },
    Text { center: DVec2, text: String },
}

/// Surface that records what was drawn instead of rasterizing it
#[derive(Clone, Debug, Default)]
pub struct CommandList {
    pub size: DVec2,
    pub commands: Vec<DrawCommand>,
}

impl CommandList {
    pub fn new(size: DVec2) -> Self {
        Self {
            size,
            commands: Vec::new(),
        }
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> + '_ {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

impl RenderSurface for CommandList {
    fn size(&self) -> DVec2 {
        self.size
    }

    fn clear(&mut self) {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear);
    }

    fn stroke_polyline(&mut self, points: &[DVec2]) {
        self.commands.push(DrawCommand::Polyline(points.to_vec()));
    }

    fn fill_circle(&mut self, center: DVec2, radius: f64) {
        self.commands.push(DrawCommand::Circle { center, radius });
    }

    fn fill_text(&mut self, center: DVec2, text: &str) {
        self.commands.push(DrawCommand::Text {
            center,
            text: text.to_string(),
        });
    }
}

/// Braille layer: segments and markers are rasterized, labels are kept as
/// terminal-cell text to be overlaid by the widget
pub struct BrailleSurface {
    pub canvas: BrailleCanvas,
    pub labels: Vec<(u16, u16, String)>,
}

impl BrailleSurface {
    /// Surface covering `cols × rows` terminal cells
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            canvas: BrailleCanvas::new(cols, rows),
            labels: Vec::new(),
        }
    }
}

impl RenderSurface for BrailleSurface {
    fn size(&self) -> DVec2 {
        DVec2::new(self.canvas.pixel_width() as f64, self.canvas.pixel_height() as f64)
    }

    fn clear(&mut self) {
        self.canvas.clear();
        self.labels.clear();
    }

    fn stroke_polyline(&mut self, points: &[DVec2]) {
        for pair in points.windows(2) {
            draw_segment(&mut self.canvas, pair[0], pair[1]);
        }
    }

    fn fill_circle(&mut self, center: DVec2, radius: f64) {
        if !center.is_finite() {
            return;
        }
        let size = self.size();
        let r = radius.ceil();
        if center.x < -r || center.y < -r || center.x > size.x + r || center.y > size.y + r {
            return;
        }
        draw_circle(
            &mut self.canvas,
            center.x.round() as i32,
            center.y.round() as i32,
            radius.round() as i32,
        );
    }

    fn fill_text(&mut self, center: DVec2, text: &str) {
        if !center.is_finite() || center.x < 0.0 || center.y < 0.0 {
            return;
        }
        // Dots -> cells, then shift left so the text is centered
        let col = (center.x / 2.0) as usize;
        let row = (center.y / 4.0) as usize;
        let half = text.chars().count() / 2;
        let col = col.saturating_sub(half);
        if let (Ok(col), Ok(row)) = (u16::try_from(col), u16::try_from(row)) {
            self.labels.push((col, row, text.to_string()));
        }
    }
}

/// Project geographic points to screen space for the given viewport.
/// Always a full re-projection: any change of scale invalidates old results.
pub fn project_route(points: &[GeoPoint], viewport: &Viewport) -> Vec<DVec2> {
    let size = viewport.map_size * viewport.scale;
    let project = |p: &GeoPoint| viewport.scaled_to_screen(lat_lng_to_pixel(p.lat, p.lng, size));

    if points.len() >= PARALLEL_THRESHOLD {
        points.par_iter().map(project).collect()
    } else {
        points.iter().map(project).collect()
    }
}

/// Greedy forward scan choosing which points get a marker.
///
/// The first and last points are always kept; an interior point is kept when
/// it is farther than `threshold` from the last kept point. Returns indices
/// into `points` in ascending order.
pub fn simplify_markers(points: &[DVec2], threshold: f64) -> Vec<usize> {
    let Some(last) = points.len().checked_sub(1) else {
        return Vec::new();
    };

    let mut kept = vec![0];
    let mut anchor = points[0];
    for (i, &p) in points.iter().enumerate().take(last).skip(1) {
        if planar_distance(anchor, p) > threshold {
            kept.push(i);
            anchor = p;
        }
    }
    if last > 0 {
        kept.push(last);
    }
    kept
}

/// Marker label for the point at `index` of a `len`-point route:
/// "A" for the start, "B" for the end, the original index otherwise
pub fn marker_label(index: usize, len: usize) -> String {
    if index == 0 {
        "A".to_string()
    } else if index + 1 == len {
        "B".to_string()
    } else {
        index.to_string()
    }
}

/// Draws the route polyline and its labeled markers
#[derive(Clone, Debug)]
pub struct RouteRenderer {
    pub marker_radius: f64,
}

impl RouteRenderer {
    pub fn new(marker_radius: f64) -> Self {
        Self { marker_radius }
    }

    /// Minimum on-screen spacing between two labeled markers
    pub fn threshold(&self) -> f64 {
        4.0 * self.marker_radius
    }

    /// Clear and fully redraw the route. A missing surface is a no-op.
    /// Returns the number of markers drawn.
    pub fn render<S: RenderSurface + ?Sized>(
        &self,
        surface: Option<&mut S>,
        viewport: &Viewport,
        points: &[GeoPoint],
    ) -> usize {
        let Some(surface) = surface else {
            return 0;
        };
        surface.clear();
        if points.is_empty() {
            return 0;
        }

        let projected = project_route(points, viewport);
        surface.stroke_polyline(&projected);

        let kept = simplify_markers(&projected, self.threshold());
        // Back to front so "A" ends up on top
        for &i in kept.iter().rev() {
            surface.fill_circle(projected[i], self.marker_radius);
            surface.fill_text(projected[i], &marker_label(i, projected.len()));
        }
        kept.len()
    }
}

impl Default for RouteRenderer {
    fn default() -> Self {
        Self::new(12.0)
    }
}
