use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use glam::DVec2;
use tracing::{debug, info, warn};

use crate::config::{
    MapConfig, DOTS_X, DOTS_Y, FRAME_INTERVAL, RESIZE_QUIET, VIEWPORT_MAX_WAIT, VIEWPORT_QUIET,
};
use crate::data::{self, RouteStore};
use crate::input::{InputController, WheelDirection};
use crate::map::{
    pixel_to_lat_lng, BrailleSurface, RenderSurface, RouteRenderer, TilePlan, TilePlanner,
    Viewport,
};
use crate::schedule::{poll_timeout, Debouncer, FrameScheduler};

/// Beyond this many tiles the grid is not outlined (pathological zoom bounds)
const MAX_DRAWN_TILES: usize = 4096;

/// Keyboard pan step in braille dots
const KEY_PAN_X: f64 = 20.0;
const KEY_PAN_Y: f64 = 12.0;

/// Wheel ticks applied per `+`/`-` key press
const KEY_ZOOM_TICKS: i32 = 8;

/// Inner map area in terminal cells for a terminal of `width × height`.
/// Accounts for the border (2 cells each way) and the status bar (1 row).
fn inner_cells(width: usize, height: usize) -> (usize, usize) {
    (width.saturating_sub(2), height.saturating_sub(3))
}

/// Terminal cell -> braille dot position inside the map border
fn cell_to_dots(col: u16, row: u16) -> DVec2 {
    DVec2::new(
        f64::from(col.saturating_sub(1)) * f64::from(DOTS_X),
        f64::from(row.saturating_sub(1)) * f64::from(DOTS_Y),
    )
}

/// Application state
pub struct App {
    pub config: MapConfig,
    pub controller: InputController,
    pub route: RouteStore,
    pub planner: TilePlanner,
    pub renderer: RouteRenderer,
    /// Viewport recompute, at most once per frame
    frame: FrameScheduler,
    /// Terminal redraw, at most once per frame
    redraw: FrameScheduler,
    viewport_debounce: Debouncer<Viewport>,
    resize_debounce: Debouncer<(usize, usize)>,
    /// Last viewport handed to the tile and route layers
    pub settled: Viewport,
    pub tile_plan: TilePlan,
    pub tile_layer: BrailleSurface,
    pub route_layer: BrailleSurface,
    /// (viewport, route revision) the route layer was drawn for
    route_drawn_for: Option<(Viewport, u64)>,
    /// Inner map size in terminal cells
    cells: (usize, usize),
    /// Current mouse position for the cursor marker
    pub mouse_pos: Option<(u16, u16)>,
    /// One-line message for the status bar
    pub status: Option<String>,
    pub should_quit: bool,
}

impl App {
    pub fn new(config: MapConfig, width: usize, height: usize) -> Self {
        let cells = inner_cells(width, height);
        let controller = InputController::new(screen_dots(cells), config.map_size);
        let planner = TilePlanner::new(config.tile_size, config.min_zoom, config.max_zoom);
        let settled = controller.viewport();
        let tile_plan = planner.plan(&settled);

        let mut app = Self {
            renderer: RouteRenderer::new(config.marker_radius),
            config,
            controller,
            route: RouteStore::new(),
            planner,
            frame: FrameScheduler::new(FRAME_INTERVAL),
            redraw: FrameScheduler::new(FRAME_INTERVAL),
            viewport_debounce: Debouncer::new(VIEWPORT_QUIET).with_max_wait(VIEWPORT_MAX_WAIT),
            resize_debounce: Debouncer::new(RESIZE_QUIET),
            settled,
            tile_plan,
            tile_layer: BrailleSurface::new(cells.0, cells.1),
            route_layer: BrailleSurface::new(cells.0, cells.1),
            route_drawn_for: None,
            cells,
            mouse_pos: None,
            status: None,
            should_quit: false,
        };
        app.settle(settled);
        app
    }

    /// Replace the route with the contents of a GeoJSON file
    pub fn load_route(&mut self, path: &Path) -> Result<()> {
        let points = data::load_route(path)?;
        info!(count = points.len(), path = %path.display(), "route loaded");
        self.route.replace(points);
        self.refresh_route_layer();
        Ok(())
    }

    /// Write the route to the configured output file
    pub fn export_route(&mut self) -> Result<()> {
        let path = self
            .config
            .output
            .clone()
            .context("no --output file configured")?;
        data::save_route(&path, self.route.points())?;
        info!(count = self.route.len(), path = %path.display(), "route exported");
        self.set_status(format!("saved {} waypoints to {}", self.route.len(), path.display()));
        Ok(())
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
        self.redraw.request();
    }

    /// Terminal resized: coalesced, the view is reset once it settles
    pub fn resize(&mut self, width: usize, height: usize) {
        self.resize_debounce.push((width, height), Instant::now());
        self.redraw.request();
    }

    pub fn pointer_down(&mut self, col: u16, row: u16) {
        self.controller.pointer_down(cell_to_dots(col, row));
    }

    pub fn pointer_drag(&mut self, col: u16, row: u16) {
        if self.controller.pointer_move(cell_to_dots(col, row)) {
            self.frame.request();
        }
    }

    /// Release; a release without drag adds a waypoint under the pointer
    pub fn pointer_up(&mut self, col: u16, row: u16) {
        if let Some(click) = self.controller.pointer_up(cell_to_dots(col, row)) {
            let extent = 0.0..=click.viewport.map_size;
            if !(extent.contains(&click.x) && extent.contains(&click.y)) {
                debug!(x = click.x, y = click.y, "click outside the map ignored");
                return;
            }
            let point = pixel_to_lat_lng(click.x, click.y, click.viewport.map_size);
            if point.lat.is_finite() && point.lng.is_finite() {
                info!(lat = point.lat, lng = point.lng, "waypoint added");
                self.route.append(point);
                self.refresh_route_layer();
            }
        }
    }

    pub fn wheel(&mut self, col: u16, row: u16, direction: WheelDirection) {
        if self.controller.wheel(cell_to_dots(col, row), direction) {
            self.frame.request();
        }
    }

    /// Keyboard pan, in steps (positive = view moves right/down)
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let delta = DVec2::new(-dx as f64 * KEY_PAN_X, -dy as f64 * KEY_PAN_Y);
        if self.controller.pan_by(delta) {
            self.frame.request();
        }
    }

    pub fn zoom_in(&mut self) {
        self.zoom_center(WheelDirection::ZoomIn);
    }

    pub fn zoom_out(&mut self) {
        self.zoom_center(WheelDirection::ZoomOut);
    }

    fn zoom_center(&mut self, direction: WheelDirection) {
        let center = self.controller.screen() / 2.0;
        for _ in 0..KEY_ZOOM_TICKS {
            self.controller.wheel(center, direction);
        }
        self.frame.request();
    }

    pub fn reset_view(&mut self) {
        self.controller.reset();
        self.frame.request();
    }

    pub fn remove_last_waypoint(&mut self) {
        if let Some(point) = self.route.pop() {
            info!(lat = point.lat, lng = point.lng, "waypoint removed");
            self.refresh_route_layer();
        }
    }

    pub fn clear_route(&mut self) {
        self.route.clear();
        self.refresh_route_layer();
    }

    pub fn set_mouse_pos(&mut self, col: u16, row: u16) {
        if self.mouse_pos != Some((col, row)) {
            self.mouse_pos = Some((col, row));
            self.redraw.request();
        }
    }

    /// Mouse position in braille dots (for the cursor marker)
    pub fn mouse_pixel_pos(&self) -> Option<DVec2> {
        self.mouse_pos.map(|(col, row)| cell_to_dots(col, row))
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Frame boundary: apply settled resizes, turn the pending frame into a
    /// viewport snapshot, and deliver it once the debounce lets it through
    pub fn tick(&mut self, now: Instant) {
        if let Some((width, height)) = self.resize_debounce.poll(now) {
            self.cells = inner_cells(width, height);
            self.tile_layer = BrailleSurface::new(self.cells.0, self.cells.1);
            self.route_layer = BrailleSurface::new(self.cells.0, self.cells.1);
            self.route_drawn_for = None;
            self.controller.resize(screen_dots(self.cells));
            // Resize already waited out its burst
            self.viewport_debounce.cancel();
            self.frame.cancel();
            self.settle(self.controller.viewport());
            return;
        }

        if self.frame.take(now) {
            self.viewport_debounce.push(self.controller.viewport(), now);
        }
        if let Some(viewport) = self.viewport_debounce.poll(now) {
            self.settle(viewport);
        }
    }

    /// How long the event loop may block before the next tick is due
    pub fn poll_timeout(&self, now: Instant) -> Duration {
        poll_timeout(
            now,
            FRAME_INTERVAL,
            &[
                self.frame.deadline(),
                self.redraw.deadline(),
                self.viewport_debounce.deadline(),
                self.resize_debounce.deadline(),
            ],
        )
    }

    /// True at most once per frame, when something changed on screen
    pub fn take_redraw(&mut self, now: Instant) -> bool {
        self.redraw.take(now)
    }

    fn settle(&mut self, viewport: Viewport) {
        self.settled = viewport;
        self.tile_plan = self.planner.plan(&viewport);
        debug!(
            x = viewport.x,
            y = viewport.y,
            width = viewport.width,
            height = viewport.height,
            scale = viewport.scale,
            zoom = self.tile_plan.zoom,
            tiles = self.tile_plan.len(),
            "viewport settled"
        );
        self.draw_tile_layer();
        self.refresh_route_layer();
        self.redraw.request();
    }

    /// Redraw the route layer if the viewport or the route changed
    fn refresh_route_layer(&mut self) {
        let key = (self.settled, self.route.revision());
        if self.route_drawn_for == Some(key) {
            return;
        }
        self.renderer
            .render(Some(&mut self.route_layer), &self.settled, self.route.points());
        self.route_drawn_for = Some(key);
        self.redraw.request();
    }

    /// Outline every planned tile and label it with its path
    fn draw_tile_layer(&mut self) {
        let surface = &mut self.tile_layer;
        surface.clear();

        let plan = &self.tile_plan;
        if plan.len() > MAX_DRAWN_TILES {
            warn!(tiles = plan.len(), zoom = plan.zoom, "tile grid too dense to outline");
            return;
        }

        let edge = plan.tile_edge * self.settled.scale;
        for tile in plan.tiles() {
            let placed = plan.placement(&tile);
            let top_left = self.settled.map_to_screen(DVec2::new(placed.x, placed.y));
            let corners = [
                top_left,
                top_left + DVec2::new(edge, 0.0),
                top_left + DVec2::new(edge, edge),
                top_left + DVec2::new(0.0, edge),
                top_left,
            ];
            surface.stroke_polyline(&corners);

            // Path label just inside the tile's top-left corner
            let label = tile.path();
            let anchor = top_left.max(DVec2::ZERO) + DVec2::new(2.0 + label.len() as f64, 4.0);
            if anchor.x < top_left.x + edge && anchor.y < top_left.y + edge {
                surface.fill_text(anchor, &label);
            }
        }
    }

    /// Scale as a status string
    pub fn scale_label(&self) -> String {
        format!("{:.3}x", self.controller.transform().scale)
    }

    pub fn tile_label(&self) -> String {
        format!("z{} ({} tiles)", self.tile_plan.zoom, self.tile_plan.len())
    }

    /// Center of the visible map as a status string
    pub fn center_coords(&self) -> String {
        let center = self.settled.center();
        let p = pixel_to_lat_lng(center.x, center.y, self.settled.map_size);
        format!(
            "{:.3}°{}, {:.3}°{}",
            p.lat.abs(),
            if p.lat >= 0.0 { "N" } else { "S" },
            p.lng.abs(),
            if p.lng >= 0.0 { "E" } else { "W" }
        )
    }

    pub fn tile_url(&self) -> Option<String> {
        self.tile_plan.tiles().next().map(|t| t.url(&self.config.tile_server))
    }
}

/// Screen size in braille dots for an inner area of `cells`
fn screen_dots(cells: (usize, usize)) -> DVec2 {
    DVec2::new(
        (cells.0 * DOTS_X as usize) as f64,
        (cells.1 * DOTS_Y as usize) as f64,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MAP_SIZE, MIN_SCALE, WHEEL_SPEED};
    use crate::map::GeoPoint;

    fn app() -> App {
        App::new(MapConfig::default(), 122, 43)
    }

    #[test]
    fn test_click_appends_waypoint() {
        let mut app = app();
        app.pointer_down(61, 21);
        app.pointer_up(61, 21);
        assert_eq!(app.route.len(), 1);

        // Clicked at the screen center of a centered map: close to 0°, 0°
        let p = app.route.points()[0];
        assert!(p.lat.abs() < 5.0 && p.lng.abs() < 5.0, "{p:?}");
    }

    #[test]
    fn test_drag_does_not_append() {
        let mut app = app();
        app.pointer_down(10, 10);
        app.pointer_drag(20, 12);
        app.pointer_drag(30, 14);
        app.pointer_up(30, 14);
        assert!(app.route.is_empty());
    }

    #[test]
    fn test_click_off_the_map_is_ignored() {
        let mut app = app();
        // Screen is 240 dots wide; move the map's right edge to x = 40
        let right_edge = app.controller.transform().x + MAP_SIZE * MIN_SCALE;
        app.controller.pan_by(DVec2::new(40.0 - right_edge, 0.0));

        app.pointer_down(100, 21);
        app.pointer_up(100, 21);
        assert!(app.route.is_empty());

        // Still on the map: left of its right edge
        app.pointer_down(10, 21);
        app.pointer_up(10, 21);
        assert_eq!(app.route.len(), 1);
        assert!(app.route.points()[0].lng <= 180.0);
    }

    #[test]
    fn test_moves_within_one_frame_recompute_once() {
        let mut app = app();
        let t0 = Instant::now();
        app.pointer_down(10, 10);
        app.pointer_drag(12, 10);
        app.tick(t0);
        assert_eq!(app.viewport_debounce.deadline(), Some(t0 + VIEWPORT_QUIET));

        // More moves before the next frame boundary: no new snapshot yet
        let mid = t0 + FRAME_INTERVAL / 2;
        app.pointer_drag(14, 11);
        app.pointer_drag(16, 12);
        app.pointer_drag(18, 13);
        app.tick(mid);
        assert_eq!(app.viewport_debounce.deadline(), Some(t0 + VIEWPORT_QUIET));

        // All three merge into the single snapshot taken at the boundary
        let next = t0 + FRAME_INTERVAL;
        app.tick(next);
        assert_eq!(app.viewport_debounce.deadline(), Some(next + VIEWPORT_QUIET));
        assert!(!app.frame.is_pending());
    }

    #[test]
    fn test_key_zoom_steps_about_center() {
        let mut app = app();
        let center = app.controller.screen() / 2.0;
        let anchor = app.controller.transform().screen_to_map(center);

        app.zoom_in();
        let scale = app.controller.transform().scale;
        let expected = MIN_SCALE * WHEEL_SPEED.powi(KEY_ZOOM_TICKS);
        assert!((scale - expected).abs() < 1e-12, "{scale} vs {expected}");

        let after = app.controller.transform().screen_to_map(center);
        assert!(after.distance(anchor) < 1e-6);
    }

    #[test]
    fn test_viewport_delivered_after_quiet_period() {
        let mut app = app();
        let before = app.settled;
        let t0 = Instant::now();

        app.wheel(61, 21, WheelDirection::ZoomIn);
        app.tick(t0);
        assert_eq!(app.settled, before);

        app.tick(t0 + VIEWPORT_QUIET);
        assert_ne!(app.settled, before);
        assert_eq!(app.settled, app.controller.viewport());
    }

    #[test]
    fn test_resize_is_coalesced() {
        let mut app = app();
        app.resize(100, 30);
        app.resize(150, 50);
        let deadline = app.resize_debounce.deadline().expect("pending resize");
        app.tick(deadline);
        assert_eq!(app.cells, (148, 47));
        assert_eq!(app.controller.screen(), DVec2::new(296.0, 188.0));
        assert_eq!(app.settled, app.controller.viewport());
    }

    #[test]
    fn test_route_layer_redraws_on_change() {
        let mut app = app();
        let t0 = Instant::now();
        assert!(app.take_redraw(t0));
        app.route.append(GeoPoint::new(0.0, 0.0));
        app.refresh_route_layer();
        assert!(app.take_redraw(t0 + FRAME_INTERVAL));
        assert!(app.route_layer.canvas.count() > 0);

        app.refresh_route_layer();
        assert!(!app.take_redraw(t0 + 2 * FRAME_INTERVAL));

        app.remove_last_waypoint();
        assert_eq!(app.route_layer.canvas.count(), 0);
    }

    #[test]
    fn test_tile_layer_has_labels() {
        let app = app();
        assert!(!app.tile_plan.is_empty());
        assert!(app.tile_layer.canvas.count() > 0);
        assert!(app.tile_url().unwrap().starts_with("https://tile.openstreetmap.org/"));
    }

    #[test]
    fn test_export_without_output_fails() {
        let mut app = app();
        assert!(app.export_route().is_err());
    }
}
