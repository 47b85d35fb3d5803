use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Bounds on the transform scale
pub const MIN_SCALE: f64 = 0.01;
pub const MAX_SCALE: f64 = 50.0;

/// Edge length of the virtual map surface in unscaled pixels (2^18)
pub const MAP_SIZE: f64 = 262_144.0;

/// Per-tick wheel zoom factor
pub const WHEEL_SPEED: f64 = 1.03;

/// Raster tile edge in pixels
pub const TILE_SIZE: f64 = 256.0;
pub const MIN_ZOOM: u8 = 4;
pub const MAX_ZOOM: u8 = 18;

pub const DEFAULT_TILE_SERVER: &str = "https://tile.openstreetmap.org";

/// Frame period of the event loop (~60fps)
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);
/// Quiet period before a settled viewport reaches the tile/route layers
pub const VIEWPORT_QUIET: Duration = Duration::from_millis(40);
/// Upper bound on how long a continuous drag can starve the layers
pub const VIEWPORT_MAX_WAIT: Duration = Duration::from_millis(120);
pub const RESIZE_QUIET: Duration = Duration::from_millis(300);

/// Braille dots per terminal cell
pub const DOTS_X: u16 = 2;
pub const DOTS_Y: u16 = 4;

#[derive(Parser, Debug)]
#[command(
    name = "tui-route-map",
    about = "Pannable terminal map: drag to pan, scroll to zoom, click to add waypoints"
)]
pub struct Cli {
    /// GeoJSON route to load at startup
    #[arg(long, env = "TUI_ROUTE_MAP_ROUTE")]
    pub route: Option<PathBuf>,

    /// Where `w` writes the current route as GeoJSON
    #[arg(long, short, env = "TUI_ROUTE_MAP_OUTPUT")]
    pub output: Option<PathBuf>,

    #[arg(long, env = "TUI_ROUTE_MAP_TILE_SERVER", default_value = DEFAULT_TILE_SERVER)]
    pub tile_server: String,

    #[arg(long, env = "TUI_ROUTE_MAP_MAP_SIZE", default_value_t = MAP_SIZE)]
    pub map_size: f64,

    #[arg(long, env = "TUI_ROUTE_MAP_TILE_SIZE", default_value_t = TILE_SIZE)]
    pub tile_size: f64,

    #[arg(long, env = "TUI_ROUTE_MAP_MIN_ZOOM", default_value_t = MIN_ZOOM)]
    pub min_zoom: u8,

    #[arg(long, env = "TUI_ROUTE_MAP_MAX_ZOOM", default_value_t = MAX_ZOOM)]
    pub max_zoom: u8,

    /// Waypoint marker radius in braille dots
    #[arg(long, env = "TUI_ROUTE_MAP_MARKER_RADIUS", default_value_t = 3.0)]
    pub marker_radius: f64,

    /// Write tracing output to this file (the terminal is owned by the UI)
    #[arg(long, env = "TUI_ROUTE_MAP_LOG")]
    pub log_file: Option<PathBuf>,
}

/// Runtime settings shared by the controller, planner and renderer
#[derive(Clone, Debug)]
pub struct MapConfig {
    pub map_size: f64,
    pub tile_size: f64,
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub tile_server: String,
    pub marker_radius: f64,
    pub output: Option<PathBuf>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            map_size: MAP_SIZE,
            tile_size: TILE_SIZE,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            tile_server: DEFAULT_TILE_SERVER.to_string(),
            marker_radius: 3.0,
            output: None,
        }
    }
}

impl From<&Cli> for MapConfig {
    fn from(cli: &Cli) -> Self {
        let defaults = Self::default();
        let (min_zoom, max_zoom) = if cli.min_zoom <= cli.max_zoom {
            (cli.min_zoom, cli.max_zoom)
        } else {
            (cli.max_zoom, cli.min_zoom)
        };
        Self {
            map_size: if cli.map_size > 0.0 { cli.map_size } else { defaults.map_size },
            tile_size: if cli.tile_size > 0.0 { cli.tile_size } else { defaults.tile_size },
            // 2^zoom must fit a u32 tile index
            min_zoom: min_zoom.min(31),
            max_zoom: max_zoom.min(31),
            tile_server: cli.tile_server.trim_end_matches('/').to_string(),
            marker_radius: cli.marker_radius.max(1.0),
            output: cli.output.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_args() {
        let cli = Cli::parse_from(["tui-route-map"]);
        let config = MapConfig::from(&cli);
        assert_eq!(config.map_size, MAP_SIZE);
        assert_eq!(config.min_zoom, MIN_ZOOM);
        assert_eq!(config.max_zoom, MAX_ZOOM);
        assert_eq!(config.tile_server, DEFAULT_TILE_SERVER);
    }

    #[test]
    fn test_swapped_zoom_bounds() {
        let cli = Cli::parse_from([
            "tui-route-map",
            "--min-zoom",
            "12",
            "--max-zoom",
            "5",
            "--tile-server",
            "http://localhost:8080/",
        ]);
        let config = MapConfig::from(&cli);
        assert_eq!((config.min_zoom, config.max_zoom), (5, 12));
        assert_eq!(config.tile_server, "http://localhost:8080");
    }

    #[test]
    fn test_env_fallbacks() {
        // Only fields no other test asserts on, tests share the environment
        std::env::set_var("TUI_ROUTE_MAP_TILE_SIZE", "512");
        std::env::set_var("TUI_ROUTE_MAP_MARKER_RADIUS", "5");

        let config = MapConfig::from(&Cli::parse_from(["tui-route-map"]));
        assert_eq!(config.tile_size, 512.0);
        assert_eq!(config.marker_radius, 5.0);

        // Flags win over the environment
        let cli = Cli::parse_from(["tui-route-map", "--tile-size", "128"]);
        assert_eq!(cli.tile_size, 128.0);

        std::env::remove_var("TUI_ROUTE_MAP_TILE_SIZE");
        std::env::remove_var("TUI_ROUTE_MAP_MARKER_RADIUS");
    }
}
