pub mod geometry;
pub mod projection;
pub mod route;
pub mod tiles;
pub mod transform;

pub use projection::{lat_lng_to_pixel, pixel_to_lat_lng, planar_distance, GeoPoint};
pub use route::{BrailleSurface, RenderSurface, RouteRenderer};
pub use tiles::{TileDescriptor, TilePlan, TilePlanner};
pub use transform::{Transform, Viewport};
