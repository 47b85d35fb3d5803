use glam::DVec2;
use std::f64::consts::PI;

/// A geographic coordinate in degrees
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Project a geographic coordinate to map-local pixels (spherical Web Mercator).
///
/// The map is a square of `map_size` pixels with (0, 0) at lng -180 and the
/// northern Mercator limit. Poles produce non-finite values instead of panicking.
#[inline]
pub fn lat_lng_to_pixel(lat: f64, lng: f64, map_size: f64) -> DVec2 {
    let x = (lng + 180.0) * map_size / 360.0;
    let lat_rad = lat * PI / 180.0;
    let merc_n = (PI / 4.0 + lat_rad / 2.0).tan().ln();
    let y = map_size / 2.0 - map_size * merc_n / (2.0 * PI);
    DVec2::new(x, y)
}

/// Inverse of [`lat_lng_to_pixel`]
#[inline]
pub fn pixel_to_lat_lng(x: f64, y: f64, map_size: f64) -> GeoPoint {
    let lng = x * 360.0 / map_size - 180.0;
    let merc_n = (map_size / 2.0 - y) * 2.0 * PI / map_size;
    let lat_rad = 2.0 * merc_n.exp().atan() - PI / 2.0;
    GeoPoint::new(lat_rad * 180.0 / PI, lng)
}

/// Euclidean distance between two pixel positions.
/// Only meaningful for on-screen spacing, not for geographic distance.
#[inline(always)]
pub fn planar_distance(a: DVec2, b: DVec2) -> f64 {
    a.distance(b)
}
