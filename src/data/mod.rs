use crate::map::GeoPoint;
use anyhow::{Context, Result};
use geojson::{Feature, GeoJson, Geometry, Value};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Authoritative, ordered list of waypoints.
///
/// Renderers borrow `points()` every frame and never keep a copy; the
/// revision changes on every mutation so they know when to redraw.
#[derive(Debug, Default)]
pub struct RouteStore {
    points: Vec<GeoPoint>,
    revision: u64,
}

impl RouteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    pub fn append(&mut self, point: GeoPoint) {
        self.points.push(point);
        self.touch();
    }

    pub fn remove(&mut self, index: usize) -> Option<GeoPoint> {
        if index >= self.points.len() {
            return None;
        }
        let removed = self.points.remove(index);
        self.touch();
        Some(removed)
    }

    pub fn pop(&mut self) -> Option<GeoPoint> {
        let removed = self.points.pop()?;
        self.touch();
        Some(removed)
    }

    /// Move the point at `from` so it ends up at `to` (drag-reorder)
    pub fn move_point(&mut self, from: usize, to: usize) -> bool {
        let len = self.points.len();
        if from >= len || to >= len {
            return false;
        }
        if from != to {
            let point = self.points.remove(from);
            self.points.insert(to, point);
            self.touch();
        }
        true
    }

    pub fn clear(&mut self) {
        if !self.points.is_empty() {
            self.points.clear();
            self.touch();
        }
    }

    pub fn replace(&mut self, points: Vec<GeoPoint>) {
        self.points = points;
        self.touch();
    }
}

/// Load a route from a GeoJSON file
pub fn load_route(path: &Path) -> Result<Vec<GeoPoint>> {
    let mut bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let geojson: GeoJson = simd_json::serde::from_slice(&mut bytes)
        .with_context(|| format!("parsing GeoJSON in {}", path.display()))?;
    Ok(route_from_geojson(&geojson))
}

/// Write the route as a single LineString feature
pub fn save_route(path: &Path, points: &[GeoPoint]) -> Result<()> {
    fs::write(path, route_to_geojson(points).to_string())
        .with_context(|| format!("writing {}", path.display()))
}

/// Collect every point and line vertex in document order. Within one
/// feature a repeated coordinate is kept only the first time.
pub fn route_from_geojson(geojson: &GeoJson) -> Vec<GeoPoint> {
    let mut points = Vec::new();
    match geojson {
        GeoJson::FeatureCollection(fc) => {
            for feature in &fc.features {
                if let Some(ref geometry) = feature.geometry {
                    points.extend(feature_points(geometry));
                }
            }
        }
        GeoJson::Feature(f) => {
            if let Some(ref geometry) = f.geometry {
                points.extend(feature_points(geometry));
            }
        }
        GeoJson::Geometry(geometry) => points.extend(feature_points(geometry)),
    }
    points
}

pub fn route_to_geojson(points: &[GeoPoint]) -> GeoJson {
    let line = points.iter().map(|p| vec![p.lng, p.lat]).collect();
    GeoJson::Feature(Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::LineString(line))),
        id: None,
        properties: None,
        foreign_members: None,
    })
}

fn feature_points(geometry: &Geometry) -> Vec<GeoPoint> {
    let mut points = Vec::new();
    process_geometry_positions(geometry, &mut |lng, lat| points.push(GeoPoint::new(lat, lng)));

    let mut seen = HashSet::new();
    points.retain(|p| seen.insert((p.lat.to_bits(), p.lng.to_bits())));
    points
}

fn process_geometry_positions<F>(geometry: &Geometry, add: &mut F)
where
    F: FnMut(f64, f64),
{
    match &geometry.value {
        Value::Point(c) => push_position(c, add),
        Value::MultiPoint(coords) | Value::LineString(coords) => {
            for c in coords {
                push_position(c, add);
            }
        }
        Value::MultiLineString(lines) => {
            for c in lines.iter().flatten() {
                push_position(c, add);
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                process_geometry_positions(g, add);
            }
        }
        // Areas are not routes
        Value::Polygon(_) | Value::MultiPolygon(_) => {}
    }
}

#[inline]
fn push_position<F>(c: &[f64], add: &mut F)
where
    F: FnMut(f64, f64),
{
    if c.len() >= 2 {
        add(c[0], c[1]);
    }
}
