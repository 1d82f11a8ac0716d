use super::geojson::{Coordinate, Feature, FeatureCollection, Geometry};
use geo::prelude::*;
use geo_types::{Coordinate as Coord, LineString, MultiPolygon, Point, Polygon};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// Removed from geo-types 0.6; same value as the former `geo::COORD_PRECISION` (0.1m).
const COORD_PRECISION: f32 = 1e-1;

#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    pub fn new(lat: f64, lon: f64) -> Self {
        Location { lat, lon }
    }

    /// Same location with the longitude wrapped into [-180, 180).
    pub fn normalized(self) -> Self {
        let lon = (self.lon + 180.).rem_euclid(360.) - 180.;
        Location { lat: self.lat, lon }
    }
}

impl PartialEq<Location> for Location {
    fn eq(&self, other: &Self) -> bool {
        let self_point: Point<f64> = (*self).into();
        let other_point: Point<f64> = (*other).into();
        let distance = self_point.haversine_distance(&other_point);
        distance < COORD_PRECISION.into()
    }
}

impl FromStr for Location {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(2, ',');
        let mut next = |label: &str| -> Result<f64, String> {
            parts
                .next()
                .ok_or_else(|| format!("missing {} in {:?}", label, s))?
                .trim()
                .parse::<f64>()
                .map_err(|e| format!("invalid {} in {:?}: {}", label, s, e))
        };
        let lat = next("latitude")?;
        let lon = next("longitude")?;
        Ok(Location { lat, lon })
    }
}

impl From<Location> for [f64; 2] {
    fn from(loc: Location) -> Self {
        [loc.lon, loc.lat]
    }
}

impl From<Location> for Point<f64> {
    fn from(loc: Location) -> Self {
        Point::new(loc.lon, loc.lat)
    }
}

impl From<Point<f64>> for Location {
    fn from(point: Point<f64>) -> Self {
        Location {
            lat: point.y(),
            lon: point.x(),
        }
    }
}

impl From<Coord<f64>> for Location {
    fn from(coordinate: Coord<f64>) -> Self {
        Location {
            lat: coordinate.y,
            lon: coordinate.x,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct Bounds {
    pub e: f64,
    pub n: f64,
    pub s: f64,
    pub w: f64,
}

impl Bounds {
    pub fn sw_ne(&self) -> ([f64; 2], [f64; 2]) {
        ([self.w, self.s], [self.e, self.n])
    }
}

impl From<&Bounds> for (Location, Location) {
    fn from(bounds: &Bounds) -> Self {
        let ne = Location {
            lon: bounds.e,
            lat: bounds.n,
        };
        let sw = Location {
            lon: bounds.w,
            lat: bounds.s,
        };

        (ne, sw)
    }
}

impl PartialEq<Bounds> for Bounds {
    fn eq(&self, other: &Self) -> bool {
        let (self_ne, self_sw) = self.into();
        let (other_ne, other_sw) = other.into();
        self_ne == other_ne && self_sw == other_sw
    }
}

fn line_string(ring: &[Vec<f64>]) -> LineString<f64> {
    ring.iter()
        .filter(|position| position.len() >= 2)
        .map(|position| (position[0], position[1]))
        .collect::<Vec<_>>()
        .into()
}

fn polygon<'a>(mut rings: impl Iterator<Item = &'a Vec<Vec<f64>>>) -> Option<Polygon<f64>> {
    let exterior = line_string(rings.next()?);
    let interiors = rings.map(|ring| line_string(ring)).collect();
    Some(Polygon::new(exterior, interiors))
}

impl From<&Geometry> for MultiPolygon<f64> {
    fn from(geometry: &Geometry) -> Self {
        let rings = geometry.coordinates.iter().filter_map(|c| match c {
            Coordinate::Ring(ring) => Some(ring),
            Coordinate::Polygon(_) => None,
        });
        let mut polygons: Vec<Polygon<f64>> = polygon(rings).into_iter().collect();
        for coordinate in geometry.coordinates.iter() {
            if let Coordinate::Polygon(rings) = coordinate {
                polygons.extend(polygon(rings.iter()));
            }
        }
        MultiPolygon(polygons)
    }
}

impl From<&FeatureCollection> for MultiPolygon<f64> {
    fn from(collection: &FeatureCollection) -> Self {
        let polygons = collection
            .features
            .iter()
            .flat_map(|feature| MultiPolygon::from(&feature.geometry).0)
            .collect();
        MultiPolygon(polygons)
    }
}

fn get_bounds(multi_polygon: &MultiPolygon<f64>) -> Option<Bounds> {
    let rect = multi_polygon.bounding_rect()?;
    Some(Bounds {
        e: rect.max().x,
        n: rect.max().y,
        s: rect.min().y,
        w: rect.min().x,
    })
}

pub trait Centerable {
    fn get_centroid(&self) -> Option<Location>;
    fn get_bounds(&self) -> Option<Bounds>;
}

impl Centerable for MultiPolygon<f64> {
    fn get_centroid(&self) -> Option<Location> {
        let point = self.centroid()?;
        Some(point.into())
    }

    fn get_bounds(&self) -> Option<Bounds> {
        get_bounds(self)
    }
}

impl Centerable for Feature {
    fn get_centroid(&self) -> Option<Location> {
        MultiPolygon::from(&self.geometry).get_centroid()
    }

    fn get_bounds(&self) -> Option<Bounds> {
        MultiPolygon::from(&self.geometry).get_bounds()
    }
}

impl Centerable for FeatureCollection {
    fn get_centroid(&self) -> Option<Location> {
        MultiPolygon::from(self).get_centroid()
    }

    fn get_bounds(&self) -> Option<Bounds> {
        MultiPolygon::from(self).get_bounds()
    }
}

impl Geometry {
    pub fn contains(&self, location: &Location) -> bool {
        let point: Point<f64> = location.normalized().into();
        MultiPolygon::from(self)
            .0
            .iter()
            .any(|polygon| polygon.contains(&point))
    }
}
