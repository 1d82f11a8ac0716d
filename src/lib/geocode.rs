use super::error::{Error, Result};
use super::geo::{Centerable, Location};
use super::geojson::FeatureCollection;
use async_trait::async_trait;
use geo::prelude::*;
use geo_types::{MultiPolygon, Point};
use itertools::Itertools;
use log::{debug, warn};
use rstar::{RTree, RTreeObject, AABB};
use serde::Serialize;
use serde_json::Value;

/// Place description returned by a reverse geocoder.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct Placemark {
    /// Country name.
    pub country: Option<String>,
    /// ISO country code.
    pub iso_code: Option<String>,
    /// State or province.
    pub administrative_area: Option<String>,
    /// City.
    pub locality: Option<String>,
}

#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn reverse_geocode(&self, location: Location) -> Result<Placemark>;
}

struct Region {
    country: Option<String>,
    iso_code: Option<String>,
    shape: MultiPolygon<f64>,
}

struct Candidate {
    index: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for Candidate {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope.clone()
    }
}

/// Resolves locations against the country polygons of a feature collection.
pub struct OfflineGeocoder {
    regions: Vec<Region>,
    tree: RTree<Candidate>,
}

fn iso_code(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(code) if code != "-99" => Some(code.clone()),
        _ => None,
    }
}

impl OfflineGeocoder {
    pub fn new(collection: &FeatureCollection) -> Self {
        let regions: Vec<Region> = collection
            .features
            .iter()
            .map(|feature| Region {
                country: feature.country().map(Into::into),
                iso_code: iso_code(feature.properties.get("iso_a2")),
                shape: MultiPolygon::from(&feature.geometry),
            })
            .collect();
        let candidates = regions
            .iter()
            .enumerate()
            .filter_map(|(index, region)| {
                let (sw, ne) = region.shape.get_bounds()?.sw_ne();
                let envelope = AABB::from_corners(sw, ne);
                Some(Candidate { index, envelope })
            })
            .collect();
        let tree = RTree::bulk_load(candidates);
        debug!("indexed {} regions", regions.len());
        OfflineGeocoder { regions, tree }
    }

    pub fn lookup(&self, location: &Location) -> Placemark {
        let location = location.normalized();
        let point: Point<f64> = location.into();
        let aabb: AABB<[f64; 2]> = AABB::from_point(location.into());
        let mut indices: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&aabb)
            .map(|candidate| candidate.index)
            .collect();
        // the tree yields candidates in no particular order
        indices.sort_unstable();
        indices
            .into_iter()
            .map(|index| &self.regions[index])
            .find(|region| region.shape.0.iter().any(|p| p.contains(&point)))
            .map(|region| Placemark {
                country: region.country.clone(),
                iso_code: region.iso_code.clone(),
                ..Default::default()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl ReverseGeocoder for OfflineGeocoder {
    async fn reverse_geocode(&self, location: Location) -> Result<Placemark> {
        Ok(self.lookup(&location))
    }
}

/// Resolve the country of every location, in order, without duplicates.
///
/// Failed lookups and locations outside any country are skipped with a
/// warning, or fail the whole call when `strict` is set.
pub async fn visited_names(
    geocoder: &dyn ReverseGeocoder,
    locations: &[Location],
    strict: bool,
) -> Result<Vec<String>> {
    let mut names = vec![];
    for location in locations {
        match geocoder.reverse_geocode(*location).await {
            Ok(Placemark {
                country: Some(country),
                ..
            }) => {
                debug!("{:?} resolved to {}", location, country);
                names.push(country);
            }
            Ok(_) if strict => {
                return Err(Error::geocode(format!("no country at {:?}", location)));
            }
            Ok(_) => warn!("no country at {:?}, skipping", location),
            Err(e) if strict => return Err(e),
            Err(e) => warn!("could not geocode {:?}: {}", location, e),
        }
    }
    Ok(names.into_iter().unique().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geojson::{Coordinate, Feature, Geometry, Properties};
    use serde_json::json;

    fn square(x: f64, y: f64, size: f64) -> Coordinate {
        Coordinate::Ring(vec![
            vec![x, y],
            vec![x + size, y],
            vec![x + size, y + size],
            vec![x, y + size],
            vec![x, y],
        ])
    }

    fn new_feature(name: Option<&str>, sovereignt: &str, ring: Coordinate) -> Feature {
        let mut properties = Properties::new();
        if let Some(name) = name {
            properties = properties.with("name", name);
        }
        Feature {
            kind: "Feature".into(),
            properties: properties
                .with("sovereignt", sovereignt)
                .with("iso_a2", json!("XX")),
            geometry: Geometry {
                kind: "Polygon".into(),
                coordinates: vec![ring],
            },
        }
    }

    fn new_collection() -> FeatureCollection {
        FeatureCollection::new(vec![
            new_feature(Some("Westland"), "Westland", square(-10., 40., 10.)),
            new_feature(None, "Eastland", square(0., 40., 10.)),
        ])
    }

    struct FailingGeocoder;

    #[async_trait]
    impl ReverseGeocoder for FailingGeocoder {
        async fn reverse_geocode(&self, _location: Location) -> Result<Placemark> {
            Err(Error::geocode("offline"))
        }
    }

    #[test]
    fn lookup_inside() {
        let geocoder = OfflineGeocoder::new(&new_collection());
        let placemark = geocoder.lookup(&Location::new(45., -5.));
        assert_eq!(placemark.country.as_deref(), Some("Westland"));
        assert_eq!(placemark.iso_code.as_deref(), Some("XX"));
    }

    #[test]
    fn lookup_falls_back_to_sovereign() {
        let geocoder = OfflineGeocoder::new(&new_collection());
        let placemark = geocoder.lookup(&Location::new(45., 5.));
        assert_eq!(placemark.country.as_deref(), Some("Eastland"));
    }

    #[test]
    fn lookup_outside() {
        let geocoder = OfflineGeocoder::new(&new_collection());
        assert_eq!(geocoder.lookup(&Location::new(0., 0.)), Placemark::default());
    }

    #[test]
    fn lookup_wrapped_longitude() {
        let geocoder = OfflineGeocoder::new(&new_collection());
        let placemark = geocoder.lookup(&Location::new(45., 365.));
        assert_eq!(placemark.country.as_deref(), Some("Eastland"));
    }

    #[tokio::test]
    async fn names_are_unique_and_ordered() {
        let geocoder = OfflineGeocoder::new(&new_collection());
        let locations = vec![
            Location::new(45., 5.),
            Location::new(45., -5.),
            Location::new(41., 9.),
        ];
        let names = visited_names(&geocoder, &locations, false).await.unwrap();
        assert_eq!(names, vec!["Eastland".to_string(), "Westland".to_string()]);
    }

    #[tokio::test]
    async fn unresolved_locations_are_skipped() {
        let geocoder = OfflineGeocoder::new(&new_collection());
        let locations = vec![Location::new(0., 0.), Location::new(45., -5.)];
        let names = visited_names(&geocoder, &locations, false).await.unwrap();
        assert_eq!(names, vec!["Westland".to_string()]);

        let result = visited_names(&geocoder, &locations, true).await;
        assert!(matches!(result, Err(Error::Geocode(_))));
    }

    #[tokio::test]
    async fn failures_are_skipped_unless_strict() {
        let locations = vec![Location::new(45., -5.)];
        let names = visited_names(&FailingGeocoder, &locations, false)
            .await
            .unwrap();
        assert!(names.is_empty());

        let result = visited_names(&FailingGeocoder, &locations, true).await;
        assert!(matches!(result, Err(Error::Geocode(_))));
    }
}
