use super::error::{Error, Result};
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::io::Read;
use std::path::Path;

pub const FEATURE_COLLECTION: &str = "FeatureCollection";
pub const FEATURE: &str = "Feature";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: String,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        FeatureCollection {
            kind: FEATURE_COLLECTION.into(),
            features,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: String,
    pub properties: Properties,
    pub geometry: Geometry,
}

impl Feature {
    /// Display name, falling back to the sovereign state's name.
    pub fn country(&self) -> Option<&str> {
        self.properties
            .name()
            .or_else(|| self.properties.sovereignt())
    }
}

const NAME: &str = "name";
const SOVEREIGNT: &str = "sovereignt";

/// Feature properties in document order.
///
/// `name` (country display name) and `sovereignt` (sovereign state) must be
/// strings when present; every other key is carried through untouched.
#[derive(Serialize, Debug, Clone, PartialEq, Default)]
#[serde(transparent)]
pub struct Properties(Map<String, Value>);

impl Properties {
    pub fn new() -> Self {
        Properties(Map::new())
    }

    pub fn name(&self) -> Option<&str> {
        self.0.get(NAME)?.as_str()
    }

    pub fn sovereignt(&self) -> Option<&str> {
        self.0.get(SOVEREIGNT)?.as_str()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Append (or replace in place) a property.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }
}

impl<'de> Deserialize<'de> for Properties {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let map = Map::deserialize(deserializer)?;
        for key in [NAME, SOVEREIGNT].iter() {
            match map.get(*key) {
                None | Some(Value::Null) | Some(Value::String(_)) => {}
                Some(other) => {
                    return Err(de::Error::custom(format!(
                        "properties.{}: expected a string, found {}",
                        key, other
                    )))
                }
            }
        }
        Ok(Properties(map))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Vec<Coordinate>,
}

/// One element of a geometry's coordinate payload.
///
/// A `Polygon` geometry carries rings (`[[f64]]` each), a `MultiPolygon`
/// carries polygons (`[[[f64]]]` each). The variant is chosen while decoding
/// by trying the ring shape first and the polygon shape second.
#[derive(Debug, Clone, PartialEq)]
pub enum Coordinate {
    Ring(Vec<Vec<f64>>),
    Polygon(Vec<Vec<Vec<f64>>>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Ring,
    Polygon,
}

impl Coordinate {
    pub fn shape(&self) -> Shape {
        match self {
            Coordinate::Ring(_) => Shape::Ring,
            Coordinate::Polygon(_) => Shape::Polygon,
        }
    }
}

fn depth(value: &Value) -> usize {
    match value {
        Value::Array(elements) => 1 + elements.first().map(depth).unwrap_or(0),
        _ => 0,
    }
}

impl<'de> Deserialize<'de> for Coordinate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        if let Ok(ring) = Vec::<Vec<f64>>::deserialize(&value) {
            return Ok(Coordinate::Ring(ring));
        }
        if let Ok(polygon) = Vec::<Vec<Vec<f64>>>::deserialize(&value) {
            return Ok(Coordinate::Polygon(polygon));
        }
        Err(de::Error::custom(format!(
            "geometry.coordinates: expected a ring [[f64]] or a polygon [[[f64]]], found nesting depth {}",
            depth(&value)
        )))
    }
}

impl Serialize for Coordinate {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Coordinate::Ring(ring) => ring.serialize(serializer),
            Coordinate::Polygon(polygon) => polygon.serialize(serializer),
        }
    }
}

pub fn decode(bytes: &[u8]) -> Result<FeatureCollection> {
    serde_json::from_slice(bytes).map_err(Error::Decode)
}

pub fn decode_reader(reader: impl Read) -> Result<FeatureCollection> {
    serde_json::from_reader(reader).map_err(Error::Decode)
}

/// Encode a collection. Property order is kept. Positions are written as
/// floats, so `[0, 0]` in the source comes back as `[0.0, 0.0]`.
pub fn encode(collection: &FeatureCollection) -> Result<Vec<u8>> {
    serde_json::to_vec(collection).map_err(Error::Encode)
}

pub fn load(path: impl AsRef<Path>) -> Result<FeatureCollection> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| Error::resource(path, e))?;
    decode(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn feature_json(coordinates: Value) -> Value {
        json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": { "name": "Somewhere", "sovereignt": "Somewhere" },
                "geometry": { "type": "Polygon", "coordinates": coordinates }
            }]
        })
    }

    fn decode_value(value: &Value) -> Result<FeatureCollection> {
        decode(value.to_string().as_bytes())
    }

    #[test]
    fn decode_polygon_rings() {
        let value = feature_json(json!([[[0, 0], [1, 0], [1, 1], [0, 0]]]));
        let collection = decode_value(&value).unwrap();
        let geometry = &collection.features[0].geometry;
        assert_eq!(geometry.coordinates.len(), 1);
        assert_eq!(geometry.coordinates[0].shape(), Shape::Ring);
        assert_eq!(
            geometry.coordinates[0],
            Coordinate::Ring(vec![
                vec![0., 0.],
                vec![1., 0.],
                vec![1., 1.],
                vec![0., 0.]
            ])
        );
    }

    #[test]
    fn decode_multi_polygon() {
        let value = feature_json(json!([
            [[[0, 0], [1, 0], [1, 1], [0, 0]]],
            [[[5, 5], [6, 5], [6, 6], [5, 5]]]
        ]));
        let collection = decode_value(&value).unwrap();
        let coordinates = &collection.features[0].geometry.coordinates;
        assert_eq!(coordinates.len(), 2);
        assert!(coordinates.iter().all(|c| c.shape() == Shape::Polygon));
    }

    #[test]
    fn reject_flat_positions() {
        let value = feature_json(json!([[0, 0], [1, 0]]));
        let err = decode_value(&value).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
        let msg = err.to_string();
        assert!(msg.contains("geometry.coordinates"));
        assert!(msg.contains("depth 1"));
    }

    #[test]
    fn reject_too_deep() {
        let value = feature_json(json!([[[[[0, 0], [1, 0]]]]]));
        let err = decode_value(&value).unwrap_err();
        assert!(err.to_string().contains("depth 4"));
    }

    #[test]
    fn reject_non_numeric() {
        let value = feature_json(json!([[["a", "b"]]]));
        assert!(matches!(decode_value(&value), Err(Error::Decode(_))));
    }

    #[test]
    fn malformed_document() {
        assert!(matches!(decode(b"{\"type\": "), Err(Error::Decode(_))));
    }

    #[test]
    fn encode_keeps_variant() {
        let value = feature_json(json!([[[[0, 0], [1, 0], [1, 1], [0, 0]]]]));
        let collection = decode_value(&value).unwrap();
        let bytes = encode(&collection).unwrap();
        let encoded: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            encoded["features"][0]["geometry"]["coordinates"],
            json!([[[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]])
        );
        let again = decode(&bytes).unwrap();
        assert_eq!(again, collection);
    }

    #[test]
    fn absent_names_are_omitted() {
        let value = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": { "iso_a3": "ATA" },
                "geometry": { "type": "Polygon", "coordinates": [] }
            }]
        });
        let collection = decode_value(&value).unwrap();
        let properties = &collection.features[0].properties;
        assert_eq!(properties.name(), None);
        assert_eq!(properties.get("iso_a3"), Some(&json!("ATA")));

        let encoded: Value = serde_json::from_slice(&encode(&collection).unwrap()).unwrap();
        assert_eq!(encoded["features"][0]["properties"], json!({ "iso_a3": "ATA" }));
    }

    #[test]
    fn property_order_survives_encoding() {
        let value = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": { "scalerank": 1, "sovereignt": "Ireland", "name": "Ireland" },
                "geometry": { "type": "Polygon", "coordinates": [] }
            }]
        });
        let collection = decode_value(&value).unwrap();
        let properties = &collection.features[0].properties;
        assert_eq!(properties.name(), Some("Ireland"));
        let keys: Vec<&str> = properties.keys().collect();
        assert_eq!(keys, vec!["scalerank", "sovereignt", "name"]);

        let bytes = encode(&collection).unwrap();
        let encoded: Value = serde_json::from_slice(&bytes).unwrap();
        let keys: Vec<&str> = encoded["features"][0]["properties"]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["scalerank", "sovereignt", "name"]);
    }

    #[test]
    fn reject_non_string_name() {
        let value = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": { "name": 42 },
                "geometry": { "type": "Polygon", "coordinates": [] }
            }]
        });
        let err = decode_value(&value).unwrap_err();
        assert!(err.to_string().contains("properties.name"));
    }

    #[test]
    fn null_name_is_absent() {
        let value = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": { "name": null, "sovereignt": "Norway" },
                "geometry": { "type": "Polygon", "coordinates": [] }
            }]
        });
        let collection = decode_value(&value).unwrap();
        assert_eq!(collection.features[0].properties.name(), None);
    }

    #[test]
    fn country_falls_back_to_sovereign() {
        let value = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": { "sovereignt": "Norway" },
                "geometry": { "type": "Polygon", "coordinates": [] }
            }]
        });
        let collection = decode_value(&value).unwrap();
        assert_eq!(collection.features[0].country(), Some("Norway"));
    }

    #[test]
    fn missing_resource() {
        let err = load("./does/not/exist.geojson").unwrap_err();
        assert!(matches!(err, Error::Resource { .. }));
    }
}
