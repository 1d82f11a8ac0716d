use super::error::{Error, Result};
use super::geo::{Bounds, Location};
use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

pub const SOURCE_ID: &str = "polyline";
pub const LINE_LAYER: &str = "polyline";
pub const CASING_LAYER: &str = "polyline-case";
pub const DASH_LAYER: &str = "polyline-dash";
pub const FILL_LAYER: &str = "polygone";

pub const STREETS_STYLE: &str = "mapbox://styles/mapbox/streets-v11";

/// A style property: either a constant or a value interpolated linearly
/// over the zoom level between stops.
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    Constant(Value),
    Zoom(Vec<(f64, f64)>),
}

impl Property {
    pub fn constant(value: impl Into<Value>) -> Self {
        Property::Constant(value.into())
    }

    pub fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
        Property::Constant(Value::String(format!("rgba({}, {}, {}, {})", r, g, b, a)))
    }
}

impl Serialize for Property {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Property::Constant(value) => value.serialize(serializer),
            Property::Zoom(stops) => {
                let mut seq = serializer.serialize_seq(Some(3 + stops.len() * 2))?;
                seq.serialize_element("interpolate")?;
                seq.serialize_element(&["linear"])?;
                seq.serialize_element(&["zoom"])?;
                for (zoom, value) in stops {
                    seq.serialize_element(zoom)?;
                    seq.serialize_element(value)?;
                }
                seq.end()
            }
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Source {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: Value,
}

impl Source {
    pub fn geojson(data: Value) -> Self {
        Source {
            kind: "geojson".into(),
            data,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Layer {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub source: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub layout: BTreeMap<String, Property>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub paint: BTreeMap<String, Property>,
}

impl Layer {
    fn new(kind: &str, id: &str, source: &str) -> Self {
        Layer {
            id: id.into(),
            kind: kind.into(),
            source: source.into(),
            layout: BTreeMap::new(),
            paint: BTreeMap::new(),
        }
    }

    pub fn line(id: &str, source: &str) -> Self {
        Layer::new("line", id, source)
    }

    pub fn fill(id: &str, source: &str) -> Self {
        Layer::new("fill", id, source)
    }

    pub fn layout(mut self, key: &str, property: Property) -> Self {
        self.layout.insert(key.into(), property);
        self
    }

    pub fn paint(mut self, key: &str, property: Property) -> Self {
        self.paint.insert(key.into(), property);
        self
    }
}

pub trait MapStyle {
    fn add_source(&mut self, id: &str, source: Source) -> Result<()>;
    fn add_layer(&mut self, layer: Layer) -> Result<()>;
    fn insert_layer_below(&mut self, layer: Layer, below: &str) -> Result<()>;
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Camera {
    pub center: Location,
    pub zoom: f64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Metadata {
    pub base_style: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
}

/// Style document in the shape of a Mapbox GL style (version 8).
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct StyleDocument {
    pub version: u8,
    pub name: String,
    pub metadata: Metadata,
    pub center: [f64; 2],
    pub zoom: f64,
    pub sources: BTreeMap<String, Source>,
    pub layers: Vec<Layer>,
}

impl StyleDocument {
    pub fn new(name: &str, base_style: &str, camera: &Camera) -> Self {
        StyleDocument {
            version: 8,
            name: name.into(),
            metadata: Metadata {
                base_style: base_style.into(),
                bounds: None,
            },
            center: camera.center.normalized().into(),
            zoom: camera.zoom,
            sources: BTreeMap::new(),
            layers: vec![],
        }
    }

    pub fn fit(&mut self, bounds: Bounds) {
        self.metadata.bounds = Some(bounds);
    }

    pub fn layer(&self, id: &str) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    fn check_layer(&self, layer: &Layer) -> Result<()> {
        if self.layer(&layer.id).is_some() {
            return Err(Error::style(format!("layer {} already exists", layer.id)));
        }
        if !self.sources.contains_key(&layer.source) {
            return Err(Error::style(format!(
                "layer {} refers to unknown source {}",
                layer.id, layer.source
            )));
        }
        Ok(())
    }
}

impl MapStyle for StyleDocument {
    fn add_source(&mut self, id: &str, source: Source) -> Result<()> {
        if self.sources.contains_key(id) {
            return Err(Error::style(format!("source {} already exists", id)));
        }
        self.sources.insert(id.into(), source);
        Ok(())
    }

    fn add_layer(&mut self, layer: Layer) -> Result<()> {
        self.check_layer(&layer)?;
        self.layers.push(layer);
        Ok(())
    }

    fn insert_layer_below(&mut self, layer: Layer, below: &str) -> Result<()> {
        self.check_layer(&layer)?;
        let index = self
            .layers
            .iter()
            .position(|l| l.id == below)
            .ok_or_else(|| Error::style(format!("no layer {} to insert below", below)))?;
        self.layers.insert(index, layer);
        Ok(())
    }
}

fn line_width() -> Property {
    Property::Zoom(vec![(14., 2.), (18., 20.)])
}

/// Add the encoded feature collection as a source with outline, casing,
/// dashed and fill layers.
pub fn draw(style: &mut dyn MapStyle, geojson: &[u8]) -> Result<()> {
    let data: Value = serde_json::from_slice(geojson).map_err(Error::Decode)?;
    style.add_source(SOURCE_ID, Source::geojson(data))?;

    let round = || Property::constant("round");
    let line = Layer::line(LINE_LAYER, SOURCE_ID)
        .layout("line-join", round())
        .layout("line-cap", round())
        .paint("line-color", Property::rgba(59, 178, 208, 1.))
        .paint("line-width", line_width());
    style.add_layer(line)?;

    let casing = Layer::line(CASING_LAYER, SOURCE_ID)
        .layout("line-join", round())
        .layout("line-cap", round())
        .paint("line-gap-width", line_width())
        .paint("line-color", Property::rgba(255, 1, 1, 1.))
        .paint("line-width", Property::Zoom(vec![(14., 1.), (18., 4.)]));
    style.insert_layer_below(casing, LINE_LAYER)?;

    let dashed = Layer::line(DASH_LAYER, SOURCE_ID)
        .layout("line-join", round())
        .layout("line-cap", round())
        .paint("line-color", Property::rgba(255, 255, 255, 1.))
        .paint("line-opacity", Property::constant(0.5))
        .paint("line-width", line_width())
        .paint("line-dasharray", Property::Constant(json!([0., 1.5])));
    style.add_layer(dashed)?;

    let polygon = Layer::fill(FILL_LAYER, SOURCE_ID)
        .paint("fill-color", Property::rgba(0, 255, 0, 1.))
        .paint("fill-opacity", Property::constant(0.5));
    style.add_layer(polygon)?;

    Ok(())
}
