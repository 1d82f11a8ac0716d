use super::error::{Error, Result};
use super::geo::Location;
use super::style::{Camera, STREETS_STYLE};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

pub const DEFAULT_RESOURCE: &str = "Geo.geojson";

/// Options for one load/geocode/select/draw run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// GeoJSON document with the country polygons.
    pub input: PathBuf,
    /// Coordinates to reverse-geocode into visited countries.
    pub locations: Vec<Location>,
    /// Country names visited in addition to the geocoded ones.
    pub countries: Vec<String>,
    /// Selector expression (see `filter::parse`), applied on top of the names.
    pub select: Option<String>,
    /// Fail on unresolved locations and countries without a feature.
    pub strict: bool,
    /// Style the drawn layers are placed on.
    pub base_style: String,
    pub center: Location,
    pub zoom: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_RESOURCE),
            locations: vec![Location::new(45.5076, -122.6736)],
            countries: Vec::new(),
            select: None,
            strict: false,
            base_style: STREETS_STYLE.into(),
            center: Location::new(36.3593, -232.0532),
            zoom: 11.,
        }
    }
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::resource(path, e))?;
        serde_json::from_reader(BufReader::new(file)).map_err(Error::Decode)
    }

    pub fn camera(&self) -> Camera {
        Camera {
            center: self.center,
            zoom: self.zoom,
        }
    }
}
