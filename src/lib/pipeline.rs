use super::config::Config;
use super::error::{Error, Result};
use super::filter::{missing, name_groups, parse, select_groups};
use super::geo::Centerable;
use super::geocode::{visited_names, ReverseGeocoder};
use super::geojson::{self, FeatureCollection};
use super::style::{draw, StyleDocument};
use itertools::Itertools;
use log::{debug, info, warn};
use std::path::Path;
use tokio::task;

/// Outcome of a run: the visited names, the selected features in encoded
/// and decoded form and the style they were drawn into.
#[derive(Debug)]
pub struct Rendered {
    pub visited: Vec<String>,
    pub missing: Vec<String>,
    pub selection: FeatureCollection,
    pub geojson: Vec<u8>,
    pub style: StyleDocument,
}

/// Read and decode a GeoJSON resource. Decoding runs on the blocking pool.
pub async fn load(path: impl AsRef<Path>) -> Result<FeatureCollection> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| Error::resource(path, e))?;
    debug!("read {} bytes from {:?}", bytes.len(), path);
    decode_blocking(move || geojson::decode(&bytes)).await
}

async fn decode_blocking<F>(decode: F) -> Result<FeatureCollection>
where
    F: FnOnce() -> Result<FeatureCollection> + Send + 'static,
{
    task::spawn_blocking(decode)
        .await
        .map_err(|e| Error::task(format!("decode: {}", e)))?
}

pub async fn run(config: &Config, geocoder: &dyn ReverseGeocoder) -> Result<Rendered> {
    let collection = load(&config.input).await?;
    debug!("decoded {} features", collection.features.len());
    run_with(&collection, config, geocoder).await
}

/// Geocode, select, encode and draw on an already loaded collection.
pub async fn run_with(
    collection: &FeatureCollection,
    config: &Config,
    geocoder: &dyn ReverseGeocoder,
) -> Result<Rendered> {
    let geocoded = visited_names(geocoder, &config.locations, config.strict).await?;
    let visited: Vec<String> = geocoded
        .into_iter()
        .chain(config.countries.iter().cloned())
        .unique()
        .collect();
    debug!("visited: {:?}", visited);

    let unmatched = missing(collection, &visited);
    if !unmatched.is_empty() {
        if config.strict {
            return Err(Error::NotFound(unmatched));
        }
        for name in unmatched.iter() {
            warn!("no feature found for {}", name);
        }
    }

    let mut groups = name_groups(&visited);
    if let Some(selector) = &config.select {
        groups.extend(parse(selector));
    }
    let selection = select_groups(collection, &groups).collection;
    let geojson = geojson::encode(&selection)?;

    let mut style = StyleDocument::new(env!("CARGO_PKG_NAME"), &config.base_style, &config.camera());
    if let Some(bounds) = selection.get_bounds() {
        style.fit(bounds);
    }
    draw(&mut style, &geojson)?;
    info!(
        "drew {} of {} features",
        selection.features.len(),
        collection.features.len()
    );

    Ok(Rendered {
        visited,
        missing: unmatched,
        selection,
        geojson,
        style,
    })
}
