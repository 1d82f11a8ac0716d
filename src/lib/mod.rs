pub use self::config::Config;
pub use self::error::{Error, Result};
pub use self::geocode::{OfflineGeocoder, Placemark, ReverseGeocoder};
pub use self::geojson::{decode, encode, Coordinate, Feature, FeatureCollection, Geometry, Properties};
pub use self::pipeline::{load, run, run_with, Rendered};
pub use self::style::{draw, MapStyle, StyleDocument};

pub mod config;
mod error;
pub mod filter;
pub mod geo;
pub mod geocode;
pub mod geojson;
pub mod output;
pub mod pipeline;
pub mod style;

/// Initialize stderr logging for the binary at the given verbosity.
pub fn initialize_logging(log_level: log::LevelFilter) -> anyhow::Result<()> {
    stderrlog::new()
        .module(module_path!())
        .show_module_names(true)
        .verbosity(log_level)
        .init()?;
    Ok(())
}
