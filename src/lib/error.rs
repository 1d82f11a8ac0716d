use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("could not read geojson resource {path:?}: {source}")]
    Resource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not decode geojson: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("could not encode geojson: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("no feature found for {}", .0.join(", "))]
    NotFound(Vec<String>),

    #[error("reverse geocoding failed: {0}")]
    Geocode(String),

    #[error("style error: {0}")]
    Style(String),

    #[error("background task failed: {0}")]
    Task(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn resource(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Resource {
            path: path.into(),
            source,
        }
    }

    pub fn geocode(msg: impl Into<String>) -> Self {
        Self::Geocode(msg.into())
    }

    pub fn style(msg: impl Into<String>) -> Self {
        Self::Style(msg.into())
    }

    pub fn task(msg: impl Into<String>) -> Self {
        Self::Task(msg.into())
    }
}
