use super::error::{Error, Result};
use super::geojson::{encode, FeatureCollection};
use super::style::StyleDocument;
use serde_json::{to_string, to_string_pretty};
use std::io::Write;

pub trait Output {
    fn write_geojson(&self, writer: &mut dyn Write) -> Result<()>;
    fn write_json_lines(&self, writer: &mut dyn Write) -> Result<()>;
}

impl Output for FeatureCollection {
    fn write_geojson(&self, writer: &mut dyn Write) -> Result<()> {
        let bytes = encode(self)?;
        writer.write_all(&bytes)?;
        writeln!(writer)?;
        Ok(())
    }

    fn write_json_lines(&self, writer: &mut dyn Write) -> Result<()> {
        for feature in self.features.iter() {
            let json = to_string(feature).map_err(Error::Encode)?;
            writeln!(writer, "{}", json)?;
        }
        Ok(())
    }
}

pub fn write_style(style: &StyleDocument, writer: &mut dyn Write) -> Result<()> {
    let string = to_string_pretty(style).map_err(Error::Encode)?;
    writeln!(writer, "{}", string)?;
    Ok(())
}
