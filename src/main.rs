use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::str::FromStr;
use structopt::StructOpt;
use tokio::runtime;
use visited_countries::geo::Location;
use visited_countries::output::{write_style, Output};
use visited_countries::{initialize_logging, load, run_with, Config, OfflineGeocoder};

#[derive(Debug)]
enum Format {
    Style,
    Geojson,
    Lines,
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "style" => Ok(Format::Style),
            "geojson" => Ok(Format::Geojson),
            "lines" => Ok(Format::Lines),
            _ => Err(format!("unknown format {}", s)),
        }
    }
}

#[derive(StructOpt, Debug)]
#[structopt(
    name = "visited_countries",
    about = "Select visited countries from a GeoJSON world map and draw them as map style layers"
)]
struct Opt {
    /// JSON configuration file, overridden by the flags below
    #[structopt(short, long, parse(from_os_str))]
    config: Option<PathBuf>,

    /// GeoJSON document with country polygons
    #[structopt(short, long, parse(from_os_str))]
    input: Option<PathBuf>,

    /// Visited location as "lat,lon" (repeatable)
    #[structopt(short, long = "location")]
    locations: Vec<Location>,

    /// Visited country name (repeatable)
    #[structopt(long = "country")]
    countries: Vec<String>,

    /// Additional selector, e.g. "sovereignt~Denmark+name~Greenland,Ireland"
    #[structopt(short, long)]
    select: Option<String>,

    /// Fail on unresolved locations or unknown countries
    #[structopt(long)]
    strict: bool,

    /// Output format
    #[structopt(short, long, default_value = "style", possible_values = &["style", "geojson", "lines"])]
    format: Format,

    /// Output file, stdout if omitted
    #[structopt(short, long, parse(from_os_str))]
    output: Option<PathBuf>,

    #[structopt(
        long,
        default_value = "warn",
        possible_values = &["off", "error", "warn", "info", "debug", "trace"]
    )]
    log_level: log::LevelFilter,
}

fn main() -> anyhow::Result<()> {
    let opt = Opt::from_args();
    initialize_logging(opt.log_level)?;

    let mut config = match &opt.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(input) = opt.input {
        config.input = input;
    }
    if !opt.locations.is_empty() {
        config.locations = opt.locations;
    }
    config.countries.extend(opt.countries);
    if opt.select.is_some() {
        config.select = opt.select;
    }
    config.strict |= opt.strict;

    let runtime = runtime::Builder::new_multi_thread().enable_all().build()?;
    let rendered = runtime.block_on(async {
        let collection = load(&config.input).await?;
        let geocoder = OfflineGeocoder::new(&collection);
        run_with(&collection, &config, &geocoder).await
    })?;

    let mut writer: Box<dyn Write> = match opt.output {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout()),
    };
    match opt.format {
        Format::Style => write_style(&rendered.style, &mut writer)?,
        Format::Geojson => rendered.selection.write_geojson(&mut writer)?,
        Format::Lines => rendered.selection.write_json_lines(&mut writer)?,
    }
    writer.flush()?;
    Ok(())
}
