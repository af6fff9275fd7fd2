//! Adds coordinates to the raw fuel price dataset.
//!
//! Geocodes the `Address` column of every row through Geoapify and writes the
//! rows back out with `Latitude` and `Longitude` columns. Rows whose address
//! cannot be resolved get empty coordinates.
//!
//! Run with: cargo run --bin enrich_prices -- --input raw.csv --output updated.csv

use clap::Parser;
use std::error::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use fuel_route::config::DEFAULT_GEOAPIFY_BASE_URL;
use fuel_route::domain::Coord;
use fuel_route::geocode::{GeoapifyGeocoder, Geocoder};
use fuel_route::routing::http_client;

/// Geocode fuel station addresses into the price dataset
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Raw dataset with an `Address` column
    #[arg(long, default_value = "static/data/fuel-prices-for-be-assessment.csv")]
    input: String,

    /// Where to write the dataset with coordinates
    #[arg(long, default_value = "static/data/fuel-prices-for-be-assessment-updated.csv")]
    output: String,
}

/// Returns the index of `name` in `headers`, appending it if absent.
fn column_index(headers: &mut csv::StringRecord, name: &str) -> usize {
    match headers.iter().position(|h| h == name) {
        Some(idx) => idx,
        None => {
            headers.push_field(name);
            headers.len() - 1
        }
    }
}

/// Rewrites one row to `width` fields with the coordinate cells set, or
/// cleared when the address did not resolve.
fn enrich_record(
    record: &csv::StringRecord,
    lat_idx: usize,
    lng_idx: usize,
    width: usize,
    coord: Option<Coord>,
) -> Vec<String> {
    let mut fields: Vec<String> = record.iter().map(str::to_string).collect();
    fields.resize(width.max(lat_idx + 1).max(lng_idx + 1), String::new());
    match coord {
        Some(coord) => {
            fields[lat_idx] = coord.latitude.to_string();
            fields[lng_idx] = coord.longitude.to_string();
        }
        None => {
            fields[lat_idx].clear();
            fields[lng_idx].clear();
        }
    }
    fields
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("enrich_prices=info".parse()?))
        .init();

    let cli = Cli::parse();
    let api_key = std::env::var("GEOAPIFY_API_KEY").map_err(|_| "Missing environment variable GEOAPIFY_API_KEY")?;
    let base_url = std::env::var("GEOAPIFY_BASE_URL").unwrap_or_else(|_| DEFAULT_GEOAPIFY_BASE_URL.to_string());
    let geocoder = GeoapifyGeocoder::new(http_client()?, base_url, api_key);

    let mut reader = csv::Reader::from_path(&cli.input)?;
    let mut headers = reader.headers()?.clone();
    let address_idx = headers
        .iter()
        .position(|h| h == "Address")
        .ok_or("Input has no Address column")?;
    let lat_idx = column_index(&mut headers, "Latitude");
    let lng_idx = column_index(&mut headers, "Longitude");

    let mut writer = csv::Writer::from_path(&cli.output)?;
    writer.write_record(&headers)?;

    let (mut rows, mut resolved) = (0usize, 0usize);
    for record in reader.records() {
        let record = record?;
        let address = record.get(address_idx).unwrap_or_default();

        let coord = match geocoder.geocode(address).await {
            Ok(coord) => coord,
            Err(e) => {
                warn!("Geocoding {:?} failed: {}", address, e);
                None
            }
        };

        if coord.is_some() {
            resolved += 1;
        }
        writer.write_record(&enrich_record(&record, lat_idx, lng_idx, headers.len(), coord))?;
        rows += 1;
    }
    writer.flush()?;

    info!("Geocoded {} of {} rows into {}", resolved, rows, cli.output);
    Ok(())
}
