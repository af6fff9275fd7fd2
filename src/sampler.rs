//! Fuel stop sampling along a route geometry.
//!
//! Walks `geometry.coordinates` at a fixed index stride and matches each
//! sampled point to the nearest known price. A notional distance grows by
//! [`DISTANCE_PER_SAMPLE`] per sample and sampling stops once it reaches
//! [`SAMPLING_DISTANCE_LIMIT`]. With the current constants that happens after
//! the first sample, so a route yields at most one stop.

use serde_json::Value;
use tracing::debug;

use crate::domain::{Coord, FuelStop, StopPrice};
use crate::prices::PriceTable;
use crate::routing::Route;

/// Index stride between sampled geometry entries.
pub const SAMPLE_STRIDE: usize = 50;

/// Distance units credited for each sampled entry.
pub const DISTANCE_PER_SAMPLE: f64 = 500.0;

/// Sampling stops once the accumulated distance reaches this value.
pub const SAMPLING_DISTANCE_LIMIT: f64 = 500.0;

/// Error type for stop sampling.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleError {
    /// The route has no `geometry.coordinates` array.
    GeometryDecode,
    /// The price table is empty, so nothing can be matched.
    EmptyPriceTable,
}

impl std::fmt::Display for SampleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SampleError::GeometryDecode => write!(f, "Error decoding route geometry"),
            SampleError::EmptyPriceTable => write!(f, "No fuel prices available for matching"),
        }
    }
}

impl std::error::Error for SampleError {}

/// Samples fuel stops along `route`.
pub fn sample_fuel_stops(route: &Route, prices: &PriceTable) -> Result<Vec<FuelStop>, SampleError> {
    let coordinates = route
        .feature
        .get("geometry")
        .and_then(|geometry| geometry.get("coordinates"))
        .and_then(Value::as_array)
        .ok_or(SampleError::GeometryDecode)?;

    sample_coordinates(coordinates, prices)
}

/// Samples fuel stops from raw GeoJSON coordinate entries.
pub fn sample_coordinates(coordinates: &[Value], prices: &PriceTable) -> Result<Vec<FuelStop>, SampleError> {
    let mut stops = Vec::new();
    let mut distance = 0.0;

    for entry in coordinates.iter().step_by(SAMPLE_STRIDE) {
        if let Some(point) = entry_coord(entry) {
            let nearest = prices.nearest(&point).ok_or(SampleError::EmptyPriceTable)?;
            stops.push(FuelStop::new(
                point.to_string(),
                nearest.price.map(StopPrice::Number),
            ));
        }

        distance += DISTANCE_PER_SAMPLE;
        if distance >= SAMPLING_DISTANCE_LIMIT {
            break;
        }
    }

    debug!("Sampled {} fuel stops from {} coordinates", stops.len(), coordinates.len());
    Ok(stops)
}

/// Reads `(lng, lat)` from the first two elements of a coordinate entry.
///
/// An element that is itself a list is unwrapped one level to its first
/// value. Entries with fewer than two elements, or non-numeric values, are
/// skipped.
fn entry_coord(entry: &Value) -> Option<Coord> {
    let items = entry.as_array()?;
    if items.len() < 2 {
        return None;
    }
    let lng = unwrap_number(&items[0])?;
    let lat = unwrap_number(&items[1])?;
    Some(Coord::new(lat, lng))
}

fn unwrap_number(value: &Value) -> Option<f64> {
    match value {
        Value::Array(inner) => inner.first().and_then(Value::as_f64),
        other => other.as_f64(),
    }
}
