//! Domain model for fuel cost estimation.
//!
//! # Overview
//!
//! - [`Coord`]: a latitude/longitude pair in degrees
//! - [`PricePoint`]: a known fuel price at a coordinate
//! - [`FuelStop`]: a sampled route point annotated with its nearest price
//! - [`StopPrice`]: the price attached to a stop, numeric or free text
//!
//! # Design
//!
//! Distances are squared planar distances in the (lat, lng) plane. There is
//! no geodesic correction, so matches are only meaningful over short ranges.

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// A geographic coordinate in degrees.
///
/// # Examples
///
/// ```
/// use fuel_route::domain::Coord;
///
/// let a = Coord::new(0.0, 0.0);
/// let b = Coord::new(3.0, 4.0);
/// assert_eq!(a.squared_distance(&b), 25.0);
/// assert_eq!(b.to_string(), "3,4");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coord {
    /// Latitude in degrees (-90 to 90).
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180).
    pub longitude: f64,
}

impl Coord {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Squared Euclidean distance in the (lat, lng) plane.
    pub fn squared_distance(&self, other: &Coord) -> f64 {
        let dlat = self.latitude - other.latitude;
        let dlng = self.longitude - other.longitude;
        dlat * dlat + dlng * dlng
    }
}

/// Formats as `lat,lng`, the form used by waypoints and map links.
impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// A known retail fuel price at a coordinate.
///
/// `price` is `None` when the dataset cell was not numeric.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PricePoint {
    pub coord: Coord,
    pub price: Option<f64>,
}

/// Price attached to a fuel stop.
///
/// Stops built from the price table always carry numbers, but stops that
/// arrive from elsewhere may carry text. Only text that parses as a finite
/// number counts towards cost.
///
/// ```
/// use fuel_route::domain::StopPrice;
///
/// assert_eq!(StopPrice::Number(3.5).value(), Some(3.5));
/// assert_eq!(StopPrice::Text(" 2.25 ".into()).value(), Some(2.25));
/// assert_eq!(StopPrice::Text("abc".into()).value(), None);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum StopPrice {
    Number(f64),
    Text(String),
}

impl StopPrice {
    /// Numeric value of the price, if it has one.
    pub fn value(&self) -> Option<f64> {
        let value = match self {
            StopPrice::Number(n) => *n,
            StopPrice::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

/// A route sample point annotated with its nearest matched fuel price.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FuelStop {
    /// Sampled point formatted as `lat,lng`.
    pub location: String,
    /// Matched price; `null` when the nearest entry had no numeric price.
    pub price: Option<StopPrice>,
}

impl FuelStop {
    pub fn new(location: impl Into<String>, price: Option<StopPrice>) -> Self {
        Self {
            location: location.into(),
            price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_price_deserializes_number_or_text() {
        let stop: FuelStop = serde_json::from_str(r#"{"location":"1,1","price":4.0}"#).unwrap();
        assert_eq!(stop.price, Some(StopPrice::Number(4.0)));

        let stop: FuelStop = serde_json::from_str(r#"{"location":"1,1","price":"abc"}"#).unwrap();
        assert_eq!(stop.price, Some(StopPrice::Text("abc".into())));

        let stop: FuelStop = serde_json::from_str(r#"{"location":"1,1","price":null}"#).unwrap();
        assert_eq!(stop.price, None);
    }

    #[test]
    fn test_non_finite_prices_have_no_value() {
        assert_eq!(StopPrice::Number(f64::NAN).value(), None);
        assert_eq!(StopPrice::Text("inf".into()).value(), None);
    }

    #[test]
    fn test_coord_display_keeps_fraction() {
        assert_eq!(Coord::new(39.95, -75.165).to_string(), "39.95,-75.165");
    }
}
