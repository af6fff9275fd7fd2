//! Fuel cost estimation.

use crate::domain::FuelStop;

/// Distance units assumed to be driven per fuel stop.
pub const DISTANCE_PER_STOP: f64 = 500.0;

/// Assumed fuel economy, distance units per unit of fuel.
pub const FUEL_ECONOMY: f64 = 10.0;

/// Sums `price * DISTANCE_PER_STOP / FUEL_ECONOMY` over all stops.
///
/// Stops whose price is missing or does not parse as a number are skipped,
/// not counted as zero. A total too large to represent saturates at
/// `f64::MAX` (or `f64::MIN`), so it always serializes as a JSON number.
///
/// # Examples
///
/// ```
/// use fuel_route::cost::total_cost;
/// use fuel_route::domain::{FuelStop, StopPrice};
///
/// let stops = vec![
///     FuelStop::new("1,1", Some(StopPrice::Number(4.0))),
///     FuelStop::new("2,2", Some(StopPrice::Text("abc".into()))),
/// ];
/// assert_eq!(total_cost(&stops), 200.0);
/// ```
pub fn total_cost(stops: &[FuelStop]) -> f64 {
    let fuel_per_stop = DISTANCE_PER_STOP / FUEL_ECONOMY;
    let total: f64 = stops
        .iter()
        .filter_map(|stop| stop.price.as_ref()?.value())
        .map(|price| price * fuel_per_stop)
        .sum();

    if total.is_nan() {
        return 0.0;
    }
    total.clamp(f64::MIN, f64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StopPrice;

    #[test]
    fn test_numeric_price() {
        let stops = vec![FuelStop::new("1,1", Some(StopPrice::Number(4.0)))];
        assert_eq!(total_cost(&stops), 200.0);
    }

    #[test]
    fn test_non_numeric_price_is_skipped() {
        let stops = vec![FuelStop::new("1,1", Some(StopPrice::Text("abc".into())))];
        assert_eq!(total_cost(&stops), 0.0);
    }

    #[test]
    fn test_numeric_string_counts() {
        let stops = vec![
            FuelStop::new("1,1", Some(StopPrice::Text("2.5".into()))),
            FuelStop::new("2,2", Some(StopPrice::Number(1.0))),
        ];
        assert_eq!(total_cost(&stops), 175.0);
    }

    #[test]
    fn test_missing_price_is_skipped() {
        let stops = vec![
            FuelStop::new("1,1", None),
            FuelStop::new("2,2", Some(StopPrice::Number(3.0))),
        ];
        assert_eq!(total_cost(&stops), 150.0);
    }

    #[test]
    fn test_no_stops() {
        assert_eq!(total_cost(&[]), 0.0);
    }

    #[test]
    fn test_huge_prices_saturate() {
        let stops = vec![
            FuelStop::new("1,1", Some(StopPrice::Number(f64::MAX))),
            FuelStop::new("2,2", Some(StopPrice::Text("1e308".into()))),
        ];
        let total = total_cost(&stops);

        assert_eq!(total, f64::MAX);
        assert!(serde_json::to_value(total).unwrap().is_f64());
    }

    #[test]
    fn test_stops_from_json() {
        let stops: Vec<FuelStop> =
            serde_json::from_str(r#"[{"location":"1,1","price":"abc"},{"location":"1,1","price":4.0}]"#).unwrap();
        assert_eq!(total_cost(&stops), 200.0);
    }
}
