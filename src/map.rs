//! Map links for viewing a route with its fuel stops.

use crate::domain::{Coord, FuelStop};

/// OpenStreetMap directions page.
pub const MAP_BASE_URL: &str = "https://www.openstreetmap.org/directions?";

/// Directions engine selected in the viewer.
const MAP_ENGINE: &str = "mapquest_car";

/// Builds a directions link through `start`, every stop in order, and `finish`.
///
/// Points are `lat,lng` joined by `;`. With no stops the link goes straight
/// from start to finish.
///
/// # Examples
///
/// ```
/// use fuel_route::domain::{Coord, FuelStop};
/// use fuel_route::map::build_map_url;
///
/// let url = build_map_url(Coord::new(36.15, -95.99), Coord::new(41.88, -87.63), &[]);
/// assert_eq!(
///     url,
///     "https://www.openstreetmap.org/directions?engine=mapquest_car&route=36.15,-95.99;41.88,-87.63"
/// );
///
/// let stops = vec![FuelStop::new("38.5,-92.1", None)];
/// let url = build_map_url(Coord::new(36.15, -95.99), Coord::new(41.88, -87.63), &stops);
/// assert!(url.ends_with("route=36.15,-95.99;38.5,-92.1;41.88,-87.63"));
/// ```
pub fn build_map_url(start: Coord, finish: Coord, stops: &[FuelStop]) -> String {
    let mut points = vec![start.to_string()];
    points.extend(stops.iter().map(|stop| stop.location.clone()));
    points.push(finish.to_string());

    format!("{}engine={}&route={}", MAP_BASE_URL, MAP_ENGINE, points.join(";"))
}
