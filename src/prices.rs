//! Fuel price table loaded from the retail price dataset.
//!
//! The dataset is a CSV file with a header row. Only the `Latitude`,
//! `Longitude` and `Retail Price` columns are read; the rest are ignored.
//! Price cells that are not numeric become missing prices rather than
//! errors. Rows with an empty coordinate cell (addresses the enrichment tool
//! could not geocode) are skipped; a coordinate that is present must parse.

use ordered_float::OrderedFloat;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::domain::{Coord, PricePoint};

/// Error type for price table loading.
#[derive(Debug)]
pub enum PriceTableError {
    /// The dataset could not be opened.
    Io(std::io::Error),
    /// A row could not be decoded (missing column, non-numeric coordinate).
    Csv(csv::Error),
}

impl std::fmt::Display for PriceTableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriceTableError::Io(e) => write!(f, "I/O error: {}", e),
            PriceTableError::Csv(e) => write!(f, "Malformed price dataset: {}", e),
        }
    }
}

impl std::error::Error for PriceTableError {}

impl From<std::io::Error> for PriceTableError {
    fn from(e: std::io::Error) -> Self {
        PriceTableError::Io(e)
    }
}

impl From<csv::Error> for PriceTableError {
    fn from(e: csv::Error) -> Self {
        PriceTableError::Csv(e)
    }
}

#[derive(Debug, Deserialize)]
struct PriceRow {
    #[serde(rename = "Latitude")]
    latitude: Option<f64>,
    #[serde(rename = "Longitude")]
    longitude: Option<f64>,
    #[serde(rename = "Retail Price", default)]
    retail_price: Option<String>,
}

/// Exact bit-level key for a coordinate pair.
type CoordKey = (OrderedFloat<f64>, OrderedFloat<f64>);

fn coord_key(coord: &Coord) -> CoordKey {
    (OrderedFloat(coord.latitude), OrderedFloat(coord.longitude))
}

/// In-memory mapping from coordinate pair to retail price.
///
/// Entries keep the order in which their coordinate first appeared; a later
/// row with the same coordinate replaces the price but not the position.
///
/// # Examples
///
/// ```
/// use fuel_route::domain::Coord;
/// use fuel_route::prices::PriceTable;
///
/// let table = PriceTable::from_points([
///     (Coord::new(0.0, 0.0), Some(3.0)),
///     (Coord::new(10.0, 10.0), Some(5.0)),
/// ]);
///
/// let nearest = table.nearest(&Coord::new(1.0, 1.0)).unwrap();
/// assert_eq!(nearest.price, Some(3.0));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PriceTable {
    points: Vec<PricePoint>,
    index: HashMap<CoordKey, usize>,
}

impl PriceTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from `(coord, price)` pairs, last write wins.
    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = (Coord, Option<f64>)>,
    {
        let mut table = Self::new();
        for (coord, price) in points {
            table.insert(coord, price);
        }
        table
    }

    /// Reads the dataset at `path`.
    ///
    /// The whole file is read on every call.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PriceTableError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let table = Self::from_reader(file)?;
        info!(
            "Loaded {} fuel price points from {}",
            table.len(),
            path.display()
        );
        Ok(table)
    }

    /// Reads a dataset from any CSV source.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, PriceTableError> {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut table = Self::new();
        let mut skipped = 0usize;

        for row in reader.deserialize() {
            let row: PriceRow = row?;
            let (Some(latitude), Some(longitude)) = (row.latitude, row.longitude) else {
                skipped += 1;
                continue;
            };
            let price = row.retail_price.as_deref().and_then(parse_price);
            table.insert(Coord::new(latitude, longitude), price);
        }

        if skipped > 0 {
            warn!("Skipped {} price rows without coordinates", skipped);
        }
        debug!("Parsed price table with {} distinct coordinates", table.len());
        Ok(table)
    }

    fn insert(&mut self, coord: Coord, price: Option<f64>) {
        let key = coord_key(&coord);
        match self.index.get(&key) {
            Some(&idx) => self.points[idx].price = price,
            None => {
                self.index.insert(key, self.points.len());
                self.points.push(PricePoint { coord, price });
            }
        }
    }

    /// Returns the entry at exactly this coordinate.
    pub fn get(&self, coord: &Coord) -> Option<&PricePoint> {
        self.index.get(&coord_key(coord)).map(|&idx| &self.points[idx])
    }

    /// Finds the entry nearest to `coord` by squared planar distance.
    ///
    /// Linear scan; ties go to the entry that appeared first. Returns `None`
    /// for an empty table.
    pub fn nearest(&self, coord: &Coord) -> Option<&PricePoint> {
        self.points
            .iter()
            .min_by_key(|point| OrderedFloat(point.coord.squared_distance(coord)))
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PricePoint> {
        self.points.iter()
    }
}

/// Permissive numeric parse: anything that is not a finite number is missing.
fn parse_price(cell: &str) -> Option<f64> {
    cell.trim()
        .parse::<f64>()
        .ok()
        .filter(|price| price.is_finite())
}
