use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One (country, date) cell of the source table, after melting the date columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub country: String,
    pub date: NaiveDate,
    pub confirmed: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub days_from_first: i64,
    pub confirmed: i64,
    /// `None` on the first retained row of a country.
    pub daily_new: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountrySeries {
    pub country: String,
    pub points: Vec<SeriesPoint>,
}

impl CountrySeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SmoothedSeries {
    pub country: String,
    pub window_length: usize,
    pub poly_order: usize,
    pub derivative: usize,
    pub days_from_first: Vec<i64>,
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ChartRequest {
    #[serde(default)]
    pub countries: Vec<String>,
    pub window_length: Option<usize>,
    pub poly_order: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SliderBounds {
    pub min: usize,
    pub max: usize,
    pub step: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CountriesResponse {
    pub countries: Vec<String>,
    pub default_selection: Vec<String>,
    pub variant: String,
    pub window_length: usize,
    pub poly_order: usize,
    pub window_length_bounds: SliderBounds,
    pub poly_order_bounds: SliderBounds,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub countries: usize,
    pub loaded_at: String,
}
