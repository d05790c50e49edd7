use crate::models::RawRecord;
use chrono::NaiveDate;
use std::io::Read;
use thiserror::Error;
use tokio::fs;
use tracing::info;

pub const COUNTRY_COLUMN: &str = "Country/Region";
const IGNORED_COLUMNS: [&str; 3] = ["Province/State", "Lat", "Long"];
const DATE_FORMAT: &str = "%m/%d/%y";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to fetch {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("fetching {url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error("malformed csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("no date columns found")]
    NoDateColumns,
    #[error("unrecognised column '{0}': expected a M/D/YY date")]
    UnknownColumn(String),
    #[error("row {row}: invalid count '{value}' in column '{column}'")]
    InvalidCount {
        row: usize,
        column: String,
        value: String,
    },
}

/// Fetches the wide table from a URL or a local path and melts it to long form.
pub async fn load_source(source: &str) -> Result<Vec<RawRecord>, LoadError> {
    let bytes = if is_remote(source) {
        fetch_remote(source).await?
    } else {
        fs::read(source).await.map_err(|err| LoadError::Io {
            path: source.to_string(),
            source: err,
        })?
    };

    let records = parse_wide_csv(bytes.as_slice())?;
    info!(source, rows = records.len(), "loaded case table");
    Ok(records)
}

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

async fn fetch_remote(url: &str) -> Result<Vec<u8>, LoadError> {
    let http_err = |source: reqwest::Error| LoadError::Http {
        url: url.to_string(),
        source,
    };
    let response = reqwest::get(url).await.map_err(http_err)?;
    let status = response.status();
    if !status.is_success() {
        return Err(LoadError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    let body = response.bytes().await.map_err(http_err)?;
    Ok(body.to_vec())
}

enum Column {
    Country,
    Ignored,
    Date(NaiveDate),
}

/// Parses a table with one row per region and one column per date.
///
/// Empty cells are treated as missing and produce no record.
pub fn parse_wide_csv<R: Read>(reader: R) -> Result<Vec<RawRecord>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns = reader
        .headers()?
        .iter()
        .map(classify_header)
        .collect::<Result<Vec<_>, _>>()?;

    let country_idx = columns
        .iter()
        .position(|column| matches!(column, Column::Country))
        .ok_or(LoadError::MissingColumn(COUNTRY_COLUMN))?;
    if !columns.iter().any(|column| matches!(column, Column::Date(_))) {
        return Err(LoadError::NoDateColumns);
    }

    let headers = reader.headers()?.clone();
    let mut records = Vec::new();
    for (line, row) in reader.records().enumerate() {
        let row = row?;
        let country = row.get(country_idx).unwrap_or_default().to_string();

        for (idx, column) in columns.iter().enumerate() {
            let Column::Date(date) = column else {
                continue;
            };
            let cell = row.get(idx).unwrap_or_default();
            if cell.is_empty() {
                continue;
            }
            let confirmed = parse_count(cell).ok_or_else(|| LoadError::InvalidCount {
                row: line + 2,
                column: headers.get(idx).unwrap_or_default().to_string(),
                value: cell.to_string(),
            })?;
            records.push(RawRecord {
                country: country.clone(),
                date: *date,
                confirmed,
            });
        }
    }

    Ok(records)
}

fn classify_header(header: &str) -> Result<Column, LoadError> {
    if header == COUNTRY_COLUMN {
        return Ok(Column::Country);
    }
    if IGNORED_COLUMNS.contains(&header) {
        return Ok(Column::Ignored);
    }
    NaiveDate::parse_from_str(header, DATE_FORMAT)
        .map(Column::Date)
        .map_err(|_| LoadError::UnknownColumn(header.to_string()))
}

fn parse_count(cell: &str) -> Option<i64> {
    if let Ok(value) = cell.parse::<i64>() {
        return Some(value);
    }
    // Some exports write counts as floats, e.g. "12.0".
    let value = cell.parse::<f64>().ok()?;
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}
