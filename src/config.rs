use crate::smoothing::{SmoothError, SmoothingParams};
use std::env;
use thiserror::Error;

pub const DEFAULT_SOURCE: &str = "https://raw.githubusercontent.com/CSSEGISandData/COVID-19/master/csse_covid_19_data/csse_covid_19_time_series/time_series_covid19_confirmed_global.csv";

pub const DEFAULT_COUNTRIES: [&str; 10] = [
    "South Africa",
    "United Kingdom",
    "Germany",
    "Singapore",
    "Australia",
    "Italy",
    "Japan",
    "Sweden",
    "New Zealand",
    "Afghanistan",
];

pub const POLY_ORDER_RANGE: (usize, usize) = (1, 10);
pub const WINDOW_LENGTH_RANGE: (usize, usize) = (7, 31);
pub const WINDOW_LENGTH_STEP: usize = 2;

const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("DASHBOARD_VARIANT must be 'tunable' or 'fixed', got '{0}'")]
    Variant(String),
    #[error("{name} must be a non-negative integer, got '{value}'")]
    NotANumber { name: &'static str, value: String },
    #[error("invalid default smoothing parameters: {0}")]
    Params(#[from] SmoothError),
}

/// Which of the two dashboard layouts to serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// Polynomial-order and window-length sliders are exposed.
    Tunable,
    /// Country selection only; smoothing is pinned to the defaults.
    Fixed,
}

impl Variant {
    pub fn as_str(self) -> &'static str {
        match self {
            Variant::Tunable => "tunable",
            Variant::Fixed => "fixed",
        }
    }

    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "tunable" => Ok(Variant::Tunable),
            "fixed" => Ok(Variant::Fixed),
            _ => Err(ConfigError::Variant(value.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub source: String,
    pub variant: Variant,
    pub params: SmoothingParams,
    pub default_countries: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            source: DEFAULT_SOURCE.to_string(),
            variant: Variant::Tunable,
            params: SmoothingParams::default(),
            default_countries: DEFAULT_COUNTRIES.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let port = lookup("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(defaults.port);
        let source = lookup("COVID_SOURCE")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(defaults.source);
        let variant = match lookup("DASHBOARD_VARIANT") {
            Some(value) => Variant::parse(&value)?,
            None => defaults.variant,
        };

        let window_length = parse_usize(&lookup, "DEFAULT_WINDOW_LENGTH")?
            .unwrap_or(defaults.params.window_length);
        let poly_order =
            parse_usize(&lookup, "DEFAULT_POLY_ORDER")?.unwrap_or(defaults.params.poly_order);
        let params = SmoothingParams::new(window_length, poly_order);
        params.validate()?;

        let default_countries = match lookup("DEFAULT_COUNTRIES") {
            Some(value) => value
                .split(';')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect(),
            None => defaults.default_countries,
        };

        Ok(Self {
            port,
            source,
            variant,
            params,
            default_countries,
        })
    }
}

fn parse_usize<F>(lookup: &F, name: &'static str) -> Result<Option<usize>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|value| {
            value.trim().parse::<usize>().map_err(|_| ConfigError::NotANumber {
                name,
                value: value.clone(),
            })
        })
        .transpose()
}
