use crate::charts::{compute_charts, ChartSpecs};
use crate::config::{Variant, POLY_ORDER_RANGE, WINDOW_LENGTH_RANGE, WINDOW_LENGTH_STEP};
use crate::errors::AppError;
use crate::models::{
    ChartRequest, CountriesResponse, CountrySeries, HealthResponse, SliderBounds, SmoothedSeries,
};
use crate::smoothing::{smooth_daily_new, Derivative, SmoothingParams};
use crate::state::AppState;
use crate::ui::render_index;
use axum::{
    extract::{Path, Query, State},
    response::Html,
    Json,
};
use serde::Deserialize;

pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_index(&state.config))
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        countries: state.dataset.len(),
        loaded_at: state.loaded_at.to_rfc3339(),
    })
}

pub async fn get_countries(State(state): State<AppState>) -> Json<CountriesResponse> {
    let config = &state.config;
    Json(CountriesResponse {
        countries: state.dataset.countries().map(str::to_string).collect(),
        default_selection: config
            .default_countries
            .iter()
            .filter(|name| state.dataset.contains(name))
            .cloned()
            .collect(),
        variant: config.variant.as_str().to_string(),
        window_length: config.params.window_length,
        poly_order: config.params.poly_order,
        window_length_bounds: SliderBounds {
            min: WINDOW_LENGTH_RANGE.0,
            max: WINDOW_LENGTH_RANGE.1,
            step: WINDOW_LENGTH_STEP,
        },
        poly_order_bounds: SliderBounds {
            min: POLY_ORDER_RANGE.0,
            max: POLY_ORDER_RANGE.1,
            step: 1,
        },
    })
}

pub async fn get_series(
    State(state): State<AppState>,
    Path(country): Path<String>,
) -> Result<Json<CountrySeries>, AppError> {
    state
        .dataset
        .series(&country)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("unknown country '{country}'")))
}

#[derive(Debug, Deserialize)]
pub struct SmoothedQuery {
    pub window_length: Option<usize>,
    pub poly_order: Option<usize>,
    #[serde(default = "default_derivative")]
    pub derivative: Derivative,
}

fn default_derivative() -> Derivative {
    Derivative::Value
}

pub async fn get_smoothed(
    State(state): State<AppState>,
    Path(country): Path<String>,
    Query(query): Query<SmoothedQuery>,
) -> Result<Json<SmoothedSeries>, AppError> {
    let series = state
        .dataset
        .series(&country)
        .ok_or_else(|| AppError::not_found(format!("unknown country '{country}'")))?;
    let params = effective_params(&state, query.window_length, query.poly_order)?;
    Ok(Json(smooth_daily_new(series, params, query.derivative)?))
}

pub async fn post_charts(
    State(state): State<AppState>,
    Json(payload): Json<ChartRequest>,
) -> Result<Json<ChartSpecs>, AppError> {
    let params = effective_params(&state, payload.window_length, payload.poly_order)?;
    let specs = compute_charts(&state.dataset, &payload.countries, params)?;
    Ok(Json(specs))
}

/// Request overrides apply only when the sliders are exposed, and must stay
/// within the slider ranges.
fn effective_params(
    state: &AppState,
    window_length: Option<usize>,
    poly_order: Option<usize>,
) -> Result<SmoothingParams, AppError> {
    let defaults = state.config.params;
    if state.config.variant == Variant::Fixed {
        return Ok(defaults);
    }

    if let Some(window) = window_length {
        check_range("window_length", window, WINDOW_LENGTH_RANGE)?;
    }
    if let Some(order) = poly_order {
        check_range("poly_order", order, POLY_ORDER_RANGE)?;
    }
    Ok(SmoothingParams::new(
        window_length.unwrap_or(defaults.window_length),
        poly_order.unwrap_or(defaults.poly_order),
    ))
}

fn check_range(name: &str, value: usize, (min, max): (usize, usize)) -> Result<(), AppError> {
    if value < min || value > max {
        return Err(AppError::bad_request(format!(
            "{name} must be between {min} and {max}, got {value}"
        )));
    }
    Ok(())
}
