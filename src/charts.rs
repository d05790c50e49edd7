use crate::models::{CountrySeries, SmoothedSeries};
use crate::reshape::Dataset;
use crate::smoothing::{smooth_daily_new, Derivative, SmoothError, SmoothingParams};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Plotly's "Bold" qualitative palette, cycled per selected country.
pub const PALETTE: [&str; 11] = [
    "rgb(127, 60, 141)",
    "rgb(17, 165, 121)",
    "rgb(57, 105, 172)",
    "rgb(242, 180, 1)",
    "rgb(231, 63, 116)",
    "rgb(128, 186, 90)",
    "rgb(230, 131, 16)",
    "rgb(0, 134, 149)",
    "rgb(207, 28, 144)",
    "rgb(249, 123, 114)",
    "rgb(165, 170, 153)",
];

const CHART_WIDTH: u32 = 1050;
const CHART_HEIGHT: u32 = 600;
const MARKER_SIZE: u32 = 5;
const SMOOTHED_OPACITY: f64 = 0.7;

/// The three linked charts in plotly's `data` + `layout` shape.
#[derive(Debug, Clone, Serialize)]
pub struct ChartSpecs {
    /// Selected countries that exist in the dataset, in selection order.
    pub countries: Vec<String>,
    pub params: SmoothingParams,
    pub cumulative: Chart,
    pub daily_new: Chart,
    pub derivative: Chart,
    /// Countries whose smoothed traces were left out, with the reason.
    pub skipped: Vec<SkippedTrace>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedTrace {
    pub country: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Chart {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

#[derive(Debug, Clone, Serialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: String,
    pub country: String,
    pub mode: &'static str,
    pub x: Vec<i64>,
    pub y: Vec<Option<f64>>,
    pub hovertext: Vec<String>,
    pub marker: Marker,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<Line>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Marker {
    pub size: u32,
    pub color: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Line {
    pub dash: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Layout {
    pub title: String,
    pub template: &'static str,
    pub width: u32,
    pub height: u32,
    pub xaxis: Axis,
    pub yaxis: Axis,
}

#[derive(Debug, Clone, Serialize)]
pub struct Axis {
    pub title: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub scale: Option<&'static str>,
}

/// Builds the cumulative, daily-new and first-derivative charts.
///
/// Unknown or repeated countries in `selection` are dropped. Parameters are
/// rejected up front when they are invalid for any series length; a country
/// too short for the window keeps its raw traces and is reported in
/// [`ChartSpecs::skipped`].
pub fn compute_charts(
    dataset: &Dataset,
    selection: &[String],
    params: SmoothingParams,
) -> Result<ChartSpecs, SmoothError> {
    params.validate()?;

    let selected = resolve_selection(dataset, selection);
    debug!(
        countries = selected.len(),
        window_length = params.window_length,
        poly_order = params.poly_order,
        "computing charts"
    );

    let mut cumulative = Vec::with_capacity(selected.len());
    let mut daily_new = Vec::with_capacity(selected.len() * 2);
    let mut derivative = Vec::with_capacity(selected.len());
    let mut skipped = Vec::new();

    for (i, series) in selected.iter().enumerate() {
        let color = PALETTE[i % PALETTE.len()];
        cumulative.push(cumulative_trace(series, color));
        daily_new.push(daily_new_trace(series, color));

        let smoothed = smooth_daily_new(series, params, Derivative::Value).and_then(|value| {
            smooth_daily_new(series, params, Derivative::First).map(|slope| (value, slope))
        });
        match smoothed {
            Ok((value, slope)) => {
                daily_new.push(smoothed_trace(
                    &value,
                    format!("{} smoothed", series.country),
                    "lines",
                    color,
                ));
                derivative.push(smoothed_trace(
                    &slope,
                    format!("{} delta cases", series.country),
                    "lines+markers",
                    color,
                ));
            }
            Err(err) => {
                warn!(country = %series.country, "skipping smoothed traces: {err}");
                skipped.push(SkippedTrace {
                    country: series.country.clone(),
                    reason: err.to_string(),
                });
            }
        }
    }

    Ok(ChartSpecs {
        countries: selected.iter().map(|s| s.country.clone()).collect(),
        params,
        cumulative: Chart {
            data: cumulative,
            layout: layout("Cumulative COVID-19 cases", "Cumulative cases", Some("log")),
        },
        daily_new: Chart {
            data: daily_new,
            layout: layout("New COVID-19 cases", "Daily new", None),
        },
        derivative: Chart {
            data: derivative,
            layout: layout(
                "First derivative of new COVID-19 cases",
                "Change in new cases",
                None,
            ),
        },
        skipped,
    })
}

fn resolve_selection<'a>(dataset: &'a Dataset, selection: &[String]) -> Vec<&'a CountrySeries> {
    let mut seen = HashSet::new();
    selection
        .iter()
        .filter(|name| seen.insert(name.as_str()))
        .filter_map(|name| dataset.series(name))
        .collect()
}

fn hover(dates: impl Iterator<Item = chrono::NaiveDate>) -> Vec<String> {
    dates.map(|date| date.to_string()).collect()
}

fn cumulative_trace(series: &CountrySeries, color: &'static str) -> Trace {
    Trace {
        kind: "scatter",
        name: series.country.clone(),
        country: series.country.clone(),
        mode: "lines",
        x: series.points.iter().map(|p| p.days_from_first).collect(),
        y: series.points.iter().map(|p| Some(p.confirmed as f64)).collect(),
        hovertext: hover(series.points.iter().map(|p| p.date)),
        marker: Marker {
            size: MARKER_SIZE,
            color,
        },
        line: None,
        opacity: None,
    }
}

fn daily_new_trace(series: &CountrySeries, color: &'static str) -> Trace {
    Trace {
        kind: "scatter",
        name: series.country.clone(),
        country: series.country.clone(),
        mode: "lines+markers",
        x: series.points.iter().map(|p| p.days_from_first).collect(),
        y: series
            .points
            .iter()
            .map(|p| p.daily_new.map(|delta| delta as f64))
            .collect(),
        hovertext: hover(series.points.iter().map(|p| p.date)),
        marker: Marker {
            size: MARKER_SIZE,
            color,
        },
        line: Some(Line { dash: "dot" }),
        opacity: None,
    }
}

fn smoothed_trace(
    smoothed: &SmoothedSeries,
    name: String,
    mode: &'static str,
    color: &'static str,
) -> Trace {
    Trace {
        kind: "scatter",
        name,
        country: smoothed.country.clone(),
        mode,
        x: smoothed.days_from_first.clone(),
        y: smoothed.values.iter().copied().map(Some).collect(),
        hovertext: hover(smoothed.dates.iter().copied()),
        marker: Marker {
            size: MARKER_SIZE,
            color,
        },
        line: None,
        opacity: Some(SMOOTHED_OPACITY),
    }
}

fn layout(title: &str, y_title: &str, y_scale: Option<&'static str>) -> Layout {
    Layout {
        title: title.to_string(),
        template: "plotly_white",
        width: CHART_WIDTH,
        height: CHART_HEIGHT,
        xaxis: Axis {
            title: "Days from first".to_string(),
            scale: None,
        },
        yaxis: Axis {
            title: y_title.to_string(),
            scale: y_scale,
        },
    }
}
