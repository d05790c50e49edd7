use crate::models::{CountrySeries, SmoothedSeries};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SmoothError {
    #[error("window length must be at least 1")]
    ZeroWindow,
    #[error("window length must be odd, got {0}")]
    EvenWindow(usize),
    #[error("polynomial order {poly_order} must be less than window length {window_length}")]
    PolyOrderTooHigh {
        poly_order: usize,
        window_length: usize,
    },
    #[error("window length {window_length} exceeds series length {len}")]
    WindowExceedsSeries { window_length: usize, len: usize },
    #[error("least-squares fit failed: {0}")]
    Numerical(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmoothingParams {
    pub window_length: usize,
    pub poly_order: usize,
}

impl Default for SmoothingParams {
    fn default() -> Self {
        Self {
            window_length: 21,
            poly_order: 2,
        }
    }
}

impl SmoothingParams {
    pub fn new(window_length: usize, poly_order: usize) -> Self {
        Self {
            window_length,
            poly_order,
        }
    }

    /// Checks the rules that do not depend on the series being smoothed.
    pub fn validate(&self) -> Result<(), SmoothError> {
        if self.window_length == 0 {
            return Err(SmoothError::ZeroWindow);
        }
        if self.window_length % 2 == 0 {
            return Err(SmoothError::EvenWindow(self.window_length));
        }
        if self.poly_order >= self.window_length {
            return Err(SmoothError::PolyOrderTooHigh {
                poly_order: self.poly_order,
                window_length: self.window_length,
            });
        }
        Ok(())
    }

    pub fn validate_for(&self, len: usize) -> Result<(), SmoothError> {
        self.validate()?;
        if self.window_length > len {
            return Err(SmoothError::WindowExceedsSeries {
                window_length: self.window_length,
                len,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Derivative {
    /// Smoothed amplitude.
    Value,
    /// Rate of change per day of the smoothed amplitude.
    First,
}

impl Derivative {
    pub fn order(self) -> usize {
        match self {
            Derivative::Value => 0,
            Derivative::First => 1,
        }
    }
}

/// Savitzky–Golay filter over `values` sampled at unit spacing.
///
/// Each output sample is the `deriv`-th derivative, at that sample, of the
/// least-squares polynomial fitted over `window_length` samples. Samples
/// within half a window of either end use the first or last full window, so
/// the output has the input's length. Orders above `poly_order` are zero.
pub fn savgol_filter(
    values: &[f64],
    params: SmoothingParams,
    deriv: usize,
) -> Result<Vec<f64>, SmoothError> {
    params.validate_for(values.len())?;

    let window = params.window_length;
    let half = window / 2;
    let last_start = values.len() - window;
    let kernels = window_kernels(params, deriv)?;

    let smoothed: Vec<f64> = (0..values.len())
        .map(|i| {
            let start = i.saturating_sub(half).min(last_start);
            let kernel = &kernels[i - start];
            kernel
                .iter()
                .zip(&values[start..start + window])
                .map(|(k, v)| k * v)
                .sum::<f64>()
        })
        .collect();

    Ok(smoothed)
}

/// Convolution weights for every evaluation offset inside the window.
///
/// One pseudo-inverse maps the window to polynomial coefficients; the
/// kernel for offset `c` is that map followed by evaluating the
/// `deriv`-th derivative of the polynomial at `c`.
fn window_kernels(params: SmoothingParams, deriv: usize) -> Result<Vec<Vec<f64>>, SmoothError> {
    let window = params.window_length;
    if deriv > params.poly_order {
        return Ok(vec![vec![0.0; window]; window]);
    }

    // Abscissae scaled into [-1, 1].
    let half = window / 2;
    let scale = half.max(1) as f64;
    let abscissa = |j: usize| (j as f64 - half as f64) / scale;

    let terms = params.poly_order + 1;
    let design = DMatrix::from_fn(window, terms, |row, col| abscissa(row).powi(col as i32));
    let pinv = design
        .pseudo_inverse(f64::EPSILON * 100.0)
        .map_err(|err| SmoothError::Numerical(err.to_string()))?;

    // d^deriv/du^deriv of u^k is k!/(k-deriv)! u^(k-deriv); du/dx = 1/scale.
    let unit = scale.powi(deriv as i32);
    let kernels: Vec<Vec<f64>> = (0..window)
        .map(|center| {
            let u = abscissa(center);
            let weights: Vec<f64> = (deriv..terms)
                .map(|k| falling_factorial(k, deriv) * u.powi((k - deriv) as i32) / unit)
                .collect();
            (0..window)
                .map(|j| {
                    weights
                        .iter()
                        .zip(deriv..terms)
                        .map(|(w, k)| w * pinv[(k, j)])
                        .sum::<f64>()
                })
                .collect()
        })
        .collect();

    Ok(kernels)
}

fn falling_factorial(n: usize, k: usize) -> f64 {
    (n - k + 1..=n).map(|i| i as f64).product()
}

/// Smooths the defined daily-new values of one country.
///
/// The first retained row has no daily-new value, so the result starts at
/// the second row and is one sample shorter than the series.
pub fn smooth_daily_new(
    series: &CountrySeries,
    params: SmoothingParams,
    derivative: Derivative,
) -> Result<SmoothedSeries, SmoothError> {
    let defined: Vec<_> = series
        .points
        .iter()
        .filter_map(|point| point.daily_new.map(|delta| (point, delta as f64)))
        .collect();
    let input: Vec<f64> = defined.iter().map(|(_, delta)| *delta).collect();
    let values = savgol_filter(&input, params, derivative.order())?;

    Ok(SmoothedSeries {
        country: series.country.clone(),
        window_length: params.window_length,
        poly_order: params.poly_order,
        derivative: derivative.order(),
        days_from_first: defined.iter().map(|(p, _)| p.days_from_first).collect(),
        dates: defined.iter().map(|(p, _)| p.date).collect(),
        values,
    })
}
