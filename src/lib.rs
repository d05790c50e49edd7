pub mod app;
pub mod charts;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod loader;
pub mod models;
pub mod reshape;
pub mod smoothing;
pub mod state;
pub mod ui;

pub use app::router;
pub use charts::{compute_charts, ChartSpecs};
pub use config::Config;
pub use loader::load_source;
pub use reshape::{reshape, Dataset};
pub use smoothing::{savgol_filter, smooth_daily_new, Derivative, SmoothingParams};
pub use state::AppState;
