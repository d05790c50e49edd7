use crate::config::Config;
use crate::reshape::Dataset;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Read-only after startup, so handlers share it without locking.
#[derive(Clone)]
pub struct AppState {
    pub dataset: Arc<Dataset>,
    pub config: Arc<Config>,
    pub loaded_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: Config, dataset: Dataset) -> Self {
        Self {
            dataset: Arc::new(dataset),
            config: Arc::new(config),
            loaded_at: Utc::now(),
        }
    }
}
