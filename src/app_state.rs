// =============================================================================
// Central Application State
// =============================================================================
//
// Shared by every request handler via `Arc<AppState>`. Configuration is
// read-only after startup; the only mutable field is an atomic request
// counter used for logging and the health endpoint.
// =============================================================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::forecast::{AdditiveForecaster, Forecaster};
use crate::market_data::PriceSource;
use crate::runtime_config::RuntimeConfig;

pub struct AppState {
    pub config: RuntimeConfig,
    pub source: Arc<dyn PriceSource>,
    pub forecaster: Arc<dyn Forecaster>,
    /// Requests served since startup.
    requests: AtomicU64,
    started_at: Instant,
}

impl AppState {
    /// Build state around `source`, using the additive model configured in
    /// `config.forecast`.
    pub fn new(config: RuntimeConfig, source: Arc<dyn PriceSource>) -> Self {
        let forecaster = Arc::new(AdditiveForecaster::new(config.forecast.clone()));
        Self::with_forecaster(config, source, forecaster)
    }

    pub fn with_forecaster(
        config: RuntimeConfig,
        source: Arc<dyn PriceSource>,
        forecaster: Arc<dyn Forecaster>,
    ) -> Self {
        Self {
            config,
            source,
            forecaster,
            requests: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    /// Count a request; returns its 1-based sequence number.
    pub fn next_request(&self) -> u64 {
        self.requests.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn requests_served(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
