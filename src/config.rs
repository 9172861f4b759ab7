use std::env;
use std::time::Duration;

use crate::error::DashboardError;

// --- CONFIG AGGREGATOR ---

#[derive(Debug, Clone)]
pub struct Config {
    pub synth: SynthConfig,
    pub dashboard: DashboardConfig,
}

impl Config {
    /// Reads `.env` (if present) and the process environment.
    pub fn from_env() -> Result<Self, DashboardError> {
        dotenv::dotenv().ok();
        Ok(Self {
            synth: SynthConfig::load()?,
            dashboard: DashboardConfig::load()?,
        })
    }
}

// --- MODULES ---

// SYNTH CLIENT (the API every rack exposes)
#[derive(Debug, Clone)]
pub struct SynthConfig {
    pub local_url: String,
    pub request_timeout_ms: u64,
}

impl SynthConfig {
    fn load() -> Result<Self, DashboardError> {
        Ok(Self {
            local_url:          get_env("SYNTH_LOCAL_URL", "http://127.0.0.1:8081")?,
            request_timeout_ms: get_env("SYNTH_REQUEST_TIMEOUT_MS", "5000")?,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.max(1))
    }
}

// DASHBOARD (HTTP API + poller)
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub host: String,
    pub port: u16,
    pub refresh_secs: u64,
    pub log_level: String,
}

impl DashboardConfig {
    fn load() -> Result<Self, DashboardError> {
        Ok(Self {
            host:         get_env("DASHBOARD_HOST", "0.0.0.0")?,
            port:         get_env("DASHBOARD_PORT", "8080")?,
            refresh_secs: get_env("DASHBOARD_REFRESH_SECS", "15")?,
            log_level:    get_env("SYNTH_DASHBOARD_LOG", "info")?,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs.max(1))
    }
}

// --- PRIVATE HELPER ---

fn get_env<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, DashboardError> {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    raw.parse()
        .map_err(|_| DashboardError::Config(format!("{} must be valid (got '{}')", key, raw)))
}
