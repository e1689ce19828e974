// src/config/app.rs
//! Application knobs loaded from TOML. Every field has a default, so a
//! missing file yields a fully working configuration.

use serde::Deserialize;
use std::{fs, path::Path};

pub const ENV_CONFIG_PATH: &str = "FXLENS_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/app.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Query for the global market sweep.
    pub global_query: String,
    pub global_count: u32,
    /// Per-pair headline count; smaller than the global sweep.
    pub pair_count: u32,
    /// News-search market/locale code.
    pub market: String,
    pub calendar_countries: Vec<String>,
    pub calendar_days_ahead: u32,
    /// Currency pairs offered for the deep-dive action.
    pub pairs: Vec<String>,
    pub headline_ttl_secs: u64,
    pub analysis_ttl_secs: u64,
    pub calendar_ttl_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            global_query: "forex market news".to_string(),
            global_count: 30,
            pair_count: 20,
            market: "en-US".to_string(),
            calendar_countries: [
                "united states",
                "eurozone",
                "united kingdom",
                "japan",
                "china",
            ]
            .map(String::from)
            .to_vec(),
            calendar_days_ahead: 4,
            pairs: [
                "EUR/USD", "EUR/GBP", "EUR/JPY", "EUR/AUD", "EUR/CAD", "EUR/INR", "USD/CNH",
                "EUR/CHF", "EUR/NOK", "USD/BRL", "USD/ZAR", "USD/MXN", "USD/IDR",
            ]
            .map(String::from)
            .to_vec(),
            headline_ttl_secs: 900,
            analysis_ttl_secs: 900,
            calendar_ttl_secs: 3600,
        }
    }
}

impl AppConfig {
    /// Load from `FXLENS_CONFIG_PATH` (or the default path). A missing or
    /// unreadable file falls back to defaults; this mirrors how the rest of
    /// the pipeline degrades instead of refusing to start.
    pub fn load() -> Self {
        let path = std::env::var(ENV_CONFIG_PATH)
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        match Self::load_from_file(&path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::debug!(error = %e, path, "app config not loaded; using defaults");
                Self::default()
            }
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)?;
        Ok(toml::from_str(&data)?)
    }

    /// Query for an instrument-specific headline fetch.
    pub fn pair_query(&self, pair: &str) -> String {
        format!("{pair} forex news")
    }
}
