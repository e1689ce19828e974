// src/config/ai.rs
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};

use crate::analyze::parse::ParseMode;

fn default_model() -> String {
    "gpt-4.1-mini".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    pub enabled: bool,
    /// "openai" (case-insensitive); anything else builds a disabled client
    pub provider: String,
    /// "ENV" means: read from OPENAI_API_KEY
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// How to treat prose around the model's JSON object. Defaults to strict.
    #[serde(default)]
    pub parse_mode: ParseMode,
}

impl AiConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)?;
        let mut cfg: AiConfig = serde_json::from_str(&data)?;

        // Normalize provider
        cfg.provider = cfg.provider.to_lowercase();

        // Resolve api key if "ENV"
        if cfg.api_key.trim().eq_ignore_ascii_case("env") {
            cfg.api_key = match cfg.provider.as_str() {
                "openai" => env::var("OPENAI_API_KEY")
                    .map_err(|_| anyhow::anyhow!("Missing OPENAI_API_KEY env var"))?,
                other => anyhow::bail!("Unsupported provider in config: {other}"),
            };
        }

        Ok(cfg)
    }

    /// Config for runs without an LLM (tests, offline).
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            provider: "openai".to_string(),
            api_key: String::new(),
            model: default_model(),
            parse_mode: ParseMode::default(),
        }
    }
}
