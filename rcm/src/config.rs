use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

#[derive(Debug, Deserialize)]
pub struct Config {
    // Xline endpoints
    pub xline_config: XlineConfig,
    /// Seconds between full resyncs of every stored runtime.
    #[serde(default = "default_resync_period_secs")]
    pub resync_period_secs: u64,
}

#[allow(dead_code)]
#[derive(Debug, Clone, Deserialize)]
pub struct XlineConfig {
    pub endpoints: Vec<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

fn default_resync_period_secs() -> u64 {
    300
}

pub fn load_config(path: &str) -> Result<Config> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read config from {path}"))?;
    let cfg: Config = serde_yaml::from_str(&content).context("Failed to parse YAML config")?;
    Ok(cfg)
}
