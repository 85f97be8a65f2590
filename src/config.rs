use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::attribution::AttributionConfig;
use crate::form::FormConfig;
use crate::scoring::ScoringConfig;
use crate::signals::SignalConfig;

pub const CONFIG_PATH_ENV: &str = "FANTASY_ENGINE_CONFIG";
pub const POSITION_MULTIPLIER_ENV: &str = "FANTASY_APPLY_POSITION_MULTIPLIERS";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub attribution: AttributionConfig,
    pub scoring: ScoringConfig,
    pub form: FormConfig,
    pub signals: SignalConfig,
}

pub fn read_config_file(path: &Path) -> Result<EngineConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read engine config {}", path.display()))?;
    serde_json::from_str::<EngineConfig>(&raw)
        .with_context(|| format!("parse engine config {}", path.display()))
}

/// Defaults, overlaid by the JSON file named in `FANTASY_ENGINE_CONFIG` and
/// then by the position-multiplier switch. A bad file is logged and ignored.
pub fn load_engine_config() -> EngineConfig {
    let mut cfg = match config_path_override() {
        Some(path) if path.exists() => match read_config_file(&path) {
            Ok(cfg) => {
                info!(path = %path.display(), "engine config loaded");
                cfg
            }
            Err(err) => {
                warn!("{err:#}; using default engine config");
                EngineConfig::default()
            }
        },
        Some(path) => {
            warn!(path = %path.display(), "engine config not found; using defaults");
            EngineConfig::default()
        }
        None => EngineConfig::default(),
    };
    if let Some(flag) = env_flag(POSITION_MULTIPLIER_ENV) {
        cfg.scoring.apply_position_multipliers = flag;
    }
    cfg
}

pub fn global_config() -> &'static EngineConfig {
    static CONFIG: OnceCell<EngineConfig> = OnceCell::new();
    CONFIG.get_or_init(load_engine_config)
}

fn config_path_override() -> Option<PathBuf> {
    env::var(CONFIG_PATH_ENV)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

fn env_flag(name: &str) -> Option<bool> {
    env::var(name).ok().and_then(|raw| parse_flag(&raw))
}

pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}
