use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use common::{Error, Result};

/// Top-level scan config file (TOML).
///
/// Example `config/scan.toml`:
/// ```toml
/// [scan]
/// concurrency = 8
/// instruments = ["AAPL", "MSFT"]
///
/// [rule]
/// type = "confirmed_buy"
///
/// [rule.params]
/// ema_fast = 5
/// ema_slow = 20
/// crossover_lookback = 5
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ScanFileConfig {
    #[serde(default)]
    pub scan: ScanSection,
    #[serde(default)]
    pub rule: RuleConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScanSection {
    /// Maximum instruments evaluated at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Explicit instrument list. When absent the provider's full universe is used.
    #[serde(default)]
    pub instruments: Option<Vec<String>>,
}

impl Default for ScanSection {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            instruments: None,
        }
    }
}

fn default_concurrency() -> usize {
    8
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RuleConfig {
    /// Rule identifier: "confirmed_buy", "ema_crossover", "golden_cross",
    /// "volume_breakout", "macd_momentum" or "price_above_sma".
    #[serde(rename = "type")]
    pub rule_type: String,
    /// Rule-specific parameters. Missing keys take the rule's defaults.
    #[serde(default)]
    pub params: HashMap<String, toml::Value>,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            rule_type: "confirmed_buy".to_string(),
            params: HashMap::new(),
        }
    }
}

impl ScanFileConfig {
    /// Load from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read scan config at '{path}': {e}")))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(content)?;
        if cfg.scan.concurrency == 0 {
            return Err(Error::Config("scan.concurrency must be >= 1".into()));
        }
        Ok(cfg)
    }
}
