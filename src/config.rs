// ⚙️ Scan Configuration - loaded from JSON, every field optional

use crate::expiry::EXPIRY_SOON_DAYS;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Days before expiry at which a pack counts as "soon" (inclusive)
    #[serde(default = "default_expiry_soon_days")]
    pub expiry_soon_days: i64,
}

fn default_expiry_soon_days() -> i64 {
    EXPIRY_SOON_DAYS
}

impl ScanConfig {
    /// Load configuration from a JSON file
    ///
    /// ```text
    /// { "expiry_soon_days": 60 }
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: ScanConfig =
            serde_json::from_str(content).context("Failed to parse config JSON")?;

        if config.expiry_soon_days < 0 {
            anyhow::bail!(
                "expiry_soon_days must not be negative (got {})",
                config.expiry_soon_days
            );
        }

        Ok(config)
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            expiry_soon_days: EXPIRY_SOON_DAYS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_window() {
        assert_eq!(ScanConfig::default().expiry_soon_days, 90);
    }

    #[test]
    fn test_from_json_override() {
        let config = ScanConfig::from_json(r#"{ "expiry_soon_days": 30 }"#).unwrap();
        assert_eq!(config.expiry_soon_days, 30);
    }

    #[test]
    fn test_from_json_missing_field_uses_default() {
        let config = ScanConfig::from_json("{}").unwrap();
        assert_eq!(config, ScanConfig::default());
    }

    #[test]
    fn test_from_json_rejects_negative_window() {
        assert!(ScanConfig::from_json(r#"{ "expiry_soon_days": -1 }"#).is_err());
    }

    #[test]
    fn test_from_file_missing() {
        assert!(ScanConfig::from_file("does_not_exist.json").is_err());
    }
}
