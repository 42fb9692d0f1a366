use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Pipeline tuning. Every field has a default, so a config file only
/// needs the keys it overrides.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Pause between municipalities and between retry attempts.
    pub delay_ms: u64,
    /// Total attempts per municipality, first one included.
    pub max_attempts: u32,
    /// How long SQLite waits on a locked database before reporting busy.
    pub query_timeout_ms: u64,
    pub output_dir: PathBuf,
    pub file_prefix: String,
    /// Year whose first rows the runner prints as a sample.
    pub sample_year: i32,
    pub sample_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            delay_ms: 1_000,
            max_attempts: 3,
            query_timeout_ms: 30_000,
            output_dir: PathBuf::from("dados_agrupados"),
            file_prefix: "vendas_agrupadas".to_string(),
            sample_year: 2016,
            sample_size: 5,
        }
    }
}

impl PipelineConfig {
    /// Load from a JSON file.
    /// In tests, use PipelineConfig::default_test().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: PipelineConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Production defaults with no waiting, so retry tests run instantly.
    pub fn default_test() -> Self {
        Self {
            delay_ms: 0,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_attempts == 0 {
            anyhow::bail!("max_attempts must be at least 1");
        }
        if self.file_prefix.trim().is_empty() {
            anyhow::bail!("file_prefix must not be empty");
        }
        Ok(())
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{ "delay_ms": 250, "output_dir": "out" }"#).unwrap();
        assert_eq!(config.delay(), Duration::from_millis(250));
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.file_prefix, "vendas_agrupadas");
    }

    #[test]
    fn zero_attempts_is_rejected() {
        let config = PipelineConfig {
            max_attempts: 0,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
