//! Configuration loading and process-wide logging setup.
//!
//! Queue disc options are plain TOML with one key per [`RedConfig`] field;
//! missing keys fall back to their defaults:
//!
//! ```toml
//! mode = "bytes"
//! min_th = 71400.0
//! max_th = 153000.0
//! queue_limit = 306000
//! queue_weight = 0.02
//! mean_pkt_size = 1020
//! ```

use std::{fs, path::Path};

use crate::errors::ConfigError;

pub use crate::queue_disc::red::{QueueMode, RedConfig, RedConfigBuilder};

impl RedConfig {
    /// Parses and validates a configuration.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: RedConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&raw)?;
        tracing::debug!(path = %path.display(), "Loaded queue disc configuration");
        Ok(config)
    }
}

/// Installs the global tracing subscriber once; later calls are no-ops.
pub fn set_logger(level: Option<tracing::level_filters::LevelFilter>) {
    #[cfg(feature = "trace")]
    {
        use std::sync::atomic::AtomicBool;

        static LOGGER_SET: AtomicBool = AtomicBool::new(false);
        if LOGGER_SET
            .compare_exchange(
                false,
                true,
                std::sync::atomic::Ordering::Release,
                std::sync::atomic::Ordering::SeqCst,
            )
            .is_err()
        {
            return;
        }

        if let Err(err) = crate::tracing::tracer::init_tracer(level) {
            eprintln!("failed tracing initialization: {err}");
        }
    }
    #[cfg(not(feature = "trace"))]
    {
        let _ = level;
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use testresult::TestResult;

    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() -> TestResult {
        let config = RedConfig::from_toml_str(
            r#"
            mode = "bytes"
            min_th = 2040.0
            max_th = 5100.0
            queue_limit = 8160
            "#,
        )?;
        assert_eq!(config.mode, QueueMode::Bytes);
        assert_eq!(config.queue_limit, 8160);
        assert_eq!(config.queue_weight, RedConfig::default().queue_weight);
        assert!(config.gentle);
        Ok(())
    }

    #[test]
    fn test_empty_toml_is_default() -> TestResult {
        assert_eq!(RedConfig::from_toml_str("")?, RedConfig::default());
        Ok(())
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = RedConfig::from_toml_str("min_th = 20.0\nmax_th = 10.0").unwrap_err();
        assert!(matches!(err, ConfigError::ThresholdOrder { .. }));

        let err = RedConfig::from_toml_str("queue_weight = 2.0").unwrap_err();
        assert!(matches!(err, ConfigError::QueueWeightOutOfRange(_)));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let err = RedConfig::from_toml_str("mode = \"frames\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test_log::test]
    fn test_load_from_file() -> TestResult {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "min_th = 70.0\nmax_th = 150.0\nqueue_limit = 300")?;
        let config = RedConfig::load(file.path())?;
        assert_eq!(config.max_th, 150.0);

        let missing = file.path().with_extension("missing");
        assert!(matches!(RedConfig::load(missing), Err(ConfigError::Io(_))));
        Ok(())
    }

    #[test]
    fn test_toml_round_trip() -> TestResult {
        let config = RedConfig::builder()
            .mode(QueueMode::Bytes)
            .thresholds(1000.0, 3000.0)
            .queue_limit(6000)
            .ns1_compat(true)
            .build()?;
        let raw = toml::to_string(&config)?;
        assert_eq!(RedConfig::from_toml_str(&raw)?, config);
        Ok(())
    }
}
