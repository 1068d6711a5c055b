//! TOML calibration loader with validation.
//!
//! Parses `linebot_common::config::CalibrationConfig` from a TOML file or
//! string and runs its validation rules. Every omitted section or field
//! falls back to the default calibration.

use std::path::Path;

use linebot_common::config::CalibrationConfig;

// ─── Error Type ─────────────────────────────────────────────────────

/// Configuration loading/validation error.
#[derive(Debug)]
pub enum ConfigError {
    /// File I/O error.
    IoError(String),
    /// TOML parse error.
    ParseError(String),
    /// Parameter validation error.
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IoError(e) => write!(f, "config I/O error: {e}"),
            Self::ParseError(e) => write!(f, "config parse error: {e}"),
            Self::ValidationError(e) => write!(f, "config validation: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ─── Loading Functions ──────────────────────────────────────────────

/// Load and validate the calibration from a TOML file.
pub fn load_config(path: &Path) -> Result<CalibrationConfig, ConfigError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::IoError(format!("failed to read {}: {e}", path.display())))?;
    load_config_from_str(&text)
}

/// Load and validate the calibration from a TOML string (for testing).
pub fn load_config_from_str(text: &str) -> Result<CalibrationConfig, ConfigError> {
    let config: CalibrationConfig =
        toml::from_str(text).map_err(|e| ConfigError::ParseError(format!("calibration: {e}")))?;
    config.validate().map_err(ConfigError::ValidationError)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config, CalibrationConfig::default());
    }

    #[test]
    fn partial_override() {
        let config = load_config_from_str(
            r#"
cycle_time_us = 2000

[magnet]
signal_duration_s = 3

[right]
stop = 180
full = 255
"#,
        )
        .unwrap();
        assert_eq!(config.cycle_time_us, 2000);
        assert_eq!(config.magnet.signal_duration_s, 3);
        // Untouched magnet fields keep their defaults.
        assert_eq!(config.magnet.blink_frequency_hz, 8);
        assert_eq!(config.right.stop, 180);
        assert_eq!(config.right.full, 255);
        assert_eq!(config.left, CalibrationConfig::default().left);
    }

    #[test]
    fn reject_malformed_toml() {
        let err = load_config_from_str("this is not valid toml @@@@");
        assert!(err.is_err());
        let msg = err.unwrap_err().to_string();
        assert!(msg.contains("parse"), "got: {msg}");
    }

    #[test]
    fn reject_threshold_order_violation() {
        let err = load_config_from_str(
            r#"
[line]
turn_right_mv = 4000
turn_left_mv = 1000
"#,
        );
        assert!(err.is_err());
        let msg = err.unwrap_err().to_string();
        assert!(msg.contains("line thresholds"), "got: {msg}");
    }

    #[test]
    fn reject_incomplete_drive_section() {
        // Drive endpoints have no field-level defaults: a partial [left]
        // section is a parse error, not a silent half-calibration.
        let err = load_config_from_str(
            r#"
[left]
stop = 90
"#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calibration.toml");
        std::fs::write(
            &path,
            r#"
[filter]
hall_inv_alpha = 8
ir_inv_alpha = 32
"#,
        )
        .unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.filter.hall_inv_alpha, 8);
        assert_eq!(config.filter.ir_inv_alpha, 32);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config(Path::new("/nonexistent/calibration.toml"));
        assert!(matches!(err, Err(ConfigError::IoError(_))));
    }

    #[test]
    fn config_error_display() {
        let err = ConfigError::ValidationError("bad value".to_string());
        assert!(err.to_string().contains("bad value"));
    }
}
