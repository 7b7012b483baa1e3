//! Codec configuration.
//!
//! A [`CodecConfig`] is shared by every format adapter. It controls the
//! buffer size of the lazily opened sink/source handle, the delimiter of the
//! text format and JSON pretty-printing. It can be built in code or loaded
//! from a JSON file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Default buffer capacity for sink writers and source readers.
pub const DEFAULT_BUFFER_CAPACITY: usize = 8 * 1024;

/// Default field delimiter of the delimited-text format.
pub const DEFAULT_TEXT_DELIMITER: char = ',';

/// Settings shared by all codec sessions.
///
/// # Example
///
/// ```rust
/// use rsense::CodecConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = CodecConfig::default()
///     .with_text_delimiter(';')
///     .with_buffer_capacity(64 * 1024);
/// config.validate()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Capacity in bytes of the buffered writer or reader wrapped around the
    /// sink or source.
    pub buffer_capacity: usize,

    /// Field delimiter of the delimited-text format.
    pub text_delimiter: char,

    /// Pretty-print JSON records.
    pub json_pretty: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            text_delimiter: DEFAULT_TEXT_DELIMITER,
            json_pretty: false,
        }
    }
}

impl CodecConfig {
    /// Sets the buffer capacity.
    #[must_use]
    pub fn with_buffer_capacity(mut self, buffer_capacity: usize) -> Self {
        self.buffer_capacity = buffer_capacity;
        self
    }

    /// Sets the text delimiter.
    #[must_use]
    pub fn with_text_delimiter(mut self, text_delimiter: char) -> Self {
        self.text_delimiter = text_delimiter;
        self
    }

    /// Enables or disables JSON pretty-printing.
    #[must_use]
    pub fn with_json_pretty(mut self, json_pretty: bool) -> Self {
        self.json_pretty = json_pretty;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the buffer capacity is zero or the
    /// delimiter could appear inside a field value.
    pub fn validate(&self) -> Result<()> {
        if self.buffer_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "buffer_capacity",
                reason: "must be > 0".to_string(),
            }
            .into());
        }

        let d = self.text_delimiter;
        // Field values are integers, floats (incl. exponent, NaN, inf) and booleans.
        if d == '\n' || d == '\r' || d == '-' || d == '+' || d == '.' || d.is_alphanumeric() {
            return Err(ConfigError::Invalid {
                field: "text_delimiter",
                reason: format!("{d:?} collides with field contents"),
            }
            .into());
        }

        Ok(())
    }

    /// Loads and validates a configuration from a JSON file.
    ///
    /// Missing keys fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] if the file cannot be read,
    /// [`ConfigError::Parse`] if it is not valid JSON, and
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|e| ConfigError::Load {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&data).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tempfile::tempdir;

    #[test]
    fn test_default_is_valid() {
        let config = CodecConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.buffer_capacity, DEFAULT_BUFFER_CAPACITY);
        assert_eq!(config.text_delimiter, ',');
        assert!(!config.json_pretty);
    }

    #[test]
    fn test_zero_buffer_rejected() {
        let err = CodecConfig::default()
            .with_buffer_capacity(0)
            .validate()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_colliding_delimiters_rejected() {
        for d in ['\n', '-', '.', '7', 'e', 't'] {
            let result = CodecConfig::default().with_text_delimiter(d).validate();
            assert!(result.is_err(), "delimiter {d:?} should be rejected");
        }
        for d in [',', ';', '\t', '|'] {
            let result = CodecConfig::default().with_text_delimiter(d).validate();
            assert!(result.is_ok(), "delimiter {d:?} should be accepted");
        }
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("codec.json");
        std::fs::write(&path, r#"{"text_delimiter": ";"}"#).unwrap();

        let config = CodecConfig::load(&path).unwrap();
        assert_eq!(config.text_delimiter, ';');
        assert_eq!(config.buffer_capacity, DEFAULT_BUFFER_CAPACITY);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let err = CodecConfig::load(dir.path().join("absent.json")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IoFailure);
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("codec.json");
        std::fs::write(&path, "not json").unwrap();

        let err = CodecConfig::load(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);
    }
}
