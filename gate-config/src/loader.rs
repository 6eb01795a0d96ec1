//! JSON configuration loaders.

use std::path::Path;

use crate::error::{ConfigError, ConfigResult};
use crate::schema::GateConfig;

impl GateConfig {
    /// Parses and validates a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed documents and
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_json_str(document: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(document)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses, and validates a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read, otherwise as
    /// [`GateConfig::from_json_str`].
    pub async fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let document = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let config = Self::from_json_str(&document)?;
        tracing::debug!(
            path = %path.display(),
            admins = config.admin_list.len(),
            "configuration loaded"
        );
        Ok(config)
    }
}
