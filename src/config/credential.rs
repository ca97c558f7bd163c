//! API token loading
//!
//! The token is read once at startup and handed to the HTTP client as an
//! opaque string.

use crate::ConfigError;
use std::path::Path;

/// Reads the personal access token from `path`
///
/// Surrounding whitespace (typically the trailing newline of the file) is
/// stripped; nothing else about the token is checked.
pub fn load_token(path: &Path) -> Result<String, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Credential {
        path: path.display().to_string(),
        source,
    })?;
    Ok(raw.trim().to_string())
}
