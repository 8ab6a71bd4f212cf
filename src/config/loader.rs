//! Profile pack loader.
//!
//! Loading pipeline:
//! 1. Read the YAML file
//! 2. Deserialize to [`ProfilePack`]
//! 3. Validate (all issues collected, warnings logged)
//! 4. Merge into a [`ProfileCatalog`]
//!
//! Validation and merging live in [`crate::config::validation`] and
//! [`crate::profile::catalog`]; this module owns the file-facing steps.

use std::path::Path;

use tracing::info;

use crate::config::ProfilePack;
use crate::error::ConfigError;
use crate::profile::catalog::ProfileCatalog;

/// Reads and parses a profile pack from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError::MissingFile` if the path does not exist and
/// `ConfigError::ParseError` if the YAML fails to deserialize.
pub fn load_pack(path: &Path) -> Result<ProfilePack, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::MissingFile {
            path: path.to_path_buf(),
        });
    }
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    serde_yaml::from_str(&raw).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Builds a catalog from the builtin packs plus any extra pack files.
///
/// Extra packs may reference profiles defined by the builtin packs and may
/// not redefine existing cargo keys or profile keys.
///
/// # Errors
///
/// Returns the first `ConfigError` encountered while loading or merging.
pub fn load_catalog<P: AsRef<Path>>(extra_packs: &[P]) -> Result<ProfileCatalog, ConfigError> {
    let mut catalog = ProfileCatalog::builtin()?;
    for path in extra_packs {
        let path = path.as_ref();
        let pack = load_pack(path)?;
        let name = path.display().to_string();
        catalog.merge_pack(&name, pack)?;
        info!(pack = %name, "profile pack loaded");
    }
    Ok(catalog)
}

// ============================================================================
// Tests
// ============================================================================
