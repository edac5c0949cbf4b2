//! Info.plist extraction
//!
//! Apple builds only carry the API key, stored under `BugsnagAPIKey`.

use crate::types::{BuildOptions, NotifyError, Platform};
use std::path::Path;

/// Property list entry holding the API key.
pub const API_KEY_ENTRY: &str = "BugsnagAPIKey";

/// Reads a top-level string entry from a property list file.
///
/// Both XML and binary property lists are accepted.
pub fn read_string(
    platform: Platform,
    path: &Path,
    key: &str,
) -> Result<Option<String>, NotifyError> {
    let value = plist::Value::from_file(path).map_err(|err| {
        tracing::debug!(?path, %err, "cannot read property list");
        NotifyError::ManifestNotFound {
            platform,
            path: path.to_path_buf(),
        }
    })?;

    Ok(value
        .as_dictionary()
        .and_then(|dict| dict.get(key))
        .and_then(plist::Value::as_string)
        .map(str::to_string))
}

/// Builds options from the API key found in the property list.
pub fn options_from_api_key(api_key: Option<String>) -> BuildOptions {
    BuildOptions {
        api_key,
        ..BuildOptions::default()
    }
}
