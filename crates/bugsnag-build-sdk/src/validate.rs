//! Payload validation.

use crate::types::{BuildOptions, NotifyError};
use std::ops::Deref;

/// Build options known to carry an API key.
///
/// Only [`validate`] creates this type, and a
/// [`NotificationRequest`](crate::notify::NotificationRequest) can only be
/// built from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedOptions(BuildOptions);

impl ValidatedOptions {
    pub fn into_inner(self) -> BuildOptions {
        self.0
    }
}

impl Deref for ValidatedOptions {
    type Target = BuildOptions;

    fn deref(&self) -> &BuildOptions {
        &self.0
    }
}

/// Checks that the merged options carry an API key.
pub fn validate(options: BuildOptions) -> Result<ValidatedOptions, NotifyError> {
    if options.api_key.is_none() {
        return Err(NotifyError::MissingApiKey);
    }
    Ok(ValidatedOptions(options))
}
