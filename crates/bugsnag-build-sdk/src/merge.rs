//! Combining manifest, git and explicit values into the final payload.
//!
//! Precedence, lowest to highest:
//!
//! 1. Manifest values
//! 2. Git values (`repository`, `branch`)
//! 3. Explicit [`Overrides`]
//!
//! An unset value at a higher level never clears a value from a lower one.

use crate::types::{BuildOptions, Overrides, overlay_field};

/// Merges the three option sources into one [`BuildOptions`].
///
/// Unset fields are simply absent from the result, so the output only ever
/// carries concrete values. The inputs are not modified and the result
/// depends only on them.
pub fn merge(manifest: &BuildOptions, git: &BuildOptions, overrides: &Overrides) -> BuildOptions {
    let mut options = manifest.clone();
    options.overlay(git);
    apply_overrides(&mut options, overrides);
    options
}

fn apply_overrides(options: &mut BuildOptions, overrides: &Overrides) {
    overlay_field(&mut options.api_key, &overrides.api_key);
    overlay_field(&mut options.app_version, &overrides.app_version);
    overlay_field(&mut options.release_stage, &overrides.release_stage);
    overlay_field(&mut options.repository, &overrides.repository);
    overlay_field(&mut options.revision, &overrides.revision);
    overlay_field(&mut options.provider, &overrides.provider);
}
