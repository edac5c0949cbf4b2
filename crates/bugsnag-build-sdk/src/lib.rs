//! Build notifications for Bugsnag.
//!
//! `bugsnag-build-sdk` tells the Bugsnag build API that a new Android, iOS
//! or macOS build exists, so crash reports can later be matched to the
//! build that produced them.
//!
//! # Architecture
//!
//! The SDK consists of several components:
//!
//! - **Manifest**: Reads `AndroidManifest.xml` metadata or `Info.plist` keys
//! - **Git**: Reads the origin URL and checked-out branch, if any
//! - **Merge**: Combines manifest, git and explicit values (explicit wins)
//! - **Validate**: Requires an API key before anything is sent
//! - **Notify**: Posts the JSON payload to the build endpoint
//!
//! Each external dependency (file parsing, git, HTTP) sits behind a trait so
//! [`BuildNotifier`] can be driven by fakes in tests.
//!
//! # Example
//!
//! ```ignore
//! use bugsnag_build_sdk::{BuildNotifier, NotifyParams, Overrides, Platform};
//!
//! fn main() -> Result<(), bugsnag_build_sdk::NotifyError> {
//!     let params = NotifyParams::new(Platform::Android, ".")
//!         .config_file("app/src/main/AndroidManifest.xml")
//!         .overrides(Overrides {
//!             release_stage: Some("production".to_string()),
//!             ..Overrides::default()
//!         });
//!
//!     let outcome = BuildNotifier::with_defaults()?.notify(&params)?;
//!     println!("sent {}", outcome.body);
//!     Ok(())
//! }
//! ```

// Public modules
pub mod git;
pub mod manifest;
pub mod merge;
pub mod notify;
pub mod pipeline;
pub mod types;
pub mod validate;

// Re-export key types for convenience
pub use git::{Git2Client, GitClient};
pub use manifest::{FileManifestParser, ManifestParser};
pub use merge::merge;
pub use notify::{HttpClient, HttpResponse, NotificationRequest, ReqwestHttpClient};
pub use pipeline::{BuildNotifier, NotifyParams};
pub use types::{
    BuildOptions, DEFAULT_ENDPOINT, Delivery, GitLookup, GitRemoteInfo, NotifyError,
    NotifyOutcome, Overrides, Platform,
};
pub use validate::{ValidatedOptions, validate};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
