//! Core types for bugsnag-build-sdk.
//!
//! This module defines the fundamental types used throughout the SDK:
//!
//! - [`NotifyError`] - Error types for extraction, validation and delivery
//! - [`Platform`] - Which manifest format the build produces
//! - [`BuildOptions`] - The payload fields sent to the build endpoint
//! - [`Overrides`] - Explicit values supplied by the caller
//! - [`GitRemoteInfo`] / [`GitLookup`] - Source control details
//! - [`NotifyOutcome`] - Result of a notification run

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Default build notification endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://build.bugsnag.com";

/// Error types for bugsnag-build-sdk operations.
///
/// Extraction and validation errors are raised before any request is made
/// to the notification endpoint. Git failures never appear here; they are
/// absorbed by the [`GitClient`](crate::git::GitClient) implementation.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The manifest file is missing or could not be parsed.
    #[error("{} file not found at {path:?}, please point to your {} file", .platform.manifest_name(), .platform.manifest_name())]
    ManifestNotFound {
        /// Platform whose manifest was requested
        platform: Platform,
        /// Path that was supplied
        path: PathBuf,
    },

    /// No API key could be resolved from the manifest or the overrides.
    #[error(
        "The build must be provided with a Bugsnag API key, through the configuration file or the api_key option"
    )]
    MissingApiKey,

    /// The endpoint is not an absolute http(s) URL.
    #[error("invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint {
        /// Endpoint as supplied
        endpoint: String,
        /// Why it was rejected
        reason: String,
    },

    /// Connection, TLS or timeout failure while posting the notification.
    #[error("failed to deliver build notification: {0}")]
    Network(#[from] reqwest::Error),

    /// The endpoint answered with a 4xx or 5xx status.
    #[error("build endpoint rejected the notification (status {status}): {body}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Response body, possibly empty
        body: String,
    },

    /// The payload could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Platform the build targets.
///
/// Android builds carry their metadata in `AndroidManifest.xml`; iOS and
/// macOS builds carry it in `Info.plist`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Android,
    Ios,
    Mac,
}

impl Platform {
    /// Returns the string representation of the platform.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Android => "android",
            Platform::Ios => "ios",
            Platform::Mac => "mac",
        }
    }

    /// File name users know the manifest by, used in error messages.
    pub fn manifest_name(&self) -> &'static str {
        match self {
            Platform::Android => "AndroidManifest.xml",
            Platform::Ios | Platform::Mac => "Info.plist",
        }
    }

    /// Guesses the platform from a manifest path's extension.
    ///
    /// `.xml` maps to Android and `.plist` to iOS. Anything else is `None`.
    pub fn infer(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "xml" => Some(Platform::Android),
            "plist" => Some(Platform::Ios),
            _ => None,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build metadata sent to the notification endpoint.
///
/// Each field is optional; `None` fields are left out of the JSON body
/// entirely rather than sent as `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

impl BuildOptions {
    /// Copies every field that is set in `other` over this one.
    ///
    /// Fields that are `None` in `other` leave the existing value alone.
    pub fn overlay(&mut self, other: &BuildOptions) {
        overlay_field(&mut self.api_key, &other.api_key);
        overlay_field(&mut self.app_version, &other.app_version);
        overlay_field(&mut self.release_stage, &other.release_stage);
        overlay_field(&mut self.repository, &other.repository);
        overlay_field(&mut self.revision, &other.revision);
        overlay_field(&mut self.provider, &other.provider);
        overlay_field(&mut self.branch, &other.branch);
    }

    /// Returns true if no field is set.
    pub fn is_empty(&self) -> bool {
        *self == BuildOptions::default()
    }
}

pub(crate) fn overlay_field(target: &mut Option<String>, source: &Option<String>) {
    if let Some(value) = source {
        *target = Some(value.clone());
    }
}

/// Values supplied explicitly by the caller.
///
/// These always win over anything read from the manifest or from git.
/// `branch` cannot be overridden.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub api_key: Option<String>,
    pub app_version: Option<String>,
    pub release_stage: Option<String>,
    pub repository: Option<String>,
    pub revision: Option<String>,
    pub provider: Option<String>,
}

/// Remote URL and branch read from the working copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitRemoteInfo {
    /// URL of the `origin` remote
    pub repository: Option<String>,
    /// Short name of the checked-out branch
    pub branch: Option<String>,
}

impl From<GitRemoteInfo> for BuildOptions {
    fn from(info: GitRemoteInfo) -> Self {
        BuildOptions {
            repository: info.repository,
            branch: info.branch,
            ..BuildOptions::default()
        }
    }
}

/// Result of inspecting a directory for a git repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitLookup {
    Found(GitRemoteInfo),
    NotFound,
}

impl GitLookup {
    /// Converts the lookup into build options, empty when nothing was found.
    pub fn into_options(self) -> BuildOptions {
        match self {
            GitLookup::Found(info) => info.into(),
            GitLookup::NotFound => BuildOptions::default(),
        }
    }
}

/// How a notification run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// The request was sent and answered with this status.
    Sent { status: u16 },
    /// Nothing was sent.
    DryRun,
}

/// Output of [`BuildNotifier::notify`](crate::BuildNotifier::notify).
#[derive(Debug, Clone)]
pub struct NotifyOutcome {
    /// Endpoint the payload was (or would have been) posted to
    pub endpoint: String,
    /// Final merged options
    pub options: BuildOptions,
    /// Serialized request body
    pub body: String,
    pub delivery: Delivery,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_only_present_fields() {
        let options = BuildOptions {
            api_key: Some("k1".into()),
            ..BuildOptions::default()
        };
        assert_eq!(serde_json::to_string(&options).unwrap(), r#"{"apiKey":"k1"}"#);
    }

    #[test]
    fn serializes_camel_case_keys() {
        let options = BuildOptions {
            api_key: Some("k".into()),
            app_version: Some("1.0".into()),
            release_stage: Some("beta".into()),
            repository: Some("git@example.com:a/b.git".into()),
            revision: Some("abc".into()),
            provider: Some("github".into()),
            branch: Some("main".into()),
        };
        let value: serde_json::Value = serde_json::to_value(&options).unwrap();
        let object = value.as_object().unwrap();
        let mut keys: Vec<_> = object.keys().cloned().collect();
        keys.sort();
        assert_eq!(
            keys,
            vec![
                "apiKey",
                "appVersion",
                "branch",
                "provider",
                "releaseStage",
                "repository",
                "revision"
            ]
        );
    }

    #[test]
    fn overlay_keeps_existing_values_for_unset_fields() {
        let mut base = BuildOptions {
            api_key: Some("k1".into()),
            app_version: Some("1.0".into()),
            ..BuildOptions::default()
        };
        let top = BuildOptions {
            app_version: Some("2.0".into()),
            branch: Some("main".into()),
            ..BuildOptions::default()
        };
        base.overlay(&top);
        assert_eq!(base.api_key.as_deref(), Some("k1"));
        assert_eq!(base.app_version.as_deref(), Some("2.0"));
        assert_eq!(base.branch.as_deref(), Some("main"));
    }

    #[test]
    fn infers_platform_from_extension() {
        assert_eq!(
            Platform::infer(Path::new("app/src/main/AndroidManifest.xml")),
            Some(Platform::Android)
        );
        assert_eq!(Platform::infer(Path::new("App/Info.PLIST")), Some(Platform::Ios));
        assert_eq!(Platform::infer(Path::new("build.gradle")), None);
        assert_eq!(Platform::infer(Path::new("Makefile")), None);
    }

    #[test]
    fn manifest_error_names_expected_file() {
        let err = NotifyError::ManifestNotFound {
            platform: Platform::Android,
            path: PathBuf::from("missing.xml"),
        };
        let message = err.to_string();
        assert!(message.contains("AndroidManifest.xml file not found"));
        assert!(message.contains("missing.xml"));
    }

    #[test]
    fn missing_git_lookup_yields_empty_options() {
        assert!(GitLookup::NotFound.into_options().is_empty());
    }
}
