//! End-to-end build notification.
//!
//! [`BuildNotifier`] runs the steps in order: read the manifest, inspect
//! git, merge with the explicit overrides, validate, then post. Everything
//! up to validation happens before any network traffic, so a missing API
//! key or a bad manifest never produces a request.

use crate::git::{self, Git2Client, GitClient};
use crate::manifest::{self, FileManifestParser, ManifestParser};
use crate::merge::merge;
use crate::notify::{self, HttpClient, NotificationRequest, ReqwestHttpClient};
use crate::types::{
    BuildOptions, DEFAULT_ENDPOINT, Delivery, NotifyError, NotifyOutcome, Overrides, Platform,
};
use crate::validate::validate;
use std::path::PathBuf;

/// Inputs for a single notification.
#[derive(Debug, Clone)]
pub struct NotifyParams {
    /// Platform whose manifest format applies to `config_file`
    pub platform: Platform,
    /// Manifest to read; skipped entirely when `None`
    pub config_file: Option<PathBuf>,
    /// Directory to inspect for a git repository
    pub working_dir: PathBuf,
    pub overrides: Overrides,
    pub endpoint: String,
}

impl NotifyParams {
    /// Creates parameters with no manifest, no overrides and the default
    /// endpoint.
    pub fn new(platform: Platform, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            platform,
            config_file: None,
            working_dir: working_dir.into(),
            overrides: Overrides::default(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    pub fn overrides(mut self, overrides: Overrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

/// Runs the notification pipeline with injectable collaborators.
pub struct BuildNotifier<M, G, H> {
    manifest: M,
    git: G,
    http: H,
    dry_run: bool,
}

impl BuildNotifier<FileManifestParser, Git2Client, ReqwestHttpClient> {
    /// Creates a notifier that reads real files, uses libgit2 and posts with
    /// reqwest.
    pub fn with_defaults() -> Result<Self, NotifyError> {
        Ok(Self::new(
            FileManifestParser,
            Git2Client,
            ReqwestHttpClient::new()?,
        ))
    }
}

impl<M, G, H> BuildNotifier<M, G, H>
where
    M: ManifestParser,
    G: GitClient,
    H: HttpClient,
{
    pub fn new(manifest: M, git: G, http: H) -> Self {
        Self {
            manifest,
            git,
            http,
            dry_run: false,
        }
    }

    /// Stops after building the request; nothing is sent.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Resolves the final options without validating or sending them.
    pub fn resolve(&self, params: &NotifyParams) -> Result<BuildOptions, NotifyError> {
        let from_manifest = match &params.config_file {
            Some(path) => manifest::read_manifest(&self.manifest, params.platform, path)?,
            None => BuildOptions::default(),
        };
        let from_git = git::inspect(&self.git, &params.working_dir);
        Ok(merge(&from_manifest, &from_git, &params.overrides))
    }

    /// Resolves, validates and sends the build notification.
    pub fn notify(&self, params: &NotifyParams) -> Result<NotifyOutcome, NotifyError> {
        let options = validate(self.resolve(params)?)?;
        let request = NotificationRequest::new(&params.endpoint, &options)?;

        let delivery = if self.dry_run {
            tracing::debug!(url = %request.url(), "dry run, not sending");
            Delivery::DryRun
        } else {
            let response = notify::send(&self.http, &request)?;
            Delivery::Sent {
                status: response.status,
            }
        };

        Ok(NotifyOutcome {
            endpoint: request.url().to_string(),
            body: request.body().to_string(),
            options: options.into_inner(),
            delivery,
        })
    }
}
