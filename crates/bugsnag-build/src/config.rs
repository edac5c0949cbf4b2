//! Settings file support for bugsnag-build.
//!
//! This module provides support for `bugsnag-build.toml` files that let a
//! project keep its notification settings next to the code instead of
//! repeating CLI flags in every CI job.
//!
//! ## Settings File Location
//!
//! The settings file is searched for in the following order:
//! 1. Current working directory (`./bugsnag-build.toml`)
//! 2. Parent directories (up to the repository root or filesystem root)
//!
//! ## Example Settings
//!
//! ```toml
//! [notify]
//! platform = "android"
//! config_file = "app/src/main/AndroidManifest.xml"
//! api_key = "${BUGSNAG_API_KEY}"
//! release_stage = "production"
//! endpoint = "https://build.bugsnag.com"
//! ```
//!
//! Values written as `${VAR}` are read from the environment when used.

use anyhow::{Context, Result};
use bugsnag_build_sdk::Platform;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// The default settings file name.
pub const CONFIG_FILE_NAME: &str = "bugsnag-build.toml";

/// Root structure of `bugsnag-build.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Notification settings.
    pub notify: NotifySettings,
}

/// The `[notify]` table.
///
/// Every field mirrors a `notify` flag of the same name. Flags given on the
/// command line take precedence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifySettings {
    /// Platform of the manifest in `config_file`.
    pub platform: Option<Platform>,

    /// AndroidManifest.xml or Info.plist location.
    ///
    /// Relative paths are resolved against the directory holding the
    /// settings file.
    pub config_file: Option<PathBuf>,

    /// Bugsnag API key.
    pub api_key: Option<String>,

    /// App version being built.
    pub app_version: Option<String>,

    /// Release stage being built, i.e. staging, production.
    pub release_stage: Option<String>,

    /// The git repository URL for this application.
    pub repository: Option<String>,

    /// The source control revision id.
    pub revision: Option<String>,

    /// Source control provider, only needed for on-premise services.
    pub provider: Option<String>,

    /// Build notification endpoint.
    pub endpoint: Option<String>,
}

impl BuildConfig {
    /// Loads settings from the specified file path.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {:?}", path))?;

        let config: BuildConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse settings file: {:?}", path))?;

        Ok(config)
    }

    /// Attempts to find and load settings starting from the specified
    /// directory and walking up until a settings file, a repository root or
    /// the filesystem root is reached.
    ///
    /// # Returns
    ///
    /// * `Ok(Some((config, path)))` - Found and loaded settings with their path
    /// * `Ok(None)` - No settings file found
    /// * `Err` - If a settings file was found but couldn't be parsed
    pub fn discover_from(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        match find_upwards(start_dir, CONFIG_FILE_NAME) {
            Some(path) => {
                let config = Self::load_from_file(&path)?;
                Ok(Some((config, path)))
            }
            None => Ok(None),
        }
    }

    /// Generates a starter settings file as a formatted TOML string.
    pub fn generate_starter_toml(platform: Platform) -> String {
        let config_file = match platform {
            Platform::Android => "app/src/main/AndroidManifest.xml",
            Platform::Ios | Platform::Mac => "Info.plist",
        };

        format!(
            r#"# bugsnag-build settings
# CLI flags override these settings when provided.

[notify]
# Platform of the manifest below: android, ios or mac
platform = "{platform}"

# AndroidManifest.xml / Info.plist location, relative to this file
config_file = "{config_file}"

# Bugsnag API key; read from the manifest when not set
# api_key = "${{BUGSNAG_API_KEY}}"

# Release stage being built, i.e. staging, production
# release_stage = "production"

# App version being built; read from the manifest on Android when not set
# app_version = "1.0.0"

# Source control details; the repository URL is read from git when not set
# repository = "https://github.com/example/app"
# revision = "${{GIT_COMMIT}}"
# provider = "github-enterprise"

# Build notification endpoint (default: {endpoint})
# endpoint = "{endpoint}"
"#,
            platform = platform,
            config_file = config_file,
            endpoint = bugsnag_build_sdk::DEFAULT_ENDPOINT,
        )
    }
}

/// Looks for `name` in `start_dir` and its parents, stopping at the first
/// directory that contains `.git`.
pub fn find_upwards(start_dir: &Path, name: &str) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        let candidate = current.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }

        // Stop at repository root or filesystem root
        if current.join(".git").exists() || !current.pop() {
            return None;
        }
    }
}

/// Settings resolver that merges settings file values with CLI arguments.
///
/// CLI arguments always take precedence over settings file values.
#[derive(Debug, Default)]
pub struct ConfigResolver {
    /// Loaded settings, if any.
    pub config: Option<BuildConfig>,

    /// Path to the loaded settings file, if any.
    pub config_path: Option<PathBuf>,
}

impl ConfigResolver {
    /// Creates a resolver by discovering settings from `start_dir`.
    pub fn discover(start_dir: &Path) -> Result<Self> {
        match BuildConfig::discover_from(start_dir)? {
            Some((config, path)) => Ok(Self {
                config: Some(config),
                config_path: Some(path),
            }),
            None => Ok(Self::default()),
        }
    }

    /// Creates a resolver from an explicitly named settings file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let config = BuildConfig::load_from_file(path)?;
        Ok(Self {
            config: Some(config),
            config_path: Some(path.to_path_buf()),
        })
    }

    fn notify(&self) -> Option<&NotifySettings> {
        self.config.as_ref().map(|c| &c.notify)
    }

    /// Returns the platform from settings.
    pub fn platform(&self) -> Option<Platform> {
        self.notify().and_then(|n| n.platform)
    }

    /// Returns the manifest path from settings, resolved against the
    /// settings file's directory.
    pub fn config_file(&self) -> Option<PathBuf> {
        let path = self.notify()?.config_file.as_ref()?;
        if path.is_absolute() {
            return Some(path.clone());
        }
        let base = self.config_path.as_deref().and_then(Path::parent);
        Some(match base {
            Some(dir) => dir.join(path),
            None => path.clone(),
        })
    }

    /// Resolves a string setting, preferring the CLI value and expanding
    /// `${VAR}` references in settings values.
    pub fn resolve_string<F>(&self, cli_value: Option<String>, getter: F) -> Result<Option<String>>
    where
        F: FnOnce(&NotifySettings) -> Option<&String>,
    {
        if cli_value.is_some() {
            return Ok(cli_value);
        }
        self.notify()
            .and_then(getter)
            .map(|raw| expand_env_var(raw))
            .transpose()
    }
}

/// Expands a value of the form `${VAR}` from the environment.
///
/// Any other value is returned unchanged.
pub fn expand_env_var(raw: &str) -> Result<String> {
    expand_with(raw, |name| env::var(name))
}

fn expand_with<F>(raw: &str, lookup: F) -> Result<String>
where
    F: FnOnce(&str) -> Result<String, env::VarError>,
{
    if let Some(stripped) = raw.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        let val = lookup(stripped)
            .with_context(|| format!("resolving env var {stripped} for bugsnag-build settings"))?;
        return Ok(val);
    }
    Ok(raw.to_string())
}
