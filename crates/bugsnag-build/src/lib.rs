//! # bugsnag-build
//!
//! Command-line tool that notifies Bugsnag of a new Android, iOS or macOS
//! build, so crash reports can be matched to the build that produced them.
//!
//! ## Installation
//!
//! ```bash
//! cargo install bugsnag-build
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! # Write a starter settings file
//! bugsnag-build init --platform android
//!
//! # Notify using the API key from AndroidManifest.xml
//! bugsnag-build notify --config-file app/src/main/AndroidManifest.xml
//!
//! # Notify with explicit values and no manifest
//! bugsnag-build notify --api-key $BUGSNAG_API_KEY --app-version 1.4.0 \
//!     --release-stage production --revision $GIT_COMMIT
//!
//! # Show the payload without sending it
//! bugsnag-build notify --config-file Info.plist --dry-run
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `notify` | Send a build notification |
//! | `init` | Write a starter `bugsnag-build.toml` |
//!
//! ## Where values come from
//!
//! Each field of the payload is taken from, lowest precedence first:
//!
//! 1. The manifest given by `--config-file`
//! 2. The git repository in the working directory (`repository`, `branch`)
//! 3. `bugsnag-build.toml`
//! 4. Command-line flags (and `BUGSNAG_API_KEY` for `--api-key`)
//!
//! A `.env.local` file at the repository root is loaded before flags are
//! parsed.
//!
//! ## Global Flags
//!
//! - **`--verbose` / `-v`** - Print debug diagnostics (also `RUST_LOG`)

use anyhow::{Context, Result, bail};
use bugsnag_build_sdk::{
    BuildNotifier, DEFAULT_ENDPOINT, Delivery, NotifyOutcome, NotifyParams, Overrides, Platform,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::env;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

pub mod config;

use config::{BuildConfig, CONFIG_FILE_NAME, ConfigResolver};

/// Notify Bugsnag of application builds.
#[derive(Parser, Debug)]
#[command(name = "bugsnag-build", author, version, about = "Notifies Bugsnag of a build", long_about = None)]
struct Cli {
    /// Print verbose output including resolved values
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send a build notification to Bugsnag.
    Notify(NotifyArgs),
    /// Write a starter settings file.
    Init {
        #[arg(long, default_value = CONFIG_FILE_NAME)]
        output: PathBuf,
        #[arg(long, value_enum, default_value_t = PlatformArg::Android)]
        platform: PlatformArg,
        #[arg(long, help = "Overwrite an existing file")]
        force: bool,
    },
}

#[derive(Args, Debug, Default)]
struct NotifyArgs {
    #[arg(
        long,
        value_enum,
        help = "Platform of the manifest (inferred from its extension when omitted)"
    )]
    platform: Option<PlatformArg>,
    #[arg(long, help = "AndroidManifest.xml/Info.plist location")]
    config_file: Option<PathBuf>,
    #[arg(long, env = "BUGSNAG_API_KEY", hide_env_values = true, help = "Bugsnag API key")]
    api_key: Option<String>,
    #[arg(long, help = "App version being built")]
    app_version: Option<String>,
    #[arg(long, help = "Release stage being built, i.e. staging, production")]
    release_stage: Option<String>,
    #[arg(long, help = "The git repository URL for this application")]
    repository: Option<String>,
    #[arg(long, help = "The source control revision id")]
    revision: Option<String>,
    #[arg(
        long,
        help = "The name of the source control provider, only required for on-premise services"
    )]
    provider: Option<String>,
    #[arg(long, help = "Bugsnag build endpoint [default: https://build.bugsnag.com]")]
    endpoint: Option<String>,
    #[arg(long, help = "Path to a bugsnag-build.toml settings file")]
    settings: Option<PathBuf>,
    #[arg(long, help = "Resolve and print the payload without sending it")]
    dry_run: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
#[clap(rename_all = "lowercase")]
enum PlatformArg {
    Android,
    Ios,
    Mac,
}

impl From<PlatformArg> for Platform {
    fn from(platform: PlatformArg) -> Self {
        match platform {
            PlatformArg::Android => Platform::Android,
            PlatformArg::Ios => Platform::Ios,
            PlatformArg::Mac => Platform::Mac,
        }
    }
}

pub fn run() -> Result<()> {
    load_dotenv();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Notify(args) => cmd_notify(args, cli.verbose),
        Command::Init {
            output,
            platform,
            force,
        } => cmd_init(&output, platform.into(), force),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn load_dotenv() {
    let Ok(cwd) = env::current_dir() else {
        return;
    };
    if let Some(path) = config::find_upwards(&cwd, ".env.local") {
        let _ = dotenvy::from_path(path);
    }
}

fn cmd_notify(args: NotifyArgs, verbose: bool) -> Result<()> {
    let cwd = env::current_dir().context("resolving current directory")?;
    let resolver = match &args.settings {
        Some(path) => ConfigResolver::from_path(path)?,
        None => ConfigResolver::discover(&cwd)?,
    };
    if let Some(path) = &resolver.config_path {
        println!("Using settings from {:?}", path);
    }

    let dry_run = args.dry_run;
    let params = resolve_params(args, &resolver, &cwd)?;
    tracing::debug!(?params, "resolved notify parameters");
    if verbose {
        match &params.config_file {
            Some(path) => println!("Reading {} manifest at {:?}", params.platform, path),
            None => println!("No manifest configured, skipping manifest values"),
        }
        println!("Endpoint: {}", params.endpoint);
    }

    let notifier = BuildNotifier::with_defaults()
        .context("building HTTP client")?
        .dry_run(dry_run);
    let outcome = notifier.notify(&params)?;
    report(&outcome, verbose)
}

/// Combines CLI arguments and settings into notifier parameters.
fn resolve_params(args: NotifyArgs, resolver: &ConfigResolver, cwd: &Path) -> Result<NotifyParams> {
    let overrides = Overrides {
        api_key: resolver.resolve_string(args.api_key, |n| n.api_key.as_ref())?,
        app_version: resolver.resolve_string(args.app_version, |n| n.app_version.as_ref())?,
        release_stage: resolver.resolve_string(args.release_stage, |n| n.release_stage.as_ref())?,
        repository: resolver.resolve_string(args.repository, |n| n.repository.as_ref())?,
        revision: resolver.resolve_string(args.revision, |n| n.revision.as_ref())?,
        provider: resolver.resolve_string(args.provider, |n| n.provider.as_ref())?,
    };
    let endpoint = resolver
        .resolve_string(args.endpoint, |n| n.endpoint.as_ref())?
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
    let config_file = args.config_file.or_else(|| resolver.config_file());
    let platform = resolve_platform(
        args.platform.map(Platform::from).or(resolver.platform()),
        config_file.as_deref(),
    )?;

    let mut params = NotifyParams::new(platform, cwd)
        .overrides(overrides)
        .endpoint(endpoint);
    params.config_file = config_file;
    Ok(params)
}

/// Picks the manifest platform: explicit value first, then the manifest's
/// extension. Without a manifest the platform does not matter.
fn resolve_platform(explicit: Option<Platform>, config_file: Option<&Path>) -> Result<Platform> {
    if let Some(platform) = explicit {
        return Ok(platform);
    }
    match config_file {
        None => Ok(Platform::Android),
        Some(path) => match Platform::infer(path) {
            Some(platform) => Ok(platform),
            None => bail!(
                "cannot tell the platform of {:?}; pass --platform android, ios or mac",
                path
            ),
        },
    }
}

fn report(outcome: &NotifyOutcome, verbose: bool) -> Result<()> {
    match outcome.delivery {
        Delivery::DryRun => {
            println!("Dry run: would POST to {}", outcome.endpoint);
            println!(
                "{}",
                serde_json::to_string_pretty(&outcome.options).context("formatting payload")?
            );
        }
        Delivery::Sent { .. } => {
            if verbose {
                println!("Payload: {}", outcome.body);
            }
        }
    }
    Ok(())
}

fn cmd_init(output: &Path, platform: Platform, force: bool) -> Result<()> {
    if output.exists() && !force {
        bail!(
            "refusing to overwrite existing file {:?}; pass --force to replace it",
            output
        );
    }
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {:?}", parent))?;
    }
    std::fs::write(output, BuildConfig::generate_starter_toml(platform))
        .with_context(|| format!("writing settings file {:?}", output))?;
    println!("Wrote starter settings to {:?}", output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::NotifySettings;
    use tempfile::TempDir;

    fn settings(notify: NotifySettings, path: &str) -> ConfigResolver {
        ConfigResolver {
            config: Some(BuildConfig { notify }),
            config_path: Some(PathBuf::from(path)),
        }
    }

    #[test]
    fn parses_notify_flags() {
        let cli = Cli::try_parse_from([
            "bugsnag-build",
            "notify",
            "--platform",
            "ios",
            "--config-file",
            "App/Info.plist",
            "--api-key",
            "k1",
            "--release-stage",
            "beta",
            "--dry-run",
        ])
        .unwrap();
        match cli.command {
            Command::Notify(args) => {
                assert_eq!(args.platform, Some(PlatformArg::Ios));
                assert_eq!(args.config_file, Some(PathBuf::from("App/Info.plist")));
                assert_eq!(args.api_key.as_deref(), Some("k1"));
                assert_eq!(args.release_stage.as_deref(), Some("beta"));
                assert!(args.dry_run);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::try_parse_from(["bugsnag-build", "notify", "-v"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn cli_values_override_settings() {
        let resolver = settings(
            NotifySettings {
                api_key: Some("from-file".into()),
                release_stage: Some("staging".into()),
                endpoint: Some("https://builds.example.com".into()),
                ..NotifySettings::default()
            },
            "/work/bugsnag-build.toml",
        );
        let args = NotifyArgs {
            api_key: Some("from-cli".into()),
            ..NotifyArgs::default()
        };

        let params = resolve_params(args, &resolver, Path::new("/work")).unwrap();
        assert_eq!(params.overrides.api_key.as_deref(), Some("from-cli"));
        assert_eq!(params.overrides.release_stage.as_deref(), Some("staging"));
        assert_eq!(params.endpoint, "https://builds.example.com");
        assert_eq!(params.working_dir, PathBuf::from("/work"));
        assert!(params.config_file.is_none());
    }

    #[test]
    fn defaults_without_settings() {
        let params =
            resolve_params(NotifyArgs::default(), &ConfigResolver::default(), Path::new("."))
                .unwrap();
        assert_eq!(params.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(params.overrides, Overrides::default());
        assert_eq!(params.platform, Platform::Android);
    }

    #[test]
    fn manifest_from_settings_resolves_platform() {
        let resolver = settings(
            NotifySettings {
                config_file: Some("ios/App/Info.plist".into()),
                ..NotifySettings::default()
            },
            "/work/bugsnag-build.toml",
        );
        let params = resolve_params(NotifyArgs::default(), &resolver, Path::new("/work")).unwrap();
        assert_eq!(
            params.config_file,
            Some(PathBuf::from("/work/ios/App/Info.plist"))
        );
        assert_eq!(params.platform, Platform::Ios);
    }

    #[test]
    fn explicit_platform_wins_over_extension() {
        assert_eq!(
            resolve_platform(Some(Platform::Mac), Some(Path::new("Info.plist"))).unwrap(),
            Platform::Mac
        );
        assert_eq!(
            resolve_platform(None, Some(Path::new("AndroidManifest.xml"))).unwrap(),
            Platform::Android
        );
    }

    #[test]
    fn unknown_manifest_extension_needs_platform() {
        let err = resolve_platform(None, Some(Path::new("manifest.json"))).unwrap_err();
        assert!(err.to_string().contains("--platform"));
    }

    #[test]
    fn init_writes_starter_settings() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("nested").join(CONFIG_FILE_NAME);

        cmd_init(&output, Platform::Ios, false).unwrap();
        let config = BuildConfig::load_from_file(&output).unwrap();
        assert_eq!(config.notify.platform, Some(Platform::Ios));

        let err = cmd_init(&output, Platform::Ios, false).unwrap_err();
        assert!(err.to_string().contains("--force"));
        cmd_init(&output, Platform::Android, true).unwrap();
    }

    #[test]
    fn starter_settings_leave_api_key_to_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join(CONFIG_FILE_NAME);
        cmd_init(&output, Platform::Android, false).unwrap();

        let resolver = ConfigResolver::from_path(&output).unwrap();
        let args = NotifyArgs {
            config_file: Some(PathBuf::from("AndroidManifest.xml")),
            ..NotifyArgs::default()
        };
        let params = resolve_params(args, &resolver, temp_dir.path()).unwrap();
        assert_eq!(params.overrides.api_key, None);
        assert_eq!(params.config_file, Some(PathBuf::from("AndroidManifest.xml")));
        assert_eq!(params.platform, Platform::Android);
    }
}
