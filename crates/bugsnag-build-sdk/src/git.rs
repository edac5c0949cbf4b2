//! Source control inspection.
//!
//! The repository URL and current branch are read from the working copy
//! through the [`GitClient`] trait. A missing or unreadable repository is
//! not an error: the lookup reports [`GitLookup::NotFound`] and the build
//! is simply sent without source control details.

use crate::types::{BuildOptions, GitLookup, GitRemoteInfo};
use std::path::{Path, PathBuf};

/// Remote-tracking branch whose remote supplies the repository URL.
pub const TRACKING_BRANCH: &str = "origin/master";
/// Remote used when the tracking branch does not exist locally.
pub const DEFAULT_REMOTE: &str = "origin";

/// Reads source control details for a directory.
pub trait GitClient {
    fn lookup(&self, dir: &Path) -> GitLookup;
}

/// Failures while reading the repository.
///
/// These never leave this module; [`Git2Client::lookup`] turns them into
/// [`GitLookup::NotFound`].
#[derive(Debug, thiserror::Error)]
enum GitError {
    #[error("not a git repository: {path}")]
    NotARepo { path: PathBuf },

    #[error("bare repository not supported")]
    BareRepo,

    #[error("git error: {0}")]
    Internal(#[from] git2::Error),
}

/// [`GitClient`] backed by libgit2.
///
/// The repository is discovered by walking up from the given directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct Git2Client;

impl GitClient for Git2Client {
    fn lookup(&self, dir: &Path) -> GitLookup {
        match read_remote_info(dir) {
            Ok(info) => {
                tracing::debug!(?dir, ?info, "read git remote info");
                GitLookup::Found(info)
            }
            Err(err) => {
                tracing::debug!(?dir, %err, "skipping git details");
                GitLookup::NotFound
            }
        }
    }
}

/// Returns the git-derived build options for `dir`, empty when there is
/// no usable repository.
pub fn inspect<G: GitClient + ?Sized>(client: &G, dir: &Path) -> BuildOptions {
    client.lookup(dir).into_options()
}

fn read_remote_info(dir: &Path) -> Result<GitRemoteInfo, GitError> {
    let repo = git2::Repository::discover(dir).map_err(|_| GitError::NotARepo {
        path: dir.to_path_buf(),
    })?;
    if repo.is_bare() {
        return Err(GitError::BareRepo);
    }

    let repository = remote_url(&repo).unwrap_or_else(|err| {
        tracing::debug!(%err, "skipping remote url");
        None
    });
    Ok(GitRemoteInfo {
        repository,
        branch: current_branch(&repo)?,
    })
}

/// URL of the remote behind `origin/master`, falling back to `origin`.
fn remote_url(repo: &git2::Repository) -> Result<Option<String>, GitError> {
    let remote_name = match repo.find_branch(TRACKING_BRANCH, git2::BranchType::Remote) {
        Ok(branch) => match branch.get().name() {
            Some(refname) => repo
                .branch_remote_name(refname)
                .ok()
                .and_then(|buf| buf.as_str().map(String::from)),
            None => None,
        },
        Err(e) if e.code() == git2::ErrorCode::NotFound => None,
        Err(e) => return Err(e.into()),
    }
    .unwrap_or_else(|| DEFAULT_REMOTE.to_string());

    match repo.find_remote(&remote_name) {
        Ok(remote) => Ok(remote.url().map(String::from)),
        Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Short name of the checked-out branch; `None` when HEAD is detached.
fn current_branch(repo: &git2::Repository) -> Result<Option<String>, GitError> {
    let head = match repo.head() {
        Ok(h) => h,
        Err(e) if e.code() == git2::ErrorCode::UnbornBranch => {
            let head_ref = repo.find_reference("HEAD")?;
            return Ok(head_ref
                .symbolic_target()
                .and_then(|target| target.strip_prefix("refs/heads/"))
                .map(String::from));
        }
        Err(e) => return Err(e.into()),
    };

    if head.is_branch() {
        return Ok(head.shorthand().map(String::from));
    }

    Ok(None)
}
