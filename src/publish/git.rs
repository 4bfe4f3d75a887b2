// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Git access for publishing.
//!
//! Read-only inspection of the repository (does it exist, is anything staged,
//! is an identity configured) goes through libgit2. Staging, committing, and
//! pushing shell out to the Git binary, so that the user's hooks, credential
//! helpers, and remote settings apply exactly as they would on the command
//! line. Arguments are always passed as a discrete argument vector, never
//! through a shell, so titles and messages with shell metacharacters stay
//! inert.

use crate::publish::VersionControl;

use async_trait::async_trait;
use git2::Repository;
use std::{
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
};
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// Committer identity to fall back on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Value for `user.name`.
    pub name: String,

    /// Value for `user.email`.
    pub email: String,
}

impl Default for Identity {
    fn default() -> Self {
        Self {
            name: "Video Manager".into(),
            email: "video-manager@localhost".into(),
        }
    }
}

/// Version control through the Git binary and libgit2.
#[derive(Debug, Clone)]
pub struct GitCli {
    work_dir: PathBuf,
    remote: Option<String>,
    branch: Option<String>,
    identity: Identity,
}

impl GitCli {
    /// Construct new Git access rooted at target working directory.
    ///
    /// Pushes go to the current branch's upstream unless a remote is set with
    /// [`GitCli::with_remote`].
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            remote: None,
            branch: None,
            identity: Identity::default(),
        }
    }

    /// Push to target remote, optionally to a fixed branch.
    pub fn with_remote(mut self, remote: impl Into<String>, branch: Option<String>) -> Self {
        self.remote = Some(remote.into());
        self.branch = branch;
        self
    }

    /// Fall back on target identity when none is configured.
    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = identity;
        self
    }

    fn open(&self) -> Result<Repository> {
        Ok(Repository::discover(&self.work_dir)?)
    }

    fn push_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["push".into()];
        if let Some(remote) = &self.remote {
            args.push(remote.into());
            args.push(match &self.branch {
                Some(branch) => format!("HEAD:refs/heads/{branch}").into(),
                None => "HEAD".into(),
            });
        }

        args
    }

    async fn gitcall_non_interactive(
        &self,
        args: impl IntoIterator<Item = impl AsRef<OsStr>>,
    ) -> Result<String> {
        syscall_non_interactive(&self.work_dir, "git", args).await
    }
}

#[async_trait]
impl VersionControl for GitCli {
    async fn has_repo(&self) -> bool {
        self.open().is_ok()
    }

    #[instrument(skip(self), level = "debug")]
    async fn stage(&self, files: &[PathBuf]) -> Result<()> {
        let mut args: Vec<OsString> = vec!["add".into(), "--".into()];
        args.extend(files.iter().map(|file| file.as_os_str().to_owned()));
        let output = self.gitcall_non_interactive(args).await?;
        debug!("git add: {output}");

        Ok(())
    }

    async fn has_staged_changes(&self) -> Result<bool> {
        let repository = self.open()?;

        // INVARIANT: Unborn HEAD compares the index against an empty tree.
        let head_tree = repository
            .head()
            .ok()
            .and_then(|head| head.peel_to_tree().ok());
        let index = repository.index()?;
        let diff = repository.diff_tree_to_index(head_tree.as_ref(), Some(&index), None)?;

        Ok(diff.deltas().len() > 0)
    }

    #[instrument(skip(self), level = "debug")]
    async fn ensure_identity(&self) -> Result<()> {
        let repository = self.open()?;
        let mut config = repository.config()?;

        if config.get_string("user.name").is_err() {
            info!("no committer name configured, use {:?}", self.identity.name);
            config.set_str("user.name", &self.identity.name)?;
        }

        if config.get_string("user.email").is_err() {
            info!("no committer email configured, use {:?}", self.identity.email);
            config.set_str("user.email", &self.identity.email)?;
        }

        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn commit(&self, message: &str) -> Result<()> {
        let output = self.gitcall_non_interactive(["commit", "-m", message]).await?;
        debug!("git commit: {output}");

        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn push(&self) -> Result<()> {
        let output = self.gitcall_non_interactive(self.push_args()).await?;
        debug!("git push: {output}");

        Ok(())
    }
}

async fn syscall_non_interactive(
    work_dir: &Path,
    cmd: impl AsRef<OsStr>,
    args: impl IntoIterator<Item = impl AsRef<OsStr>>,
) -> Result<String> {
    let args = args
        .into_iter()
        .map(|arg| arg.as_ref().to_owned())
        .collect::<Vec<_>>();
    let command = std::iter::once(cmd.as_ref())
        .chain(args.iter().map(OsString::as_os_str))
        .map(OsStr::to_string_lossy)
        .collect::<Vec<_>>()
        .join(" ");

    // INVARIANT: Never block on a credential prompt.
    let output = Command::new(cmd.as_ref())
        .args(&args)
        .current_dir(work_dir)
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()
        .await
        .map_err(|err| GitError::Spawn {
            source: err,
            command: command.clone(),
        })?;

    let stdout = String::from_utf8_lossy(output.stdout.as_slice()).into_owned();
    let stderr = String::from_utf8_lossy(output.stderr.as_slice()).into_owned();
    let mut message = String::new();

    if !stdout.is_empty() {
        message.push_str(format!("stdout: {stdout}").as_str());
    }

    if !stderr.is_empty() {
        message.push_str(format!("stderr: {stderr}").as_str());
    }

    // INVARIANT: Chomp trailing newlines.
    let message = message
        .strip_suffix("\r\n")
        .or(message.strip_suffix('\n'))
        .map(ToString::to_string)
        .unwrap_or(message);

    if !output.status.success() {
        return Err(GitError::Syscall { command, message });
    }

    Ok(message)
}

/// Git access error types.
#[derive(Debug, thiserror::Error)]
pub enum GitError {
    /// Operations from libgit2 fail.
    #[error(transparent)]
    Git2(#[from] git2::Error),

    /// Git binary cannot be started.
    #[error("failed to run {command:?}")]
    Spawn {
        #[source]
        source: std::io::Error,
        command: String,
    },

    /// Git binary exits with failure.
    #[error("command {command:?} failed:\n{message}")]
    Syscall { command: String, message: String },
}

/// Friendly result alias :3
type Result<T, E = GitError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;

    #[test]
    fn push_args_follow_remote_settings() {
        let git = GitCli::new(".");
        assert_eq!(git.push_args(), vec![OsString::from("push")]);

        let git = GitCli::new(".").with_remote("origin", None);
        assert_eq!(
            git.push_args(),
            vec![OsString::from("push"), "origin".into(), "HEAD".into()]
        );

        let git = GitCli::new(".").with_remote("origin", Some("main".into()));
        assert_eq!(
            git.push_args(),
            vec![
                OsString::from("push"),
                "origin".into(),
                "HEAD:refs/heads/main".into()
            ]
        );
    }

    #[tokio::test]
    async fn has_repo_outside_repository() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let git = GitCli::new(dir.path());
        assert!(!git.has_repo().await);
        assert!(matches!(git.has_staged_changes().await, Err(GitError::Git2(_))));

        Ok(())
    }

    #[sealed_test(env = [
        ("HOME", "/nonexistent/home"),
        ("XDG_CONFIG_HOME", "/nonexistent/xdg")
    ])]
    fn ensure_identity_sets_missing_values() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let repository = Repository::init(dir.path())?;
        let identity = Identity {
            name: "Portfolio Bot".into(),
            email: "bot@portfolio.test".into(),
        };
        let git = GitCli::new(dir.path()).with_identity(identity);
        runtime()?.block_on(git.ensure_identity())?;

        let config = repository.config()?.snapshot()?;
        assert_eq!(config.get_str("user.name")?, "Portfolio Bot");
        assert_eq!(config.get_str("user.email")?, "bot@portfolio.test");

        Ok(())
    }

    #[sealed_test(env = [
        ("HOME", "/nonexistent/home"),
        ("XDG_CONFIG_HOME", "/nonexistent/xdg")
    ])]
    fn ensure_identity_keeps_configured_values() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let repository = Repository::init(dir.path())?;
        let mut config = repository.config()?;
        config.set_str("user.name", "Jane Editor")?;
        config.set_str("user.email", "jane@editor.test")?;

        let git = GitCli::new(dir.path());
        runtime()?.block_on(git.ensure_identity())?;

        let config = repository.config()?.snapshot()?;
        assert_eq!(config.get_str("user.name")?, "Jane Editor");
        assert_eq!(config.get_str("user.email")?, "jane@editor.test");

        Ok(())
    }

    fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
    }
}
