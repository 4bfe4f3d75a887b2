// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Catalog publishing.
//!
//! Once the catalog file has been rewritten, the change is published through
//! version control: stage the catalog file, commit it, and push the commit to
//! the remote. Each of these stages can fail on its own, and callers need to
//! know exactly which one did. A failed push after a successful commit should
//! be retried with a push alone, never by committing again.
//!
//! The file mutation itself is already durable on disk before publishing
//! starts, so a publish failure never rolls anything back.
//!
//! # Version Control Access
//!
//! Publishing talks to version control through the [`VersionControl`]
//! capability, so that each failure stage can be simulated without a real
//! repository. [`GitCli`] is the real implementation.

pub mod git;

pub use git::{GitCli, GitError, Identity};

use async_trait::async_trait;
use serde::Serialize;
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::PathBuf,
};
use tracing::{info, instrument, warn};

/// Version control capabilities needed to publish the catalog.
#[async_trait]
pub trait VersionControl: Send + Sync + 'static {
    /// Check if a repository exists at the working directory.
    async fn has_repo(&self) -> bool;

    /// Stage target files.
    async fn stage(&self, files: &[PathBuf]) -> Result<(), GitError>;

    /// Check if the index differs from the last commit.
    async fn has_staged_changes(&self) -> Result<bool, GitError>;

    /// Configure a default committer identity if none is set.
    async fn ensure_identity(&self) -> Result<(), GitError>;

    /// Commit staged changes.
    async fn commit(&self, message: &str) -> Result<(), GitError>;

    /// Push committed changes to the remote.
    async fn push(&self) -> Result<(), GitError>;
}

/// Stage at which publishing failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishStage {
    /// No repository at the working directory.
    Repository,

    /// Catalog file could not be staged.
    Stage,

    /// Staged changes could not be committed.
    Commit,

    /// Commit could not be pushed to the remote.
    Push,
}

impl Display for PublishStage {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(match self {
            Self::Repository => "repository",
            Self::Stage => "stage",
            Self::Commit => "commit",
            Self::Push => "push",
        })
    }
}

/// Outcome of a publish attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishReport {
    /// Whether publishing went through to the end.
    pub success: bool,

    /// Stage that failed, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<PublishStage>,

    /// Nothing was staged, so no commit was made.
    #[serde(skip_serializing_if = "is_false")]
    pub skipped: bool,

    /// Local commit exists even though publishing failed.
    #[serde(skip_serializing_if = "is_false")]
    pub committed: bool,

    /// Diagnostic text of the failed stage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PublishReport {
    /// Everything was committed and pushed.
    pub fn published() -> Self {
        Self {
            success: true,
            stage: None,
            skipped: false,
            committed: false,
            error: None,
        }
    }

    /// Nothing changed, so nothing was committed.
    pub fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::published()
        }
    }

    /// Publishing failed at target stage.
    pub fn failed(stage: PublishStage, committed: bool, error: impl Into<String>) -> Self {
        Self {
            success: false,
            stage: Some(stage),
            skipped: false,
            committed,
            error: Some(error.into()),
        }
    }
}

fn is_false(value: &bool) -> bool {
    !value
}

/// Publish catalog changes through version control.
#[derive(Debug)]
pub struct Publisher<V = GitCli>
where
    V: VersionControl,
{
    vcs: V,
}

impl<V> Publisher<V>
where
    V: VersionControl,
{
    /// Construct new publisher.
    pub fn new(vcs: V) -> Self {
        Self { vcs }
    }

    /// Underlying version control access.
    pub fn vcs(&self) -> &V {
        &self.vcs
    }

    /// Stage, commit, and push target files.
    ///
    /// Stops at the first failing stage, and reports it. Staging that changes
    /// nothing skips the commit and push, and still counts as success.
    #[instrument(skip(self, files), level = "debug")]
    pub async fn publish(&self, message: &str, files: &[PathBuf]) -> PublishReport {
        if !self.vcs.has_repo().await {
            warn!("no git repository found, catalog change stays local");
            return PublishReport::failed(
                PublishStage::Repository,
                false,
                "no git repository found at working directory",
            );
        }

        if let Err(err) = self.vcs.stage(files).await {
            warn!("failed to stage catalog file: {err}");
            return PublishReport::failed(PublishStage::Stage, false, err.to_string());
        }

        match self.vcs.has_staged_changes().await {
            Ok(true) => {}
            Ok(false) => {
                info!("nothing staged, skip commit");
                return PublishReport::skipped();
            }
            Err(err) => {
                warn!("failed to inspect staged changes: {err}");
                return PublishReport::failed(PublishStage::Stage, false, err.to_string());
            }
        }

        // INVARIANT: Commits need an identity, even in fresh environments.
        let committed = match self.vcs.ensure_identity().await {
            Ok(()) => self.vcs.commit(message).await,
            Err(err) => Err(err),
        };
        if let Err(err) = committed {
            warn!("failed to commit catalog change: {err}");
            return PublishReport::failed(PublishStage::Commit, false, err.to_string());
        }
        info!("committed {message:?}");

        self.push_committed().await
    }

    /// Push already committed changes without committing again.
    #[instrument(skip(self), level = "debug")]
    pub async fn push(&self) -> PublishReport {
        if !self.vcs.has_repo().await {
            return PublishReport::failed(
                PublishStage::Repository,
                false,
                "no git repository found at working directory",
            );
        }

        self.push_committed().await
    }

    async fn push_committed(&self) -> PublishReport {
        match self.vcs.push().await {
            Ok(()) => {
                info!("pushed catalog change to remote");
                PublishReport::published()
            }
            Err(err) => {
                warn!("commit kept locally, push failed: {err}");
                PublishReport::failed(PublishStage::Push, true, err.to_string())
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::{fake::FakeVcs, *};
    use simple_test_case::test_case;

    fn files() -> Vec<PathBuf> {
        vec![PathBuf::from("src/components/Work.tsx")]
    }

    #[tokio::test]
    async fn publish_commits_and_pushes() {
        let publisher = Publisher::new(FakeVcs::default());
        let report = publisher.publish("Add reel: Demo", &files()).await;
        pretty_assertions::assert_eq!(report, PublishReport::published());
        pretty_assertions::assert_eq!(
            publisher.vcs().calls(),
            vec![
                "add src/components/Work.tsx".to_string(),
                "commit Add reel: Demo".to_string(),
                "push".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn publish_without_repository() {
        let publisher = Publisher::new(FakeVcs {
            missing_repo: true,
            ..FakeVcs::default()
        });
        let report = publisher.publish("Add reel: Demo", &files()).await;
        assert!(!report.success);
        pretty_assertions::assert_eq!(report.stage, Some(PublishStage::Repository));
        assert!(publisher.vcs().calls().is_empty());
    }

    #[tokio::test]
    async fn publish_skips_when_nothing_staged() {
        let publisher = Publisher::new(FakeVcs {
            nothing_staged: true,
            ..FakeVcs::default()
        });
        let report = publisher.publish("Reorder reels", &files()).await;
        pretty_assertions::assert_eq!(report, PublishReport::skipped());
        pretty_assertions::assert_eq!(
            publisher.vcs().calls(),
            vec!["add src/components/Work.tsx".to_string()]
        );
    }

    #[test_case(PublishStage::Stage, false, 1; "stage")]
    #[test_case(PublishStage::Commit, false, 2; "commit")]
    #[test_case(PublishStage::Push, true, 3; "push")]
    #[tokio::test]
    async fn publish_reports_failing_stage(stage: PublishStage, committed: bool, calls: usize) {
        let publisher = Publisher::new(FakeVcs::failing_at(stage));
        let report = publisher.publish("Remove reel: Demo", &files()).await;
        assert!(!report.success);
        pretty_assertions::assert_eq!(report.stage, Some(stage));
        pretty_assertions::assert_eq!(report.committed, committed);
        assert!(report.error.is_some());
        pretty_assertions::assert_eq!(publisher.vcs().calls().len(), calls);
    }

    #[tokio::test]
    async fn push_retry_does_not_commit_again() {
        let publisher = Publisher::new(FakeVcs::failing_at(PublishStage::Push));
        let report = publisher.publish("Add project: Demo", &files()).await;
        pretty_assertions::assert_eq!(report.stage, Some(PublishStage::Push));
        assert!(report.committed);

        publisher.vcs().fail_at(None);
        let report = publisher.push().await;
        pretty_assertions::assert_eq!(report, PublishReport::published());
        pretty_assertions::assert_eq!(
            publisher.vcs().calls(),
            vec![
                "add src/components/Work.tsx".to_string(),
                "commit Add project: Demo".to_string(),
                "push".to_string(),
                "push".to_string(),
            ]
        );
    }

    #[test]
    fn report_serializes_to_wire_shape() -> anyhow::Result<()> {
        let report = PublishReport::failed(PublishStage::Push, true, "no remote");
        pretty_assertions::assert_eq!(
            serde_json::to_value(&report)?,
            serde_json::json!({
                "success": false,
                "stage": "push",
                "committed": true,
                "error": "no remote",
            })
        );
        pretty_assertions::assert_eq!(
            serde_json::to_value(PublishReport::skipped())?,
            serde_json::json!({ "success": true, "skipped": true })
        );

        Ok(())
    }
}
