// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::{RepoFixture, RepoKind};

use anyhow::Result;
use indoc::indoc;
use pretty_assertions::assert_eq;
use reelkeep::{
    config::ManagerConfig,
    publish::{PublishReport, PublishStage},
    service::{AddRequest, CatalogService, ReorderRequest, ServiceError},
};
use std::path::Path;

const CATALOG: &str = "src/components/Work.tsx";

const WORK: &str = indoc! {r#"
    const projects = [];

    const reels = [
      {
        title: "Football Highlight Reel",
        videoUrl: "https://streamable.com/l06h1d",
        embedId: "l06h1d",
        platform: "streamable",
        thumbnail: `https://cdn-cf-east.streamable.com/image/l06h1d.jpg`,
      },
    ];

    export default function Work() {
      return null;
    }
"#};

fn config(repo_root: &Path) -> ManagerConfig {
    let mut config = ManagerConfig::default();
    config.catalog.repo_root = repo_root.to_path_buf();
    config.catalog.file = CATALOG.into();
    config
}

fn add_reel(title: &str, embed_id: &str) -> AddRequest {
    AddRequest {
        category: "shortform".into(),
        title: title.into(),
        video_url: format!("https://streamable.com/{embed_id}"),
        embed_id: embed_id.into(),
        ..AddRequest::default()
    }
}

#[tokio::test]
async fn push_failure_then_push_retry_reaches_remote() -> Result<()> {
    let root = tempfile::tempdir()?;
    let work_dir = root.path().join("work");
    let work = RepoFixture::new(&work_dir, RepoKind::Normal)?;
    work.write_and_commit(CATALOG, WORK)?;
    let mut config = config(&work_dir);

    let service = CatalogService::from_config(&config);
    let report = match service.add(add_reel("Test", "abc123")).await {
        Err(ServiceError::Publish { report }) => report,
        other => panic!("expected publish failure, got {other:?}"),
    };
    assert_eq!(report.stage, Some(PublishStage::Push));
    assert!(report.committed);
    assert_eq!(work.head_message()?, "Add reel: Test");
    assert_eq!(service.list().await?.reels[0].embed_id, "abc123");

    let remote_dir = root.path().join("remote.git");
    let remote = RepoFixture::new(&remote_dir, RepoKind::Bare)?;
    work.repo()
        .remote("origin", remote_dir.to_string_lossy().as_ref())?;
    config.publish.remote = Some("origin".into());
    config.publish.branch = Some("main".into());

    let head = work.head_id()?;
    let service = CatalogService::from_config(&config);
    let report = service.push().await?;
    assert_eq!(report, PublishReport::published());
    assert_eq!(work.head_id()?, head);
    assert_eq!(remote.branch_id("main")?, Some(head));

    Ok(())
}

#[tokio::test]
async fn add_publishes_to_remote() -> Result<()> {
    let root = tempfile::tempdir()?;
    let work_dir = root.path().join("work");
    let remote_dir = root.path().join("remote.git");
    let work = RepoFixture::new(&work_dir, RepoKind::Normal)?;
    let remote = RepoFixture::new(&remote_dir, RepoKind::Bare)?;
    work.write_and_commit(CATALOG, WORK)?;
    work.repo()
        .remote("origin", remote_dir.to_string_lossy().as_ref())?;

    let mut config = config(&work_dir);
    config.publish.remote = Some("origin".into());
    config.publish.branch = Some("main".into());
    let service = CatalogService::from_config(&config);

    let response = service
        .add(AddRequest {
            category: "longform".into(),
            title: "Demo".into(),
            video_url: "https://streamable.com/ct2sog".into(),
            embed_id: "ct2sog".into(),
            video_category: Some("Spec Work".into()),
            ..AddRequest::default()
        })
        .await?;
    assert_eq!(response.git, Some(PublishReport::published()));
    assert_eq!(work.head_message()?, "Add project: Demo");
    assert_eq!(remote.branch_id("main")?, Some(work.head_id()?));

    // INVARIANT: Nothing changed, so nothing is committed.
    let head = work.head_id()?;
    let response = service
        .reorder(ReorderRequest {
            category: "projects".into(),
            order: vec!["ct2sog".into()],
        })
        .await?;
    assert_eq!(response.git, Some(PublishReport::skipped()));
    assert_eq!(work.head_id()?, head);

    Ok(())
}

#[tokio::test]
async fn add_outside_repository_keeps_file() -> Result<()> {
    let root = tempfile::tempdir()?;
    let catalog = root.path().join(CATALOG);
    std::fs::create_dir_all(catalog.parent().unwrap())?;
    std::fs::write(&catalog, WORK)?;

    let service = CatalogService::from_config(&config(root.path()));
    match service.add(add_reel("Test", "abc123")).await {
        Err(error @ ServiceError::Publish { .. }) => {
            assert!(error.file_updated());
            assert_eq!(
                error.report().and_then(|report| report.stage),
                Some(PublishStage::Repository)
            );
        }
        other => panic!("expected publish failure, got {other:?}"),
    }
    assert_eq!(service.list().await?.reels.len(), 2);

    Ok(())
}

#[tokio::test]
async fn add_without_publishing_leaves_history_alone() -> Result<()> {
    let root = tempfile::tempdir()?;
    let work = RepoFixture::new(root.path(), RepoKind::Normal)?;
    work.write_and_commit(CATALOG, WORK)?;
    let head = work.head_id()?;

    let mut config = config(root.path());
    config.publish.enabled = false;
    let service = CatalogService::from_config(&config);
    let response = service.add(add_reel("Test", "abc123")).await?;
    assert_eq!(response.git, None);
    assert_eq!(response.total_count, 2);
    assert_eq!(work.head_id()?, head);

    Ok(())
}
