// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Catalog request handling.
//!
//! Every mutating request runs through the same sequence. The request is
//! validated, the catalog file is mutated and written, the change is
//! published, and a response is built. Validation failures never touch the
//! catalog file. Publish failures happen after the file was written, so they
//! are reported as such and never undo the write.
//!
//! # Concurrency
//!
//! One service instance owns one catalog file. The whole
//! mutate-then-publish cycle runs under a single async lock, so requests
//! handled by the same process never interleave. Other processes writing
//! the same file are not guarded against.

use crate::{
    catalog::{Catalog, Collection, ValidationError, VideoRecord},
    config::{InsertAt, ManagerConfig},
    publish::{GitCli, PublishReport, Publisher, VersionControl},
    store::{CatalogStore, StoreError},
};

use serde::{Deserialize, Serialize};
use std::{collections::HashSet, path::PathBuf};
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

/// Add a video to a collection.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddRequest {
    /// Target collection, e.g., `longform` or `shortform`.
    #[serde(default)]
    pub category: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub video_url: String,

    #[serde(default)]
    pub embed_id: String,

    /// Thumbnail override, derived from the embed identifier if absent.
    #[serde(default)]
    pub thumbnail: Option<String>,

    /// Category label of a long-form video.
    #[serde(default)]
    pub video_category: Option<String>,
}

/// Remove a video from a collection.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequest {
    #[serde(default)]
    pub category: String,

    #[serde(default)]
    pub embed_id: String,
}

/// Rearrange a collection.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderRequest {
    #[serde(default)]
    pub category: String,

    /// Embed identifiers to move to the front, in order.
    #[serde(default)]
    pub order: Vec<String>,
}

/// Both collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListResponse {
    pub success: bool,
    pub projects: Vec<VideoRecord>,
    pub reels: Vec<VideoRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddResponse {
    pub success: bool,
    pub message: String,
    pub category: Collection,
    pub total_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git: Option<PublishReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,

    /// Title of the removed record.
    pub title: String,

    /// Records left in the collection.
    pub remaining: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git: Option<PublishReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderResponse {
    pub success: bool,
    pub message: String,
    pub total_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git: Option<PublishReport>,
}

/// Handle catalog requests against one catalog file.
#[derive(Debug)]
pub struct CatalogService<V = GitCli>
where
    V: VersionControl,
{
    store: CatalogStore,
    tracked_file: PathBuf,
    publisher: Option<Publisher<V>>,
    insert_at: InsertAt,
    lock: Mutex<()>,
}

impl CatalogService<GitCli> {
    /// Construct new service from configuration.
    ///
    /// Publishing goes through the Git binary at the configured repository
    /// root, unless disabled.
    pub fn from_config(config: &ManagerConfig) -> Self {
        let publisher = config
            .publish
            .enabled
            .then(|| Publisher::new(config.git()));

        Self::new(
            CatalogStore::new(config.catalog_path()),
            &config.catalog.file,
            publisher,
        )
        .with_insert_at(config.catalog.insert_at)
    }
}

impl<V> CatalogService<V>
where
    V: VersionControl,
{
    /// Construct new service.
    ///
    /// The tracked file is the catalog file path as handed to version control
    /// when staging. A missing publisher disables publishing.
    pub fn new(
        store: CatalogStore,
        tracked_file: impl Into<PathBuf>,
        publisher: Option<Publisher<V>>,
    ) -> Self {
        Self {
            store,
            tracked_file: tracked_file.into(),
            publisher,
            insert_at: InsertAt::default(),
            lock: Mutex::new(()),
        }
    }

    /// Insert new records at target position.
    pub fn with_insert_at(mut self, insert_at: InsertAt) -> Self {
        self.insert_at = insert_at;
        self
    }

    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    pub fn publisher(&self) -> Option<&Publisher<V>> {
        self.publisher.as_ref()
    }

    /// List both collections.
    ///
    /// # Errors
    ///
    /// - Return [`ServiceError::Store`] if catalog file cannot be read or
    ///   parsed.
    #[instrument(skip(self), level = "debug")]
    pub async fn list(&self) -> Result<ListResponse> {
        let Catalog { projects, reels } = self.store.list().await?;
        Ok(ListResponse {
            success: true,
            projects,
            reels,
        })
    }

    /// Add a video to a collection, then publish.
    ///
    /// # Errors
    ///
    /// - Return [`ServiceError::Validation`] if request is invalid.
    /// - Return [`ServiceError::Duplicate`] if embed identifier is already in
    ///   the collection.
    /// - Return [`ServiceError::Store`] if catalog file cannot be updated.
    /// - Return [`ServiceError::Publish`] if catalog file was updated but
    ///   publishing failed.
    #[instrument(skip(self), level = "debug")]
    pub async fn add(&self, request: AddRequest) -> Result<AddResponse> {
        let collection: Collection = request.category.parse()?;
        let record = VideoRecord::new(
            collection,
            request.title.trim(),
            request.video_url.trim(),
            request.embed_id.trim(),
            request.thumbnail.map(|thumbnail| thumbnail.trim().to_string()),
            request
                .video_category
                .map(|category| category.trim().to_string()),
        );
        record.validate(collection)?;

        let _guard = self.lock.lock().await;
        let title = record.title.clone();
        let insert_at = self.insert_at;
        let mutation = self
            .store
            .mutate(collection, |records| {
                if records.iter().any(|entry| entry.embed_id == record.embed_id) {
                    return Err(ServiceError::Duplicate {
                        collection,
                        embed_id: record.embed_id,
                    });
                }

                match insert_at {
                    InsertAt::Top => records.insert(0, record),
                    InsertAt::Bottom => records.push(record),
                }

                Ok(())
            })
            .await?;
        info!("added {title:?} to {collection}");

        let git = self
            .publish(format!("Add {}: {title}", collection.noun()))
            .await?;

        Ok(AddResponse {
            success: true,
            message: format!("Video {title:?} added to {collection}"),
            category: collection,
            total_count: mutation.records.len(),
            git,
        })
    }

    /// Remove a video from a collection, then publish.
    ///
    /// # Errors
    ///
    /// - Return [`ServiceError::Validation`] if request is invalid.
    /// - Return [`ServiceError::NotFound`] if embed identifier is not in the
    ///   collection.
    /// - Return [`ServiceError::Store`] if catalog file cannot be updated.
    /// - Return [`ServiceError::Publish`] if catalog file was updated but
    ///   publishing failed.
    #[instrument(skip(self), level = "debug")]
    pub async fn delete(&self, request: DeleteRequest) -> Result<DeleteResponse> {
        let collection: Collection = request.category.parse()?;
        let embed_id = request.embed_id.trim();
        if embed_id.is_empty() {
            return Err(ValidationError::MissingField("embedId").into());
        }

        let _guard = self.lock.lock().await;
        let mutation = self
            .store
            .mutate(collection, |records| {
                let index = records
                    .iter()
                    .position(|entry| entry.embed_id == embed_id)
                    .ok_or_else(|| ServiceError::NotFound {
                        collection,
                        embed_id: embed_id.to_string(),
                    })?;

                Ok::<_, ServiceError>(records.remove(index))
            })
            .await?;
        let removed = mutation.outcome;
        info!("removed {:?} from {collection}", removed.title);

        let git = self
            .publish(format!("Remove {}: {}", collection.noun(), removed.title))
            .await?;

        Ok(DeleteResponse {
            success: true,
            message: format!("Video {:?} removed from {collection}", removed.title),
            title: removed.title,
            remaining: mutation.records.len(),
            git,
        })
    }

    /// Rearrange a collection into target order, then publish.
    ///
    /// Records named by the order move to the front in that order. Records
    /// left out follow in their original relative order.
    ///
    /// # Errors
    ///
    /// - Return [`ServiceError::Validation`] if order is empty or repeats an
    ///   identifier.
    /// - Return [`ServiceError::NotFound`] if order names an unknown
    ///   identifier.
    /// - Return [`ServiceError::Store`] if catalog file cannot be updated.
    /// - Return [`ServiceError::Publish`] if catalog file was updated but
    ///   publishing failed.
    #[instrument(skip(self), level = "debug")]
    pub async fn reorder(&self, request: ReorderRequest) -> Result<ReorderResponse> {
        let collection: Collection = request.category.parse()?;
        if request.order.is_empty() {
            return Err(ValidationError::MissingField("order").into());
        }

        let mut seen = HashSet::new();
        if let Some(repeated) = request.order.iter().find(|id| !seen.insert(id.as_str())) {
            return Err(ValidationError::DuplicateInOrder(repeated.clone()).into());
        }

        let _guard = self.lock.lock().await;
        let mutation = self
            .store
            .mutate(collection, |records| {
                apply_order(records, &request.order, collection)
            })
            .await?;
        info!("reordered {collection}");

        let git = self.publish(format!("Reorder {collection}")).await?;

        Ok(ReorderResponse {
            success: true,
            message: format!("{collection} reordered"),
            total_count: mutation.records.len(),
            git,
        })
    }

    /// Push already committed catalog changes again.
    ///
    /// Recovery path for a publish that committed but failed to push.
    ///
    /// # Errors
    ///
    /// - Return [`ServiceError::PublishingDisabled`] if publishing is off.
    /// - Return [`ServiceError::Push`] if the push fails again.
    #[instrument(skip(self), level = "debug")]
    pub async fn push(&self) -> Result<PublishReport> {
        let publisher = self
            .publisher
            .as_ref()
            .ok_or(ServiceError::PublishingDisabled)?;

        let _guard = self.lock.lock().await;
        let report = publisher.push().await;
        if !report.success {
            return Err(ServiceError::Push { report });
        }

        Ok(report)
    }

    async fn publish(&self, message: String) -> Result<Option<PublishReport>> {
        let Some(publisher) = &self.publisher else {
            return Ok(None);
        };

        let report = publisher
            .publish(&message, std::slice::from_ref(&self.tracked_file))
            .await;
        if !report.success {
            warn!("catalog file updated, but publishing failed");
            return Err(ServiceError::Publish { report });
        }

        Ok(Some(report))
    }
}

fn apply_order(
    records: &mut Vec<VideoRecord>,
    order: &[String],
    collection: Collection,
) -> Result<()> {
    if let Some(unknown) = order
        .iter()
        .find(|id| !records.iter().any(|entry| &entry.embed_id == *id))
    {
        return Err(ServiceError::NotFound {
            collection,
            embed_id: unknown.clone(),
        });
    }

    // INVARIANT: Named records go first, the rest keep their relative order.
    let mut remaining = std::mem::take(records);
    for id in order {
        if let Some(index) = remaining.iter().position(|entry| &entry.embed_id == id) {
            records.push(remaining.remove(index));
        }
    }
    records.extend(remaining);

    Ok(())
}

/// Request handling error types.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Request is malformed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Video is already in the collection.
    #[error("video with embed id {embed_id:?} already exists in {collection}")]
    Duplicate {
        collection: Collection,
        embed_id: String,
    },

    /// Video is not in the collection.
    #[error("video with embed id {embed_id:?} not found in {collection}")]
    NotFound {
        collection: Collection,
        embed_id: String,
    },

    /// Catalog file cannot be read, parsed, or written.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Catalog file was updated, but publishing it failed.
    #[error(
        "catalog file updated, but git {} failed",
        report.stage.map(|stage| stage.to_string()).unwrap_or_default()
    )]
    Publish { report: PublishReport },

    /// Push-only retry failed.
    #[error("git push failed")]
    Push { report: PublishReport },

    /// Push-only retry requested with publishing turned off.
    #[error("publishing is disabled")]
    PublishingDisabled,
}

impl ServiceError {
    /// Publish report attached to the error, if any.
    pub fn report(&self) -> Option<&PublishReport> {
        match self {
            Self::Publish { report } | Self::Push { report } => Some(report),
            _ => None,
        }
    }

    /// Whether the catalog file was updated despite the error.
    pub fn file_updated(&self) -> bool {
        matches!(self, Self::Publish { .. })
    }
}

/// Friendly result alias :3
pub type Result<T, E = ServiceError> = std::result::Result<T, E>;
