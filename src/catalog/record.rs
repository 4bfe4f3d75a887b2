// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Video record model.
//!
//! A __video record__ is one entry of the catalog. Records live in one of two
//! named collections: `projects` holds long-form work and `reels` holds
//! short-form work. Long-form records carry a category label, short-form
//! records never do.

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};
use url::Url;

/// Platform tag of the only supported video host.
pub const STREAMABLE: &str = "streamable";

const STREAMABLE_HOSTS: [&str; 2] = ["streamable.com", "www.streamable.com"];

/// Named collection of video records inside the catalog file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    /// Long-form content, a.k.a. featured projects.
    Projects,

    /// Short-form content, a.k.a. featured reels.
    Reels,
}

impl Collection {
    /// Name of the array binding in the catalog file.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Projects => "projects",
            Self::Reels => "reels",
        }
    }

    /// Singular noun used in commit messages.
    pub fn noun(&self) -> &'static str {
        match self {
            Self::Projects => "project",
            Self::Reels => "reel",
        }
    }

    /// The other collection sharing the catalog file.
    pub fn sibling(&self) -> Self {
        match self {
            Self::Projects => Self::Reels,
            Self::Reels => Self::Projects,
        }
    }

    /// Whether records of this collection require a category label.
    pub fn requires_category(&self) -> bool {
        matches!(self, Self::Projects)
    }
}

impl Display for Collection {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(self.name())
    }
}

impl FromStr for Collection {
    type Err = ValidationError;

    /// Accept both the content kind used by callers ("longform", "shortform")
    /// and the array names themselves.
    fn from_str(data: &str) -> Result<Self, Self::Err> {
        match data.trim().to_ascii_lowercase().as_str() {
            "longform" | "long-form" | "projects" | "project" => Ok(Self::Projects),
            "shortform" | "short-form" | "reels" | "reel" => Ok(Self::Reels),
            _ => Err(ValidationError::UnknownCategory(data.to_string())),
        }
    }
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    /// Display title.
    pub title: String,

    /// Category label, only present for long-form records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Watch page URL on the video host.
    pub video_url: String,

    /// Host specific video identifier.
    pub embed_id: String,

    /// Thumbnail image URL.
    pub thumbnail: String,

    /// Playback provider tag.
    pub platform: String,
}

impl VideoRecord {
    /// Construct new record for target collection.
    ///
    /// Thumbnail is derived from the embed identifier unless supplied, and the
    /// platform is always the default host. Category is dropped for
    /// collections that do not carry one.
    pub fn new(
        collection: Collection,
        title: impl Into<String>,
        video_url: impl Into<String>,
        embed_id: impl Into<String>,
        thumbnail: Option<String>,
        category: Option<String>,
    ) -> Self {
        let embed_id = embed_id.into();
        let thumbnail = thumbnail
            .filter(|thumbnail| !thumbnail.trim().is_empty())
            .unwrap_or_else(|| thumbnail_url(&embed_id));
        let category = category.filter(|_| collection.requires_category());

        Self {
            title: title.into(),
            category,
            video_url: video_url.into(),
            embed_id,
            thumbnail,
            platform: STREAMABLE.into(),
        }
    }

    /// Check record against the rules of target collection.
    ///
    /// # Errors
    ///
    /// - Return [`ValidationError::MissingField`] if title, video URL, or
    ///   embed identifier are empty.
    /// - Return [`ValidationError::MissingCategory`] if a long-form record has
    ///   no category.
    /// - Return [`ValidationError::UnexpectedCategory`] if a short-form record
    ///   carries a category.
    /// - Return [`ValidationError::UnsupportedUrl`] if the video URL does not
    ///   point at a supported watch page.
    /// - Return [`ValidationError::EmbedIdMismatch`] if the embed identifier
    ///   disagrees with the one found in the video URL.
    pub fn validate(&self, collection: Collection) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::MissingField("title"));
        }

        if self.video_url.trim().is_empty() {
            return Err(ValidationError::MissingField("videoUrl"));
        }

        if self.embed_id.trim().is_empty() {
            return Err(ValidationError::MissingField("embedId"));
        }

        let has_category = self
            .category
            .as_deref()
            .is_some_and(|category| !category.trim().is_empty());
        match (collection.requires_category(), has_category) {
            (true, false) => return Err(ValidationError::MissingCategory),
            (false, true) => return Err(ValidationError::UnexpectedCategory(collection)),
            _ => {}
        }

        let extracted = extract_embed_id(&self.video_url)
            .ok_or_else(|| ValidationError::UnsupportedUrl(self.video_url.clone()))?;
        if extracted != self.embed_id {
            return Err(ValidationError::EmbedIdMismatch {
                embed_id: self.embed_id.clone(),
                extracted,
            });
        }

        Ok(())
    }
}

/// Extract embed identifier from a watch page URL.
///
/// Only `https://streamable.com/<id>` style URLs are accepted, where the
/// identifier is a non-empty run of ASCII letters and digits forming the
/// first path segment.
pub fn extract_embed_id(video_url: &str) -> Option<String> {
    let url = Url::parse(video_url.trim()).ok()?;
    if !matches!(url.scheme(), "https" | "http") {
        return None;
    }

    let host = url.host_str()?.to_ascii_lowercase();
    if !STREAMABLE_HOSTS.contains(&host.as_str()) {
        return None;
    }

    let mut segments = url.path_segments()?.filter(|segment| !segment.is_empty());
    let embed_id = segments.next()?;
    if segments.next().is_some() || !is_embed_id(embed_id) {
        return None;
    }

    Some(embed_id.to_string())
}

/// Derive thumbnail URL of a video from its embed identifier.
pub fn thumbnail_url(embed_id: &str) -> String {
    format!("https://cdn-cf-east.streamable.com/image/{embed_id}.jpg")
}

fn is_embed_id(candidate: &str) -> bool {
    !candidate.is_empty() && candidate.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Caller input is missing or malformed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Required field is empty or absent.
    #[error("missing required field {0:?}")]
    MissingField(&'static str),

    /// Long-form records need a category label.
    #[error("project type required for long-form content")]
    MissingCategory,

    /// Short-form records cannot carry a category label.
    #[error("category is not allowed for {0}")]
    UnexpectedCategory(Collection),

    /// Category name is not one of the known collections.
    #[error("unknown category {0:?} (expected: longform|shortform)")]
    UnknownCategory(String),

    /// Video URL does not point at a supported watch page.
    #[error("invalid streamable URL {0:?} (expected: https://streamable.com/<id>)")]
    UnsupportedUrl(String),

    /// Embed identifier disagrees with the one in the video URL.
    #[error("embed id {embed_id:?} does not match {extracted:?} from video URL")]
    EmbedIdMismatch { embed_id: String, extracted: String },

    /// Reorder listing names the same embed identifier twice.
    #[error("embed id {0:?} appears more than once in order")]
    DuplicateInOrder(String),
}

/// Friendly result alias :3
type Result<T, E = ValidationError> = std::result::Result<T, E>;
