// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Video catalog representation.
//!
//! The __catalog__ is the list of videos shown on the portfolio page. It does
//! not live in a database. Instead, it lives inside a hand-authored UI source
//! file, the __catalog file__, as two literal array assignments:
//!
//! - `const projects = [ ... ];` holds long-form work.
//! - `const reels = [ ... ];` holds short-form work.
//!
//! Everything else in the catalog file is unrelated UI code that must pass
//! through any edit byte-for-byte. Hence, the catalog is read by scanning for
//! those two assignments with [`parse`], and written by regenerating just the
//! assignment text with [`render`] before splicing it back in place.
//!
//! # See Also
//!
//! 1. [`record`]
//! 2. [`crate::store`]

pub mod parse;
pub mod record;
pub mod render;

pub use parse::{parse_collection, ParseError, ParsedCollection};
pub use record::{Collection, ValidationError, VideoRecord};
pub use render::render_collection;

use serde::Serialize;

/// Both collections of the catalog, read-only.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Catalog {
    /// Long-form records in display order.
    pub projects: Vec<VideoRecord>,

    /// Short-form records in display order.
    pub reels: Vec<VideoRecord>,
}

impl Catalog {
    /// Parse both collections out of catalog file text.
    ///
    /// # Errors
    ///
    /// - Return [`ParseError`] if either collection cannot be parsed.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        Ok(Self {
            projects: parse_collection(text, Collection::Projects)?.records,
            reels: parse_collection(text, Collection::Reels)?.records,
        })
    }

    /// Records of target collection.
    pub fn collection(&self, collection: Collection) -> &[VideoRecord] {
        match collection {
            Collection::Projects => &self.projects,
            Collection::Reels => &self.reels,
        }
    }
}
