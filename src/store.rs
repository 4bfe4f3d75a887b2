// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Catalog file storage.
//!
//! The catalog file is the only persistent state of the catalog. Every
//! operation reads it fresh from disk, so there is no cache that could drift
//! from what was last committed. Mutations follow one read-modify-write cycle:
//!
//! 1. Read the whole catalog file.
//! 2. Parse the target collection, remembering the exact span of its
//!    assignment.
//! 3. Hand the records to a caller supplied edit.
//! 4. Render the edited records, and splice them over the old span, leaving
//!    every other byte of the file untouched.
//! 5. Parse the new text again, and check that both collections read back as
//!    expected.
//! 6. Write the new text back to the same path.
//!
//! If the edit or any parse or check fails, nothing is written.
//!
//! # Concurrency
//!
//! The store does not lock the catalog file. Overlapping mutations of the same
//! file can interleave, so callers that may run concurrently must serialize
//! themselves, e.g., through [`crate::service::CatalogService`].

use crate::catalog::{
    parse_collection, render_collection, Catalog, Collection, ParseError, VideoRecord,
};

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument};

/// Read-modify-write access to a catalog file.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    path: PathBuf,
}

/// Result of a finished mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation<T> {
    /// Records of the mutated collection after the edit.
    pub records: Vec<VideoRecord>,

    /// Value returned by the edit.
    pub outcome: T,

    /// Whether the catalog file content actually changed.
    pub changed: bool,
}

impl CatalogStore {
    /// Construct new catalog store over target file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path to catalog file.
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// Read both collections.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::Read`] if catalog file cannot be read.
    /// - Return [`StoreError::Parse`] if either collection cannot be parsed.
    #[instrument(skip(self), level = "debug")]
    pub async fn list(&self) -> Result<Catalog> {
        let text = self.read().await?;
        Ok(Catalog::parse(&text)?)
    }

    /// Apply an edit to one collection, and persist the result.
    ///
    /// The edit works on its own copy of the records. Returning an error from
    /// the edit aborts the mutation without writing anything. The catalog
    /// file is only rewritten when its content actually changes.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::Read`] if catalog file cannot be read.
    /// - Return [`StoreError::Parse`] if either collection cannot be parsed.
    /// - Return [`StoreError::Diverged`] if the rewritten file would not read
    ///   back as the edited collection beside the untouched one.
    /// - Return [`StoreError::Write`] if catalog file cannot be written.
    /// - Return whatever error the edit itself returns.
    #[instrument(skip(self, edit), level = "debug")]
    pub async fn mutate<T, E, F>(&self, collection: Collection, edit: F) -> Result<Mutation<T>, E>
    where
        F: FnOnce(&mut Vec<VideoRecord>) -> Result<T, E>,
        E: From<StoreError>,
    {
        let text = self.read().await?;
        let parsed = parse_collection(&text, collection).map_err(StoreError::from)?;
        let untouched = parse_collection(&text, collection.sibling())
            .map_err(StoreError::from)?
            .records;
        let mut records = parsed.records;
        let outcome = edit(&mut records)?;

        let mut updated = String::with_capacity(text.len());
        updated.push_str(&text[..parsed.span.start]);
        updated.push_str(&render_collection(collection, &records));
        updated.push_str(&text[parsed.span.end..]);

        // INVARIANT: Never write text that does not read back as the edited
        //   collection beside the untouched one.
        let reread = Catalog::parse(&updated).map_err(StoreError::from)?;
        if reread.collection(collection) != records.as_slice()
            || reread.collection(collection.sibling()) != untouched.as_slice()
        {
            return Err(StoreError::Diverged {
                collection,
                path: self.path.clone(),
            }
            .into());
        }

        let changed = updated != text;
        if changed {
            fs::write(&self.path, updated.as_bytes())
                .await
                .map_err(|err| StoreError::Write {
                    source: err,
                    path: self.path.clone(),
                })?;
            info!(
                "updated {collection} in {:?} ({} entries)",
                self.path.display(),
                records.len()
            );
        } else {
            debug!("{collection} unchanged, skip write");
        }

        Ok(Mutation {
            records,
            outcome,
            changed,
        })
    }

    async fn read(&self) -> Result<String> {
        fs::read_to_string(&self.path)
            .await
            .map_err(|err| StoreError::Read {
                source: err,
                path: self.path.clone(),
            })
    }
}

/// Catalog file storage error types.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Catalog file cannot be read from.
    #[error("failed to read catalog file at {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Catalog file cannot be written to.
    #[error("failed to write catalog file at {:?}", path.display())]
    Write {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Catalog file is not in the expected shape.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Rewritten catalog file would not read back as intended.
    #[error("refusing to write {collection} to {:?}, result does not read back", path.display())]
    Diverged {
        collection: Collection,
        path: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = StoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const WORK: &str = indoc! {r#"
        import { useState } from "react";

        const projects = [
          {
            title: "PVE for personal brand",
            category: "Spec Work",
            videoUrl: "https://streamable.com/ct2sog",
            embedId: "ct2sog",
            thumbnail: `https://cdn-cf-east.streamable.com/image/ct2sog.jpg`,
            platform: "streamable",
          },
        ];

        const reels = [
          {
            title: "Football Highlight Reel",
            videoUrl: "https://streamable.com/l06h1d",
            embedId: "l06h1d",
            platform: "streamable",
            thumbnail: `https://cdn-cf-east.streamable.com/image/l06h1d.jpg`,
          },
        ];

        const Work = () => {
          const [playing, setPlaying] = useState<string | null>(null);
          return <section id="work" />;
        };

        export default Work;
    "#};

    fn fixture() -> anyhow::Result<(TempDir, CatalogStore)> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("Work.tsx");
        std::fs::write(&path, WORK)?;
        Ok((dir, CatalogStore::new(path)))
    }

    fn reel(title: &str, embed_id: &str) -> VideoRecord {
        VideoRecord::new(
            Collection::Reels,
            title,
            format!("https://streamable.com/{embed_id}"),
            embed_id,
            None,
            None,
        )
    }

    #[tokio::test]
    async fn list_reads_both_collections() -> anyhow::Result<()> {
        let (_dir, store) = fixture()?;
        let catalog = store.list().await?;
        assert_eq!(catalog.projects.len(), 1);
        assert_eq!(catalog.projects[0].embed_id, "ct2sog");
        assert_eq!(catalog.reels.len(), 1);
        assert_eq!(catalog.reels[0].title, "Football Highlight Reel");

        Ok(())
    }

    #[tokio::test]
    async fn mutate_passes_through_surrounding_text() -> anyhow::Result<()> {
        let (_dir, store) = fixture()?;
        let before = parse_collection(WORK, Collection::Reels)?.span;

        let mutation = store
            .mutate(Collection::Reels, |records| {
                records.insert(0, reel("Short Form Edit", "3ib9ax"));
                Ok::<_, StoreError>(records.len())
            })
            .await?;
        assert!(mutation.changed);
        assert_eq!(mutation.outcome, 2);

        let text = std::fs::read_to_string(store.path())?;
        let after = parse_collection(&text, Collection::Reels)?.span;
        assert_eq!(&text[..after.start], &WORK[..before.start]);
        assert_eq!(&text[after.end..], &WORK[before.end..]);

        let catalog = store.list().await?;
        assert_eq!(catalog.reels, mutation.records);
        assert_eq!(catalog.reels[0].embed_id, "3ib9ax");
        assert_eq!(catalog.projects, Catalog::parse(WORK)?.projects);

        Ok(())
    }

    #[tokio::test]
    async fn mutate_rejected_edit_leaves_file_alone() -> anyhow::Result<()> {
        #[derive(Debug)]
        enum EditError {
            Rejected,
            Store(StoreError),
        }

        impl From<StoreError> for EditError {
            fn from(err: StoreError) -> Self {
                Self::Store(err)
            }
        }

        let (_dir, store) = fixture()?;
        let result = store
            .mutate(Collection::Projects, |records| {
                records.clear();
                Err::<(), _>(EditError::Rejected)
            })
            .await;
        assert!(matches!(result, Err(EditError::Rejected)));
        assert_eq!(std::fs::read_to_string(store.path())?, WORK);

        Ok(())
    }

    #[tokio::test]
    async fn mutate_unchanged_skips_write() -> anyhow::Result<()> {
        let (_dir, store) = fixture()?;
        let mutation = store
            .mutate(Collection::Projects, |_| Ok::<_, StoreError>(()))
            .await?;
        assert!(!mutation.changed);
        assert_eq!(std::fs::read_to_string(store.path())?, WORK);

        Ok(())
    }

    #[tokio::test]
    async fn mutate_refuses_records_that_do_not_read_back() -> anyhow::Result<()> {
        let (_dir, store) = fixture()?;
        let result = store
            .mutate(Collection::Reels, |records| {
                let mut stray = reel("Stray", "zz9");
                stray.category = Some("Spec Work".into());
                records.push(stray);
                Ok::<_, StoreError>(())
            })
            .await;
        assert!(matches!(
            result,
            Err(StoreError::Diverged {
                collection: Collection::Reels,
                ..
            })
        ));
        assert_eq!(std::fs::read_to_string(store.path())?, WORK);

        Ok(())
    }

    #[tokio::test]
    async fn mutate_keeps_sibling_with_code_in_titles() -> anyhow::Result<()> {
        let (_dir, store) = fixture()?;
        store
            .mutate(Collection::Projects, |records| {
                records[0].title = "Demo const reels = []; /* cut".into();
                Ok::<_, StoreError>(())
            })
            .await?;
        let mutation = store
            .mutate(Collection::Reels, |records| {
                records.insert(0, reel("New", "zz9"));
                Ok::<_, StoreError>(())
            })
            .await?;

        let catalog = store.list().await?;
        assert_eq!(catalog.projects[0].title, "Demo const reels = []; /* cut");
        assert_eq!(catalog.reels, mutation.records);
        assert_eq!(catalog.reels.len(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn mutate_missing_file() {
        let store = CatalogStore::new("/definitely/not/here/Work.tsx");
        let result = store
            .mutate(Collection::Reels, |_| Ok::<_, StoreError>(()))
            .await;
        assert!(matches!(result, Err(StoreError::Read { .. })));
    }

    #[tokio::test]
    async fn mutate_corrupt_collection_aborts() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("Work.tsx");
        let corrupt = "const projects = [\n  { title: oops },\n];\nconst reels = [];\n";
        std::fs::write(&path, corrupt)?;
        let store = CatalogStore::new(&path);

        let result = store
            .mutate(Collection::Projects, |records| {
                records.clear();
                Ok::<_, StoreError>(())
            })
            .await;
        assert!(matches!(
            result,
            Err(StoreError::Parse(ParseError::MalformedEntry { line: 2, .. }))
        ));
        assert_eq!(std::fs::read_to_string(&path)?, corrupt);

        Ok(())
    }
}
