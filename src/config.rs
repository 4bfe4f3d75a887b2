// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout of the configuration file that the video manager reads
//! at startup. Every key is optional, so an empty file, or no file at all,
//! yields a working configuration for a catalog file in the current
//! directory.
//!
//! ```toml
//! [server]
//! listen_addr = "127.0.0.1:3000"
//!
//! [catalog]
//! repo_root = "$HOME/portfolio"
//! file = "pr/src/components/Work.tsx"
//! insert_at = "top"
//!
//! [publish]
//! enabled = true
//! remote = "origin"
//! branch = "main"
//! committer_name = "Video Manager"
//! committer_email = "video-manager@localhost"
//! ```

use crate::publish::{GitCli, Identity};

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    str::FromStr,
};

/// Video manager configuration.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// HTTP server settings.
    pub server: ServerSettings,

    /// Catalog file location and editing behavior.
    pub catalog: CatalogSettings,

    /// Version control publishing settings.
    pub publish: PublishSettings,
}

impl ManagerConfig {
    /// Read configuration file at target path.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Read`] if file cannot be read.
    /// - Return [`ConfigError::Deserialize`] if file is not valid TOML for
    ///   this layout.
    /// - Return [`ConfigError::ShellExpansion`] if repository root cannot be
    ///   shell expanded.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|err| ConfigError::Read {
            source: err,
            path: path.into(),
        })?;

        data.parse()
    }

    /// Absolute or repository relative path to catalog file.
    pub fn catalog_path(&self) -> PathBuf {
        self.catalog.repo_root.join(&self.catalog.file)
    }

    /// Git access for the configured repository root.
    pub fn git(&self) -> GitCli {
        let git = GitCli::new(&self.catalog.repo_root).with_identity(Identity {
            name: self.publish.committer_name.clone(),
            email: self.publish.committer_email.clone(),
        });

        match &self.publish.remote {
            Some(remote) => git.with_remote(remote, self.publish.branch.clone()),
            None => git,
        }
    }
}

impl FromStr for ManagerConfig {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut config: ManagerConfig = toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on repository root field.
        config.catalog.repo_root = PathBuf::from(
            shellexpand::full(config.catalog.repo_root.to_string_lossy().as_ref())
                .map_err(ConfigError::ShellExpansion)?
                .into_owned(),
        );

        Ok(config)
    }
}

impl Display for ManagerConfig {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// HTTP server settings.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Socket address to listen on.
    pub listen_addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:3000".into(),
        }
    }
}

/// Catalog file settings.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// Root of the repository that tracks the catalog file.
    ///
    /// Git commands run from here.
    pub repo_root: PathBuf,

    /// Path to catalog file, relative to repository root.
    pub file: PathBuf,

    /// Where new records land in their collection.
    pub insert_at: InsertAt,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            repo_root: PathBuf::from("."),
            file: PathBuf::from("pr/src/components/Work.tsx"),
            insert_at: InsertAt::default(),
        }
    }
}

/// Position that new records are inserted at.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InsertAt {
    /// Newest record shows first.
    #[default]
    Top,

    /// Newest record shows last.
    Bottom,
}

/// Publishing settings.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PublishSettings {
    /// Stage, commit, and push after every mutation.
    pub enabled: bool,

    /// Remote to push to, rather than the upstream of the current branch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,

    /// Branch on the remote to push to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    /// Committer name to use if none is configured.
    pub committer_name: String,

    /// Committer email to use if none is configured.
    pub committer_email: String,
}

impl Default for PublishSettings {
    fn default() -> Self {
        let identity = Identity::default();
        Self {
            enabled: true,
            remote: None,
            branch: None,
            committer_name: identity.name,
            committer_email: identity.email,
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file cannot be read from.
    #[error("failed to read configuration file at {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Fails to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Fails to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Shell expansion fails for a field.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;
