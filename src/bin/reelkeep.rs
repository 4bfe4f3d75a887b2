// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use reelkeep::{
    catalog::{record::extract_embed_id, ValidationError},
    config::ManagerConfig,
    path::default_config_path,
    server,
    service::{AddRequest, CatalogService, DeleteRequest, ReorderRequest, ServiceError},
};

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::{path::PathBuf, process::exit};
use tracing::{debug, error};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "\n  reelkeep [options] <command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    /// Read configuration from target file.
    #[arg(short, long, value_name = "path")]
    pub config: Option<PathBuf>,

    /// Root of the repository that tracks the catalog file.
    #[arg(long, value_name = "dir")]
    pub repo_root: Option<PathBuf>,

    /// Path to catalog file, relative to repository root.
    #[arg(long, value_name = "file")]
    pub catalog_file: Option<PathBuf>,

    /// Write catalog changes without committing or pushing them.
    #[arg(long)]
    pub no_publish: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    async fn run(self) -> Result<()> {
        let config = self.load_config()?;
        match self.command {
            Command::Serve(opts) => run_serve(config, opts).await,
            Command::List => respond(CatalogService::from_config(&config).list().await),
            Command::Add(opts) => run_add(config, opts).await,
            Command::Delete(opts) => run_delete(config, opts).await,
            Command::Reorder(opts) => run_reorder(config, opts).await,
            Command::Push => respond(CatalogService::from_config(&config).push().await),
        }
    }

    fn load_config(&self) -> Result<ManagerConfig> {
        let mut config = match &self.config {
            Some(path) => ManagerConfig::load(path)?,
            None => match default_config_path() {
                Ok(path) if path.exists() => ManagerConfig::load(path)?,
                _ => {
                    debug!("no configuration file found, use defaults");
                    ManagerConfig::default()
                }
            },
        };

        if let Some(repo_root) = &self.repo_root {
            config.catalog.repo_root = repo_root.clone();
        }

        if let Some(file) = &self.catalog_file {
            config.catalog.file = file.clone();
        }

        if self.no_publish {
            config.publish.enabled = false;
        }

        Ok(config)
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Serve catalog operations over HTTP.
    #[command(override_usage = "reelkeep serve [options]")]
    Serve(ServeOptions),

    /// List both collections.
    #[command(override_usage = "reelkeep list")]
    List,

    /// Add video to a collection.
    #[command(override_usage = "reelkeep add [options] <category> <title> <video_url>")]
    Add(AddOptions),

    /// Remove video from a collection.
    #[command(override_usage = "reelkeep delete <category> <embed_id>")]
    Delete(DeleteOptions),

    /// Move videos to the front of a collection in target order.
    #[command(override_usage = "reelkeep reorder <category> <embed_id>...")]
    Reorder(ReorderOptions),

    /// Retry pushing committed catalog changes.
    #[command(override_usage = "reelkeep push")]
    Push,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ServeOptions {
    /// Socket address to listen on.
    #[arg(short, long, value_name = "addr")]
    pub listen: Option<String>,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct AddOptions {
    /// Collection to add to (longform or shortform).
    #[arg(required = true, value_name = "category")]
    pub category: String,

    /// Display title of the video.
    #[arg(required = true, value_name = "title")]
    pub title: String,

    /// Watch page URL of the video.
    #[arg(required = true, value_name = "video_url")]
    pub video_url: String,

    /// Embed identifier, extracted from the video URL if omitted.
    #[arg(short, long, value_name = "embed_id")]
    pub embed_id: Option<String>,

    /// Thumbnail URL, derived from the embed identifier if omitted.
    #[arg(short, long, value_name = "url")]
    pub thumbnail: Option<String>,

    /// Category label of a long-form video, e.g., "Spec Work".
    #[arg(long, value_name = "name")]
    pub video_category: Option<String>,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct DeleteOptions {
    /// Collection to remove from.
    #[arg(required = true, value_name = "category")]
    pub category: String,

    /// Embed identifier of the video to remove.
    #[arg(required = true, value_name = "embed_id")]
    pub embed_id: String,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ReorderOptions {
    /// Collection to rearrange.
    #[arg(required = true, value_name = "category")]
    pub category: String,

    /// Embed identifiers to move to the front, in order.
    #[arg(required = true, value_name = "embed_id")]
    pub order: Vec<String>,
}

#[tokio::main]
async fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_timer(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run().await {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

async fn run() -> Result<()> {
    Cli::parse().run().await
}

async fn run_serve(mut config: ManagerConfig, opts: ServeOptions) -> Result<()> {
    if let Some(listen) = opts.listen {
        config.server.listen_addr = listen;
    }

    server::serve(config).await?;

    Ok(())
}

async fn run_add(config: ManagerConfig, opts: AddOptions) -> Result<()> {
    let embed_id = match opts.embed_id {
        Some(embed_id) => embed_id,
        None => extract_embed_id(&opts.video_url)
            .ok_or_else(|| ValidationError::UnsupportedUrl(opts.video_url.clone()))?,
    };

    let request = AddRequest {
        category: opts.category,
        title: opts.title,
        video_url: opts.video_url,
        embed_id,
        thumbnail: opts.thumbnail,
        video_category: opts.video_category,
    };

    respond(CatalogService::from_config(&config).add(request).await)
}

async fn run_delete(config: ManagerConfig, opts: DeleteOptions) -> Result<()> {
    let request = DeleteRequest {
        category: opts.category,
        embed_id: opts.embed_id,
    };

    respond(CatalogService::from_config(&config).delete(request).await)
}

async fn run_reorder(config: ManagerConfig, opts: ReorderOptions) -> Result<()> {
    let request = ReorderRequest {
        category: opts.category,
        order: opts.order,
    };

    respond(CatalogService::from_config(&config).reorder(request).await)
}

fn respond(result: Result<impl Serialize, ServiceError>) -> Result<()> {
    match result {
        Ok(response) => {
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Err(error) => {
            // INVARIANT: Publish reports still reach stdout on failure.
            if let Some(report) = error.report() {
                println!("{}", serde_json::to_string_pretty(report)?);
            }

            Err(error.into())
        }
    }
}
