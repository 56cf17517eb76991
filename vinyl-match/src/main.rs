//! vinyl-match command-line entry point
//!
//! Results are printed to stdout as JSON; logs go to stderr (or the
//! configured log file).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use vinyl_common::config::{database_path, find_config_file, resolve_root_folder};
use vinyl_common::logging::init_tracing;
use vinyl_match::catalog::DiscogsClient;
use vinyl_match::config::{TomlConfig, CONFIG_FILE_NAME};
use vinyl_match::db::{init_database_pool, SqliteEmbeddingStore, SqliteRecordLookup};
use vinyl_match::embeddings::{
    CoverMatcher, EmbeddingRebuilder, RebuildMode, RecordCoverSource, RemoteEmbeddingProvider,
};
use vinyl_match::models::{RecordAttributes, RecordId, RecordLookup};
use vinyl_match::resolution::{CandidateScorer, ReleaseResolver};

#[derive(Parser, Debug)]
#[command(name = "vinyl-match")]
#[command(about = "Resolve vinyl records against Discogs and match cover photos")]
#[command(version)]
struct Cli {
    /// Config file (default: platform config dir / vinyl-match.toml)
    #[arg(short, long, env = "VINYL_MATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Data folder holding records.db and local covers
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Find the best matching US LP release for a record
    Resolve {
        #[command(flatten)]
        record: RecordArgs,

        /// Skip searching and check this release id
        #[arg(long)]
        release_id: Option<u64>,
    },

    /// List every US LP candidate for a record, best first
    Candidates {
        #[command(flatten)]
        record: RecordArgs,
    },

    /// Pick cover artwork for a record from its best release
    Cover {
        #[command(flatten)]
        record: RecordArgs,

        #[arg(long)]
        release_id: Option<u64>,

        /// Write the selection back to the record (needs --record-id)
        #[arg(long, requires = "record_id")]
        save: bool,
    },

    /// Take a record's tracklist from its best release
    Tracks {
        #[command(flatten)]
        record: RecordArgs,

        #[arg(long)]
        release_id: Option<u64>,

        /// Replace the record's stored tracks (needs --record-id)
        #[arg(long, requires = "record_id")]
        save: bool,
    },

    /// Identify which local record a cover photo shows
    MatchCover {
        /// Image file (JPEG, PNG, ...)
        image: PathBuf,
    },

    /// Compute cover embeddings for local records
    Rebuild {
        /// Stop after this many records have been embedded
        #[arg(long)]
        limit: Option<usize>,

        /// Only embed records without stored vectors
        #[arg(long)]
        missing_only: bool,
    },
}

/// A stored record, or attributes given inline
#[derive(Args, Debug)]
struct RecordArgs {
    /// Load attributes from the records table
    #[arg(long, conflicts_with_all = ["artist", "title"])]
    record_id: Option<RecordId>,

    #[arg(long)]
    artist: Option<String>,

    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    year: Option<i32>,

    #[arg(long)]
    label: Option<String>,

    #[arg(long = "catno")]
    catalog_number: Option<String>,

    #[arg(long)]
    barcode: Option<String>,

    /// Required release country (default US)
    #[arg(long)]
    country: Option<String>,
}

impl RecordArgs {
    fn inline_attributes(&self) -> RecordAttributes {
        RecordAttributes {
            artist: self.artist.clone().unwrap_or_default(),
            title: self.title.clone().unwrap_or_default(),
            year: self.year,
            label: self.label.clone(),
            catalog_number: self.catalog_number.clone(),
            barcode: self.barcode.clone(),
            country: self.country.clone(),
        }
    }
}

struct App {
    config: TomlConfig,
    root_folder: PathBuf,
}

impl App {
    async fn records(&self) -> Result<SqliteRecordLookup> {
        let db_path = database_path(&self.root_folder);
        info!("Database: {}", db_path.display());
        let pool = init_database_pool(&db_path)
            .await
            .with_context(|| format!("Failed to open database {}", db_path.display()))?;
        Ok(SqliteRecordLookup::new(pool))
    }

    async fn attributes(&self, args: &RecordArgs) -> Result<(RecordAttributes, Option<SqliteRecordLookup>)> {
        let Some(record_id) = args.record_id else {
            return Ok((args.inline_attributes(), None));
        };
        let records = self.records().await?;
        let attributes = records
            .get_attributes(record_id)
            .await
            .context("Failed to read record")?
            .with_context(|| format!("Record {} not found", record_id))?;
        Ok((attributes, Some(records)))
    }

    fn resolver(&self) -> Result<ReleaseResolver<DiscogsClient>> {
        let catalog = DiscogsClient::new(self.config.catalog.discogs_settings())
            .context("Failed to create Discogs client")?;
        let scorer = CandidateScorer::new(self.config.scoring).context("Invalid scoring weights")?;
        Ok(ReleaseResolver::new(
            catalog,
            scorer,
            self.config.catalog.resolver_settings(),
        ))
    }

    async fn embedding_provider(&self) -> Result<Arc<RemoteEmbeddingProvider>> {
        let provider = RemoteEmbeddingProvider::new(self.config.embedding.remote_settings())
            .context("Failed to create embedding client")?;
        provider
            .initialize()
            .await
            .context("Failed to initialize embedding model")?;
        Ok(Arc::new(provider))
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().or_else(|| find_config_file(CONFIG_FILE_NAME));
    let config = TomlConfig::load(config_path.as_deref()).context("Failed to load configuration")?;
    init_tracing(&config.logging).context("Failed to initialize logging")?;

    let root_folder = resolve_root_folder(cli.root_folder.as_deref(), config.root_folder.as_deref());
    info!("Root folder: {}", root_folder.display());

    let app = App {
        config,
        root_folder,
    };

    match cli.command {
        Command::Resolve { record, release_id } => {
            let (attributes, _) = app.attributes(&record).await?;
            let outcome = app
                .resolver()?
                .resolve_catalog_match(&attributes, release_id)
                .await?;
            print_json(&outcome)?;
        }

        Command::Candidates { record } => {
            let (attributes, _) = app.attributes(&record).await?;
            let candidates = app.resolver()?.candidates(&attributes).await;
            print_json(&candidates)?;
        }

        Command::Cover {
            record,
            release_id,
            save,
        } => {
            let (attributes, records) = app.attributes(&record).await?;
            let selection = app.resolver()?.select_cover(&attributes, release_id).await?;

            if save {
                let (Some(records), Some(record_id)) = (records, record.record_id) else {
                    bail!("--save requires --record-id");
                };
                let updated = records
                    .save_cover_selection(record_id, &selection)
                    .await
                    .context("Failed to save cover selection")?;
                info!(record_id, updated, "Saved cover selection");
            }

            print_json(&selection)?;
        }

        Command::Tracks {
            record,
            release_id,
            save,
        } => {
            let (attributes, records) = app.attributes(&record).await?;
            let selection = app.resolver()?.select_tracks(&attributes, release_id).await?;

            if save {
                let (Some(records), Some(record_id)) = (records, record.record_id) else {
                    bail!("--save requires --record-id");
                };
                let updated = records
                    .save_track_selection(record_id, &selection)
                    .await
                    .context("Failed to save tracks")?;
                info!(record_id, updated, tracks = selection.tracks.len(), "Saved tracks");
            }

            print_json(&selection)?;
        }

        Command::MatchCover { image } => {
            let bytes = tokio::fs::read(&image)
                .await
                .with_context(|| format!("Failed to read {}", image.display()))?;

            let records = app.records().await?;
            let matcher = CoverMatcher::new(
                app.embedding_provider().await?,
                Arc::new(SqliteEmbeddingStore::new(records.pool().clone())),
                Arc::new(records),
                app.config.matching.matcher(),
            );

            let outcome = matcher.match_cover_image(&bytes).await?;
            print_json(&outcome)?;
        }

        Command::Rebuild {
            limit,
            missing_only,
        } => {
            let records = app.records().await?;
            let covers = RecordCoverSource::new(
                records.clone(),
                app.root_folder.clone(),
                Duration::from_secs(app.config.embedding.request_timeout_secs),
            )
            .context("Failed to create cover downloader")?;

            let rebuilder = EmbeddingRebuilder::new(
                app.embedding_provider().await?,
                Arc::new(SqliteEmbeddingStore::new(records.pool().clone())),
                Arc::new(records),
                app.config.embedding.rotations_deg.clone(),
            );

            let mode = if missing_only {
                RebuildMode::MissingOnly
            } else {
                RebuildMode::All
            };
            let report = rebuilder.rebuild_embeddings(&covers, limit, mode).await?;
            print_json(&report)?;
        }
    }

    Ok(())
}
