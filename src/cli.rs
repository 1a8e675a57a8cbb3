// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Running the live filter preview
//! - Capturing snapshots
//! - Browsing, deleting and favoriting saved snapshots

use chrono::Local;
use filtercam::app::PreviewPipeline;
use filtercam::backends::camera::{ImageFileSource, SyntheticSource};
use filtercam::config::Config;
use filtercam::constants::timing;
use filtercam::errors::{AppResult, ConfigError, DeleteError};
use filtercam::filters::{CpuFilterEngine, FilterMode, SharedFilterConfig};
use filtercam::gallery::{Catalog, CatalogListing, FavoritesStore};
use filtercam::pipelines::photo::{CaptureService, parse_artifact_name};
use filtercam::storage::{ArtifactId, ArtifactStore, FsStorage, MemoryStorage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::warn;

/// Everything a command needs: configuration plus the storage it points at
pub struct Context {
    config: Config,
    config_path: Option<PathBuf>,
    store: Arc<dyn ArtifactStore>,
    ephemeral: bool,
}

impl Context {
    pub fn new(config_path: Option<&Path>, ephemeral: bool) -> AppResult<Self> {
        let config = match config_path {
            Some(path) => Config::load_from(path)?,
            None => match Config::load() {
                Ok(config) => config,
                Err(ConfigError::NoConfigDir) => {
                    warn!("No configuration directory, using defaults");
                    Config::default()
                }
                Err(e) => return Err(e.into()),
            },
        };
        let config_path = config_path
            .map(Path::to_path_buf)
            .or_else(|| Config::default_path().ok());

        let store: Arc<dyn ArtifactStore> = if ephemeral {
            Arc::new(MemoryStorage::new())
        } else {
            let storage = FsStorage::new(config.pictures_root());
            if let Err(e) = storage.purge_stale_pending(&config.album) {
                warn!(error = %e, "Failed to clean up pending snapshots");
            }
            Arc::new(storage)
        };

        Ok(Self {
            config,
            config_path,
            store,
            ephemeral,
        })
    }

    fn catalog(&self) -> Catalog {
        let favorites = if self.ephemeral {
            FavoritesStore::in_memory()
        } else {
            FavoritesStore::open(self.config.favorites_path())
        };
        Catalog::new(Arc::clone(&self.store), self.config.album.clone(), favorites)
    }

    /// Accept either a bare file name or a full `<album>/<name>` id
    fn resolve_id(&self, raw: &str) -> ArtifactId {
        if raw.contains('/') {
            ArtifactId::new(raw)
        } else {
            ArtifactId::in_namespace(&self.config.album, raw)
        }
    }

    fn filter_config(&self, filter: Option<FilterMode>, intensity: Option<i32>) -> SharedFilterConfig {
        let shared = SharedFilterConfig::new(self.config.initial_filter());
        if let Some(mode) = filter {
            shared.set_mode(mode);
        }
        if let Some(intensity) = intensity {
            shared.set_intensity(intensity);
        }
        shared
    }
}

fn start_pipeline(image: Option<&Path>, config: SharedFilterConfig) -> AppResult<PreviewPipeline> {
    let engine = CpuFilterEngine::new();
    Ok(match image {
        Some(path) => PreviewPipeline::start(ImageFileSource::open(path)?, engine, config),
        None => PreviewPipeline::start(SyntheticSource::default(), engine, config),
    })
}

/// Run the live pipeline, printing counters once per second
pub fn preview(
    ctx: &Context,
    filter: Option<FilterMode>,
    intensity: Option<i32>,
    seconds: Option<u64>,
    image: Option<PathBuf>,
) -> AppResult<()> {
    let config = ctx.filter_config(filter, intensity);
    let selected = config.load();
    if selected.mode.uses_intensity() {
        println!("Filter: {} (intensity {})", selected.mode.display_name(), selected.intensity);
    } else {
        println!("Filter: {}", selected.mode.display_name());
    }

    let stop = Arc::new(AtomicBool::new(false));
    let stop_handler = Arc::clone(&stop);
    ctrlc::set_handler(move || stop_handler.store(true, Ordering::SeqCst))?;

    let mut pipeline = start_pipeline(image.as_deref(), config)?;
    let stats = pipeline.stats();
    let deadline = seconds.map(|s| Instant::now() + Duration::from_secs(s));
    let mut next_report = Instant::now() + timing::FPS_WINDOW;

    println!("Press Ctrl-C to stop");
    while !stop.load(Ordering::SeqCst) && pipeline.is_running() {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            break;
        }
        if Instant::now() >= next_report {
            let s = stats.snapshot();
            println!(
                "fps={} frames={} errors={} dropped={}",
                s.fps, s.frames_processed, s.processing_errors, s.dropped_frames
            );
            next_report += timing::FPS_WINDOW;
        }
        std::thread::sleep(timing::LOOP_POLL_INTERVAL);
    }

    pipeline.stop();
    let s = stats.snapshot();
    println!(
        "Processed {} frames ({} errors, {} dropped)",
        s.frames_processed, s.processing_errors, s.dropped_frames
    );
    Ok(())
}

/// Warm the pipeline up and save one snapshot
pub fn capture(
    ctx: &Context,
    filter: Option<FilterMode>,
    intensity: Option<i32>,
    image: Option<PathBuf>,
    warmup_ms: u64,
) -> AppResult<()> {
    let config = ctx.filter_config(filter, intensity);
    let mut pipeline = start_pipeline(image.as_deref(), config)?;
    let service = CaptureService::new(
        pipeline.latest(),
        Arc::clone(&ctx.store),
        ctx.config.app_prefix.clone(),
        ctx.config.album.clone(),
    )
    .with_quality(ctx.config.jpeg_quality);

    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(async {
        tokio::time::sleep(Duration::from_millis(warmup_ms)).await;
        // Slow sources may not have delivered anything yet
        let _ = tokio::time::timeout(Duration::from_secs(5), pipeline.latest().wait_for_frame()).await;
        service.capture().await
    });
    pipeline.stop();

    let receipt = result?;
    println!("Saved: {}", receipt.artifact.id);
    println!(
        "Filter: {} (intensity {})",
        receipt.artifact.provenance.mode.display_name(),
        receipt.artifact.provenance.intensity
    );
    if !receipt.metadata_attached {
        println!("Warning: provenance could not be attached");
    }
    if ctx.ephemeral {
        println!("(ephemeral storage: the snapshot is discarded on exit)");
    }
    Ok(())
}

/// Print the catalog with favorite markers and provenance
pub fn list(ctx: &Context) -> AppResult<()> {
    let catalog = ctx.catalog();
    let entries = match catalog.load()? {
        CatalogListing::Empty => {
            println!("No saved images");
            return Ok(());
        }
        CatalogListing::Entries(entries) => entries,
    };

    for entry in &entries {
        let marker = if entry.is_favorite { "*" } else { " " };
        let filter = match catalog.provenance(&entry.id) {
            Ok(Some(p)) => format!("{} {}", p.mode, p.intensity),
            _ => parse_artifact_name(entry.id.name())
                .map(|c| format!("{} {}", c.mode, c.intensity))
                .unwrap_or_else(|| "-".to_string()),
        };
        println!(
            "{} {}  {}  {}",
            marker,
            entry.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
            filter,
            entry.id.name()
        );
    }
    println!("{} image(s)", entries.len());
    Ok(())
}

/// Print the provenance of one snapshot
pub fn show(ctx: &Context, raw_id: &str) -> AppResult<()> {
    let catalog = ctx.catalog();
    let id = ctx.resolve_id(raw_id);

    match catalog.provenance(&id)? {
        Some(p) => {
            println!("Id:        {}", id);
            println!("Filter:    {}", p.mode.display_name());
            println!("Intensity: {}", p.intensity);
            println!("Created:   {}", p.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S%.3f"));
        }
        None => {
            println!("Id:        {}", id);
            match parse_artifact_name(id.name()) {
                Some(c) => {
                    println!("Filter:    {} (from file name)", c.mode.display_name());
                    println!("Intensity: {}", c.intensity);
                }
                None => println!("No provenance recorded"),
            }
        }
    }
    println!("Favorite:  {}", if catalog.is_favorite(&id) { "yes" } else { "no" });
    Ok(())
}

/// Delete one snapshot; a missing one is reported, not treated as an error
pub fn delete(ctx: &Context, raw_id: &str) -> AppResult<()> {
    let catalog = ctx.catalog();
    let id = ctx.resolve_id(raw_id);

    match catalog.delete(&id) {
        Ok(()) => println!("Deleted: {}", id),
        Err(DeleteError::NotFound(id)) => println!("Already deleted: {}", id),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Toggle the favorite flag of one snapshot
pub fn favorite(ctx: &Context, raw_id: &str) -> AppResult<()> {
    let catalog = ctx.catalog();
    let id = ctx.resolve_id(raw_id);

    if catalog.toggle_favorite(&id) {
        println!("{} is now a favorite", id);
    } else {
        println!("{} is no longer a favorite", id);
    }
    Ok(())
}

/// Print the effective configuration and resolved paths
pub fn print_config(ctx: &Context) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(&ctx.config)?);
    if let Some(path) = &ctx.config_path {
        println!("Config file:    {}", path.display());
    }
    println!(
        "Snapshots:      {}",
        ctx.config.pictures_root().join(&ctx.config.album).display()
    );
    println!("Favorites file: {}", ctx.config.favorites_path().display());
    if ctx.ephemeral {
        println!("Storage:        in memory (--ephemeral)");
    }
    Ok(())
}
