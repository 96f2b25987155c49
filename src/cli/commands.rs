//! Command handlers for the HITRAN XSC CLI
//!
//! Each handler builds the components it needs from the loaded
//! [`AppConfig`], runs the command and prints a human-readable report.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::app::{
    CacheKey, CrossSectionMeta, DiskCacheStore, HitranClient, LoadSource, MetaLoader,
    MetadataRegistry, MoleculeDirectory, MoleculeId,
};
use crate::cli::args::{CacheAction, CacheArgs, ListArgs, XscAction, XscArgs};
use crate::config::AppConfig;
use crate::constants::env as env_constants;
use crate::errors::{AppError, Result};

/// Handle `xsc` subcommands
pub async fn handle_xsc(args: XscArgs, config: &AppConfig) -> Result<()> {
    match args.action {
        XscAction::List(list) => handle_xsc_list(list, config).await,
        XscAction::Molecules { refresh } => handle_xsc_molecules(refresh, config).await,
    }
}

/// Handle `cache` subcommands
pub async fn handle_cache(args: CacheArgs, config: &AppConfig) -> Result<()> {
    match args.action {
        CacheAction::Info => handle_cache_info(config).await,
        CacheAction::Clear => handle_cache_clear(config).await,
    }
}

async fn build_loader(config: &AppConfig) -> Result<MetaLoader> {
    let (cache_config, client_config, registry_config) = config.to_runtime_config();

    if client_config.api_key.is_none() {
        debug!(
            "No HITRAN API key configured; only cached metadata is available (set {})",
            env_constants::API_KEY
        );
    }

    let store = Arc::new(DiskCacheStore::new(&cache_config).await?);
    let registry = Arc::new(MetadataRegistry::with_config(registry_config));
    let client = Arc::new(HitranClient::new(client_config)?);

    Ok(MetaLoader::with_client(
        store,
        registry,
        client,
        cache_config.max_age,
    ))
}

async fn load_meta(
    loader: &MetaLoader,
    molecule_id: MoleculeId,
    refresh: bool,
) -> Result<CrossSectionMeta> {
    let meta = if refresh {
        info!("Refreshing cross-section metadata");
        loader.refresh(molecule_id).await
    } else {
        loader.load(molecule_id).await
    };

    if !meta.is_loaded() {
        return Err(AppError::generic(format!(
            "Cross-section metadata is unavailable: nothing cached and the HITRAN request failed. \
             Check your network connection and {}",
            env_constants::API_KEY
        )));
    }

    if meta.source() == Some(LoadSource::StaleFallback) {
        println!("⚠️  HITRAN could not be reached; showing cached metadata that may be out of date.");
        println!();
    }
    if meta.malformed_count() > 0 {
        warn!("{} malformed cross-section records were skipped", meta.malformed_count());
    }

    Ok(meta)
}

/// Handle `xsc list`
async fn handle_xsc_list(args: ListArgs, config: &AppConfig) -> Result<()> {
    let loader = build_loader(config).await?;
    let molecule_id = args.molecule_id();
    let meta = load_meta(&loader, molecule_id, args.refresh).await?;

    let filter = args.to_filter();
    let records = filter.matching_records(loader.registry()).await;

    let directory = config.molecule_directory()?;
    let name = directory
        .name(molecule_id)
        .unwrap_or_else(|| format!("molecule {}", molecule_id));

    if records.is_empty() {
        println!(
            "No cross-sections of {} match ({} known in total).",
            name,
            meta.metas().len()
        );
        return Ok(());
    }

    println!(
        "🔬 {} of {} cross-sections of {} match:",
        records.len(),
        meta.metas().len(),
        name
    );
    for record in &records {
        if args.details {
            println!(
                "  {}  {:>8.1} Torr  {:>6.1} K  {:.1}-{:.1} cm-1",
                record.filename, record.pressure, record.temperature, record.numin, record.numax
            );
        } else {
            println!("  {}", record.filename);
        }
    }

    Ok(())
}

/// Handle `xsc molecules`
async fn handle_xsc_molecules(refresh: bool, config: &AppConfig) -> Result<()> {
    let loader = build_loader(config).await?;
    let directory = config.molecule_directory()?;

    // Any molecule id loads the shared metadata file
    let probe = MoleculeId(0);
    load_meta(&loader, probe, refresh).await?;

    let summaries = loader.registry().summaries(&directory).await;

    println!("🧪 Molecules with cross-sections");
    println!("================================");
    if summaries.is_empty() {
        println!("No cross-section metadata found.");
        return Ok(());
    }

    println!("{:>6}  {:<16}  {:>8}", "ID", "Name", "Files");
    for summary in summaries {
        println!(
            "{:>6}  {:<16}  {:>8}",
            summary.molecule_id,
            summary.name.as_deref().unwrap_or("-"),
            summary.record_count
        );
    }

    Ok(())
}

/// Handle `cache info`
async fn handle_cache_info(config: &AppConfig) -> Result<()> {
    let cache_config = config.cache_config();
    let store = DiskCacheStore::new(&cache_config).await?;
    let entries = store.entries().await?;
    let now = Utc::now();

    println!("💾 Cache Information");
    println!("===================");
    println!("Location: {}", store.root().display());
    println!("Max age: {:?}", cache_config.max_age);
    println!("Cached entries: {}", entries.len());

    for entry in &entries {
        let status = match entry.timestamp {
            Some(ts) if entry.is_fresh_at(cache_config.max_age, now) => {
                format!("fresh, written {}", ts.format("%Y-%m-%d %H:%M:%S UTC"))
            }
            Some(ts) => format!("stale, written {}", ts.format("%Y-%m-%d %H:%M:%S UTC")),
            None => "unreadable".to_string(),
        };
        println!(
            "  {:<28} {:>10.1} KB  {}",
            entry.file_name,
            entry.size_bytes as f64 / 1024.0,
            status
        );
    }

    if !entries.iter().any(|e| e.file_name == CacheKey::xscm().file_name()) {
        println!();
        println!("No cross-section metadata cached yet. Run 'hitran_xsc xsc molecules' to fetch it.");
    }

    Ok(())
}

/// Handle `cache clear`
async fn handle_cache_clear(config: &AppConfig) -> Result<()> {
    let store = DiskCacheStore::new(&config.cache_config()).await?;
    let removed = store.clear().await?;

    println!("🧹 Cache Cleanup");
    println!("===============");
    println!("Removed {} cached entries from {}", removed, store.root().display());

    Ok(())
}
