//! Cross-section metadata registry
//!
//! The registry is the shared in-memory index of cross-section metadata,
//! keyed by molecule. It is created once and handed to every consumer as an
//! `Arc<MetadataRegistry>`; batches fetched by concurrent loaders are merged
//! into it under a write lock so no update is lost, while readers clone a
//! consistent snapshot under the read lock.
//!
//! Ingestion is additive: ingesting the same records twice stores them twice
//! unless [`DedupPolicy::ById`] is selected.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::app::models::{CrossSectionRecord, MoleculeDirectory, MoleculeId};

pub mod filter;

pub use filter::CrossSectionFilter;

/// How repeated records are handled on ingest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupPolicy {
    /// Append every record, duplicates included
    #[default]
    Append,
    /// Skip records whose `id` is already stored for the same molecule
    ById,
}

/// Registry behaviour settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub dedup: DedupPolicy,
}

/// Outcome of an ingest or replace
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Records stored
    pub accepted: usize,
    /// Records skipped by [`DedupPolicy::ById`]
    pub skipped_duplicates: usize,
    /// Molecules touched, in ascending order
    pub molecules: Vec<MoleculeId>,
}

/// Per-molecule overview
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoleculeSummary {
    pub molecule_id: MoleculeId,
    pub name: Option<String>,
    pub record_count: usize,
}

/// Shared index of cross-section records by molecule
#[derive(Debug, Default)]
pub struct MetadataRegistry {
    config: RegistryConfig,
    entries: RwLock<HashMap<MoleculeId, Vec<CrossSectionRecord>>>,
}

impl MetadataRegistry {
    /// Create an empty registry that appends every record
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            config,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Merge a batch of records into the registry
    ///
    /// Records are grouped by molecule and appended in input order. The whole
    /// batch is applied under one write guard.
    pub async fn ingest<I>(&self, records: I) -> IngestReport
    where
        I: IntoIterator<Item = CrossSectionRecord>,
    {
        let mut report = IngestReport::default();
        let mut entries = self.entries.write().await;

        for record in records {
            let molecule_id = record.molecule_id;
            let list = entries.entry(molecule_id).or_default();

            if self.config.dedup == DedupPolicy::ById && list.iter().any(|r| r.id == record.id) {
                report.skipped_duplicates += 1;
                continue;
            }

            list.push(record);
            report.accepted += 1;
            if !report.molecules.contains(&molecule_id) {
                report.molecules.push(molecule_id);
            }
        }
        drop(entries);

        report.molecules.sort();
        info!(
            "Ingested {} cross-section records for {} molecules ({} duplicates skipped)",
            report.accepted,
            report.molecules.len(),
            report.skipped_duplicates
        );
        report
    }

    /// Replace the entries of every molecule present in `records`
    ///
    /// Molecules absent from the batch keep their current entries.
    pub async fn replace<I>(&self, records: I) -> IngestReport
    where
        I: IntoIterator<Item = CrossSectionRecord>,
    {
        let mut grouped: HashMap<MoleculeId, Vec<CrossSectionRecord>> = HashMap::new();
        let mut report = IngestReport::default();

        for record in records {
            let list = grouped.entry(record.molecule_id).or_default();
            if self.config.dedup == DedupPolicy::ById && list.iter().any(|r| r.id == record.id) {
                report.skipped_duplicates += 1;
                continue;
            }
            list.push(record);
            report.accepted += 1;
        }

        report.molecules = grouped.keys().copied().collect();
        report.molecules.sort();

        let mut entries = self.entries.write().await;
        entries.extend(grouped);
        drop(entries);

        info!(
            "Replaced cross-section records for {} molecules ({} records)",
            report.molecules.len(),
            report.accepted
        );
        report
    }

    /// Run `f` over the records of one molecule under the read guard
    pub async fn with_records<R>(
        &self,
        molecule_id: MoleculeId,
        f: impl FnOnce(&[CrossSectionRecord]) -> R,
    ) -> R {
        let entries = self.entries.read().await;
        let records = entries.get(&molecule_id).map(Vec::as_slice).unwrap_or(&[]);
        f(records)
    }

    /// Snapshot of a molecule's records; empty if none were ingested
    pub async fn lookup(&self, molecule_id: MoleculeId) -> Vec<CrossSectionRecord> {
        self.with_records(molecule_id, <[CrossSectionRecord]>::to_vec)
            .await
    }

    /// File names of a molecule's records, in registry order
    pub async fn filenames(&self, molecule_id: MoleculeId) -> Vec<String> {
        self.with_records(molecule_id, |records| {
            records.iter().map(|r| r.filename.clone()).collect()
        })
        .await
    }

    pub async fn contains(&self, molecule_id: MoleculeId) -> bool {
        self.entries.read().await.contains_key(&molecule_id)
    }

    /// Molecules with at least one entry, ascending
    pub async fn molecule_ids(&self) -> Vec<MoleculeId> {
        let mut ids: Vec<MoleculeId> = self.entries.read().await.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Total number of stored records across all molecules
    pub async fn record_count(&self) -> usize {
        self.entries.read().await.values().map(Vec::len).sum()
    }

    /// Record counts per molecule with names from `directory`
    pub async fn summaries(&self, directory: &dyn MoleculeDirectory) -> Vec<MoleculeSummary> {
        let entries = self.entries.read().await;
        let mut summaries: Vec<MoleculeSummary> = entries
            .iter()
            .map(|(id, records)| MoleculeSummary {
                molecule_id: *id,
                name: directory.name(*id),
                record_count: records.len(),
            })
            .collect();
        drop(entries);

        summaries.sort_by_key(|s| s.molecule_id);
        debug!("Summarized {} molecules", summaries.len());
        summaries
    }
}
