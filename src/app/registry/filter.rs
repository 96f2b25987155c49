//! Range filters over registry entries
//!
//! Pressure and temperature are point checks against strict bounds. The
//! wavenumber check is a coverage test instead: a record passes only when its
//! own band extends strictly past both ends of the requested band.

use crate::app::models::{BoundRange, CrossSectionRecord, MoleculeId};

use super::MetadataRegistry;

/// Which cross-section files of a molecule satisfy physical constraints
#[derive(Debug, Clone, PartialEq)]
pub struct CrossSectionFilter {
    pub molecule_id: MoleculeId,
    pub wn_range: Option<BoundRange>,
    pub pressure_range: Option<BoundRange>,
    pub temp_range: Option<BoundRange>,
}

impl CrossSectionFilter {
    /// A filter with no constraints beyond the molecule
    pub fn new(molecule_id: MoleculeId) -> Self {
        Self {
            molecule_id,
            wn_range: None,
            pressure_range: None,
            temp_range: None,
        }
    }

    /// Require the record's band to cover `range` (cm-1)
    pub fn with_wn_range(mut self, range: BoundRange) -> Self {
        self.wn_range = Some(range);
        self
    }

    /// Require pressure (Torr) strictly inside `range`
    pub fn with_pressure_range(mut self, range: BoundRange) -> Self {
        self.pressure_range = Some(range);
        self
    }

    /// Require temperature (K) strictly inside `range`
    pub fn with_temp_range(mut self, range: BoundRange) -> Self {
        self.temp_range = Some(range);
        self
    }

    pub fn passes(&self, record: &CrossSectionRecord) -> bool {
        self.pressure_range
            .map_or(true, |r| r.strictly_contains(record.pressure))
            && self
                .temp_range
                .map_or(true, |r| r.strictly_contains(record.temperature))
            && self
                .wn_range
                .map_or(true, |r| r.strictly_covered_by(record.numin, record.numax))
    }

    /// File names of the molecule's records that pass, in registry order
    pub async fn matching_filenames(&self, registry: &MetadataRegistry) -> Vec<String> {
        registry
            .with_records(self.molecule_id, |records| {
                records
                    .iter()
                    .filter(|r| self.passes(r))
                    .map(|r| r.filename.clone())
                    .collect()
            })
            .await
    }

    /// Full records of the molecule that pass, in registry order
    pub async fn matching_records(&self, registry: &MetadataRegistry) -> Vec<CrossSectionRecord> {
        registry
            .with_records(self.molecule_id, |records| {
                records.iter().filter(|r| self.passes(r)).cloned().collect()
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::test_support::record;

    fn ccl4() -> CrossSectionRecord {
        record(139, 104, "CCl4_296.7K-757.7Torr_750.0-812.0_00.xsc", 757.7, 296.7, 750.0, 812.0)
    }

    #[test]
    fn test_unconstrained_filter_passes_everything() {
        assert!(CrossSectionFilter::new(MoleculeId(104)).passes(&ccl4()));
    }

    #[test]
    fn test_pressure_and_temperature_ranges() {
        let filter = CrossSectionFilter::new(MoleculeId(104))
            .with_pressure_range(BoundRange::new(700.0, 800.0))
            .with_temp_range(BoundRange::new(290.0, 300.0));
        assert!(filter.passes(&ccl4()));

        let filter =
            CrossSectionFilter::new(MoleculeId(104)).with_pressure_range(BoundRange::new(758.0, 900.0));
        assert!(!filter.passes(&ccl4()));

        let filter =
            CrossSectionFilter::new(MoleculeId(104)).with_temp_range(BoundRange::new(296.7, 300.0));
        assert!(!filter.passes(&ccl4()), "bounds are exclusive");
    }

    #[test]
    fn test_wavenumber_coverage() {
        let covered =
            CrossSectionFilter::new(MoleculeId(104)).with_wn_range(BoundRange::new(760.0, 800.0));
        assert!(covered.passes(&ccl4()));

        let wider =
            CrossSectionFilter::new(MoleculeId(104)).with_wn_range(BoundRange::new(700.0, 820.0));
        assert!(!wider.passes(&ccl4()));

        // Overlapping but not covered
        let overlap =
            CrossSectionFilter::new(MoleculeId(104)).with_wn_range(BoundRange::new(780.0, 850.0));
        assert!(!overlap.passes(&ccl4()));

        let touching =
            CrossSectionFilter::new(MoleculeId(104)).with_wn_range(BoundRange::new(750.0, 800.0));
        assert!(!touching.passes(&ccl4()));
    }

    #[tokio::test]
    async fn test_matching_filenames() {
        let registry = MetadataRegistry::new();
        registry
            .ingest(vec![
                ccl4(),
                record(140, 104, "CCl4_250.0K-7.5Torr_750.0-812.0_00.xsc", 7.5, 250.0, 750.0, 812.0),
                record(141, 104, "CCl4_296.0K-760.0Torr_700.0-900.0_00.xsc", 760.0, 296.0, 700.0, 900.0),
                record(900, 31, "H2S_296.0K-760.0Torr_700.0-900.0_00.xsc", 760.0, 296.0, 700.0, 900.0),
            ])
            .await;

        let filter = CrossSectionFilter::new(MoleculeId(104))
            .with_pressure_range(BoundRange::new(700.0, 800.0))
            .with_wn_range(BoundRange::new(760.0, 800.0));

        assert_eq!(
            filter.matching_filenames(&registry).await,
            vec![
                "CCl4_296.7K-757.7Torr_750.0-812.0_00.xsc".to_string(),
                "CCl4_296.0K-760.0Torr_700.0-900.0_00.xsc".to_string(),
            ]
        );
        let records = filter.matching_records(&registry).await;
        assert_eq!(records.iter().map(|r| r.id).collect::<Vec<_>>(), vec![139, 141]);
    }

    #[test]
    fn test_unknown_molecule_matches_nothing() {
        let registry = MetadataRegistry::new();
        tokio_test::block_on(registry.ingest(vec![ccl4()]));

        let filter = CrossSectionFilter::new(MoleculeId(7));
        assert!(tokio_test::block_on(filter.matching_filenames(&registry)).is_empty());
    }
}
