use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write as _};
use std::path::Path;

use polars::prelude::*;

use super::histogram1d::Histogram;
use super::histogram2d::Histogram2D;
use crate::error::PlotError;

/// One rectangular cell of the ABCD grid, or the inclusive no-cut entry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub enum RegionId {
    Inclusive,
    Cell(char),
}

impl RegionId {
    pub fn prefix(&self) -> String {
        match self {
            RegionId::Inclusive => String::new(),
            RegionId::Cell(letter) => format!("{}_", letter),
        }
    }
}

/// Structured histogram key. The string rendering (`A_ht_Cluster`) only
/// exists at the serialization boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct HistKey {
    pub observable: String,
    pub region: RegionId,
    pub label: String,
}

impl HistKey {
    pub fn new(observable: &str, region: RegionId, label: &str) -> Self {
        Self {
            observable: observable.to_string(),
            region,
            label: label.to_string(),
        }
    }

    pub fn render(&self) -> String {
        format!("{}{}_{}", self.region.prefix(), self.observable, self.label)
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum HistEntry {
    H1(Histogram),
    H2(Histogram2D),
}

impl HistEntry {
    pub fn scale(&mut self, factor: f64) {
        match self {
            HistEntry::H1(h) => h.scale(factor),
            HistEntry::H2(h) => h.scale(factor),
        }
    }
}

/// The histogram collection for a run. Owns every booked histogram and the
/// set of already-processed labels; handed back at the end of the run for
/// serialization.
#[derive(Debug, Default)]
pub struct HistogramRegistry {
    hists: HashMap<HistKey, HistEntry>,
    labels: HashSet<String>,
}

impl HistogramRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a label as processed; returns false if it already was, in
    /// which case booking for that label is a no-op.
    pub fn mark_processed(&mut self, label: &str) -> bool {
        self.labels.insert(label.to_string())
    }

    pub fn book_1d(&mut self, key: HistKey, bins: usize, range: (f64, f64)) {
        if !self.hists.contains_key(&key) {
            let hist = Histogram::new(&key.render(), bins, range);
            self.hists.insert(key, HistEntry::H1(hist));
        }
    }

    pub fn book_2d(&mut self, key: HistKey, bins: (usize, usize), range: ((f64, f64), (f64, f64))) {
        if !self.hists.contains_key(&key) {
            let hist = Histogram2D::new(&key.render(), bins, range);
            self.hists.insert(key, HistEntry::H2(hist));
        }
    }

    pub fn len(&self) -> usize {
        self.hists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hists.is_empty()
    }

    pub fn contains(&self, key: &HistKey) -> bool {
        self.hists.contains_key(key)
    }

    pub fn get(&self, key: &HistKey) -> Option<&HistEntry> {
        self.hists.get(key)
    }

    pub fn get_mut(&mut self, key: &HistKey) -> Option<&mut HistEntry> {
        self.hists.get_mut(key)
    }

    pub fn insert(&mut self, key: HistKey, entry: HistEntry) {
        self.hists.insert(key, entry);
    }

    pub fn keys(&self) -> impl Iterator<Item = &HistKey> {
        self.hists.keys()
    }

    pub fn fill_1d(&mut self, key: &HistKey, values: &Float64Chunked, weights: &Float64Chunked) {
        match self.hists.get_mut(key) {
            Some(HistEntry::H1(hist)) => {
                for (value, weight) in values.iter().zip(weights.iter()) {
                    if let (Some(v), Some(w)) = (value, weight) {
                        hist.fill(v, w);
                    }
                }
            }
            Some(HistEntry::H2(_)) => {
                log::error!("Histogram '{}' is 2D, expected 1D", key.render());
            }
            None => log::error!("Histogram '{}' not found in the registry", key.render()),
        }
    }

    pub fn fill_2d(
        &mut self,
        key: &HistKey,
        x_values: &Float64Chunked,
        y_values: &Float64Chunked,
        weights: &Float64Chunked,
    ) {
        match self.hists.get_mut(key) {
            Some(HistEntry::H2(hist)) => {
                for ((x, y), weight) in x_values.iter().zip(y_values.iter()).zip(weights.iter()) {
                    if let (Some(x), Some(y), Some(w)) = (x, y, weight) {
                        hist.fill(x, y, w);
                    }
                }
            }
            Some(HistEntry::H1(_)) => {
                log::error!("Histogram '{}' is 1D, expected 2D", key.render());
            }
            None => log::error!("Histogram '{}' not found in the registry", key.render()),
        }
    }

    /// Multiply every histogram by `factor` (cross-section normalization).
    pub fn scale_all(&mut self, factor: f64) {
        for entry in self.hists.values_mut() {
            entry.scale(factor);
        }
    }

    /// Rendered-name view, used at the serialization boundary.
    pub fn to_named(&self) -> BTreeMap<String, HistEntry> {
        self.hists
            .iter()
            .map(|(key, entry)| (key.render(), entry.clone()))
            .collect()
    }

    pub fn save_json(&self, path: &Path) -> Result<(), PlotError> {
        let mut file = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut file, &self.to_named())?;
        file.flush()?;
        Ok(())
    }

    pub fn save_binary(&self, path: &Path) -> Result<(), PlotError> {
        let mut file = BufWriter::new(File::create(path)?);
        bincode::serialize_into(&mut file, &self.to_named())?;
        file.flush()?;
        Ok(())
    }

    pub fn load_binary(path: &Path) -> Result<BTreeMap<String, HistEntry>, PlotError> {
        let file = BufReader::new(File::open(path)?);
        Ok(bincode::deserialize_from(file)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_keys() {
        let key = HistKey::new("ht", RegionId::Cell('A'), "Cluster");
        assert_eq!(key.render(), "A_ht_Cluster");
        let key = HistKey::new("ht", RegionId::Inclusive, "Cluster_puweights_up");
        assert_eq!(key.render(), "ht_Cluster_puweights_up");
    }

    #[test]
    fn booking_is_idempotent() {
        let mut registry = HistogramRegistry::new();
        let key = HistKey::new("ht", RegionId::Inclusive, "Cluster");
        registry.book_1d(key.clone(), 100, (0.0, 10000.0));

        if let Some(HistEntry::H1(h)) = registry.get_mut(&key) {
            h.fill(5000.0, 1.0);
        }
        registry.book_1d(key.clone(), 100, (0.0, 10000.0));

        match registry.get(&key) {
            Some(HistEntry::H1(h)) => assert_eq!(h.integral(false), 1.0),
            _ => panic!("missing histogram"),
        }
    }

    #[test]
    fn binary_round_trip() {
        let mut registry = HistogramRegistry::new();
        let key1 = HistKey::new("ht", RegionId::Cell('B'), "Cluster");
        registry.book_1d(key1.clone(), 10, (0.0, 100.0));
        let key2 = HistKey::new("ABCDvars", RegionId::Inclusive, "Cluster");
        registry.book_2d(key2.clone(), (4, 4), ((0.0, 1.0), (0.0, 1000.0)));

        if let Some(HistEntry::H1(h)) = registry.get_mut(&key1) {
            h.fill(50.0, 1.5);
            h.fill(500.0, 2.0);
        }
        if let Some(HistEntry::H2(h)) = registry.get_mut(&key2) {
            h.fill(0.5, 500.0, 0.3);
        }

        let path = std::env::temp_dir().join("suep_plotter_registry_roundtrip.bin");
        registry.save_binary(&path).unwrap();
        let loaded = HistogramRegistry::load_binary(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, registry.to_named());
    }
}
