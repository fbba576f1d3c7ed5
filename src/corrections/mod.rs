use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::PlotError;

pub mod gnn;
pub mod higgs;
pub mod pileup;
pub mod track_killing;
pub mod trigger;
pub mod xsection;

pub use gnn::GnnSyst;
pub use higgs::HiggsReweight;
pub use pileup::PileupWeights;
pub use trigger::TriggerScaleFactors;
pub use xsection::{lumi, XSectionTable};

pub(crate) fn load_table<T: DeserializeOwned>(path: &Path) -> Result<T, PlotError> {
    let file = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(file)?)
}

/// Weights for one correction with its up and down variations, indexed
/// directly (pileup) or through a set of bin edges.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct VariationTable {
    pub nominal: Vec<f64>,
    pub up: Vec<f64>,
    pub down: Vec<f64>,
}

impl VariationTable {
    pub fn select(&self, syst: &str, up_tag: &str, down_tag: &str) -> &[f64] {
        if syst == up_tag {
            &self.up
        } else if syst == down_tag {
            &self.down
        } else {
            &self.nominal
        }
    }
}

/// A variation table with explicit bin edges; `bins` has one more entry
/// than each weight list.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct BinnedVariation {
    pub bins: Vec<f64>,
    #[serde(flatten)]
    pub weights: VariationTable,
}

/// Bin holding `value`, clamped to the outermost bins.
pub(crate) fn bin_index(bins: &[f64], value: f64) -> usize {
    if bins.len() < 2 {
        return 0;
    }
    let i = bins.partition_point(|edge| *edge <= value);
    i.saturating_sub(1).min(bins.len() - 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bin_index_clamps_to_range() {
        let bins = [0.0, 1.0, 2.0, 3.0];
        assert_eq!(bin_index(&bins, -5.0), 0);
        assert_eq!(bin_index(&bins, 0.5), 0);
        assert_eq!(bin_index(&bins, 1.0), 1);
        assert_eq!(bin_index(&bins, 2.9), 2);
        assert_eq!(bin_index(&bins, 100.0), 2);
    }

    #[test]
    fn select_variation() {
        let table = VariationTable {
            nominal: vec![1.0],
            up: vec![2.0],
            down: vec![0.5],
        };
        assert_eq!(table.select("", "x_up", "x_down"), &[1.0]);
        assert_eq!(table.select("x_up", "x_up", "x_down"), &[2.0]);
        assert_eq!(table.select("x_down", "x_up", "x_down"), &[0.5]);
        assert_eq!(table.select("other_up", "x_up", "x_down"), &[1.0]);
    }
}
