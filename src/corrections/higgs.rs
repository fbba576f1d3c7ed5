use std::path::Path;

use polars::prelude::*;

use super::{bin_index, load_table, BinnedVariation};
use crate::error::PlotError;

/// Higgs pT reweighting, binned in the generated SUEP pT. Only applied to
/// the central SUEP signal samples.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(transparent)]
pub struct HiggsReweight {
    table: BinnedVariation,
}

impl HiggsReweight {
    pub fn load(path: &Path) -> Result<Self, PlotError> {
        load_table(path)
    }

    /// Whether `sample` should be reweighted at all.
    pub fn applies_to(sample: &str) -> bool {
        sample.contains("SUEP-m125")
    }

    pub fn event_weights(&self, df: &DataFrame, syst: &str) -> Result<Vec<f64>, PlotError> {
        let weights = self
            .table
            .weights
            .select(syst, "higgs_weights_up", "higgs_weights_down");
        let gen_pt = df.column("SUEP_genPt")?.f64()?;
        Ok(gen_pt
            .iter()
            .map(|value| {
                let index = bin_index(&self.table.bins, value.unwrap_or(0.0));
                weights.get(index).copied().unwrap_or(1.0)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_central_signal_samples() {
        assert!(HiggsReweight::applies_to("SUEP-m125-darkPho"));
        assert!(!HiggsReweight::applies_to("QCD_Pt_470to600"));
    }

    #[test]
    fn binned_in_gen_pt() {
        let higgs: HiggsReweight = serde_json::from_str(
            r#"{
                "bins": [0.0, 100.0, 300.0],
                "nominal": [1.1, 0.9],
                "up": [1.2, 1.0],
                "down": [1.0, 0.8]
            }"#,
        )
        .unwrap();

        let df = df!("SUEP_genPt" => [50.0, 200.0, 1000.0]).unwrap();
        let nominal = higgs.event_weights(&df, "").unwrap();
        assert_eq!(nominal, vec![1.1, 0.9, 0.9]);

        let up = higgs.event_weights(&df, "higgs_weights_up").unwrap();
        assert_eq!(up, vec![1.2, 1.0, 1.0]);
    }
}
