use std::collections::BTreeMap;
use std::path::Path;

use polars::prelude::*;

use super::{load_table, VariationTable};
use crate::error::PlotError;

/// Pileup reweighting, indexed by the number of true interactions.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(transparent)]
pub struct PileupWeights {
    tables: BTreeMap<String, VariationTable>,
}

impl PileupWeights {
    pub fn load(path: &Path) -> Result<Self, PlotError> {
        load_table(path)
    }

    fn for_era(&self, era: u16) -> Result<&VariationTable, PlotError> {
        self.tables
            .get(&era.to_string())
            .ok_or_else(|| PlotError::Config(format!("No pileup weights for era {}", era)))
    }

    /// Per-event weight from `Pileup_nTrueInt`. Interaction counts beyond
    /// the table fall back to unit weight.
    pub fn event_weights(
        &self,
        df: &DataFrame,
        era: u16,
        syst: &str,
    ) -> Result<Vec<f64>, PlotError> {
        let table = self.for_era(era)?;
        let weights = table.select(syst, "puweights_up", "puweights_down");
        let ntrue = df.column("Pileup_nTrueInt")?.f64()?;
        Ok(ntrue
            .iter()
            .map(|value| {
                let index = value.unwrap_or(0.0).max(0.0) as usize;
                weights.get(index).copied().unwrap_or(1.0)
            })
            .collect())
    }
}
