use std::collections::BTreeMap;
use std::path::Path;

use polars::prelude::*;

use super::{bin_index, load_table, BinnedVariation};
use crate::error::PlotError;

/// Trigger efficiency scale factors binned in `ht`.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(transparent)]
pub struct TriggerScaleFactors {
    tables: BTreeMap<String, BinnedVariation>,
}

impl TriggerScaleFactors {
    pub fn load(path: &Path) -> Result<Self, PlotError> {
        load_table(path)
    }

    fn for_era(&self, era: u16) -> Result<&BinnedVariation, PlotError> {
        self.tables
            .get(&era.to_string())
            .ok_or_else(|| PlotError::Config(format!("No trigger scale factors for era {}", era)))
    }

    pub fn event_weights(
        &self,
        df: &DataFrame,
        era: u16,
        syst: &str,
    ) -> Result<Vec<f64>, PlotError> {
        let table = self.for_era(era)?;
        let weights = table.weights.select(syst, "trigSF_up", "trigSF_down");
        let ht = df.column("ht")?.f64()?;
        Ok(ht
            .iter()
            .map(|value| {
                let index = bin_index(&table.bins, value.unwrap_or(0.0));
                weights.get(index).copied().unwrap_or(1.0)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scale_factors() -> TriggerScaleFactors {
        serde_json::from_str(
            r#"{"2018": {
                "bins": [0.0, 1000.0, 1500.0],
                "nominal": [0.9, 1.0],
                "up": [0.95, 1.05],
                "down": [0.85, 0.95]
            }}"#,
        )
        .unwrap()
    }

    #[test]
    fn binned_in_ht() {
        let df = df!("ht" => [500.0, 1200.0, 9000.0]).unwrap();
        let sf = scale_factors();

        let nominal = sf.event_weights(&df, 2018, "").unwrap();
        assert_eq!(nominal, vec![0.9, 1.0, 1.0]);

        let down = sf.event_weights(&df, 2018, "trigSF_down").unwrap();
        assert_eq!(down, vec![0.85, 0.95, 0.95]);
    }
}
