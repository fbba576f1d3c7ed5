use std::collections::BTreeMap;
use std::path::Path;

use super::{bin_index, load_table};
use crate::error::PlotError;
use crate::histoer::{HistEntry, HistKey, HistogramRegistry};

/// Relative uncertainties on the GNN output score, per era and model,
/// binned in the score itself.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(transparent)]
pub struct GnnSyst {
    tables: BTreeMap<String, BTreeMap<String, Vec<f64>>>,
}

impl GnnSyst {
    pub fn load(path: &Path) -> Result<Self, PlotError> {
        load_table(path)
    }

    fn for_era_model(&self, era: u16, model: &str) -> Result<&[f64], PlotError> {
        self.tables
            .get(&era.to_string())
            .and_then(|models| models.get(model))
            .map(Vec::as_slice)
            .ok_or_else(|| {
                PlotError::Config(format!(
                    "No GNN uncertainties for era {} model '{}'",
                    era, model
                ))
            })
    }

    /// Add `<label>_GNN_syst_up` and `<label>_GNN_syst_down` copies of every
    /// model score histogram, with each score bin shifted by its relative
    /// uncertainty.
    pub fn apply(
        &self,
        registry: &mut HistogramRegistry,
        models: &[String],
        syst_bins: &[f64],
        era: u16,
        out_label: &str,
    ) -> Result<(), PlotError> {
        let targets: Vec<HistKey> = registry
            .keys()
            .filter(|key| key.label == out_label && models.contains(&key.observable))
            .cloned()
            .collect();

        for key in targets {
            let factors = self.for_era_model(era, &key.observable)?;
            let Some(HistEntry::H1(hist)) = registry.get(&key) else {
                continue;
            };

            let mut up = hist.clone();
            let mut down = hist.clone();
            for i in 0..hist.bins.len() {
                let center = hist.range.0 + (i as f64 + 0.5) * hist.bin_width;
                let factor = factors
                    .get(bin_index(syst_bins, center))
                    .copied()
                    .unwrap_or(0.0);
                up.bins[i] = hist.bins[i] * (1.0 + factor);
                up.variances[i] = hist.variances[i] * (1.0 + factor) * (1.0 + factor);
                down.bins[i] = hist.bins[i] * (1.0 - factor);
                down.variances[i] = hist.variances[i] * (1.0 - factor) * (1.0 - factor);
            }

            for (direction, varied) in [("up", up), ("down", down)] {
                let mut varied = varied;
                let new_key = HistKey::new(
                    &key.observable,
                    key.region,
                    &format!("{}_GNN_syst_{}", out_label, direction),
                );
                varied.name = new_key.render();
                registry.insert(new_key, HistEntry::H1(varied));
            }
        }
        Ok(())
    }
}
