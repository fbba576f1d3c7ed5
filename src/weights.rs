use std::collections::BTreeMap;
use std::path::Path;

use polars::prelude::*;

use crate::corrections::{
    bin_index, load_table, HiggsReweight, PileupWeights, TriggerScaleFactors,
};
use crate::error::PlotError;
use crate::regions::RegionConfig;

/// The weight systematics evaluated for MC when systematics are requested.
/// The empty string is the nominal pass and always comes first.
pub fn systematic_variations(is_mc: bool, do_syst: bool) -> Vec<&'static str> {
    if is_mc && do_syst {
        vec![
            "",
            "puweights_up",
            "puweights_down",
            "trigSF_up",
            "trigSF_down",
            "PSWeight_ISR_up",
            "PSWeight_ISR_down",
            "PSWeight_FSR_up",
            "PSWeight_FSR_down",
            "higgs_weights_up",
            "higgs_weights_down",
        ]
    } else {
        vec![""]
    }
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct RegionWeights {
    pub bins: Vec<f64>,
    pub weights: Vec<f64>,
}

/// Optional per-cell scaling weights, derived externally to force MC to
/// agree with data in one variable. Keyed by ABCD cell letter, binned in
/// `ht` within each cell. Not a systematic.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(transparent)]
pub struct ScalingWeights {
    regions: BTreeMap<String, RegionWeights>,
}

impl ScalingWeights {
    pub fn load(path: &Path) -> Result<Self, PlotError> {
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            return Err(PlotError::Config(format!(
                "Scaling weights must be a .json file, got '{}'",
                path.display()
            )));
        }
        load_table(path)
    }

    /// Per-event weight from the event's cell in the given ABCD grid.
    /// Events outside the grid, or in a cell without weights, get 1.
    pub fn event_weights(&self, df: &DataFrame, grid: &RegionConfig) -> Result<Vec<f64>, PlotError> {
        let x = df.column(&grid.xvar)?.f64()?;
        let y = df.column(&grid.yvar)?.f64()?;
        let ht = df.column("ht")?.f64()?;

        let mut out = Vec::with_capacity(df.height());
        for ((x, y), ht) in x.iter().zip(y.iter()).zip(ht.iter()) {
            let weight = match (x, y, ht) {
                (Some(x), Some(y), Some(ht)) => grid
                    .cell_for(x, y)
                    .and_then(|letter| self.regions.get(&letter.to_string()))
                    .map(|region| {
                        let index = bin_index(&region.bins, ht);
                        region.weights.get(index).copied().unwrap_or(1.0)
                    })
                    .unwrap_or(1.0),
                _ => 1.0,
            };
            out.push(weight);
        }
        Ok(out)
    }
}

/// Builds the per-event `event_weight` column for one systematic pass.
/// Corrections left unset contribute unit weights.
#[derive(Debug, Default)]
pub struct EventWeighter {
    pub pileup: Option<PileupWeights>,
    pub trigger: Option<TriggerScaleFactors>,
    pub higgs: Option<HiggsReweight>,
    pub scaling: Option<ScalingWeights>,
}

pub struct WeightContext<'a> {
    pub era: u16,
    pub sample: &'a str,
    pub is_mc: bool,
    pub scouting: bool,
    /// Grid used by the optional scaling weights.
    pub scaling_grid: &'a RegionConfig,
}

impl EventWeighter {
    /// Replace the `event_weight` column. Data always gets unit weights;
    /// for MC the corrections multiply in, each shifted when `syst` names
    /// its variation.
    pub fn apply(
        &self,
        df: &mut DataFrame,
        syst: &str,
        ctx: &WeightContext<'_>,
    ) -> Result<(), PlotError> {
        let mut weights = vec![1.0; df.height()];

        if ctx.is_mc {
            if !ctx.scouting {
                if let Some(pileup) = &self.pileup {
                    multiply(&mut weights, &pileup.event_weights(df, ctx.era, syst)?);
                }
                if let Some(trigger) = &self.trigger {
                    multiply(&mut weights, &trigger.event_weights(df, ctx.era, syst)?);
                }
                if syst.contains("PSWeight") {
                    if let Ok(column) = df.column(syst) {
                        let ps = column.f64()?;
                        for (weight, value) in weights.iter_mut().zip(ps.iter()) {
                            *weight *= value.unwrap_or(1.0);
                        }
                    }
                }
            }

            if HiggsReweight::applies_to(ctx.sample) {
                if let Some(higgs) = &self.higgs {
                    multiply(&mut weights, &higgs.event_weights(df, syst)?);
                }
            }

            if let Some(scaling) = &self.scaling {
                multiply(&mut weights, &scaling.event_weights(df, ctx.scaling_grid)?);
            }
        }

        df.with_column(Column::new("event_weight".into(), weights))?;
        Ok(())
    }
}

fn multiply(weights: &mut [f64], factors: &[f64]) {
    for (weight, factor) in weights.iter_mut().zip(factors) {
        *weight *= factor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regions::default_configs;

    #[test]
    fn variation_list() {
        assert_eq!(systematic_variations(false, true), vec![""]);
        assert_eq!(systematic_variations(true, false), vec![""]);
        let all = systematic_variations(true, true);
        assert_eq!(all.len(), 11);
        assert_eq!(all[0], "");
    }

    #[test]
    fn data_gets_unit_weights() {
        let mut df = df!(
            "ht" => [1300.0, 1400.0],
            "Pileup_nTrueInt" => [10.0, 20.0],
        )
        .unwrap();

        let configs = default_configs(false).unwrap();
        let weighter = EventWeighter::default();
        let ctx = WeightContext {
            era: 2018,
            sample: "JetHT",
            is_mc: false,
            scouting: false,
            scaling_grid: &configs[0],
        };
        weighter.apply(&mut df, "", &ctx).unwrap();

        let weights = df.column("event_weight").unwrap().f64().unwrap();
        assert_eq!(weights.get(0), Some(1.0));
        assert_eq!(weights.get(1), Some(1.0));
    }

    #[test]
    fn ps_weight_reads_its_column() {
        let mut df = df!(
            "ht" => [1300.0],
            "PSWeight_ISR_up" => [0.7],
        )
        .unwrap();

        let configs = default_configs(false).unwrap();
        let weighter = EventWeighter::default();
        let ctx = WeightContext {
            era: 2018,
            sample: "QCD_Pt_470to600",
            is_mc: true,
            scouting: false,
            scaling_grid: &configs[0],
        };
        weighter.apply(&mut df, "PSWeight_ISR_up", &ctx).unwrap();

        let weights = df.column("event_weight").unwrap().f64().unwrap();
        assert_eq!(weights.get(0), Some(0.7));
    }

    #[test]
    fn scaling_weights_follow_the_cell() {
        let scaling: ScalingWeights = serde_json::from_str(
            r#"{"A": {"bins": [0.0, 2000.0], "weights": [0.5]},
                "I": {"bins": [0.0, 2000.0], "weights": [2.0]}}"#,
        )
        .unwrap();

        let df = df!(
            "SUEP_S1_CL" => [0.36, 0.7, 0.1],
            "SUEP_nconst_CL" => [25.0, 100.0, 25.0],
            "ht" => [1300.0, 1300.0, 1300.0],
        )
        .unwrap();

        let configs = default_configs(false).unwrap();
        let weights = scaling.event_weights(&df, &configs[0]).unwrap();
        assert_eq!(weights, vec![0.5, 2.0, 1.0]);
    }

    #[test]
    fn scaling_weights_require_json() {
        let err = ScalingWeights::load(Path::new("weights.npy"));
        assert!(err.is_err());
    }
}
