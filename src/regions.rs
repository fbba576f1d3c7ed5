use crate::cutter::{CutExpr, CutOp, Cuts};
use crate::error::PlotError;
use crate::histoer::{HistKey, HistogramRegistry, RegionId};

const REGION_LETTERS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Letter for lettered cell `i` of the ABCD grid.
pub fn cell_letter(i: usize) -> char {
    REGION_LETTERS.as_bytes()[i] as char
}

/// Jet energy correction variants; each gets its own region configuration
/// with `ht` swapped for the corrected column.
pub const JET_CORRECTIONS: [&str; 5] = [
    "JEC",
    "JEC_JER_up",
    "JEC_JER_down",
    "JEC_JES_up",
    "JEC_JES_down",
];

/// One plotting method: the event selection, the ABCD grid it spans, and
/// which observable catalogs it books. Several methods can read the same
/// input method with different selections.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RegionConfig {
    pub name: String,
    pub input_method: String,
    pub xvar: String,
    pub xvar_regions: Vec<f64>,
    pub yvar: String,
    pub yvar_regions: Vec<f64>,
    pub sr: Cuts,
    #[serde(default)]
    pub sr2: Option<Cuts>,
    pub selections: Cuts,
    #[serde(default)]
    pub models: Vec<String>,
    #[serde(default)]
    pub gnn_syst_bins: Vec<f64>,
    // Which observable catalogs this method books.
    #[serde(default)]
    pub has_substructure_vars: bool,
    #[serde(default)]
    pub has_inverted_vars: bool,
    #[serde(default)]
    pub has_gnn_vars: bool,
    #[serde(default)]
    pub has_gnn_inverted_vars: bool,
    /// Track-based observables read their `_track_down` columns.
    #[serde(default)]
    pub track_down: bool,
    /// Systematic variants of a method only run with the nominal weights.
    #[serde(default)]
    pub nominal_only: bool,
}

impl RegionConfig {
    /// Region edges must have at least a lower and an upper bound and be
    /// strictly increasing, otherwise cell assignment is ill-defined.
    pub fn validate(&self) -> Result<(), PlotError> {
        for (axis, edges) in [("x", &self.xvar_regions), ("y", &self.yvar_regions)] {
            if edges.len() < 2 {
                return Err(PlotError::Config(format!(
                    "Method '{}': {}var_regions needs at least 2 edges",
                    self.name, axis
                )));
            }
            if edges.windows(2).any(|w| w[0] >= w[1]) {
                return Err(PlotError::Config(format!(
                    "Method '{}': {}var_regions must be strictly increasing",
                    self.name, axis
                )));
            }
        }
        if self.n_regions() > REGION_LETTERS.len() {
            return Err(PlotError::Config(format!(
                "Method '{}': too many ABCD cells ({})",
                self.name,
                self.n_regions()
            )));
        }
        Ok(())
    }

    pub fn n_regions(&self) -> usize {
        (self.xvar_regions.len() - 1) * (self.yvar_regions.len() - 1)
    }

    /// The inclusive entry followed by one lettered cell per grid rectangle,
    /// ordered x-major (A is the low-x low-y corner).
    pub fn region_ids(&self) -> Vec<RegionId> {
        let mut ids = vec![RegionId::Inclusive];
        for i in 0..self.n_regions() {
            ids.push(RegionId::Cell(cell_letter(i)));
        }
        ids
    }

    /// Lettered cell holding the given (x, y) point, if any.
    pub fn cell_for(&self, x: f64, y: f64) -> Option<char> {
        let find = |edges: &[f64], value: f64| -> Option<usize> {
            if value < edges[0] || value >= *edges.last()? {
                return None;
            }
            Some(edges.partition_point(|e| *e <= value) - 1)
        };
        let ix = find(&self.xvar_regions, x)?;
        let iy = find(&self.yvar_regions, y)?;
        Some(cell_letter(ix * (self.yvar_regions.len() - 1) + iy))
    }

    /// Bounds of lettered cell `i`: ((x_low, x_high), (y_low, y_high)).
    pub fn cell_bounds(&self, i: usize) -> ((f64, f64), (f64, f64)) {
        let n_y = self.yvar_regions.len() - 1;
        let ix = i / n_y;
        let iy = i % n_y;
        (
            (self.xvar_regions[ix], self.xvar_regions[ix + 1]),
            (self.yvar_regions[iy], self.yvar_regions[iy + 1]),
        )
    }

    /// The half-open cut box selecting lettered cell `i`.
    pub fn cell_cuts(&self, i: usize) -> Cuts {
        let ((x_low, x_high), (y_low, y_high)) = self.cell_bounds(i);
        Cuts::new(vec![
            CutExpr::new(&self.xvar, CutOp::Ge, x_low),
            CutExpr::new(&self.xvar, CutOp::Lt, x_high),
            CutExpr::new(&self.yvar, CutOp::Ge, y_low),
            CutExpr::new(&self.yvar, CutOp::Lt, y_high),
        ])
    }
}

/// Load plotting methods from a YAML file instead of the built-in set.
pub fn load_configs(path: &std::path::Path) -> Result<Vec<RegionConfig>, PlotError> {
    let file = std::fs::File::open(path)?;
    let configs: Vec<RegionConfig> = serde_yaml::from_reader(file)?;
    for cfg in &configs {
        cfg.validate()?;
    }
    Ok(configs)
}

/// The standard plotting methods. GNN methods are only included when
/// inference outputs are expected in the input files.
pub fn default_configs(do_inf: bool) -> Result<Vec<RegionConfig>, PlotError> {
    let mut configs = vec![
        RegionConfig {
            name: "Cluster".to_string(),
            input_method: "CL".to_string(),
            xvar: "SUEP_S1_CL".to_string(),
            xvar_regions: vec![0.35, 0.4, 0.5, 1.0],
            yvar: "SUEP_nconst_CL".to_string(),
            yvar_regions: vec![20.0, 40.0, 80.0, 1000.0],
            sr: Cuts::parse(&["SUEP_S1_CL >= 0.5", "SUEP_nconst_CL >= 80"])?,
            sr2: None,
            selections: Cuts::parse(&["ht > 1200", "ntracks > 0"])?,
            models: vec![],
            gnn_syst_bins: vec![],
            has_substructure_vars: true,
            has_inverted_vars: false,
            has_gnn_vars: false,
            has_gnn_inverted_vars: false,
            track_down: false,
            nominal_only: false,
        },
        RegionConfig {
            name: "ClusterInverted".to_string(),
            input_method: "CL".to_string(),
            xvar: "ISR_S1_CL".to_string(),
            xvar_regions: vec![0.35, 0.4, 0.5, 1.0],
            yvar: "ISR_nconst_CL".to_string(),
            yvar_regions: vec![20.0, 40.0, 80.0, 1000.0],
            sr: Cuts::parse(&["ISR_S1_CL >= 0.5", "ISR_nconst_CL >= 80"])?,
            sr2: None,
            selections: Cuts::parse(&["ht > 1200", "ntracks > 0"])?,
            models: vec![],
            gnn_syst_bins: vec![],
            has_substructure_vars: true,
            has_inverted_vars: true,
            has_gnn_vars: false,
            has_gnn_inverted_vars: false,
            track_down: false,
            nominal_only: false,
        },
    ];

    if do_inf {
        let model = "single_l5_bPfcand_S1_SUEPtracks".to_string();
        configs.push(RegionConfig {
            name: "GNN".to_string(),
            input_method: "GNN".to_string(),
            xvar: "SUEP_S1_GNN".to_string(),
            xvar_regions: vec![0.3, 0.4, 0.5, 1.0],
            yvar: format!("{}_GNN", model),
            yvar_regions: vec![0.0, 0.5, 1.0],
            sr: Cuts::parse(&[
                "SUEP_S1_GNN >= 0.5",
                "single_l5_bPfcand_S1_SUEPtracks_GNN >= 0.5",
            ])?,
            // blinded together with the primary signal region
            sr2: Some(Cuts::parse(&["SUEP_S1_CL >= 0.5", "SUEP_nconst_CL >= 80"])?),
            selections: Cuts::parse(&["ht > 1200", "ntracks > 40"])?,
            models: vec![model.clone()],
            gnn_syst_bins: vec![0.0, 0.25, 0.5, 0.75, 1.0],
            has_substructure_vars: false,
            has_inverted_vars: false,
            has_gnn_vars: true,
            has_gnn_inverted_vars: false,
            track_down: false,
            nominal_only: false,
        });
        configs.push(RegionConfig {
            name: "GNNInverted".to_string(),
            input_method: "GNNInverted".to_string(),
            xvar: "ISR_S1_GNNInverted".to_string(),
            xvar_regions: vec![0.0, 1.5, 2.0],
            yvar: format!("{}_GNNInverted", model),
            yvar_regions: vec![0.0, 1.5, 2.0],
            sr: Cuts::parse(&[
                "ISR_S1_GNNInverted >= 10.0",
                "single_l5_bPfcand_S1_SUEPtracks_GNNInverted >= 10.0",
            ])?,
            sr2: None,
            selections: Cuts::parse(&["ht > 1200", "ntracks > 40"])?,
            models: vec![model],
            gnn_syst_bins: vec![],
            has_substructure_vars: false,
            has_inverted_vars: false,
            has_gnn_vars: false,
            has_gnn_inverted_vars: true,
            track_down: false,
            nominal_only: false,
        });
    }

    Ok(configs)
}

fn is_track_column(column: &str, models: &[String]) -> bool {
    column == "ntracks"
        || column.starts_with("SUEP_")
        || column.starts_with("ISR_")
        || models.iter().any(|m| column.starts_with(m.as_str()))
}

/// Track-killing variants: every track-based column in the configuration is
/// pointed at its `_track_down` counterpart.
pub fn track_killing_configs(configs: &[RegionConfig]) -> Vec<RegionConfig> {
    configs
        .iter()
        .map(|cfg| {
            let mut out = cfg.clone();
            out.name = format!("{}_track_down", cfg.name);
            let models = cfg.models.clone();
            let rename = |column: &str| {
                if is_track_column(column, &models) {
                    format!("{}_track_down", column)
                } else {
                    column.to_string()
                }
            };
            out.xvar = rename(&out.xvar);
            out.yvar = rename(&out.yvar);
            out.sr.rename_columns(&rename);
            if let Some(sr2) = &mut out.sr2 {
                sr2.rename_columns(&rename);
            }
            out.selections.rename_columns(&rename);
            out.track_down = true;
            out.nominal_only = true;
            out
        })
        .collect()
}

/// Jet energy correction variants: `ht` is swapped for `ht_<correction>`
/// wherever it appears in the configuration.
pub fn jet_correction_configs(configs: &[RegionConfig]) -> Vec<RegionConfig> {
    let mut out = Vec::new();
    for correction in JET_CORRECTIONS {
        for cfg in configs {
            let mut varied = cfg.clone();
            varied.name = format!("{}_{}", cfg.name, correction);
            let rename = |column: &str| {
                if column == "ht" {
                    format!("ht_{}", correction)
                } else {
                    column.to_string()
                }
            };
            varied.xvar = rename(&varied.xvar);
            varied.yvar = rename(&varied.yvar);
            varied.sr.rename_columns(&rename);
            if let Some(sr2) = &mut varied.sr2 {
                sr2.rename_columns(&rename);
            }
            varied.selections.rename_columns(&rename);
            varied.nominal_only = true;
            out.push(varied);
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hist1DSpec {
    pub observable: String,
    pub bins: usize,
    pub range: (f64, f64),
    /// Booked per ABCD cell as well as inclusively.
    pub per_region: bool,
}

impl Hist1DSpec {
    fn new(observable: &str, bins: usize, range: (f64, f64)) -> Self {
        Self {
            observable: observable.to_string(),
            bins,
            range,
            per_region: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hist2DSpec {
    pub observable: String,
    pub x_observable: String,
    pub y_observable: String,
    pub bins: (usize, usize),
    pub range: ((f64, f64), (f64, f64)),
}

impl Hist2DSpec {
    fn new(
        observable: &str,
        x_observable: &str,
        y_observable: &str,
        bins: (usize, usize),
        range: ((f64, f64), (f64, f64)),
    ) -> Self {
        Self {
            observable: observable.to_string(),
            x_observable: x_observable.to_string(),
            y_observable: y_observable.to_string(),
            bins,
            range,
        }
    }
}

/// The full set of histograms a method books for one output label.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionSchema {
    pub hists_1d: Vec<Hist1DSpec>,
    pub hists_2d: Vec<Hist2DSpec>,
}

/// Assemble the observable catalog for a method from its capability flags.
pub fn build_schema(cfg: &RegionConfig) -> RegionSchema {
    let mut schema = RegionSchema::default();

    // event-level variables, booked for every method
    for observable in [
        "ht",
        "ht_JEC",
        "ht_JEC_JER_up",
        "ht_JEC_JER_down",
        "ht_JEC_JES_up",
        "ht_JEC_JES_down",
    ] {
        schema
            .hists_1d
            .push(Hist1DSpec::new(observable, 100, (0.0, 10000.0)));
    }
    schema
        .hists_1d
        .push(Hist1DSpec::new("ntracks", 101, (0.0, 500.0)));
    schema
        .hists_1d
        .push(Hist1DSpec::new("ngood_fastjets", 9, (0.0, 10.0)));
    schema
        .hists_1d
        .push(Hist1DSpec::new("PV_npvs", 199, (0.0, 200.0)));
    schema
        .hists_1d
        .push(Hist1DSpec::new("Pileup_nTrueInt", 199, (0.0, 200.0)));
    schema
        .hists_1d
        .push(Hist1DSpec::new("ngood_ak4jets", 19, (0.0, 20.0)));

    // the ABCD discriminating plane itself
    let span = |edges: &[f64]| {
        (
            edges.first().copied().unwrap_or(0.0),
            edges.last().copied().unwrap_or(1.0),
        )
    };
    schema.hists_2d.push(Hist2DSpec::new(
        "ABCDvars",
        &cfg.xvar,
        &cfg.yvar,
        (100, 100),
        (span(&cfg.xvar_regions), span(&cfg.yvar_regions)),
    ));

    if cfg.has_substructure_vars {
        schema.hists_2d.push(Hist2DSpec::new(
            "2D_SUEP_S1_vs_ntracks",
            "SUEP_S1",
            "ntracks",
            (100, 100),
            ((0.0, 1.0), (0.0, 500.0)),
        ));
        schema.hists_2d.push(Hist2DSpec::new(
            "2D_SUEP_S1_vs_SUEP_nconst",
            "SUEP_S1",
            "SUEP_nconst",
            (100, 200),
            ((0.0, 1.0), (0.0, 500.0)),
        ));
        schema.hists_2d.push(Hist2DSpec::new(
            "2D_SUEP_nconst_vs_SUEP_pt_avg",
            "SUEP_nconst",
            "SUEP_pt_avg",
            (200, 200),
            ((0.0, 500.0), (0.0, 500.0)),
        ));

        schema
            .hists_1d
            .push(Hist1DSpec::new("SUEP_nconst", 199, (0.0, 500.0)));
        schema
            .hists_1d
            .push(Hist1DSpec::new("SUEP_pt", 100, (0.0, 2000.0)));
        schema
            .hists_1d
            .push(Hist1DSpec::new("SUEP_delta_pt_genPt", 400, (-2000.0, 2000.0)));
        schema
            .hists_1d
            .push(Hist1DSpec::new("SUEP_pt_avg", 200, (0.0, 500.0)));
        schema
            .hists_1d
            .push(Hist1DSpec::new("SUEP_eta", 100, (-5.0, 5.0)));
        schema
            .hists_1d
            .push(Hist1DSpec::new("SUEP_phi", 100, (-6.5, 6.5)));
        schema
            .hists_1d
            .push(Hist1DSpec::new("SUEP_mass", 150, (0.0, 2000.0)));
        schema.hists_1d.push(Hist1DSpec::new(
            "SUEP_delta_mass_genMass",
            400,
            (-2000.0, 2000.0),
        ));
        schema
            .hists_1d
            .push(Hist1DSpec::new("SUEP_S1", 100, (0.0, 1.0)));
    }

    if cfg.has_inverted_vars {
        schema.hists_2d.push(Hist2DSpec::new(
            "2D_ISR_S1_vs_ntracks",
            "ISR_S1",
            "ntracks",
            (100, 200),
            ((0.0, 1.0), (0.0, 500.0)),
        ));
        schema.hists_2d.push(Hist2DSpec::new(
            "2D_ISR_S1_vs_ISR_nconst",
            "ISR_S1",
            "ISR_nconst",
            (100, 200),
            ((0.0, 1.0), (0.0, 500.0)),
        ));
        schema.hists_2d.push(Hist2DSpec::new(
            "2D_ISR_nconst_vs_ISR_pt_avg",
            "ISR_nconst",
            "ISR_pt_avg",
            (200, 500),
            ((0.0, 500.0), (0.0, 500.0)),
        ));

        schema
            .hists_1d
            .push(Hist1DSpec::new("ISR_nconst", 199, (0.0, 500.0)));
        schema
            .hists_1d
            .push(Hist1DSpec::new("ISR_pt", 100, (0.0, 2000.0)));
        schema
            .hists_1d
            .push(Hist1DSpec::new("ISR_pt_avg", 500, (0.0, 500.0)));
        schema
            .hists_1d
            .push(Hist1DSpec::new("ISR_eta", 100, (-5.0, 5.0)));
        schema
            .hists_1d
            .push(Hist1DSpec::new("ISR_phi", 100, (-6.5, 6.5)));
        schema
            .hists_1d
            .push(Hist1DSpec::new("ISR_mass", 150, (0.0, 4000.0)));
        schema
            .hists_1d
            .push(Hist1DSpec::new("ISR_S1", 100, (0.0, 1.0)));
    }

    if cfg.has_gnn_vars {
        for model in &cfg.models {
            schema.hists_2d.push(Hist2DSpec::new(
                &format!("2D_SUEP_S1_vs_{}", model),
                "SUEP_S1",
                model,
                (100, 100),
                ((0.0, 1.0), (0.0, 1.0)),
            ));
            schema.hists_2d.push(Hist2DSpec::new(
                &format!("2D_SUEP_nconst_vs_{}", model),
                "SUEP_nconst",
                model,
                (200, 100),
                ((0.0, 500.0), (0.0, 1.0)),
            ));
            schema.hists_1d.push(Hist1DSpec::new(model, 100, (0.0, 1.0)));
        }
        schema.hists_2d.push(Hist2DSpec::new(
            "2D_SUEP_nconst_vs_SUEP_S1",
            "SUEP_nconst",
            "SUEP_S1",
            (200, 100),
            ((0.0, 500.0), (0.0, 1.0)),
        ));
        schema
            .hists_1d
            .push(Hist1DSpec::new("SUEP_nconst", 199, (0.0, 500.0)));
        schema
            .hists_1d
            .push(Hist1DSpec::new("SUEP_S1", 100, (-1.0, 2.0)));
    }

    if cfg.has_gnn_inverted_vars {
        for model in &cfg.models {
            schema.hists_2d.push(Hist2DSpec::new(
                &format!("2D_ISR_S1_vs_{}", model),
                "ISR_S1",
                model,
                (100, 100),
                ((0.0, 1.0), (0.0, 1.0)),
            ));
            schema.hists_2d.push(Hist2DSpec::new(
                &format!("2D_ISR_nconst_vs_{}", model),
                "ISR_nconst",
                model,
                (200, 100),
                ((0.0, 500.0), (0.0, 1.0)),
            ));
            schema.hists_1d.push(Hist1DSpec::new(model, 100, (0.0, 1.0)));
        }
        schema.hists_2d.push(Hist2DSpec::new(
            "2D_ISR_nconst_vs_ISR_S1",
            "ISR_nconst",
            "ISR_S1",
            (200, 100),
            ((0.0, 500.0), (0.0, 1.0)),
        ));
        schema
            .hists_1d
            .push(Hist1DSpec::new("ISR_nconst", 199, (0.0, 500.0)));
        schema
            .hists_1d
            .push(Hist1DSpec::new("ISR_S1", 100, (-1.0, 2.0)));
    }

    schema
}

/// Book every histogram for one output label. Calling this again with the
/// same label is a no-op so the file loop can book lazily.
pub fn book_region_histograms(
    registry: &mut HistogramRegistry,
    cfg: &RegionConfig,
    schema: &RegionSchema,
    label: &str,
) {
    if !registry.mark_processed(label) {
        return;
    }

    for spec in &schema.hists_2d {
        let key = HistKey::new(&spec.observable, RegionId::Inclusive, label);
        registry.book_2d(key, spec.bins, spec.range);
    }

    for spec in &schema.hists_1d {
        let regions = if spec.per_region {
            cfg.region_ids()
        } else {
            vec![RegionId::Inclusive]
        };
        for region in regions {
            let key = HistKey::new(&spec.observable, region, label);
            registry.book_1d(key, spec.bins, spec.range);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_rejects_bad_edges() {
        let mut cfg = default_configs(false).unwrap().remove(0);
        cfg.validate().unwrap();

        cfg.xvar_regions = vec![0.5];
        assert!(cfg.validate().is_err());

        cfg.xvar_regions = vec![0.5, 0.4, 1.0];
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn region_ids_cover_the_grid() {
        let cfg = default_configs(false).unwrap().remove(0);
        assert_eq!(cfg.n_regions(), 9);
        let ids = cfg.region_ids();
        assert_eq!(ids.len(), 10);
        assert_eq!(ids[0], RegionId::Inclusive);
        assert_eq!(ids[1], RegionId::Cell('A'));
        assert_eq!(ids[9], RegionId::Cell('I'));

        // 2x2 grid: A through D plus the inclusive entry
        let mut small = cfg.clone();
        small.xvar_regions = vec![0.0, 1.0, 2.0];
        small.yvar_regions = vec![0.0, 10.0, 20.0];
        small.validate().unwrap();
        assert_eq!(small.n_regions(), 4);
        assert_eq!(
            small.region_ids(),
            vec![
                RegionId::Inclusive,
                RegionId::Cell('A'),
                RegionId::Cell('B'),
                RegionId::Cell('C'),
                RegionId::Cell('D'),
            ]
        );
    }

    #[test]
    fn cell_bounds_are_x_major() {
        let cfg = default_configs(false).unwrap().remove(0);
        // A is the low-x low-y corner
        assert_eq!(cfg.cell_bounds(0), ((0.35, 0.4), (20.0, 40.0)));
        // B moves up in y within the same x slice
        assert_eq!(cfg.cell_bounds(1), ((0.35, 0.4), (40.0, 80.0)));
        // D starts the second x slice
        assert_eq!(cfg.cell_bounds(3), ((0.4, 0.5), (20.0, 40.0)));
        // I is the signal corner
        assert_eq!(cfg.cell_bounds(8), ((0.5, 1.0), (80.0, 1000.0)));

        assert_eq!(cfg.cell_for(0.36, 25.0), Some('A'));
        assert_eq!(cfg.cell_for(0.45, 25.0), Some('D'));
        assert_eq!(cfg.cell_for(0.7, 100.0), Some('I'));
        assert_eq!(cfg.cell_for(0.1, 25.0), None);
        assert_eq!(cfg.cell_for(0.7, 1000.0), None);
    }

    #[test]
    fn track_killing_renames_track_columns() {
        let configs = default_configs(false).unwrap();
        let varied = track_killing_configs(&configs);
        let cluster = &varied[0];
        assert_eq!(cluster.name, "Cluster_track_down");
        assert_eq!(cluster.xvar, "SUEP_S1_CL_track_down");
        assert!(cluster.track_down);
        assert!(cluster.nominal_only);

        let columns = cluster.selections.required_columns();
        assert!(columns.contains(&"ht".to_string()));
        assert!(columns.contains(&"ntracks_track_down".to_string()));
    }

    #[test]
    fn jet_corrections_rename_ht_only() {
        let configs = default_configs(false).unwrap();
        let varied = jet_correction_configs(&configs);
        assert_eq!(varied.len(), 2 * JET_CORRECTIONS.len());

        let jes_up = varied
            .iter()
            .find(|c| c.name == "Cluster_JEC_JES_up")
            .unwrap();
        assert_eq!(jes_up.xvar, "SUEP_S1_CL");
        let columns = jes_up.selections.required_columns();
        assert!(columns.contains(&"ht_JEC_JES_up".to_string()));
        assert!(columns.contains(&"ntracks".to_string()));
    }

    #[test]
    fn configs_round_trip_through_yaml() {
        let configs = default_configs(true).unwrap();
        let yaml = serde_yaml::to_string(&configs).unwrap();

        let dir = std::env::temp_dir().join("suep_plotter_regions_yaml");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("methods.yaml");
        std::fs::write(&path, yaml).unwrap();

        let loaded = load_configs(&path).unwrap();
        assert_eq!(loaded, configs);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn cluster_books_full_catalog() {
        let cfg = default_configs(false).unwrap().remove(0);
        let schema = build_schema(&cfg);
        let mut registry = HistogramRegistry::new();
        book_region_histograms(&mut registry, &cfg, &schema, "Cluster");

        // 10 region entries x (11 event-level + 9 substructure) 1D
        // histograms, plus ABCDvars and 3 correlation maps
        assert_eq!(registry.len(), 10 * 20 + 4);

        // booking the same label twice changes nothing
        book_region_histograms(&mut registry, &cfg, &schema, "Cluster");
        assert_eq!(registry.len(), 204);

        assert!(registry.contains(&HistKey::new(
            "SUEP_nconst",
            RegionId::Cell('I'),
            "Cluster"
        )));
        assert!(registry.contains(&HistKey::new("ABCDvars", RegionId::Inclusive, "Cluster")));
    }
}
