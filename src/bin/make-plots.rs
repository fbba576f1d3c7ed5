use std::path::PathBuf;

use clap::{ArgAction, Parser};
use indicatif::{ProgressBar, ProgressStyle};

use suep_plotter::corrections::{
    gnn::GnnSyst, higgs::HiggsReweight, pileup::PileupWeights, track_killing,
    trigger::TriggerScaleFactors, xsection::XSectionTable,
};
use suep_plotter::error::PlotError;
use suep_plotter::files;
use suep_plotter::filler::{auto_fill, prepare_dataframe, skip_label};
use suep_plotter::histoer::HistogramRegistry;
use suep_plotter::regions::{
    self, book_region_histograms, build_schema, RegionConfig, RegionSchema,
};
use suep_plotter::weights::{systematic_variations, EventWeighter, ScalingWeights, WeightContext};

/// Fill analysis histograms from per-event files.
#[derive(Debug, Parser)]
#[command(name = "make-plots")]
struct Args {
    /// Output tag appended to the dataset name.
    #[arg(short, long)]
    output: String,

    /// Dataset (sample) name.
    #[arg(short, long, default_value = "QCD")]
    dataset: String,

    /// Read this single file instead of a directory.
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Directory of event files; a remote path when --xrootd is set.
    #[arg(short, long)]
    input_dir: Option<String>,

    /// Stage files through an XRootD redirector.
    #[arg(long)]
    xrootd: bool,

    #[arg(long, default_value = "root://submit50.mit.edu/")]
    redirector: String,

    /// Read from the merged subdirectory.
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    merged: bool,

    /// Data-taking era, e.g. 2018.
    #[arg(short, long)]
    era: u16,

    /// Whether the input is simulation.
    #[arg(long)]
    is_mc: bool,

    /// Scouting data stream (no pileup or trigger weights).
    #[arg(long)]
    scouting: bool,

    /// Run the weight and variable systematics.
    #[arg(long)]
    do_syst: bool,

    /// Book the GNN methods.
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    do_inf: bool,

    /// Fill the per-cell histograms of each ABCD grid.
    #[arg(long)]
    do_abcd: bool,

    /// Drop data events in the signal regions.
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    blind: bool,

    /// Optional per-cell scaling weights (JSON).
    #[arg(long)]
    weights: Option<PathBuf>,

    /// Plotting methods YAML; the built-in set when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the correction tables.
    #[arg(long, default_value = "data/corrections")]
    corrections_dir: PathBuf,

    #[arg(long, default_value = "outputs")]
    out_dir: PathBuf,
}

fn main() {
    env_logger::init();
    if let Err(err) = run(Args::parse()) {
        log::error!("{}", err);
        std::process::exit(1);
    }
}

fn load_methods(args: &Args) -> Result<Vec<RegionConfig>, PlotError> {
    let mut configs = match &args.config {
        Some(path) => regions::load_configs(path)?,
        None => regions::default_configs(args.do_inf)?,
    };
    if configs.is_empty() {
        return Err(PlotError::Config("No plotting methods defined".to_string()));
    }
    for cfg in &configs {
        cfg.validate()?;
    }

    if args.is_mc && args.do_syst {
        let jet = regions::jet_correction_configs(&configs);
        let track = regions::track_killing_configs(&configs);
        configs.extend(jet);
        configs.extend(track);
    }
    Ok(configs)
}

fn correction_table<T>(
    dir: &std::path::Path,
    name: &str,
    load: impl FnOnce(&std::path::Path) -> Result<T, PlotError>,
) -> Result<Option<T>, PlotError> {
    let path = dir.join(name);
    if path.exists() {
        Ok(Some(load(&path)?))
    } else {
        log::warn!("No correction table '{}', using unit weights", path.display());
        Ok(None)
    }
}

fn build_weighter(args: &Args) -> Result<EventWeighter, PlotError> {
    let mut weighter = EventWeighter::default();
    if args.is_mc {
        let dir = &args.corrections_dir;
        weighter.pileup = correction_table(dir, "pileup.json", PileupWeights::load)?;
        weighter.trigger = correction_table(dir, "trigger_sf.json", TriggerScaleFactors::load)?;
        weighter.higgs = correction_table(dir, "higgs_reweight.json", HiggsReweight::load)?;
    }
    if let Some(path) = &args.weights {
        weighter.scaling = Some(ScalingWeights::load(path)?);
    }
    Ok(weighter)
}

fn input_files(args: &Args) -> Result<Vec<String>, PlotError> {
    if let Some(file) = &args.file {
        return Ok(vec![file.to_string_lossy().into_owned()]);
    }
    let Some(input_dir) = &args.input_dir else {
        return Err(PlotError::Config(
            "Either --file or --input-dir is required".to_string(),
        ));
    };
    let mut dir = input_dir.clone();
    if args.merged {
        if !dir.ends_with('/') {
            dir.push('/');
        }
        dir.push_str("merged/");
    }
    if args.xrootd {
        files::xrdfs_ls(&args.redirector, &dir)
    } else {
        Ok(files::list_local_files(std::path::Path::new(&dir))?
            .into_iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect())
    }
}

fn run(args: Args) -> Result<(), PlotError> {
    let configs = load_methods(&args)?;
    let methods: Vec<(RegionConfig, RegionSchema)> = configs
        .into_iter()
        .map(|cfg| {
            let schema = build_schema(&cfg);
            (cfg, schema)
        })
        .collect();

    // the Cluster grid anchors the optional scaling weights
    let scaling_grid = methods
        .iter()
        .map(|(cfg, _)| cfg.clone())
        .find(|cfg| cfg.name == "Cluster")
        .unwrap_or_else(|| methods[0].0.clone());

    let weighter = build_weighter(&args)?;

    // an unknown MC sample is fatal before any file is read
    let xsection = if args.is_mc {
        let table = XSectionTable::load(&args.corrections_dir.join("xsections.json"))?;
        table.xsection(args.era, &args.dataset)?
    } else {
        1.0
    };

    let file_list = input_files(&args)?;
    log::info!("Setup ready, filling histograms from {} files.", file_list.len());

    let sys_loop = systematic_variations(args.is_mc, args.do_syst);
    let mut registry = HistogramRegistry::new();
    let mut nfailed: u32 = 0;
    let mut total_gensumweight = 0.0;

    std::fs::create_dir_all(&args.out_dir)?;
    let staged = args.out_dir.join(format!("{}.stage.parquet", args.dataset));

    let progress = ProgressBar::new(file_list.len() as u64).with_style(
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>5}/{len:5} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    for file in &file_list {
        progress.inc(1);

        let local: PathBuf = if args.xrootd {
            files::xrdcp(&args.redirector, file, &staged)?;
            staged.clone()
        } else {
            PathBuf::from(file)
        };

        let (df, metadata) = match files::load_events(&local) {
            Ok(loaded) => loaded,
            Err(err) => {
                log::warn!("Failed to read '{}': {}", file, err);
                nfailed += 1;
                continue;
            }
        };

        // empty files still count in the normalization denominator
        if args.is_mc {
            total_gensumweight += metadata.gensumweight;
        }
        let Some(df) = df else {
            continue;
        };

        let ctx = WeightContext {
            era: args.era,
            sample: &args.dataset,
            is_mc: args.is_mc,
            scouting: args.scouting,
            scaling_grid: &scaling_grid,
        };

        for sys in &sys_loop {
            let mut df_sys = df.clone();
            weighter.apply(&mut df_sys, sys, &ctx)?;

            for (cfg, schema) in &methods {
                if skip_label(cfg, sys) {
                    continue;
                }
                let label = if sys.is_empty() {
                    cfg.name.clone()
                } else {
                    format!("{}_{}", cfg.name, sys)
                };

                book_region_histograms(&mut registry, cfg, schema, &label);
                let df_plot = prepare_dataframe(&df_sys, cfg, args.is_mc, args.blind)?;
                auto_fill(&df_plot, &mut registry, cfg, schema, &label, args.do_abcd)?;
            }
        }

        if args.xrootd {
            std::fs::remove_file(&staged).ok();
        }
    }
    progress.finish_and_clear();

    if nfailed > 0 {
        log::warn!("Number of files that failed to be read: {}", nfailed);
    }

    log::info!("Applying symmetric systematics and normalization.");

    if args.is_mc && args.do_syst {
        track_killing::generate_up_histograms(&mut registry);

        if args.do_inf {
            let path = args.corrections_dir.join("gnn_syst.json");
            if let Some(gnn_cfg) = methods.iter().map(|(c, _)| c).find(|c| c.name == "GNN") {
                if path.exists() {
                    let syst = GnnSyst::load(&path)?;
                    syst.apply(
                        &mut registry,
                        &gnn_cfg.models,
                        &gnn_cfg.gnn_syst_bins,
                        args.era,
                        "GNN",
                    )?;
                } else {
                    log::warn!("No GNN uncertainty table '{}', skipping", path.display());
                }
            }
        }
    }

    if args.is_mc {
        if total_gensumweight > 0.0 {
            registry.scale_all(xsection / total_gensumweight);
        } else {
            log::warn!("Total generator sum of weights is zero, skipping normalization");
        }
    }

    log::info!("Saving outputs.");
    let stem = format!("{}_{}", args.dataset, args.output);
    registry.save_json(&args.out_dir.join(format!("{}.json", stem)))?;
    registry.save_binary(&args.out_dir.join(format!("{}.bin", stem)))?;
    log::info!("Wrote {} histograms to {}", registry.len(), args.out_dir.display());

    Ok(())
}
