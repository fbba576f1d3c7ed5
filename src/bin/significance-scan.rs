use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use clap::Parser;

use suep_plotter::corrections::{lumi, XSectionTable};
use suep_plotter::error::PlotError;
use suep_plotter::files::load_events;
use suep_plotter::histoer::{HistogramNd, ScanAxis};
use suep_plotter::plots::{plot_scan_1d, plot_scan_2d};
use suep_plotter::significance::{
    find_optimum, significance_scan, SignificanceFunctions, SignificanceMode,
};

/// Scan a figure of merit over one-sided cuts on a set of columns.
#[derive(Debug, Parser)]
#[command(name = "significance-scan")]
struct Args {
    /// Columns to scan, in axis order.
    #[arg(short, long, num_args = 1.., required = true)]
    columns: Vec<String>,

    /// Signal event files.
    #[arg(short, long, num_args = 1.., required = true)]
    signal: Vec<PathBuf>,

    /// Background event files.
    #[arg(short, long, num_args = 1.., required = true)]
    background: Vec<PathBuf>,

    #[arg(short, long, default_value_t = 2018)]
    era: u16,

    /// punzi_simple, punzi_full, punzi_full_smooth, s_over_b or
    /// s_over_b_and_s.
    #[arg(short, long, default_value = "punzi_full_smooth")]
    mode: String,

    #[arg(long, default_value_t = 2.0)]
    alpha: f64,

    #[arg(long, default_value_t = 5.0)]
    beta: f64,

    /// Directory holding the cross section table.
    #[arg(long, default_value = "data/corrections")]
    corrections_dir: PathBuf,

    #[arg(short, long, default_value = "outputs/significance")]
    out_dir: PathBuf,

    /// Render the scan next to the output file.
    #[arg(long)]
    plot: bool,
}

fn main() {
    env_logger::init();
    if let Err(err) = run(Args::parse()) {
        log::error!("{}", err);
        std::process::exit(1);
    }
}

/// Axes available for scanning. Values below each range are dropped on
/// purpose; a one-sided cut never lands there.
fn scan_axes() -> BTreeMap<String, ScanAxis> {
    let specs = [
        ("ntracks", "nTracks", 300, (0.0, 300.0)),
        ("nMuons", "nMuons", 30, (0.0, 30.0)),
        ("nMuons_category1", "nMuons_cat1", 20, (0.0, 20.0)),
        ("nMuons_category2", "nMuons_cat2", 10, (0.0, 10.0)),
        ("nMuons_category3", "nMuons_cat3", 10, (0.0, 10.0)),
        ("nMuons_highPurity", "nMuons highPurity", 20, (0.0, 20.0)),
        ("nMuons_looseId", "nMuons looseId", 20, (0.0, 20.0)),
        ("nMuons_mediumId", "nMuons mediumId", 20, (0.0, 20.0)),
        ("nMuons_tightId", "nMuons tightId", 20, (0.0, 20.0)),
        ("nMuons_isTracker", "nMuons isTracker", 20, (0.0, 20.0)),
        ("nMuons_triggerIdLoose", "nMuons triggerIdLoose", 20, (0.0, 20.0)),
    ];
    specs
        .into_iter()
        .map(|(name, label, bins, range)| {
            let mut axis = ScanAxis::new(name, bins, range);
            axis.label = label.to_string();
            (name.to_string(), axis)
        })
        .collect()
}

fn axes_for(columns: &[String]) -> Result<Vec<ScanAxis>, PlotError> {
    let catalog = scan_axes();
    columns
        .iter()
        .map(|column| {
            catalog
                .get(column)
                .cloned()
                .ok_or_else(|| PlotError::Config(format!("No scan axis for column '{}'", column)))
        })
        .collect()
}

/// Fill one scan histogram from a list of files. Every event of a file
/// carries the same weight, xsection * lumi / gensumweight.
fn make_histogram(
    axes: Vec<ScanAxis>,
    columns: &[String],
    file_list: &[PathBuf],
    xsections: &XSectionTable,
    era: u16,
) -> Result<HistogramNd, PlotError> {
    let mut hist = HistogramNd::new(axes);
    let lumi = lumi(era)?;

    for path in file_list {
        let (df, metadata) = load_events(path)?;
        let Some(df) = df else {
            continue;
        };
        let sample = metadata.sample.ok_or_else(|| {
            PlotError::Config(format!(
                "File '{}' has no sample name in its metadata",
                path.display()
            ))
        })?;
        if metadata.gensumweight <= 0.0 {
            log::warn!("'{}' has no generator weight, skipping", path.display());
            continue;
        }
        let weight = xsections.xsection(era, &sample)? * lumi / metadata.gensumweight;

        let series: Vec<_> = columns
            .iter()
            .map(|column| df.column(column).and_then(|c| c.f64().cloned()))
            .collect::<Result<_, _>>()?;

        let mut values = vec![0.0; columns.len()];
        for row in 0..df.height() {
            let mut complete = true;
            for (slot, column) in values.iter_mut().zip(&series) {
                match column.get(row) {
                    Some(value) => *slot = value,
                    None => {
                        complete = false;
                        break;
                    }
                }
            }
            if complete {
                hist.fill(&values, weight);
            }
        }
    }
    Ok(hist)
}

fn run(args: Args) -> Result<(), PlotError> {
    let mode: SignificanceMode = args.mode.parse()?;
    let funcs = SignificanceFunctions::new(args.alpha, args.beta, mode);
    let xsections = XSectionTable::load(&args.corrections_dir.join("xsections.json"))?;

    log::info!("Filling scan histograms over {:?}.", args.columns);
    let signal = make_histogram(
        axes_for(&args.columns)?,
        &args.columns,
        &args.signal,
        &xsections,
        args.era,
    )?;
    let background = make_histogram(
        axes_for(&args.columns)?,
        &args.columns,
        &args.background,
        &xsections,
        args.era,
    )?;

    let scan = significance_scan(&signal, &background, &funcs)?;

    let (cuts, best) = find_optimum(&scan);
    for (column, edge) in &cuts {
        log::info!("Optimum cut: {} >= {}", column, edge);
    }
    log::info!("Best significance: {}", best);

    std::fs::create_dir_all(&args.out_dir)?;
    let out_path = args.out_dir.join("scan.json");
    let file = BufWriter::new(File::create(&out_path)?);
    serde_json::to_writer(
        file,
        &serde_json::json!({
            "signal": signal,
            "background": background,
            "significance": scan,
        }),
    )?;
    log::info!("Wrote scan to {}", out_path.display());

    if args.plot {
        match args.columns.len() {
            1 => plot_scan_1d(&signal, &background, &scan, &args.out_dir.join("scan.png"))?,
            2 => plot_scan_2d(&scan, &args.out_dir.join("scan.png"))?,
            n => log::warn!("No plot layout for {} axes", n),
        }
    }

    Ok(())
}
