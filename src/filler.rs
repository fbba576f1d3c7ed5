use polars::prelude::*;

use crate::error::PlotError;
use crate::histoer::{HistKey, HistogramRegistry, RegionId};
use crate::regions::{RegionConfig, RegionSchema};

/// Whether this method should be skipped for the given weight systematic.
/// Variant methods (track killing, jet corrections) carry their systematic
/// in the event variables and only run with nominal weights.
pub fn skip_label(cfg: &RegionConfig, syst: &str) -> bool {
    cfg.nominal_only && !syst.is_empty()
}

fn is_track_based(cfg: &RegionConfig, observable: &str) -> bool {
    observable == "ntracks"
        || observable.starts_with("SUEP_")
        || observable.starts_with("ISR_")
        || cfg.models.iter().any(|m| observable.starts_with(m.as_str()))
}

/// Resolve an observable to a dataframe column: first with the input method
/// suffix, then bare. Track-based observables of a track-killing variant
/// read their `_track_down` columns instead.
fn resolve_column(df: &DataFrame, cfg: &RegionConfig, observable: &str) -> Option<String> {
    let suffix = if cfg.track_down
        && is_track_based(cfg, observable)
        && !observable.ends_with("_track_down")
    {
        "_track_down"
    } else {
        ""
    };
    let candidates = [
        format!("{}_{}{}", observable, cfg.input_method, suffix),
        format!("{}{}", observable, suffix),
    ];
    candidates
        .into_iter()
        .find(|name| df.column(name).is_ok())
}

/// Apply the method's event selection and, for blinded data, drop every
/// event inside the signal region (and the secondary one if defined).
pub fn prepare_dataframe(
    df: &DataFrame,
    cfg: &RegionConfig,
    is_mc: bool,
    blind: bool,
) -> Result<DataFrame, PlotError> {
    let mut out = cfg.selections.filter(df)?;

    if !is_mc && blind {
        let mut keep = !cfg.sr.create_mask(&out)?;
        if let Some(sr2) = &cfg.sr2 {
            keep = keep & !sr2.create_mask(&out)?;
        }
        out = out.filter(&keep)?;
    }

    Ok(out)
}

fn fill_1d_from(
    df: &DataFrame,
    registry: &mut HistogramRegistry,
    cfg: &RegionConfig,
    observable: &str,
    region: RegionId,
    label: &str,
) -> Result<(), PlotError> {
    // observables missing from the input are skipped, not fatal: not every
    // sample carries the full catalog (e.g. gen-level variables on data)
    let Some(column) = resolve_column(df, cfg, observable) else {
        return Ok(());
    };
    let values = df.column(&column)?.f64()?.clone();
    let weights = df.column("event_weight")?.f64()?.clone();
    let key = HistKey::new(observable, region, label);
    registry.fill_1d(&key, &values, &weights);
    Ok(())
}

/// Fill every histogram of one method for one output label. The inclusive
/// entries always fill; the lettered cells only when `do_abcd` is set.
pub fn auto_fill(
    df: &DataFrame,
    registry: &mut HistogramRegistry,
    cfg: &RegionConfig,
    schema: &RegionSchema,
    label: &str,
    do_abcd: bool,
) -> Result<(), PlotError> {
    for spec in &schema.hists_2d {
        let (Some(x_column), Some(y_column)) = (
            resolve_column(df, cfg, &spec.x_observable),
            resolve_column(df, cfg, &spec.y_observable),
        ) else {
            continue;
        };
        let x_values = df.column(&x_column)?.f64()?.clone();
        let y_values = df.column(&y_column)?.f64()?.clone();
        let weights = df.column("event_weight")?.f64()?.clone();
        let key = HistKey::new(&spec.observable, RegionId::Inclusive, label);
        registry.fill_2d(&key, &x_values, &y_values, &weights);
    }

    for spec in &schema.hists_1d {
        fill_1d_from(df, registry, cfg, &spec.observable, RegionId::Inclusive, label)?;
    }

    if !do_abcd {
        return Ok(());
    }

    for i in 0..cfg.n_regions() {
        let cell = cfg.cell_cuts(i);
        // cell cuts reference the grid columns directly; a file without
        // them cannot be split into cells
        if cell
            .required_columns()
            .iter()
            .any(|c| df.column(c).is_err())
        {
            continue;
        }
        let in_cell = cell.filter(df)?;
        let region = RegionId::Cell(crate::regions::cell_letter(i));
        for spec in &schema.hists_1d {
            if !spec.per_region {
                continue;
            }
            fill_1d_from(&in_cell, registry, cfg, &spec.observable, region, label)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histoer::HistEntry;
    use crate::regions::{book_region_histograms, build_schema, default_configs};

    fn sample_df() -> DataFrame {
        df!(
            "ht" => [1300.0, 1300.0, 1000.0, 1300.0],
            "ntracks" => [30.0, 120.0, 50.0, 90.0],
            "SUEP_S1_CL" => [0.36, 0.7, 0.45, 0.45],
            "SUEP_nconst_CL" => [25.0, 100.0, 50.0, 50.0],
            "event_weight" => [1.0, 1.0, 1.0, 1.0],
        )
        .unwrap()
    }

    #[test]
    fn selections_and_blinding() {
        let cfg = default_configs(false).unwrap().remove(0);
        let df = sample_df();

        // MC keeps the signal region
        let mc = prepare_dataframe(&df, &cfg, true, true).unwrap();
        assert_eq!(mc.height(), 3);

        // blinded data drops the event passing both SR cuts
        let data = prepare_dataframe(&df, &cfg, false, true).unwrap();
        assert_eq!(data.height(), 2);

        // unblinded data keeps it
        let open = prepare_dataframe(&df, &cfg, false, false).unwrap();
        assert_eq!(open.height(), 3);
    }

    #[test]
    fn fills_inclusive_and_cells() {
        let cfg = default_configs(false).unwrap().remove(0);
        let schema = build_schema(&cfg);
        let mut registry = HistogramRegistry::new();
        book_region_histograms(&mut registry, &cfg, &schema, "Cluster");

        let df = prepare_dataframe(&sample_df(), &cfg, true, true).unwrap();
        auto_fill(&df, &mut registry, &cfg, &schema, "Cluster", true).unwrap();

        let inclusive = HistKey::new("ht", RegionId::Inclusive, "Cluster");
        match registry.get(&inclusive) {
            Some(HistEntry::H1(h)) => assert_eq!(h.integral(true), 3.0),
            _ => panic!("missing inclusive ht"),
        }

        // (0.36, 25) lands in A, (0.7, 100) in I, (0.45, 50) in E
        for (letter, expected) in [('A', 1.0), ('I', 1.0), ('E', 1.0), ('B', 0.0)] {
            let key = HistKey::new("ntracks", RegionId::Cell(letter), "Cluster");
            match registry.get(&key) {
                Some(HistEntry::H1(h)) => assert_eq!(h.integral(true), expected, "{}", letter),
                _ => panic!("missing cell {}", letter),
            }
        }

        // SUEP_S1 resolves through the input method suffix
        let s1 = HistKey::new("SUEP_S1", RegionId::Inclusive, "Cluster");
        match registry.get(&s1) {
            Some(HistEntry::H1(h)) => assert_eq!(h.integral(true), 3.0),
            _ => panic!("missing SUEP_S1"),
        }

        // observables absent from the file stay empty
        let pt = HistKey::new("SUEP_pt", RegionId::Inclusive, "Cluster");
        match registry.get(&pt) {
            Some(HistEntry::H1(h)) => assert_eq!(h.integral(true), 0.0),
            _ => panic!("missing SUEP_pt"),
        }
    }

    #[test]
    fn variant_methods_only_run_nominal() {
        let mut cfg = default_configs(false).unwrap().remove(0);
        assert!(!skip_label(&cfg, "puweights_up"));
        cfg.nominal_only = true;
        assert!(skip_label(&cfg, "puweights_up"));
        assert!(!skip_label(&cfg, ""));
    }
}
