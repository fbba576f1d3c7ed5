use std::path::Path;

use plotters::prelude::*;

use crate::error::PlotError;
use crate::histoer::HistogramNd;

fn plot_err<E: std::fmt::Display>(e: E) -> PlotError {
    PlotError::Plot(e.to_string())
}

/// Render a 1D scan: cumulative signal and background yields on top, the
/// significance below.
pub fn plot_scan_1d(
    signal: &HistogramNd,
    background: &HistogramNd,
    scan: &HistogramNd,
    path: &Path,
) -> Result<(), PlotError> {
    if scan.axes.len() != 1 {
        return Err(PlotError::Plot(format!(
            "Expected a 1D scan, got {} axes",
            scan.axes.len()
        )));
    }
    let axis = &scan.axes[0];

    let sig_points: Vec<(f64, f64)> = (0..axis.bins)
        .map(|i| (axis.edge(i), signal.sum_from(&[i]).0))
        .collect();
    let bkg_points: Vec<(f64, f64)> = (0..axis.bins)
        .map(|i| (axis.edge(i), background.sum_from(&[i]).0))
        .collect();
    let scan_points: Vec<(f64, f64)> = (0..axis.bins)
        .map(|i| (axis.edge(i), scan.get_bin(&[i]).0))
        .collect();

    let root = BitMapBackend::new(path, (900, 700)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;
    let (upper, lower) = root.split_vertically(350);

    let yield_max = bkg_points
        .iter()
        .chain(&sig_points)
        .map(|(_, y)| *y)
        .fold(0.0_f64, f64::max)
        .max(1.0);
    let mut chart = ChartBuilder::on(&upper)
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(60)
        .caption("Cumulative yields", ("sans-serif", 22))
        .build_cartesian_2d(axis.range.0..axis.range.1, 0.0..yield_max * 1.1)
        .map_err(plot_err)?;
    chart
        .configure_mesh()
        .x_desc(axis.label.clone())
        .draw()
        .map_err(plot_err)?;
    chart
        .draw_series(LineSeries::new(bkg_points, &BLUE))
        .map_err(plot_err)?
        .label("background")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));
    chart
        .draw_series(LineSeries::new(sig_points, &RED))
        .map_err(plot_err)?
        .label("signal")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));
    chart
        .configure_series_labels()
        .border_style(BLACK)
        .draw()
        .map_err(plot_err)?;

    let scan_max = scan_points
        .iter()
        .map(|(_, y)| *y)
        .fold(0.0_f64, f64::max)
        .max(f64::MIN_POSITIVE);
    let mut chart = ChartBuilder::on(&lower)
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(60)
        .caption("Significance", ("sans-serif", 22))
        .build_cartesian_2d(axis.range.0..axis.range.1, 0.0..scan_max * 1.1)
        .map_err(plot_err)?;
    chart
        .configure_mesh()
        .x_desc(axis.label.clone())
        .draw()
        .map_err(plot_err)?;
    chart
        .draw_series(LineSeries::new(scan_points, &BLACK))
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    Ok(())
}

/// Render a 2D scan as a heat map over the two cut axes.
pub fn plot_scan_2d(scan: &HistogramNd, path: &Path) -> Result<(), PlotError> {
    if scan.axes.len() != 2 {
        return Err(PlotError::Plot(format!(
            "Expected a 2D scan, got {} axes",
            scan.axes.len()
        )));
    }
    let x_axis = &scan.axes[0];
    let y_axis = &scan.axes[1];

    let mut cells = Vec::with_capacity(x_axis.bins * y_axis.bins);
    let mut max_value = f64::MIN_POSITIVE;
    for i in 0..x_axis.bins {
        for j in 0..y_axis.bins {
            let value = scan.get_bin(&[i, j]).0;
            max_value = max_value.max(value);
            cells.push((i, j, value));
        }
    }

    let root = BitMapBackend::new(path, (900, 700)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(60)
        .caption("Significance", ("sans-serif", 22))
        .build_cartesian_2d(x_axis.range.0..x_axis.range.1, y_axis.range.0..y_axis.range.1)
        .map_err(plot_err)?;
    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc(x_axis.label.clone())
        .y_desc(y_axis.label.clone())
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(cells.iter().map(|&(i, j, value)| {
            let fraction = (value / max_value).clamp(0.0, 1.0);
            let color = HSLColor(240.0 / 360.0 * (1.0 - fraction), 0.8, 0.4);
            Rectangle::new(
                [
                    (x_axis.edge(i), y_axis.edge(j)),
                    (x_axis.edge(i + 1), y_axis.edge(j + 1)),
                ],
                color.filled(),
            )
        }))
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histoer::ScanAxis;

    #[test]
    fn renders_both_scan_layouts() {
        let dir = std::env::temp_dir().join("suep_plotter_plots_test");
        std::fs::create_dir_all(&dir).unwrap();

        let mut signal = HistogramNd::new(vec![ScanAxis::new("ntracks", 5, (0.0, 5.0))]);
        let mut background = signal.zeroed();
        let mut scan = signal.zeroed();
        for i in 0..5 {
            signal.fill(&[i as f64 + 0.5], 1.0);
            background.fill(&[i as f64 + 0.5], 4.0);
            scan.set_bin(&[i], 0.1 * i as f64, 0.0);
        }
        let path_1d = dir.join("scan1d.png");
        plot_scan_1d(&signal, &background, &scan, &path_1d).unwrap();
        assert!(path_1d.exists());

        let mut scan2 = HistogramNd::new(vec![
            ScanAxis::new("x", 3, (0.0, 3.0)),
            ScanAxis::new("y", 3, (0.0, 3.0)),
        ]);
        scan2.set_bin(&[1, 1], 0.5, 0.0);
        let path_2d = dir.join("scan2d.png");
        plot_scan_2d(&scan2, &path_2d).unwrap();
        assert!(path_2d.exists());

        std::fs::remove_dir_all(&dir).ok();
    }
}
