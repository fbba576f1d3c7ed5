use std::str::FromStr;

use itertools::Itertools as _;

use crate::error::PlotError;
use crate::histoer::HistogramNd;

/// Figure of merit evaluated at each cut point of the scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignificanceMode {
    PunziSimple,
    PunziFull,
    #[default]
    PunziFullSmooth,
    SOverB,
    SOverBAndS,
}

impl FromStr for SignificanceMode {
    type Err = PlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "punzi_simple" => Ok(SignificanceMode::PunziSimple),
            "punzi_full" => Ok(SignificanceMode::PunziFull),
            "punzi_full_smooth" => Ok(SignificanceMode::PunziFullSmooth),
            "s_over_b" => Ok(SignificanceMode::SOverB),
            "s_over_b_and_s" => Ok(SignificanceMode::SOverBAndS),
            other => Err(PlotError::Config(format!(
                "Unknown significance mode '{}'",
                other
            ))),
        }
    }
}

/// Significance and its propagated uncertainty as closed-form functions of
/// the signal yield S, the total signal S_tot, and the background yield B.
#[derive(Debug, Clone, Copy)]
pub struct SignificanceFunctions {
    pub alpha: f64,
    pub beta: f64,
    pub mode: SignificanceMode,
}

impl SignificanceFunctions {
    pub fn new(alpha: f64, beta: f64, mode: SignificanceMode) -> Self {
        Self { alpha, beta, mode }
    }

    fn guard(&self, s: f64, s_tot: f64, b: f64) -> bool {
        let combined_ok = match self.mode {
            SignificanceMode::SOverBAndS => b + s > 0.0,
            _ => true,
        };
        s_tot > 0.0 && b > 0.0 && combined_ok
    }

    // alpha*sqrt(B) + (beta/2)*sqrt(beta^2 + 4*alpha*sqrt(B) + 4*B)
    fn punzi_common(&self, b: f64) -> f64 {
        let root_b = b.sqrt();
        self.alpha * root_b
            + (self.beta / 2.0)
                * (self.beta * self.beta + 4.0 * self.alpha * root_b + 4.0 * b).sqrt()
    }

    fn punzi_common_db(&self, b: f64) -> f64 {
        let root_b = b.sqrt();
        let inner = (self.beta * self.beta + 4.0 * self.alpha * root_b + 4.0 * b).sqrt();
        self.alpha / (2.0 * root_b)
            + (self.beta / 2.0) * (self.alpha / root_b + 2.0) / inner
    }

    /// Denominator D(B) and its derivative, for the modes where the
    /// significance factorizes as (S / S_tot) / D(B).
    fn denominator(&self, b: f64) -> (f64, f64) {
        let alpha2 = self.alpha * self.alpha;
        let beta2 = self.beta * self.beta;
        match self.mode {
            SignificanceMode::PunziSimple => (alpha2 / 2.0 + b.sqrt(), 1.0 / (2.0 * b.sqrt())),
            SignificanceMode::PunziFull => {
                (beta2 / 2.0 + self.punzi_common(b), self.punzi_common_db(b))
            }
            SignificanceMode::PunziFullSmooth => (
                alpha2 / 8.0 + 9.0 * beta2 / 13.0 + self.punzi_common(b),
                self.punzi_common_db(b),
            ),
            SignificanceMode::SOverB => (b.sqrt(), 1.0 / (2.0 * b.sqrt())),
            SignificanceMode::SOverBAndS => unreachable!("handled separately"),
        }
    }

    /// Significance at one cut point. Out-of-domain inputs give 0.
    pub fn value(&self, s: f64, s_tot: f64, b: f64) -> f64 {
        if !self.guard(s, s_tot, b) {
            return 0.0;
        }
        match self.mode {
            SignificanceMode::SOverBAndS => s / (s_tot * (b + s).sqrt()),
            _ => s / (s_tot * self.denominator(b).0),
        }
    }

    /// Propagated variance from the (S, S_tot, B) variances. Out-of-domain
    /// inputs give 0.
    pub fn variance(
        &self,
        s: f64,
        s_tot: f64,
        b: f64,
        s_var: f64,
        s_tot_var: f64,
        b_var: f64,
    ) -> f64 {
        if !self.guard(s, s_tot, b) {
            return 0.0;
        }
        let (d_s, d_s_tot, d_b) = match self.mode {
            SignificanceMode::SOverBAndS => {
                let root = (b + s).sqrt();
                let cube = root * root * root;
                (
                    1.0 / (s_tot * root) - s / (2.0 * s_tot * cube),
                    -s / (s_tot * s_tot * root),
                    -s / (2.0 * s_tot * cube),
                )
            }
            _ => {
                let (den, den_db) = self.denominator(b);
                (
                    1.0 / (s_tot * den),
                    -s / (s_tot * s_tot * den),
                    -s * den_db / (s_tot * den * den),
                )
            }
        };
        d_s * d_s * s_var + d_s_tot * d_s_tot * s_tot_var + d_b * d_b * b_var
    }

    pub fn uncertainty(
        &self,
        s: f64,
        s_tot: f64,
        b: f64,
        s_var: f64,
        s_tot_var: f64,
        b_var: f64,
    ) -> f64 {
        self.variance(s, s_tot, b, s_var, s_tot_var, b_var).sqrt()
    }
}

/// Scan the significance over every one-sided cut combination. Each output
/// bin holds the significance of cutting at that bin's lower edges on all
/// axes at once, with yields summed upward overflow included.
pub fn significance_scan(
    signal: &HistogramNd,
    background: &HistogramNd,
    funcs: &SignificanceFunctions,
) -> Result<HistogramNd, PlotError> {
    if signal.shape() != background.shape() {
        return Err(PlotError::Hist(format!(
            "Signal and background shapes differ: {:?} vs {:?}",
            signal.shape(),
            background.shape()
        )));
    }

    let (s_tot, s_tot_var) = signal.integral_with_flow();

    let mut result = signal.zeroed();
    for axis in &mut result.axes {
        axis.label = format!("{} >= cutvalue", axis.label);
    }

    let ranges: Vec<Vec<usize>> = signal.shape().iter().map(|&n| (0..n).collect()).collect();
    for indices in ranges
        .iter()
        .map(|r| r.iter().copied())
        .multi_cartesian_product()
    {
        let (s, s_var) = signal.sum_from(&indices);
        let (b, b_var) = background.sum_from(&indices);
        let value = funcs.value(s, s_tot, b);
        let variance = funcs.variance(s, s_tot, b, s_var, s_tot_var, b_var);
        result.set_bin(&indices, value, variance);
    }

    Ok(result)
}

/// Best cut point of a finished scan: the lower edges of the maximum bin,
/// paired with their axis names.
pub fn find_optimum(scan: &HistogramNd) -> (Vec<(String, f64)>, f64) {
    let (indices, value) = scan.max_bin();
    let cuts = scan
        .axes
        .iter()
        .zip(&indices)
        .map(|(axis, &i)| (axis.name.clone(), axis.edge(i)))
        .collect();
    (cuts, value)
}
