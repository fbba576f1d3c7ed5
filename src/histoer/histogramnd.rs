use itertools::Itertools as _;

/// A regular axis for scan histograms. No underflow slot: values below the
/// range are dropped, values at or above the upper edge land in a single
/// overflow slot, matching the cut-scan axis convention.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ScanAxis {
    pub name: String,
    pub label: String,
    pub bins: usize,
    pub range: (f64, f64),
}

impl ScanAxis {
    pub fn new(name: &str, bins: usize, range: (f64, f64)) -> Self {
        Self {
            name: name.to_string(),
            label: name.to_string(),
            bins,
            range,
        }
    }

    pub fn bin_width(&self) -> f64 {
        (self.range.1 - self.range.0) / self.bins as f64
    }

    /// Lower edge of regular bin `i`.
    pub fn edge(&self, i: usize) -> f64 {
        self.range.0 + i as f64 * self.bin_width()
    }

    // Returns the storage slot: Some(bins) is the overflow slot.
    fn slot(&self, value: f64) -> Option<usize> {
        if value < self.range.0 {
            None
        } else if value >= self.range.1 {
            Some(self.bins)
        } else {
            Some(((value - self.range.0) / self.bin_width()) as usize)
        }
    }
}

/// Dense weighted N-dimensional histogram used by the significance scan.
/// Each axis carries `bins` regular slots plus one overflow slot.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct HistogramNd {
    pub axes: Vec<ScanAxis>,
    sums: Vec<f64>,
    variances: Vec<f64>,
}

impl HistogramNd {
    pub fn new(axes: Vec<ScanAxis>) -> Self {
        let size = axes.iter().map(|a| a.bins + 1).product();
        Self {
            axes,
            sums: vec![0.0; size],
            variances: vec![0.0; size],
        }
    }

    /// Regular-bin counts per axis (overflow slots excluded).
    pub fn shape(&self) -> Vec<usize> {
        self.axes.iter().map(|a| a.bins).collect()
    }

    pub fn zeroed(&self) -> Self {
        Self::new(self.axes.clone())
    }

    fn strides(&self) -> Vec<usize> {
        let dims: Vec<usize> = self.axes.iter().map(|a| a.bins + 1).collect();
        let mut strides = vec![1; dims.len()];
        for i in (0..dims.len().saturating_sub(1)).rev() {
            strides[i] = strides[i + 1] * dims[i + 1];
        }
        strides
    }

    fn flat_index(&self, indices: &[usize]) -> usize {
        indices
            .iter()
            .zip(self.strides())
            .map(|(i, s)| i * s)
            .sum()
    }

    /// Fill one event; values below any axis range are dropped.
    pub fn fill(&mut self, values: &[f64], weight: f64) {
        let mut indices = Vec::with_capacity(self.axes.len());
        for (axis, &value) in self.axes.iter().zip(values) {
            match axis.slot(value) {
                Some(slot) => indices.push(slot),
                None => return,
            }
        }
        let flat = self.flat_index(&indices);
        self.sums[flat] += weight;
        self.variances[flat] += weight * weight;
    }

    pub fn get_bin(&self, indices: &[usize]) -> (f64, f64) {
        let flat = self.flat_index(indices);
        (self.sums[flat], self.variances[flat])
    }

    pub fn set_bin(&mut self, indices: &[usize], value: f64, variance: f64) {
        let flat = self.flat_index(indices);
        self.sums[flat] = value;
        self.variances[flat] = variance;
    }

    /// One-sided cumulative (sum, variance) over the hyper-rectangle from
    /// `start` upward on every axis, overflow slots included.
    pub fn sum_from(&self, start: &[usize]) -> (f64, f64) {
        let ranges: Vec<Vec<usize>> = self
            .axes
            .iter()
            .zip(start)
            .map(|(a, &s)| (s..=a.bins).collect())
            .collect();

        let mut sum = 0.0;
        let mut variance = 0.0;
        for indices in ranges.iter().map(|r| r.iter().copied()).multi_cartesian_product() {
            let flat = self.flat_index(&indices);
            sum += self.sums[flat];
            variance += self.variances[flat];
        }
        (sum, variance)
    }

    /// Full integral including overflow.
    pub fn integral_with_flow(&self) -> (f64, f64) {
        (self.sums.iter().sum(), self.variances.iter().sum())
    }

    /// Regular bin holding the maximum value, with its content.
    pub fn max_bin(&self) -> (Vec<usize>, f64) {
        let ranges: Vec<Vec<usize>> = self.axes.iter().map(|a| (0..a.bins).collect()).collect();
        let mut best = (vec![0; self.axes.len()], f64::NEG_INFINITY);
        for indices in ranges.iter().map(|r| r.iter().copied()).multi_cartesian_product() {
            let value = self.sums[self.flat_index(&indices)];
            if value > best.1 {
                best = (indices, value);
            }
        }
        best
    }
}
