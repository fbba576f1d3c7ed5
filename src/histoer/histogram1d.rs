/// A weighted 1D histogram: each bin stores a sum of weights and a sum of
/// squared weights so statistical uncertainties survive scaling.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Histogram {
    pub name: String,
    pub bins: Vec<f64>,
    pub variances: Vec<f64>,
    pub range: (f64, f64),
    pub bin_width: f64,
    pub underflow: (f64, f64),
    pub overflow: (f64, f64),
}

impl Histogram {
    pub fn new(name: &str, number_of_bins: usize, range: (f64, f64)) -> Self {
        Histogram {
            name: name.to_string(),
            bins: vec![0.0; number_of_bins],
            variances: vec![0.0; number_of_bins],
            range,
            bin_width: (range.1 - range.0) / number_of_bins as f64,
            underflow: (0.0, 0.0),
            overflow: (0.0, 0.0),
        }
    }

    pub fn reset(&mut self) {
        self.bins = vec![0.0; self.bins.len()];
        self.variances = vec![0.0; self.variances.len()];
        self.underflow = (0.0, 0.0);
        self.overflow = (0.0, 0.0);
    }

    /// Add a value with the given event weight.
    pub fn fill(&mut self, value: f64, weight: f64) {
        if value >= self.range.0 && value < self.range.1 {
            let index = ((value - self.range.0) / self.bin_width) as usize;
            if index < self.bins.len() {
                self.bins[index] += weight;
                self.variances[index] += weight * weight;
            }
        } else if value >= self.range.1 {
            self.overflow.0 += weight;
            self.overflow.1 += weight * weight;
        } else {
            self.underflow.0 += weight;
            self.underflow.1 += weight * weight;
        }
    }

    pub fn get_bin_edges(&self) -> Vec<f64> {
        (0..=self.bins.len())
            .map(|i| self.range.0 + i as f64 * self.bin_width)
            .collect()
    }

    pub fn get_bin_index(&self, x: f64) -> Option<usize> {
        if x < self.range.0 || x >= self.range.1 {
            return None;
        }
        Some(((x - self.range.0) / self.bin_width).floor() as usize)
    }

    /// Sum of weights, optionally including the flow bins.
    pub fn integral(&self, flow: bool) -> f64 {
        let mut sum: f64 = self.bins.iter().sum();
        if flow {
            sum += self.underflow.0 + self.overflow.0;
        }
        sum
    }

    /// Multiply every bin by `factor`; variances scale with the square.
    pub fn scale(&mut self, factor: f64) {
        for bin in &mut self.bins {
            *bin *= factor;
        }
        for var in &mut self.variances {
            *var *= factor * factor;
        }
        self.underflow.0 *= factor;
        self.underflow.1 *= factor * factor;
        self.overflow.0 *= factor;
        self.overflow.1 *= factor * factor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_and_flow() {
        let mut h = Histogram::new("ht", 10, (0.0, 100.0));
        h.fill(5.0, 1.0);
        h.fill(5.0, 2.0);
        h.fill(150.0, 1.0);
        h.fill(-1.0, 1.0);

        assert_eq!(h.bins[0], 3.0);
        assert_eq!(h.variances[0], 5.0);
        assert_eq!(h.overflow.0, 1.0);
        assert_eq!(h.underflow.0, 1.0);
        assert_eq!(h.integral(false), 3.0);
        assert_eq!(h.integral(true), 5.0);
    }

    #[test]
    fn scale_squares_variances() {
        let mut h = Histogram::new("ht", 2, (0.0, 2.0));
        h.fill(0.5, 1.0);
        h.scale(3.0);
        assert_eq!(h.bins[0], 3.0);
        assert_eq!(h.variances[0], 9.0);
    }

    #[test]
    fn edges_span_range() {
        let h = Histogram::new("x", 4, (0.0, 2.0));
        assert_eq!(h.get_bin_edges(), vec![0.0, 0.5, 1.0, 1.5, 2.0]);
        assert_eq!(h.get_bin_index(0.75), Some(1));
        assert_eq!(h.get_bin_index(-0.1), None);
        // the upper edge belongs to overflow, not the last bin
        assert_eq!(h.get_bin_index(2.0), None);
        assert_eq!(h.get_bin_index(1.9), Some(3));
    }
}
