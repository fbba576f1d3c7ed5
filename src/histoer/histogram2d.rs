use fnv::FnvHashMap;

/// Sparse weighted 2D histogram. Most correlation histograms are sparsely
/// populated, so occupied bins live in a map keyed by (x, y) bin index.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Histogram2D {
    pub name: String,
    pub bins: Bins,
    pub range: Range,
    pub underflow: (f64, f64),
    pub overflow: (f64, f64),
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Bins {
    pub x: usize,
    pub x_width: f64,
    pub y: usize,
    pub y_width: f64,
    // (sum of weights, sum of squared weights) per occupied bin. Stored as
    // an entry list on the wire so JSON output keeps tuple bin indices.
    #[serde(with = "counts_serde")]
    pub counts: FnvHashMap<(usize, usize), (f64, f64)>,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Range {
    pub x: Value,
    pub y: Value,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Value {
    pub min: f64,
    pub max: f64,
}

impl Histogram2D {
    pub fn new(name: &str, bins: (usize, usize), range: ((f64, f64), (f64, f64))) -> Self {
        Self {
            name: name.to_owned(),
            bins: Bins {
                x: bins.0,
                x_width: (range.0 .1 - range.0 .0) / bins.0 as f64,
                y: bins.1,
                y_width: (range.1 .1 - range.1 .0) / bins.1 as f64,
                counts: FnvHashMap::default(),
            },
            range: Range {
                x: Value {
                    min: range.0 .0,
                    max: range.0 .1,
                },
                y: Value {
                    min: range.1 .0,
                    max: range.1 .1,
                },
            },
            underflow: (0.0, 0.0),
            overflow: (0.0, 0.0),
        }
    }

    pub fn reset(&mut self) {
        self.bins.counts.clear();
        self.underflow = (0.0, 0.0);
        self.overflow = (0.0, 0.0);
    }

    pub fn fill(&mut self, x_value: f64, y_value: f64, weight: f64) {
        if x_value < self.range.x.min || y_value < self.range.y.min {
            self.underflow.0 += weight;
            self.underflow.1 += weight * weight;
        } else if x_value >= self.range.x.max || y_value >= self.range.y.max {
            self.overflow.0 += weight;
            self.overflow.1 += weight * weight;
        } else {
            let x_index = ((x_value - self.range.x.min) / self.bins.x_width) as usize;
            let y_index = ((y_value - self.range.y.min) / self.bins.y_width) as usize;

            let bin = self
                .bins
                .counts
                .entry((x_index, y_index))
                .or_insert((0.0, 0.0));
            bin.0 += weight;
            bin.1 += weight * weight;
        }
    }

    pub fn integral(&self, flow: bool) -> f64 {
        let mut sum: f64 = self.bins.counts.values().map(|(w, _)| w).sum();
        if flow {
            sum += self.underflow.0 + self.overflow.0;
        }
        sum
    }

    pub fn scale(&mut self, factor: f64) {
        for bin in self.bins.counts.values_mut() {
            bin.0 *= factor;
            bin.1 *= factor * factor;
        }
        self.underflow.0 *= factor;
        self.underflow.1 *= factor * factor;
        self.overflow.0 *= factor;
        self.overflow.1 *= factor * factor;
    }
}

mod counts_serde {
    use fnv::FnvHashMap;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    type Entry = ((usize, usize), (f64, f64));

    pub fn serialize<S: Serializer>(
        counts: &FnvHashMap<(usize, usize), (f64, f64)>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut entries: Vec<Entry> = counts.iter().map(|(k, v)| (*k, *v)).collect();
        entries.sort_by_key(|(k, _)| *k);
        entries.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<FnvHashMap<(usize, usize), (f64, f64)>, D::Error> {
        let entries: Vec<Entry> = Vec::deserialize(deserializer)?;
        Ok(entries.into_iter().collect())
    }
}
