pub mod histogram1d;
pub mod histogram2d;
pub mod histogramnd;
pub mod registry;

pub use histogram1d::Histogram;
pub use histogram2d::Histogram2D;
pub use histogramnd::{HistogramNd, ScanAxis};
pub use registry::{HistEntry, HistKey, HistogramRegistry, RegionId};
