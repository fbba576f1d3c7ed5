use polars::error::PolarsError;
use std::error::Error;
use std::fmt::Display;

#[derive(Debug)]
pub enum PlotError {
    Config(String),
    File(std::io::Error),
    DataFrame(PolarsError),
    Json(serde_json::Error),
    Yaml(serde_yaml::Error),
    Binary(bincode::Error),
    Hist(String),
    Plot(String),
}

impl From<std::io::Error> for PlotError {
    fn from(err: std::io::Error) -> PlotError {
        PlotError::File(err)
    }
}

impl From<PolarsError> for PlotError {
    fn from(err: PolarsError) -> PlotError {
        PlotError::DataFrame(err)
    }
}

impl From<serde_json::Error> for PlotError {
    fn from(err: serde_json::Error) -> PlotError {
        PlotError::Json(err)
    }
}

impl From<serde_yaml::Error> for PlotError {
    fn from(err: serde_yaml::Error) -> PlotError {
        PlotError::Yaml(err)
    }
}

impl From<bincode::Error> for PlotError {
    fn from(err: bincode::Error) -> PlotError {
        PlotError::Binary(err)
    }
}

impl Display for PlotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlotError::Config(x) => write!(f, "Run had a configuration error: {}", x),
            PlotError::File(x) => write!(f, "Run had a file I/O error: {}", x),
            PlotError::DataFrame(x) => write!(f, "Run had an error using polars: {}", x),
            PlotError::Json(x) => write!(f, "Run had a JSON error: {}", x),
            PlotError::Yaml(x) => write!(f, "Run had a YAML error: {}", x),
            PlotError::Binary(x) => write!(f, "Run had a binary serialization error: {}", x),
            PlotError::Hist(x) => write!(f, "Run had a histogram error: {}", x),
            PlotError::Plot(x) => write!(f, "Run had a plotting error: {}", x),
        }
    }
}

impl Error for PlotError {}
