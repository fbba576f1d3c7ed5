use std::collections::BTreeMap;
use std::path::Path;

use super::load_table;
use crate::error::PlotError;

fn unity() -> f64 {
    1.0
}

/// Cross section in pb with its k-factor and branching ratio.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct XSectionEntry {
    pub xsec: f64,
    #[serde(default = "unity")]
    pub kr: f64,
    #[serde(default = "unity")]
    pub br: f64,
}

/// Cross sections keyed by era, then sample name.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(transparent)]
pub struct XSectionTable {
    tables: BTreeMap<String, BTreeMap<String, XSectionEntry>>,
}

impl XSectionTable {
    pub fn load(path: &Path) -> Result<Self, PlotError> {
        load_table(path)
    }

    /// Effective cross section for a sample. An unknown sample is fatal
    /// since it would silently produce an unnormalized histogram.
    pub fn xsection(&self, era: u16, sample: &str) -> Result<f64, PlotError> {
        let entry = self
            .tables
            .get(&era.to_string())
            .and_then(|samples| samples.get(sample))
            .ok_or_else(|| {
                PlotError::Config(format!(
                    "No cross section for sample '{}' in era {}",
                    sample, era
                ))
            })?;
        Ok(entry.xsec * entry.kr * entry.br)
    }
}

/// Integrated luminosity per era, in pb^-1.
pub fn lumi(era: u16) -> Result<f64, PlotError> {
    match era {
        2016 => Ok(35920.0),
        2017 => Ok(41530.0),
        2018 => Ok(59740.0),
        other => Err(PlotError::Config(format!("Unknown era: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_xsection_multiplies_factors() {
        let table: XSectionTable = serde_json::from_str(
            r#"{"2018": {
                "QCD_Pt_470to600": {"xsec": 552.1, "kr": 1.0, "br": 1.0},
                "SUEP-m125-darkPho": {"xsec": 870.0, "br": 0.01}
            }}"#,
        )
        .unwrap();

        assert_eq!(table.xsection(2018, "QCD_Pt_470to600").unwrap(), 552.1);
        assert!((table.xsection(2018, "SUEP-m125-darkPho").unwrap() - 8.7).abs() < 1e-9);
        assert!(table.xsection(2018, "nonexistent").is_err());
        assert!(table.xsection(2016, "QCD_Pt_470to600").is_err());
    }

    #[test]
    fn known_eras_have_lumi() {
        assert!(lumi(2018).unwrap() > lumi(2016).unwrap());
        assert!(lumi(1999).is_err());
    }
}
