use std::ops::BitAnd;
use std::str::FromStr;
use std::sync::OnceLock;

use polars::prelude::*;
use regex::Regex;

use crate::error::PlotError;

/// Comparison operators allowed in selection and signal-region cuts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CutOp {
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
}

impl CutOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CutOp::Gt => ">",
            CutOp::Lt => "<",
            CutOp::Ge => ">=",
            CutOp::Le => "<=",
            CutOp::Eq => "==",
            CutOp::Ne => "!=",
        }
    }
}

impl FromStr for CutOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ">" => Ok(CutOp::Gt),
            "<" => Ok(CutOp::Lt),
            ">=" => Ok(CutOp::Ge),
            "<=" => Ok(CutOp::Le),
            "==" => Ok(CutOp::Eq),
            "!=" => Ok(CutOp::Ne),
            other => Err(format!("Unknown operator: {}", other)),
        }
    }
}

/// A single threshold cut, e.g. ("ht", ">", 1200.0).
///
/// Serialized as the 3-element list the region configurations use.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "(String, String, f64)", into = "(String, String, f64)")]
pub struct CutExpr {
    pub column: String,
    pub op: CutOp,
    pub value: f64,
}

impl TryFrom<(String, String, f64)> for CutExpr {
    type Error = String;

    fn try_from(parts: (String, String, f64)) -> Result<Self, Self::Error> {
        Ok(CutExpr {
            column: parts.0,
            op: parts.1.parse()?,
            value: parts.2,
        })
    }
}

impl From<CutExpr> for (String, String, f64) {
    fn from(cut: CutExpr) -> Self {
        (cut.column, cut.op.as_str().to_string(), cut.value)
    }
}

fn condition_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?P<column>\w+)\s*(?P<op>>=|<=|!=|==|>|<)\s*(?P<value>-?\d+(?:\.\d+)?(?:e-?\d+)?)",
        )
        .unwrap()
    })
}

impl CutExpr {
    pub fn new(column: &str, op: CutOp, value: f64) -> Self {
        Self {
            column: column.to_string(),
            op,
            value,
        }
    }

    /// Parse a single condition like `ht > 1200` or `SUEP_S1_CL >= 0.5`.
    pub fn parse(expression: &str) -> Result<Self, PlotError> {
        let caps = condition_re().captures(expression.trim()).ok_or_else(|| {
            PlotError::Config(format!("Failed to parse cut expression '{}'", expression))
        })?;
        let op: CutOp = caps["op"]
            .parse()
            .map_err(|e: String| PlotError::Config(e))?;
        let value: f64 = caps["value"].parse().map_err(|e| {
            PlotError::Config(format!(
                "Invalid numeric literal in cut '{}': {}",
                expression, e
            ))
        })?;
        Ok(CutExpr::new(&caps["column"], op, value))
    }

    pub fn create_mask(&self, df: &DataFrame) -> Result<BooleanChunked, PolarsError> {
        let column = df.column(&self.column)?.f64()?;
        let mask = match self.op {
            CutOp::Gt => column.gt(self.value),
            CutOp::Lt => column.lt(self.value),
            CutOp::Ge => column.gt_eq(self.value),
            CutOp::Le => column.lt_eq(self.value),
            CutOp::Eq => column.equal(self.value),
            CutOp::Ne => column.not_equal(self.value),
        };
        Ok(mask)
    }
}

/// An AND-combination of threshold cuts.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Cuts {
    pub cuts: Vec<CutExpr>,
}

impl Cuts {
    pub fn new(cuts: Vec<CutExpr>) -> Self {
        Self { cuts }
    }

    /// Parse a list of expressions like `["ht > 1200", "ntracks > 0"]`.
    pub fn parse(expressions: &[&str]) -> Result<Self, PlotError> {
        let cuts = expressions
            .iter()
            .map(|e| CutExpr::parse(e))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(cuts))
    }

    pub fn is_empty(&self) -> bool {
        self.cuts.is_empty()
    }

    pub fn required_columns(&self) -> Vec<String> {
        self.cuts.iter().map(|cut| cut.column.clone()).collect()
    }

    /// Combined AND mask over all cuts; an empty cut list keeps every row.
    pub fn create_mask(&self, df: &DataFrame) -> Result<BooleanChunked, PolarsError> {
        let masks: Vec<BooleanChunked> = self
            .cuts
            .iter()
            .map(|cut| cut.create_mask(df))
            .collect::<Result<Vec<_>, _>>()?;

        let combined = masks
            .into_iter()
            .reduce(|a, b| a.bitand(b))
            .unwrap_or_else(|| BooleanChunked::full("mask".into(), true, df.height()));
        Ok(combined)
    }

    pub fn filter(&self, df: &DataFrame) -> Result<DataFrame, PolarsError> {
        let mask = self.create_mask(df)?;
        df.filter(&mask)
    }

    /// Rename cut columns in place via the given mapping function.
    pub fn rename_columns(&mut self, rename: impl Fn(&str) -> String) {
        for cut in &mut self.cuts {
            cut.column = rename(&cut.column);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_expression() {
        let cut = CutExpr::parse("ht > 1200").unwrap();
        assert_eq!(cut.column, "ht");
        assert_eq!(cut.op, CutOp::Gt);
        assert_eq!(cut.value, 1200.0);

        let cut = CutExpr::parse("SUEP_S1_CL >= 0.5").unwrap();
        assert_eq!(cut.op, CutOp::Ge);
        assert_eq!(cut.value, 0.5);

        assert!(CutExpr::parse("not a cut").is_err());
    }

    #[test]
    fn mask_filters_rows() {
        let df = df!(
            "ht" => [1000.0, 1500.0, 2000.0],
            "ntracks" => [10.0, 0.0, 50.0],
        )
        .unwrap();

        let cuts = Cuts::parse(&["ht > 1200", "ntracks > 0"]).unwrap();
        let filtered = cuts.filter(&df).unwrap();
        assert_eq!(filtered.height(), 1);
        let ht = filtered.column("ht").unwrap().f64().unwrap();
        assert_eq!(ht.get(0), Some(2000.0));
    }

    #[test]
    fn empty_cuts_keep_everything() {
        let df = df!("x" => [1.0, 2.0]).unwrap();
        let filtered = Cuts::default().filter(&df).unwrap();
        assert_eq!(filtered.height(), 2);
    }

    #[test]
    fn triples_round_trip_through_serde() {
        let json = r#"[["ht", ">", 1200.0], ["ntracks", ">", 0.0]]"#;
        let cuts: Cuts = serde_json::from_str(json).unwrap();
        assert_eq!(cuts.cuts.len(), 2);
        assert_eq!(cuts.cuts[0], CutExpr::new("ht", CutOp::Gt, 1200.0));

        let back = serde_json::to_string(&cuts).unwrap();
        let again: Cuts = serde_json::from_str(&back).unwrap();
        assert_eq!(cuts, again);
    }
}
