use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::Command;

use polars::prelude::*;

use crate::error::PlotError;

fn default_gensumweight() -> f64 {
    1.0
}

/// Sidecar metadata written next to each event file. A missing sidecar
/// means unit generator weight.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct FileMetadata {
    #[serde(default = "default_gensumweight")]
    pub gensumweight: f64,
    #[serde(default)]
    pub era: Option<String>,
    #[serde(default)]
    pub sample: Option<String>,
}

impl Default for FileMetadata {
    fn default() -> Self {
        Self {
            gensumweight: 1.0,
            era: None,
            sample: None,
        }
    }
}

fn metadata_path(path: &Path) -> PathBuf {
    path.with_extension("meta.json")
}

/// Read one event file and its metadata sidecar. The table is `None` for
/// files that are readable but hold no events; the metadata still comes
/// back, since a fully filtered file still counts in the generator sum of
/// weights.
pub fn load_events(path: &Path) -> Result<(Option<DataFrame>, FileMetadata), PlotError> {
    let df = ParquetReader::new(File::open(path)?).finish()?;

    let meta_path = metadata_path(path);
    let metadata = if meta_path.exists() {
        let file = std::io::BufReader::new(File::open(&meta_path)?);
        serde_json::from_reader(file)?
    } else {
        FileMetadata::default()
    };

    if df.height() == 0 || df.column("empty").is_ok() {
        return Ok((None, metadata));
    }

    Ok((Some(df), metadata))
}

/// Event files in a local directory, sorted for reproducible runs.
pub fn list_local_files(dir: &Path) -> Result<Vec<PathBuf>, PlotError> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("parquet"))
        .collect();
    files.sort();
    Ok(files)
}

/// List a remote directory through an XRootD redirector.
pub fn xrdfs_ls(redirector: &str, dir: &str) -> Result<Vec<String>, PlotError> {
    let output = Command::new("xrdfs")
        .args([redirector, "ls", dir])
        .output()?;
    if !output.status.success() {
        return Err(PlotError::Config(format!(
            "xrdfs ls {} failed: {}",
            dir,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Copy one remote file to a local path with `xrdcp`.
pub fn xrdcp(redirector: &str, remote: &str, local: &Path) -> Result<(), PlotError> {
    if local.exists() {
        std::fs::remove_file(local)?;
    }
    let url = format!("{}{}", redirector, remote);
    let status = Command::new("xrdcp")
        .arg("-s")
        .arg(&url)
        .arg(local)
        .status()?;
    if !status.success() {
        return Err(PlotError::Config(format!("xrdcp of '{}' failed", url)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_parquet(path: &Path, mut df: DataFrame) {
        let file = File::create(path).unwrap();
        ParquetWriter::new(file).finish(&mut df).unwrap();
    }

    #[test]
    fn round_trip_with_sidecar() {
        let dir = std::env::temp_dir().join("suep_plotter_files_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("events.parquet");
        write_parquet(&path, df!("ht" => [1300.0, 1400.0]).unwrap());
        std::fs::write(
            dir.join("events.meta.json"),
            r#"{"gensumweight": 42.0, "sample": "QCD"}"#,
        )
        .unwrap();

        let (df, metadata) = load_events(&path).unwrap();
        assert_eq!(df.unwrap().height(), 2);
        assert_eq!(metadata.gensumweight, 42.0);
        assert_eq!(metadata.sample.as_deref(), Some("QCD"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_sidecar_defaults_to_unit_weight() {
        let dir = std::env::temp_dir().join("suep_plotter_files_nosidecar");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("events.parquet");
        write_parquet(&path, df!("ht" => [1300.0]).unwrap());

        let (_, metadata) = load_events(&path).unwrap();
        assert_eq!(metadata.gensumweight, 1.0);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn empty_files_are_skipped() {
        let dir = std::env::temp_dir().join("suep_plotter_files_empty");
        std::fs::create_dir_all(&dir).unwrap();

        let no_rows = dir.join("no_rows.parquet");
        write_parquet(&no_rows, df!("ht" => Vec::<f64>::new()).unwrap());
        assert!(load_events(&no_rows).unwrap().0.is_none());

        let marked = dir.join("marked.parquet");
        write_parquet(&marked, df!("empty" => [1.0]).unwrap());
        assert!(load_events(&marked).unwrap().0.is_none());

        std::fs::remove_dir_all(&dir).ok();
    }

    // a merged file where every event was filtered away still carries the
    // generator sum of weights of its inputs
    #[test]
    fn empty_files_keep_their_metadata() {
        let dir = std::env::temp_dir().join("suep_plotter_files_empty_meta");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("filtered.parquet");
        write_parquet(&path, df!("ht" => Vec::<f64>::new()).unwrap());
        std::fs::write(
            dir.join("filtered.meta.json"),
            r#"{"gensumweight": 100.0}"#,
        )
        .unwrap();

        let (df, metadata) = load_events(&path).unwrap();
        assert!(df.is_none());
        assert_eq!(metadata.gensumweight, 100.0);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn corrupted_files_are_errors() {
        let dir = std::env::temp_dir().join("suep_plotter_files_corrupt");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("broken.parquet");
        std::fs::write(&path, b"not a parquet file").unwrap();

        assert!(load_events(&path).is_err());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn lists_only_parquet() {
        let dir = std::env::temp_dir().join("suep_plotter_files_list");
        std::fs::create_dir_all(&dir).unwrap();
        write_parquet(&dir.join("b.parquet"), df!("x" => [1.0]).unwrap());
        write_parquet(&dir.join("a.parquet"), df!("x" => [1.0]).unwrap());
        std::fs::write(dir.join("notes.txt"), "x").unwrap();

        let files = list_local_files(&dir).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("a.parquet"));

        std::fs::remove_dir_all(&dir).ok();
    }
}
