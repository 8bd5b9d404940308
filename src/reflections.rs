//! Reflection tables exported as CSV: approximate `SIGFOBS` from `FOBS` for refinement input.

use crate::error::{AnalysisError, Result};
use crate::utils::{f64_values, list_files_with_extension, read_csv, write_df_to_file, DataFrameFileType};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

pub const FOBS: &str = "FOBS";
pub const SIGFOBS: &str = "SIGFOBS";

/// Default suffix appended to the file stem of processed tables.
pub const DEFAULT_OUTPUT_SUFFIX: &str = "_with_sigma";

/// Insert `SIGFOBS = sqrt(max(FOBS, 0))` directly after the `FOBS` column.
///
/// Returns `Ok(None)` if the table already has a `SIGFOBS` column, and
/// [`AnalysisError::MissingColumn`] if it has no `FOBS` column.
pub fn add_sigma_column(df: &DataFrame, path: &Path) -> Result<Option<DataFrame>> {
    let Some(fobs_index) = df.get_column_index(FOBS) else {
        return Err(AnalysisError::MissingColumn {
            column: FOBS.to_string(),
            path: path.to_path_buf(),
        });
    };
    if df.get_column_index(SIGFOBS).is_some() {
        return Ok(None);
    }

    let sigma: Vec<Option<f64>> = f64_values(df, FOBS)?
        .into_iter()
        .map(|f| f.map(|f| f.max(0.0).sqrt()))
        .collect();
    let mut out = df.clone();
    out.insert_column(fobs_index + 1, Column::new(SIGFOBS.into(), sigma))?;
    Ok(Some(out))
}

/// Output path for a processed table: `<dir>/<stem><suffix>.csv`.
pub fn output_path(input: &Path, suffix: &str) -> PathBuf {
    let stem = crate::utils::file_stem(input);
    input.with_file_name(format!("{stem}{suffix}.csv"))
}

/// Outcome of processing one reflection table.
#[derive(Debug)]
pub enum SigmaOutcome {
    Written(PathBuf),
    AlreadyPresent,
}

/// Add `SIGFOBS` to a single table and write the result next to it.
pub fn process_table(input: &Path, suffix: &str) -> Result<SigmaOutcome> {
    let df = read_csv(input)?;
    match add_sigma_column(&df, input)? {
        Some(mut out) => {
            let path = output_path(input, suffix);
            write_df_to_file(&mut out, &path, DataFrameFileType::Csv)?;
            Ok(SigmaOutcome::Written(path))
        }
        None => Ok(SigmaOutcome::AlreadyPresent),
    }
}

/// Process every CSV table of a directory. A failing file is logged and the batch continues.
///
/// Tables produced by an earlier run (name ending in `suffix`) are not reprocessed.
/// Returns the paths written.
pub fn process_directory(dir: &Path, suffix: &str) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for input in list_files_with_extension(dir, "csv")? {
        if crate::utils::file_stem(&input).ends_with(suffix) {
            continue;
        }
        info!("Processing {}", input.display());
        match process_table(&input, suffix) {
            Ok(SigmaOutcome::Written(path)) => {
                info!("Generated {}", path.display());
                written.push(path);
            }
            Ok(SigmaOutcome::AlreadyPresent) => {
                warn!("{} already contains a {SIGFOBS} column, skipping", input.display());
            }
            Err(e) => error!("Failed to process {}: {} - {e}", input.display(), e.kind()),
        }
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::tests::column_names;

    #[test]
    fn sigma_is_inserted_after_fobs() {
        let df = df!(
            "H" => [1i64, 1, 2],
            "K" => [0i64, 1, 0],
            "L" => [0i64, 0, 3],
            "FOBS" => [16.0, -4.0, 2.25],
            "R-free-flags" => [0i64, 1, 0],
        )
        .unwrap();
        let out = add_sigma_column(&df, Path::new("x.csv")).unwrap().unwrap();
        assert_eq!(
            column_names(&out),
            ["H", "K", "L", "FOBS", "SIGFOBS", "R-free-flags"]
        );
        assert_eq!(
            f64_values(&out, SIGFOBS).unwrap(),
            vec![Some(4.0), Some(0.0), Some(1.5)]
        );
    }

    #[test]
    fn existing_sigma_is_left_alone() {
        let df = df!("FOBS" => [1.0], "SIGFOBS" => [0.5]).unwrap();
        assert!(add_sigma_column(&df, Path::new("x.csv")).unwrap().is_none());
    }

    #[test]
    fn missing_fobs_is_an_error() {
        let df = df!("F" => [1.0]).unwrap();
        match add_sigma_column(&df, Path::new("x.csv")) {
            Err(e @ AnalysisError::MissingColumn { .. }) => assert_eq!(e.kind(), "MissingColumn"),
            other => panic!("Expected a missing column error, got {other:?}"),
        }
    }

    #[test]
    fn directory_batch_continues_after_failures() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.csv"), "H,K,L,FOBS\n1,0,0,9.0\n").unwrap();
        std::fs::write(dir.path().join("b.csv"), "H,K,L,F\n1,0,0,9.0\n").unwrap();
        std::fs::write(dir.path().join("c.csv"), "H,FOBS,SIGFOBS\n1,9.0,3.0\n").unwrap();

        let written = process_directory(dir.path(), DEFAULT_OUTPUT_SUFFIX).unwrap();
        assert_eq!(written, vec![dir.path().join("a_with_sigma.csv")]);
        let out = read_csv(&written[0]).unwrap();
        assert_eq!(column_names(&out), ["H", "K", "L", "FOBS", "SIGFOBS"]);
        assert_eq!(f64_values(&out, SIGFOBS).unwrap(), vec![Some(3.0)]);

        // A rerun does not pick up its own output
        let again = process_directory(dir.path(), DEFAULT_OUTPUT_SUFFIX).unwrap();
        assert_eq!(again, written);
    }
}
