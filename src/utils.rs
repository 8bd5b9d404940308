use crate::error::{AnalysisError, Result};
use pdbtbx::*;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{error, warn};

/// Run a closure inside a dedicated rayon thread pool.
///
/// `num_threads` follows the rayon convention: 0 lets rayon pick the number
/// of threads, any other value fixes the pool size.
pub fn run_with_threads<F, R>(num_threads: usize, f: F) -> Result<R>
where
    F: FnOnce() -> R + Send,
    R: Send,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
        .map_err(|e| AnalysisError::Argument(format!("Failed to build thread pool: {e}")))?;
    Ok(pool.install(f))
}

fn path_str(path: &Path) -> Result<&str> {
    path.to_str().ok_or_else(|| {
        AnalysisError::Argument(format!("Path is not valid UTF-8: {}", path.display()))
    })
}

fn read_structure(input_file: &Path, only_atomic_coords: bool) -> Result<(PDB, Vec<PDBError>)> {
    pdbtbx::ReadOptions::default()
        .set_only_atomic_coords(only_atomic_coords)
        .set_level(pdbtbx::StrictnessLevel::Loose)
        .read(path_str(input_file)?)
        .map_err(|errors| AnalysisError::StructureParsing {
            path: input_file.to_path_buf(),
            message: errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<String>>()
                .join("; "),
        })
}

/// Open an atomic data file with [`pdbtbx::ReadOptions`], keeping only the coordinate records.
///
/// Ligands, waters and other hetero residues are kept; callers select what they need.
pub fn load_model(input_file: &Path) -> Result<(PDB, Vec<PDBError>)> {
    read_structure(input_file, true)
}

/// Open an atomic data file keeping header records, for files that are written back out.
pub fn load_full_model(input_file: &Path) -> Result<(PDB, Vec<PDBError>)> {
    read_structure(input_file, false)
}

/// Forward the parser warnings to the log, by severity.
pub fn log_pdb_warnings(warnings: &[PDBError]) {
    for e in warnings {
        match e.level() {
            pdbtbx::ErrorLevel::BreakingError => error!("{e}"),
            pdbtbx::ErrorLevel::InvalidatingError => error!("{e}"),
            _ => warn!("{e}"),
        }
    }
}

/// Load a structure and log its parser warnings.
pub fn load_and_report(input_file: &Path) -> Result<PDB> {
    let (pdb, warnings) = load_model(input_file)?;
    log_pdb_warnings(&warnings);
    Ok(pdb)
}

/// The file name without its extension, e.g. `1QNJ` for `pdbs/1QNJ.pdb`.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// All files in `dir` with the given extension, sorted by name.
pub fn list_files_with_extension(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Read a CSV file with a header row. Surrounding whitespace is stripped from the column names.
pub fn read_csv(path: &Path) -> Result<DataFrame> {
    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    let trimmed: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|c| c.trim().to_string())
        .collect();
    df.set_column_names(trimmed)?;
    Ok(df)
}

/// Fail with [`AnalysisError::MissingColumn`] on the first required column absent from `df`.
pub fn require_columns(df: &DataFrame, columns: &[&str], path: &Path) -> Result<()> {
    match columns
        .iter()
        .find(|column| df.get_column_index(column).is_none())
    {
        Some(column) => Err(AnalysisError::MissingColumn {
            column: column.to_string(),
            path: path.to_path_buf(),
        }),
        None => Ok(()),
    }
}

/// Read a CSV file and validate it against the columns the caller relies on.
pub fn read_table(path: &Path, columns: &[&str]) -> Result<DataFrame> {
    let df = read_csv(path)?;
    require_columns(&df, columns, path)?;
    Ok(df)
}

/// Values of a column coerced to `f64`; entries that cannot be parsed become `None`.
pub fn f64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df.column(name)?.cast(&DataType::Float64)?;
    Ok(column.f64()?.into_iter().collect())
}

/// Values of a column coerced to `i64`; entries that cannot be parsed become `None`.
pub fn i64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<i64>>> {
    let column = df.column(name)?.cast(&DataType::Int64)?;
    Ok(column.i64()?.into_iter().collect())
}

/// Values of a column rendered as strings.
pub fn str_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df.column(name)?.cast(&DataType::String)?;
    Ok(column
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.trim().to_string()))
        .collect())
}

/// Write a DataFrame to `file_path` in the requested format.
pub fn write_df_to_file(
    df: &mut DataFrame,
    file_path: &Path,
    file_type: DataFrameFileType,
) -> Result<()> {
    if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::File::create(file_path)?;
    match file_type {
        DataFrameFileType::Csv => {
            CsvWriter::new(&mut file).finish(df)?;
        }
        DataFrameFileType::Tsv => {
            CsvWriter::new(&mut file).with_separator(b'\t').finish(df)?;
        }
        DataFrameFileType::Parquet => {
            ParquetWriter::new(&mut file).finish(df)?;
        }
        DataFrameFileType::Json => {
            JsonWriter::new(&mut file)
                .with_json_format(JsonFormat::Json)
                .finish(df)?;
        }
    }
    Ok(())
}

/// File format for writing DataFrames.
#[derive(clap::ValueEnum, Clone, Debug, Copy, PartialEq, Eq)]
pub enum DataFrameFileType {
    /// Comma-separated values
    Csv,
    /// Tab-separated values
    Tsv,
    /// Parquet columnar storage
    Parquet,
    /// Standard JSON
    Json,
}

impl std::fmt::Display for DataFrameFileType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            DataFrameFileType::Csv => write!(f, "csv"),
            DataFrameFileType::Tsv => write!(f, "tsv"),
            DataFrameFileType::Parquet => write!(f, "parquet"),
            DataFrameFileType::Json => write!(f, "json"),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn test_data(name: &str) -> PathBuf {
        let root = env!("CARGO_MANIFEST_DIR");
        Path::new(root).join("test-data").join(name)
    }

    pub(crate) fn load_test_model(name: &str) -> PDB {
        let (pdb, _) = load_model(&test_data(name)).unwrap();
        pdb
    }

    pub(crate) fn column_names(df: &DataFrame) -> Vec<String> {
        df.get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn load_keeps_hetero_residues() {
        let pdb = load_test_model("ligand_complex.pdb");
        let has_ligand = pdb
            .residues()
            .any(|r| r.name().is_some_and(|name| name == "BEN"));
        assert!(has_ligand, "Ligand residue BEN should be kept after loading");
    }

    #[test]
    fn missing_file_is_a_parse_error() {
        let result = load_model(&test_data("does_not_exist.pdb"));
        assert!(matches!(
            result,
            Err(AnalysisError::StructureParsing { .. })
        ));
    }

    #[test]
    fn required_columns_are_checked() {
        let path = test_data("chain_mapping.csv");
        let df = read_csv(&path).unwrap();
        assert!(require_columns(&df, &["PDB_ID", "Chain_ID", "Ligand"], &path).is_ok());

        match require_columns(&df, &["PDB_ID", "State"], &path) {
            Err(AnalysisError::MissingColumn { column, .. }) => assert_eq!(column, "State"),
            other => panic!("Expected a missing column error, got {other:?}"),
        }
    }

    #[test]
    fn header_whitespace_is_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("padded.csv");
        std::fs::write(&path, " resi , chain,distance \n57,A,3.5\n").unwrap();

        let df = read_table(&path, &["resi", "chain", "distance"]).unwrap();
        assert_eq!(i64_values(&df, "resi").unwrap(), vec![Some(57)]);
        assert_eq!(f64_values(&df, "distance").unwrap(), vec![Some(3.5)]);
    }

    #[test]
    fn files_are_listed_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.pdb", "a.pdb", "c.txt", "D.PDB"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        let files = list_files_with_extension(dir.path(), "pdb").unwrap();
        let names: Vec<String> = files.iter().map(|p| file_stem(p)).collect();
        assert_eq!(names, vec!["D", "a", "b"]);
    }

    #[test]
    fn thread_pool_runs_closure() {
        let sum = run_with_threads(2, || (1..=10).sum::<i32>()).unwrap();
        assert_eq!(sum, 55);
    }
}
