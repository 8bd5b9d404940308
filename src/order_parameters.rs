//! Changes in side-chain order parameters (S²) between paired structures.

use crate::error::{AnalysisError, Result};
use crate::utils::{
    f64_values, i64_values, read_csv, read_table, require_columns, str_values, write_df_to_file,
    DataFrameFileType,
};
use polars::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Residue numbers of the catalytic triad (His57, Asp102, Ser195, chymotrypsin numbering).
pub const CATALYTIC_RESIDUES: [i64; 3] = [57, 102, 195];

/// Residues closer than this to the ligand (Å) are binding residues.
pub const BINDING_CUTOFF: f64 = 4.0;

/// Residues further than this from the ligand (Å) are distal residues.
pub const DISTAL_CUTOFF: f64 = 10.0;

/// Location of a residue relative to the active site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResidueCategory {
    Catalytic,
    Binding,
    Distal,
    Other,
    Unknown,
}

impl ResidueCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResidueCategory::Catalytic => "Catalytic",
            ResidueCategory::Binding => "Binding",
            ResidueCategory::Distal => "Distal",
            ResidueCategory::Other => "Other",
            ResidueCategory::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ResidueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Residue-to-ligand distances, keyed by residue number. Only the first row of each residue counts.
#[derive(Debug, Clone, Default)]
pub struct DistanceTable {
    distances: HashMap<i64, f64>,
}

impl DistanceTable {
    pub fn from_rows<I: IntoIterator<Item = (i64, f64)>>(rows: I) -> Self {
        let mut distances = HashMap::new();
        for (resi, distance) in rows {
            distances.entry(resi).or_insert(distance);
        }
        Self { distances }
    }

    /// Build from a table with `resi` and `distance` columns; rows with missing values are ignored.
    pub fn from_df(df: &DataFrame, path: &Path) -> Result<Self> {
        require_columns(df, &["resi", "distance"], path)?;
        let resis = i64_values(df, "resi")?;
        let distances = f64_values(df, "distance")?;
        Ok(Self::from_rows(
            resis
                .into_iter()
                .zip(distances)
                .filter_map(|(r, d)| Some((r?, d?))),
        ))
    }

    pub fn get(&self, resi: i64) -> Option<f64> {
        self.distances.get(&resi).copied()
    }
}

/// Category of a residue: catalytic residues first, then by distance to the ligand.
pub fn classify_residue(
    resi: i64,
    distances: &DistanceTable,
    catalytic: &[i64],
) -> ResidueCategory {
    if catalytic.contains(&resi) {
        return ResidueCategory::Catalytic;
    }
    match distances.get(resi) {
        Some(d) if d < BINDING_CUTOFF => ResidueCategory::Binding,
        Some(d) if d > DISTAL_CUTOFF => ResidueCategory::Distal,
        Some(_) => ResidueCategory::Other,
        None => ResidueCategory::Unknown,
    }
}

/// Path of the order parameter file of a structure, `<dir>/<ID>_OP.out`.
pub fn op_file_path(directory: &Path, pdb_id: &str) -> PathBuf {
    directory.join(format!("{pdb_id}_OP.out"))
}

/// Read the order parameters of a structure. A missing file is logged and gives `None`.
pub fn read_op_file(directory: &Path, pdb_id: &str) -> Result<Option<DataFrame>> {
    let path = op_file_path(directory, pdb_id);
    if !path.exists() {
        warn!("File {} not found", path.display());
        return Ok(None);
    }
    read_table(&path, &["resi", "chain", "s2calc"]).map(Some)
}

struct OpRow {
    resi: i64,
    chain: String,
    s2calc: Option<f64>,
}

fn op_rows(df: &DataFrame) -> Result<Vec<OpRow>> {
    let resis = i64_values(df, "resi")?;
    let chains = str_values(df, "chain")?;
    let s2 = f64_values(df, "s2calc")?;
    Ok(resis
        .into_iter()
        .zip(chains)
        .zip(s2)
        .filter_map(|((resi, chain), s2calc)| {
            Some(OpRow {
                resi: resi?,
                chain: chain?,
                s2calc,
            })
        })
        .collect())
}

/// Join the order parameters of two structures on `(resi, chain)` and classify each residue.
///
/// Rows keep the order of `op1`. The output columns are
/// `resi, chain, s2calc_pdb1, s2calc_pdb2, s2calc_diff, category`, with
/// `s2calc_diff = s2calc_pdb2 - s2calc_pdb1`.
pub fn compare_pair(
    op1: &DataFrame,
    op2: &DataFrame,
    distances: &DistanceTable,
    catalytic: &[i64],
) -> Result<DataFrame> {
    let mut right: HashMap<(i64, String), Vec<Option<f64>>> = HashMap::new();
    for row in op_rows(op2)? {
        right.entry((row.resi, row.chain)).or_default().push(row.s2calc);
    }

    let mut resi = Vec::new();
    let mut chain = Vec::new();
    let mut s2_1 = Vec::new();
    let mut s2_2 = Vec::new();
    let mut diff = Vec::new();
    let mut category = Vec::new();
    for row in op_rows(op1)? {
        let Some(matches) = right.get(&(row.resi, row.chain.clone())) else {
            continue;
        };
        for other in matches {
            resi.push(row.resi);
            chain.push(row.chain.clone());
            s2_1.push(row.s2calc);
            s2_2.push(*other);
            diff.push(row.s2calc.zip(*other).map(|(a, b)| b - a));
            category.push(classify_residue(row.resi, distances, catalytic).to_string());
        }
    }
    debug!("{} residues shared between the two structures", resi.len());

    Ok(df!(
        "resi" => resi,
        "chain" => chain,
        "s2calc_pdb1" => s2_1,
        "s2calc_pdb2" => s2_2,
        "s2calc_diff" => diff,
        "category" => category,
    )?)
}

/// File name of a merged comparison, `merged_s2calc_diff_<ID1>_<ID2>.csv`.
pub fn merged_file_name(id1: &str, id2: &str) -> String {
    format!("merged_s2calc_diff_{id1}_{id2}.csv")
}

/// A merged comparison of one structure pair and the file it lives in.
#[derive(Debug, Clone)]
pub struct MergedPair {
    /// `<ID1>_<ID2>`
    pub pair: String,
    pub path: PathBuf,
    pub table: DataFrame,
}

fn compare_op_files(
    op_dir: &Path,
    id1: &str,
    id2: &str,
    distances: &DistanceTable,
    catalytic: &[i64],
) -> Result<Option<DataFrame>> {
    let (Some(op1), Some(op2)) = (read_op_file(op_dir, id1)?, read_op_file(op_dir, id2)?) else {
        return Ok(None);
    };
    compare_pair(&op1, &op2, distances, catalytic).map(Some)
}

/// Compare every pair and write each merged table to `output_dir`.
///
/// A pair with a missing or malformed order parameter file is logged and skipped;
/// the remaining pairs are still compared.
pub fn compare_pairs(
    pairs: &[(String, String)],
    op_dir: &Path,
    distances: &DistanceTable,
    catalytic: &[i64],
    output_dir: &Path,
) -> Vec<MergedPair> {
    let mut merged = Vec::new();
    for (id1, id2) in pairs {
        let path = output_dir.join(merged_file_name(id1, id2));
        let result = compare_op_files(op_dir, id1, id2, distances, catalytic).and_then(|df| {
            let Some(mut df) = df else {
                return Ok(None);
            };
            write_df_to_file(&mut df, &path, DataFrameFileType::Csv)?;
            Ok(Some(df))
        });
        match result {
            Ok(Some(table)) => {
                info!("Saved {}", path.display());
                merged.push(MergedPair {
                    pair: format!("{id1}_{id2}"),
                    path,
                    table,
                });
            }
            Ok(None) => warn!("Skipping pair {id1}, {id2}"),
            Err(e) => warn!("Skipping pair {id1}, {id2}: {} - {e}", e.kind()),
        }
    }
    merged
}

/// Columns of a merged comparison and the types they are pooled with.
fn merged_schema() -> [(&'static str, DataType); 6] {
    [
        ("resi", DataType::Int64),
        ("chain", DataType::String),
        ("s2calc_pdb1", DataType::Float64),
        ("s2calc_pdb2", DataType::Float64),
        ("s2calc_diff", DataType::Float64),
        ("category", DataType::String),
    ]
}

/// Bring a merged comparison to the pooled column layout.
///
/// `resi` and `s2calc_diff` are required. The other merged columns are filled
/// with nulls when absent and extra columns are dropped, so any two conformed
/// tables stack.
pub fn conform_merged(df: &DataFrame, path: &Path) -> Result<DataFrame> {
    require_columns(df, &["resi", "s2calc_diff"], path)?;
    let columns = merged_schema()
        .into_iter()
        .map(|(name, dtype)| match df.column(name).ok() {
            Some(column) => column.cast(&dtype),
            None => Ok(Column::full_null(name.into(), df.height(), &dtype)),
        })
        .collect::<PolarsResult<Vec<Column>>>()?;
    Ok(DataFrame::new(columns)?)
}

/// Read the merged comparison of every pair from `merged_dir`.
///
/// Missing files and tables without `resi` or `s2calc_diff` are logged and skipped.
pub fn read_merged_tables(pairs: &[(String, String)], merged_dir: &Path) -> Vec<MergedPair> {
    let mut tables = Vec::new();
    for (id1, id2) in pairs {
        let path = merged_dir.join(merged_file_name(id1, id2));
        if !path.exists() {
            warn!("File {} not found", path.display());
            continue;
        }
        match read_csv(&path).and_then(|df| conform_merged(&df, &path)) {
            Ok(table) => tables.push(MergedPair {
                pair: format!("{id1}_{id2}"),
                path,
                table,
            }),
            Err(e) => warn!("Skipping {}: {} - {e}", path.display(), e.kind()),
        }
    }
    tables
}

/// Read the structure pairs from a table, using the given ID columns.
pub fn read_pairs(path: &Path, column1: &str, column2: &str) -> Result<Vec<(String, String)>> {
    let df = read_table(path, &[column1, column2])?;
    let first = str_values(&df, column1)?;
    let second = str_values(&df, column2)?;
    Ok(first
        .into_iter()
        .zip(second)
        .filter_map(|(a, b)| Some((a?, b?)))
        .filter(|(a, b)| !a.is_empty() && !b.is_empty())
        .collect())
}

/// Pool the differences and categories of several merged comparisons.
pub fn pooled_differences(merged: &[DataFrame]) -> Result<DataFrame> {
    let mut diffs: Vec<Option<f64>> = Vec::new();
    let mut categories: Vec<Option<String>> = Vec::new();
    for df in merged {
        diffs.extend(f64_values(df, "s2calc_diff")?);
        categories.extend(str_values(df, "category")?);
    }
    Ok(df!(
        "s2calc_diff" => diffs,
        "category" => categories,
    )?)
}

/// Differences grouped by category, missing values dropped.
pub fn differences_by_category(
    pooled: &DataFrame,
) -> Result<BTreeMap<ResidueCategory, Vec<f64>>> {
    let diffs = f64_values(pooled, "s2calc_diff")?;
    let categories = str_values(pooled, "category")?;
    let mut groups: BTreeMap<ResidueCategory, Vec<f64>> = BTreeMap::new();
    for (diff, category) in diffs.into_iter().zip(categories) {
        let (Some(diff), Some(category)) = (diff, category) else {
            continue;
        };
        let category = [
            ResidueCategory::Catalytic,
            ResidueCategory::Binding,
            ResidueCategory::Distal,
            ResidueCategory::Other,
        ]
        .into_iter()
        .find(|c| c.as_str() == category)
        .unwrap_or(ResidueCategory::Unknown);
        groups.entry(category).or_default().push(diff);
    }
    Ok(groups)
}

/// Stack merged comparisons, tagging every row with its pair as `PDB = <ID1>_<ID2>`.
///
/// A table that cannot be conformed or stacked is logged and left out.
pub fn pool_merged(tables: &[MergedPair]) -> Result<DataFrame> {
    let mut pooled: Option<DataFrame> = None;
    for merged in tables {
        let result = conform_merged(&merged.table, &merged.path).and_then(|mut df| {
            let tag = Column::new("PDB".into(), vec![merged.pair.clone(); df.height()]);
            df.with_column(tag)?;
            match pooled.as_mut() {
                Some(acc) => {
                    acc.vstack_mut(&df)?;
                }
                None => pooled = Some(df),
            }
            Ok(())
        });
        if let Err(e) = result {
            warn!("Skipping {}: {} - {e}", merged.path.display(), e.kind());
        }
    }
    pooled.ok_or_else(|| AnalysisError::EmptySelection("no merged comparison tables".into()))
}

/// Mean difference per pair and residue, ready to draw as a heatmap.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapGrid {
    /// Pair names, in order of first appearance
    pub rows: Vec<String>,
    /// Residue numbers, ascending
    pub columns: Vec<i64>,
    /// `values[row][column]`, `None` where the pair has no value for the residue
    pub values: Vec<Vec<Option<f64>>>,
}

impl HeatmapGrid {
    pub fn from_pooled(pooled: &DataFrame) -> Result<Self> {
        let pairs = str_values(pooled, "PDB")?;
        let resis = i64_values(pooled, "resi")?;
        let diffs = f64_values(pooled, "s2calc_diff")?;

        let mut rows: Vec<String> = Vec::new();
        let mut columns: BTreeSet<i64> = BTreeSet::new();
        let mut sums: HashMap<(String, i64), (f64, usize)> = HashMap::new();
        for ((pair, resi), diff) in pairs.into_iter().zip(resis).zip(diffs) {
            let (Some(pair), Some(resi), Some(diff)) = (pair, resi, diff) else {
                continue;
            };
            if !rows.contains(&pair) {
                rows.push(pair.clone());
            }
            columns.insert(resi);
            let entry = sums.entry((pair, resi)).or_insert((0.0, 0));
            entry.0 += diff;
            entry.1 += 1;
        }

        let columns: Vec<i64> = columns.into_iter().collect();
        let values = rows
            .iter()
            .map(|pair| {
                columns
                    .iter()
                    .map(|resi| {
                        sums.get(&(pair.clone(), *resi))
                            .map(|(sum, n)| sum / *n as f64)
                    })
                    .collect()
            })
            .collect();
        Ok(Self {
            rows,
            columns,
            values,
        })
    }

    /// Largest absolute value in the grid, used for a symmetric color scale.
    pub fn max_abs(&self) -> f64 {
        self.values
            .iter()
            .flatten()
            .flatten()
            .fold(0.0, |acc: f64, v| acc.max(v.abs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::tests::column_names;

    fn op_table(rows: &[(i64, &str, f64)]) -> DataFrame {
        df!(
            "resi" => rows.iter().map(|r| r.0).collect::<Vec<i64>>(),
            "chain" => rows.iter().map(|r| r.1.to_string()).collect::<Vec<String>>(),
            "s2calc" => rows.iter().map(|r| r.2).collect::<Vec<f64>>(),
        )
        .unwrap()
    }

    fn merged_pair(pair: &str, table: DataFrame) -> MergedPair {
        MergedPair {
            pair: pair.to_string(),
            path: PathBuf::from(format!("merged_s2calc_diff_{pair}.csv")),
            table,
        }
    }

    #[test]
    fn categories_follow_distance_cutoffs() {
        let distances = DistanceTable::from_rows([(10, 3.9), (20, 4.0), (30, 10.0), (40, 10.5), (57, 2.0)]);
        let cat = &CATALYTIC_RESIDUES;
        assert_eq!(classify_residue(57, &distances, cat), ResidueCategory::Catalytic);
        assert_eq!(classify_residue(102, &distances, cat), ResidueCategory::Catalytic);
        assert_eq!(classify_residue(10, &distances, cat), ResidueCategory::Binding);
        assert_eq!(classify_residue(20, &distances, cat), ResidueCategory::Other);
        assert_eq!(classify_residue(30, &distances, cat), ResidueCategory::Other);
        assert_eq!(classify_residue(40, &distances, cat), ResidueCategory::Distal);
        assert_eq!(classify_residue(99, &distances, cat), ResidueCategory::Unknown);
    }

    #[test]
    fn first_distance_row_wins() {
        let distances = DistanceTable::from_rows([(10, 12.0), (10, 1.0)]);
        assert_eq!(classify_residue(10, &distances, &[]), ResidueCategory::Distal);
    }

    #[test]
    fn pair_comparison_joins_on_residue_and_chain() {
        let op1 = op_table(&[(57, "A", 0.80), (58, "A", 0.50), (59, "B", 0.70)]);
        let op2 = op_table(&[(58, "A", 0.65), (57, "A", 0.60), (59, "A", 0.10)]);
        let distances = DistanceTable::from_rows([(58, 3.0)]);

        let merged = compare_pair(&op1, &op2, &distances, &CATALYTIC_RESIDUES).unwrap();
        assert_eq!(
            column_names(&merged),
            ["resi", "chain", "s2calc_pdb1", "s2calc_pdb2", "s2calc_diff", "category"]
        );
        assert_eq!(merged.height(), 2);
        assert_eq!(i64_values(&merged, "resi").unwrap(), vec![Some(57), Some(58)]);

        let diff = f64_values(&merged, "s2calc_diff").unwrap();
        assert!((diff[0].unwrap() + 0.20).abs() < 1e-12);
        assert!((diff[1].unwrap() - 0.15).abs() < 1e-12);
        assert_eq!(
            str_values(&merged, "category").unwrap(),
            vec![Some("Catalytic".to_string()), Some("Binding".to_string())]
        );
    }

    #[test]
    fn missing_op_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_op_file(dir.path(), "1ABC").unwrap().is_none());

        std::fs::write(
            op_file_path(dir.path(), "1ABC"),
            "resi,chain,s2calc,resn\n57,A,0.8,HIS\n",
        )
        .unwrap();
        let df = read_op_file(dir.path(), "1ABC").unwrap().unwrap();
        assert_eq!(df.height(), 1);
    }

    #[test]
    fn pairs_are_read_from_named_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pairs.csv");
        std::fs::write(&path, "GSA,Chain,TSA,Chain.1\n1AAA,A,2BBB,A\n3CCC,B,,A\n").unwrap();
        let pairs = read_pairs(&path, "GSA", "TSA").unwrap();
        assert_eq!(pairs, vec![("1AAA".to_string(), "2BBB".to_string())]);

        assert!(matches!(
            read_pairs(&path, "APO", "GSA"),
            Err(AnalysisError::MissingColumn { .. })
        ));
    }

    #[test]
    fn heatmap_averages_per_pair_and_residue() {
        let distances = DistanceTable::default();
        let a = compare_pair(
            &op_table(&[(57, "A", 0.5), (57, "B", 0.7), (60, "A", 0.2)]),
            &op_table(&[(57, "A", 0.6), (57, "B", 0.9), (60, "A", 0.1)]),
            &distances,
            &CATALYTIC_RESIDUES,
        )
        .unwrap();
        let b = compare_pair(
            &op_table(&[(58, "A", 0.5)]),
            &op_table(&[(58, "A", 0.25)]),
            &distances,
            &CATALYTIC_RESIDUES,
        )
        .unwrap();

        let pooled = pool_merged(&[merged_pair("X_Y", a), merged_pair("Y_Z", b)]).unwrap();
        assert_eq!(pooled.height(), 4);

        let grid = HeatmapGrid::from_pooled(&pooled).unwrap();
        assert_eq!(grid.rows, vec!["X_Y", "Y_Z"]);
        assert_eq!(grid.columns, vec![57, 58, 60]);
        // Chains A and B of residue 57 are averaged: (0.1 + 0.2) / 2
        assert!((grid.values[0][0].unwrap() - 0.15).abs() < 1e-12);
        assert_eq!(grid.values[0][1], None);
        assert!((grid.values[1][1].unwrap() + 0.25).abs() < 1e-12);
        assert!((grid.max_abs() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn pooled_differences_group_by_category() {
        let distances = DistanceTable::from_rows([(10, 2.0), (11, 20.0)]);
        let merged = compare_pair(
            &op_table(&[(10, "A", 0.5), (11, "A", 0.5), (195, "A", 0.5)]),
            &op_table(&[(10, "A", 0.6), (11, "A", 0.4), (195, "A", 0.5)]),
            &distances,
            &CATALYTIC_RESIDUES,
        )
        .unwrap();
        let pooled = pooled_differences(&[merged.clone(), merged]).unwrap();
        assert_eq!(column_names(&pooled), ["s2calc_diff", "category"]);
        assert_eq!(pooled.height(), 6);

        let groups = differences_by_category(&pooled).unwrap();
        assert_eq!(groups[&ResidueCategory::Binding].len(), 2);
        assert_eq!(groups[&ResidueCategory::Distal].len(), 2);
        assert_eq!(groups[&ResidueCategory::Catalytic], vec![0.0, 0.0]);
    }

    #[test]
    fn malformed_op_file_skips_only_its_pair() {
        let op_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let write = |id: &str, text: &str| {
            std::fs::write(op_file_path(op_dir.path(), id), text).unwrap();
        };
        write("3CCC", "resi,chain,s2\n57,A,0.8\n");
        write("4DDD", "resi,chain,s2calc\n57,A,0.7\n");
        write("1AAA", "resi,chain,s2calc\n57,A,0.8\n195,A,0.4\n");
        write("2BBB", "resi,chain,s2calc\n57,A,0.6\n195,A,0.5\n");
        let pairs = vec![
            ("3CCC".to_string(), "4DDD".to_string()),
            ("5EEE".to_string(), "1AAA".to_string()),
            ("1AAA".to_string(), "2BBB".to_string()),
        ];

        let merged = compare_pairs(
            &pairs,
            op_dir.path(),
            &DistanceTable::default(),
            &CATALYTIC_RESIDUES,
            out_dir.path(),
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].pair, "1AAA_2BBB");
        assert_eq!(merged[0].table.height(), 2);
        assert_eq!(merged[0].path, out_dir.path().join(merged_file_name("1AAA", "2BBB")));
        assert!(merged[0].path.exists());
        assert!(!out_dir.path().join(merged_file_name("3CCC", "4DDD")).exists());
    }

    #[test]
    fn malformed_merged_table_is_not_pooled() {
        let dir = tempfile::tempdir().unwrap();
        let mut good = compare_pair(
            &op_table(&[(57, "A", 0.5), (60, "A", 0.2)]),
            &op_table(&[(57, "A", 0.6), (60, "A", 0.1)]),
            &DistanceTable::default(),
            &CATALYTIC_RESIDUES,
        )
        .unwrap();
        write_df_to_file(
            &mut good,
            &dir.path().join(merged_file_name("X", "Y")),
            DataFrameFileType::Csv,
        )
        .unwrap();
        std::fs::write(
            dir.path().join(merged_file_name("Y", "Z")),
            "resi,chain,s2calc_pdb1\n57,A,0.5\n",
        )
        .unwrap();
        // Only the two required columns, plus one the pooled table does not keep
        std::fs::write(
            dir.path().join(merged_file_name("Z", "W")),
            "resi,s2calc_diff,note\n58,0.3,loop\n",
        )
        .unwrap();
        let pairs = vec![
            ("Y".to_string(), "Z".to_string()),
            ("X".to_string(), "Y".to_string()),
            ("Q".to_string(), "R".to_string()),
            ("Z".to_string(), "W".to_string()),
        ];

        let tables = read_merged_tables(&pairs, dir.path());
        let names: Vec<&str> = tables.iter().map(|t| t.pair.as_str()).collect();
        assert_eq!(names, ["X_Y", "Z_W"]);

        let pooled = pool_merged(&tables).unwrap();
        assert_eq!(pooled.height(), 3);
        assert_eq!(
            column_names(&pooled),
            ["resi", "chain", "s2calc_pdb1", "s2calc_pdb2", "s2calc_diff", "category", "PDB"]
        );
        assert_eq!(
            str_values(&pooled, "chain").unwrap(),
            vec![Some("A".to_string()), Some("A".to_string()), None]
        );
        let grid = HeatmapGrid::from_pooled(&pooled).unwrap();
        assert_eq!(grid.rows, vec!["X_Y", "Z_W"]);
        assert_eq!(grid.columns, vec![57, 58, 60]);
    }

    #[test]
    fn missing_merged_column_names_the_file() {
        let path = PathBuf::from("merged/merged_s2calc_diff_Y_Z.csv");
        let bad = df!("resi" => [57i64], "chain" => ["A"]).unwrap();
        match conform_merged(&bad, &path) {
            Err(AnalysisError::MissingColumn { column, path: p }) => {
                assert_eq!(column, "s2calc_diff");
                assert_eq!(p, path);
            }
            other => panic!("Expected a missing column, got {other:?}"),
        }

        let good = df!("resi" => [60i64], "s2calc_diff" => [0.1]).unwrap();
        let pooled = pool_merged(&[
            MergedPair {
                pair: "Y_Z".to_string(),
                path: path.clone(),
                table: bad,
            },
            merged_pair("X_Y", good),
        ])
        .unwrap();
        assert_eq!(pooled.height(), 1);
        assert_eq!(str_values(&pooled, "PDB").unwrap(), vec![Some("X_Y".to_string())]);

        assert!(matches!(
            pool_merged(&[]),
            Err(AnalysisError::EmptySelection(_))
        ));
    }
}
