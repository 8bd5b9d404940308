use crate::error::{AnalysisError, Result};
use crate::utils::{load_and_report, load_full_model, log_pdb_warnings};
use pdbtbx::*;
use polars::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

/// Placeholder written when no chain holds the requested residue.
pub const NOT_FOUND: &str = "Not Found";

pub trait ChainExt {
    /// Whether the chain has a residue with this number and name.
    fn holds_residue(&self, resi: isize, resn: &str) -> bool;
}

impl ChainExt for Chain {
    fn holds_residue(&self, resi: isize, resn: &str) -> bool {
        self.residues()
            .any(|res| res.serial_number() == resi && res.name() == Some(resn))
    }
}

/// First chain, in model order, holding residue `resn` `resi`.
pub fn find_residue_chain(pdb: &PDB, resi: isize, resn: &str) -> Option<String> {
    pdb.models()
        .flat_map(|model| model.chains())
        .find(|chain| chain.holds_residue(resi, resn))
        .map(|chain| chain.id().to_string())
}

/// Chain holding the residue for every structure file, as a `PDB Name, Chain ID` table.
///
/// Unreadable files are logged and reported as not found.
pub fn residue_chain_table(files: &[impl AsRef<Path>], resi: isize, resn: &str) -> Result<DataFrame> {
    let mut names = Vec::new();
    let mut chains = Vec::new();
    for file in files {
        let file = file.as_ref();
        let chain = match load_and_report(file) {
            Ok(pdb) => find_residue_chain(&pdb, resi, resn),
            Err(e) => {
                warn!("{e}");
                None
            }
        };
        names.push(
            file.file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
        );
        chains.push(chain.unwrap_or_else(|| NOT_FOUND.to_string()));
    }
    Ok(df!(
        "PDB Name" => names,
        "Chain ID" => chains,
    )?)
}

/// Parse `OLD:NEW` chain renames, e.g. `E:A`.
pub fn parse_chain_mapping<S: AsRef<str>>(entries: &[S]) -> Result<BTreeMap<String, String>> {
    let mut mapping = BTreeMap::new();
    for entry in entries {
        let entry = entry.as_ref();
        match entry.split_once(':') {
            Some((old, new)) if !old.trim().is_empty() && !new.trim().is_empty() => {
                mapping.insert(old.trim().to_string(), new.trim().to_string());
            }
            _ => {
                return Err(AnalysisError::Argument(format!(
                    "chain mapping '{entry}' is not of the form OLD:NEW"
                )))
            }
        }
    }
    Ok(mapping)
}

/// Rename chains in place; all renames are decided from the original IDs.
///
/// pdbtbx stores chain IDs upper-cased, so `a` is written as `A`.
/// Returns the number of chains renamed over all models.
pub fn rename_chains(pdb: &mut PDB, mapping: &BTreeMap<String, String>) -> Result<usize> {
    let mut renamed = 0;
    for chain in pdb.chains_mut() {
        let Some(new_id) = mapping.get(chain.id()) else {
            continue;
        };
        if !chain.set_id(new_id) {
            return Err(AnalysisError::Argument(format!(
                "'{new_id}' is not a valid chain identifier"
            )));
        }
        renamed += 1;
    }
    Ok(renamed)
}

/// Read a structure, rename its chains and save it to `output`.
pub fn rename_chains_in_file(
    input: &Path,
    output: &Path,
    mapping: &BTreeMap<String, String>,
) -> Result<usize> {
    let (mut pdb, warnings) = load_full_model(input)?;
    log_pdb_warnings(&warnings);
    let renamed = rename_chains(&mut pdb, mapping)?;

    let output_str = output.to_str().ok_or_else(|| {
        AnalysisError::Argument(format!("Path is not valid UTF-8: {}", output.display()))
    })?;
    pdbtbx::save(&pdb, output_str, StrictnessLevel::Loose).map_err(|errors| {
        AnalysisError::StructureParsing {
            path: output.to_path_buf(),
            message: errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<String>>()
                .join("; "),
        }
    })?;
    info!("Renamed {renamed} chains, saved to {}", output.display());
    Ok(renamed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::tests::{load_test_model, test_data};
    use crate::utils::{load_model, str_values};

    #[test]
    fn residue_chain_lookup() {
        let pdb = load_test_model("ligand_complex.pdb");
        assert_eq!(find_residue_chain(&pdb, 195, "SER"), Some("A".to_string()));
        assert_eq!(find_residue_chain(&pdb, 10, "ALA"), Some("B".to_string()));
        assert_eq!(find_residue_chain(&pdb, 195, "ALA"), None);
        assert_eq!(find_residue_chain(&pdb, 999, "SER"), None);
    }

    #[test]
    fn chain_table_marks_missing_residues() {
        let files = [test_data("ligand_complex.pdb"), test_data("ca_reference.pdb")];
        let df = residue_chain_table(&files, 195, "SER").unwrap();
        assert_eq!(
            str_values(&df, "PDB Name").unwrap(),
            vec![
                Some("ligand_complex.pdb".to_string()),
                Some("ca_reference.pdb".to_string())
            ]
        );
        assert_eq!(
            str_values(&df, "Chain ID").unwrap(),
            vec![Some("A".to_string()), Some(NOT_FOUND.to_string())]
        );
    }

    #[test]
    fn mapping_entries_are_validated() {
        let mapping = parse_chain_mapping(&["E:A", "F:B"]).unwrap();
        assert_eq!(mapping["E"], "A");
        assert_eq!(mapping["F"], "B");
        assert!(parse_chain_mapping(&["EA"]).is_err());
        assert!(parse_chain_mapping(&["E:"]).is_err());
    }

    #[test]
    fn chains_are_swapped_from_original_ids() {
        let mut pdb = load_test_model("ligand_complex.pdb");
        let mapping = parse_chain_mapping(&["A:B", "B:A"]).unwrap();
        assert_eq!(rename_chains(&mut pdb, &mapping).unwrap(), 2);
        assert_eq!(find_residue_chain(&pdb, 195, "SER"), Some("B".to_string()));
        assert_eq!(find_residue_chain(&pdb, 10, "ALA"), Some("A".to_string()));
    }

    #[test]
    fn renamed_structure_is_saved() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("renamed.pdb");
        let mapping = parse_chain_mapping(&["A:E"]).unwrap();
        let renamed =
            rename_chains_in_file(&test_data("ligand_complex.pdb"), &output, &mapping).unwrap();
        assert_eq!(renamed, 1);

        let (pdb, _) = load_model(&output).unwrap();
        let ids: Vec<String> = pdb.chains().map(|c| c.id().to_string()).collect();
        assert_eq!(ids, vec!["E", "B"]);
    }

    #[test]
    fn invalid_chain_id_is_rejected() {
        let mut pdb = load_test_model("ligand_complex.pdb");
        let mapping = parse_chain_mapping(&["A:Å"]).unwrap();
        assert!(matches!(
            rename_chains(&mut pdb, &mapping),
            Err(AnalysisError::Argument(_))
        ));

        let mut pdb = load_test_model("ligand_complex.pdb");
        let mapping = parse_chain_mapping(&["B:x"]).unwrap();
        assert_eq!(rename_chains(&mut pdb, &mapping).unwrap(), 1);
        assert_eq!(find_residue_chain(&pdb, 10, "ALA"), Some("X".to_string()));
    }
}
