//! Active-site survey over a directory of structures.
//!
//! Each structure is looked up in a chain-mapping table. Structures without a
//! ligand get the carbon closest to the target atom (and its bonded oxygen);
//! structures with a ligand get the ligand's minimum distance to the target residue.

use crate::error::Result;
use crate::proximity::{find_catalytic_partner, ligand_distance, NearbyAtom, TargetAtom};
use crate::residues::ResidueKey;
use crate::utils::{file_stem, load_and_report, read_table, str_values};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Ligand code marking a structure without a bound ligand.
pub const NO_LIGAND: &str = "no_lig";

/// One row of the chain-mapping table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainMapping {
    pub pdb_id: String,
    pub chain: String,
    pub ligand: String,
}

impl ChainMapping {
    pub fn has_ligand(&self) -> bool {
        self.ligand != NO_LIGAND
    }
}

/// Read a chain-mapping table with columns `PDB_ID, Chain_ID, Ligand`.
pub fn read_chain_mapping(path: &Path) -> Result<Vec<ChainMapping>> {
    let df = read_table(path, &["PDB_ID", "Chain_ID", "Ligand"])?;
    let ids = str_values(&df, "PDB_ID")?;
    let chains = str_values(&df, "Chain_ID")?;
    let ligands = str_values(&df, "Ligand")?;
    Ok(ids
        .into_iter()
        .zip(chains)
        .zip(ligands)
        .filter_map(|((pdb_id, chain), ligand)| {
            Some(ChainMapping {
                pdb_id: pdb_id?,
                chain: chain?,
                ligand: ligand?,
            })
        })
        .collect())
}

/// Closest carbon to the target atom in a structure without ligand.
#[derive(Debug, Clone, PartialEq)]
pub struct PartnerRow {
    pub pdb_id: String,
    pub resi: isize,
    pub chain: String,
    pub atom_name: String,
    pub distance: f64,
    pub nearest_oxygen: Option<NearbyAtom>,
}

/// Minimum ligand distance in a structure with ligand.
#[derive(Debug, Clone, PartialEq)]
pub struct LigandRow {
    pub pdb_id: String,
    pub ligand_resi: isize,
    pub chain: String,
    pub distance: f64,
    pub ligand: String,
}

/// Results of a survey, both tables sorted by PDB ID.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurveyResults {
    pub partners: Vec<PartnerRow>,
    pub ligands: Vec<LigandRow>,
}

/// Describe the oxygen found near a carbon, or `None`.
pub fn describe_oxygen(oxygen: Option<&NearbyAtom>) -> String {
    match oxygen {
        None => "None".to_string(),
        Some(o) => format!(
            "{} (Residue: {}, Chain: {}, Distance: {:.2}, Coordinates: ({:.3}, {:.3}, {:.3}))",
            o.site.name,
            o.site.key.resi,
            o.site.key.chain,
            o.distance,
            o.site.position.0,
            o.site.position.1,
            o.site.position.2
        ),
    }
}

/// Target residue and atom surveyed in every structure; the chain comes from the mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct SurveyTarget {
    pub resi: isize,
    pub resn: String,
    pub atom_name: String,
    pub threshold: f64,
    pub oxygen_cutoff: f64,
}

/// Survey one structure. Selection problems are logged and give no row.
pub fn survey_structure(
    path: &Path,
    mapping: &ChainMapping,
    target: &SurveyTarget,
    results: &mut SurveyResults,
) -> Result<()> {
    let pdb = load_and_report(path)?;
    let pdb_id = mapping.pdb_id.clone();

    if mapping.has_ligand() {
        let residue = ResidueKey::new(mapping.chain.clone(), target.resi, "");
        match ligand_distance(&pdb, &residue, &mapping.ligand) {
            Ok(contact) => results.ligands.push(LigandRow {
                pdb_id,
                ligand_resi: contact.ligand.resi,
                chain: contact.ligand.chain,
                distance: contact.distance,
                ligand: mapping.ligand.clone(),
            }),
            Err(e) => warn!("{pdb_id}: {e}, skipping"),
        }
        return Ok(());
    }

    let atom = TargetAtom {
        chain: mapping.chain.clone(),
        resi: target.resi,
        resn: target.resn.clone(),
        atom_name: target.atom_name.clone(),
    };
    match find_catalytic_partner(&pdb, &atom, target.threshold, target.oxygen_cutoff) {
        Ok(Some(partner)) => {
            debug!(
                "{pdb_id}: closest carbon {} {} at {:.2} Å",
                partner.carbon.key, partner.carbon.name, partner.distance
            );
            if partner.nearest_oxygen.is_none() {
                info!("{pdb_id}: no oxygen within {} Å of the carbon", target.oxygen_cutoff);
            }
            results.partners.push(PartnerRow {
                pdb_id,
                resi: partner.carbon.key.resi,
                chain: partner.carbon.key.chain,
                atom_name: partner.carbon.name,
                distance: partner.distance,
                nearest_oxygen: partner.nearest_oxygen,
            });
        }
        Ok(None) => info!(
            "{pdb_id}: no carbon within {} Å of the target atom",
            target.threshold
        ),
        Err(e) => warn!("{pdb_id}: {e}, skipping"),
    }
    Ok(())
}

/// Survey every structure file, matched to the mapping by upper-cased file stem.
///
/// Files without a mapping entry or that fail to load are logged and skipped.
pub fn survey_structures(
    files: &[PathBuf],
    mappings: &[ChainMapping],
    target: &SurveyTarget,
) -> SurveyResults {
    let mut results = SurveyResults::default();
    for file in files {
        let pdb_id = file_stem(file).to_uppercase();
        let Some(mapping) = mappings.iter().find(|m| m.pdb_id == pdb_id) else {
            warn!("No chain mapping for PDB ID {pdb_id}, skipping");
            continue;
        };
        info!(
            "Processing {pdb_id}: chain {}, ligand {}",
            mapping.chain, mapping.ligand
        );
        if let Err(e) = survey_structure(file, mapping, target, &mut results) {
            warn!("{pdb_id}: {e}, skipping");
        }
    }
    results.partners.sort_by(|a, b| a.pdb_id.cmp(&b.pdb_id));
    results.ligands.sort_by(|a, b| a.pdb_id.cmp(&b.pdb_id));
    results
}

impl SurveyResults {
    /// Table with columns `PDB_ID, residue_number, chain, item_name, distance, nearest_oxygen`.
    pub fn partners_df(&self) -> Result<DataFrame> {
        let rows = &self.partners;
        Ok(df!(
            "PDB_ID" => rows.iter().map(|r| r.pdb_id.to_owned()).collect::<Vec<String>>(),
            "residue_number" => rows.iter().map(|r| r.resi as i64).collect::<Vec<i64>>(),
            "chain" => rows.iter().map(|r| r.chain.to_owned()).collect::<Vec<String>>(),
            "item_name" => rows.iter().map(|r| r.atom_name.to_owned()).collect::<Vec<String>>(),
            "distance" => rows.iter().map(|r| r.distance).collect::<Vec<f64>>(),
            "nearest_oxygen" => rows.iter().map(|r| describe_oxygen(r.nearest_oxygen.as_ref())).collect::<Vec<String>>(),
        )?)
    }

    /// Table with columns `PDB_ID, lig_Residue, chain, distance, ligand`.
    pub fn ligands_df(&self) -> Result<DataFrame> {
        let rows = &self.ligands;
        Ok(df!(
            "PDB_ID" => rows.iter().map(|r| r.pdb_id.to_owned()).collect::<Vec<String>>(),
            "lig_Residue" => rows.iter().map(|r| r.ligand_resi as i64).collect::<Vec<i64>>(),
            "chain" => rows.iter().map(|r| r.chain.to_owned()).collect::<Vec<String>>(),
            "distance" => rows.iter().map(|r| r.distance).collect::<Vec<f64>>(),
            "ligand" => rows.iter().map(|r| r.ligand.to_owned()).collect::<Vec<String>>(),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proximity::{DEFAULT_CONTACT_THRESHOLD, DEFAULT_OXYGEN_CUTOFF};
    use crate::utils::tests::{column_names, test_data};
    use crate::utils::{write_df_to_file, DataFrameFileType};

    fn target() -> SurveyTarget {
        SurveyTarget {
            resi: 195,
            resn: "SER".to_string(),
            atom_name: "OG".to_string(),
            threshold: DEFAULT_CONTACT_THRESHOLD,
            oxygen_cutoff: DEFAULT_OXYGEN_CUTOFF,
        }
    }

    /// Copies of the complex under the IDs of the mapping fixture.
    fn structure_dir() -> (tempfile::TempDir, Vec<PathBuf>) {
        let dir = tempfile::tempdir().unwrap();
        let mut files = Vec::new();
        for name in ["2abc.pdb", "1abc.pdb", "3abc.pdb", "9zzz.pdb"] {
            let path = dir.path().join(name);
            std::fs::copy(test_data("ligand_complex.pdb"), &path).unwrap();
            files.push(path);
        }
        files.sort();
        (dir, files)
    }

    #[test]
    fn mapping_is_read_from_fixture() {
        let mappings = read_chain_mapping(&test_data("chain_mapping.csv")).unwrap();
        assert_eq!(mappings.len(), 3);
        assert_eq!(
            mappings[0],
            ChainMapping {
                pdb_id: "1ABC".to_string(),
                chain: "A".to_string(),
                ligand: NO_LIGAND.to_string()
            }
        );
        assert!(mappings[1].has_ligand());
    }

    #[test]
    fn both_branches_are_surveyed() {
        let (_dir, files) = structure_dir();
        let mappings = read_chain_mapping(&test_data("chain_mapping.csv")).unwrap();
        let results = survey_structures(&files, &mappings, &target());

        assert_eq!(results.partners.len(), 1);
        let partner = &results.partners[0];
        assert_eq!(partner.pdb_id, "1ABC");
        assert_eq!((partner.resi, partner.chain.as_str()), (10, "B"));
        assert_eq!(partner.atom_name, "CA");

        // 3ABC maps to a ligand code absent from the structure
        assert_eq!(results.ligands.len(), 1);
        let ligand = &results.ligands[0];
        assert_eq!(ligand.pdb_id, "2ABC");
        assert_eq!((ligand.ligand_resi, ligand.chain.as_str()), (301, "A"));
        assert!((ligand.distance - 3.2).abs() < 1e-3);
    }

    #[test]
    fn oxygen_description() {
        let (_dir, files) = structure_dir();
        let mappings = read_chain_mapping(&test_data("chain_mapping.csv")).unwrap();
        let results = survey_structures(&files, &mappings, &target());
        assert_eq!(
            describe_oxygen(results.partners[0].nearest_oxygen.as_ref()),
            "O (Residue: 10, Chain: B, Distance: 1.20, Coordinates: (3.000, 1.200, 0.000))"
        );
        assert_eq!(describe_oxygen(None), "None");
    }

    #[test]
    fn survey_tables_are_identical_across_runs() {
        let (dir, files) = structure_dir();
        let mappings = read_chain_mapping(&test_data("chain_mapping.csv")).unwrap();

        let mut outputs = Vec::new();
        for run in 0..2 {
            let results = survey_structures(&files, &mappings, &target());
            let mut partners = results.partners_df().unwrap();
            let mut ligands = results.ligands_df().unwrap();
            assert_eq!(
                column_names(&partners),
                ["PDB_ID", "residue_number", "chain", "item_name", "distance", "nearest_oxygen"]
            );
            assert_eq!(
                column_names(&ligands),
                ["PDB_ID", "lig_Residue", "chain", "distance", "ligand"]
            );

            let p = dir.path().join(format!("no_lig_{run}.csv"));
            let l = dir.path().join(format!("with_lig_{run}.csv"));
            write_df_to_file(&mut partners, &p, DataFrameFileType::Csv).unwrap();
            write_df_to_file(&mut ligands, &l, DataFrameFileType::Csv).unwrap();
            outputs.push((std::fs::read(&p).unwrap(), std::fs::read(&l).unwrap()));
        }
        assert_eq!(outputs[0], outputs[1]);
    }
}
