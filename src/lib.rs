#![doc = include_str!("../README.md")]

//! # Proteasekit Library
//!
//! This library provides the structural analyses used to compare serine-protease
//! structures across the catalytic cycle: apo, ground-state analogue (GSA) bound
//! and transition-state analogue (TSA) bound.
//!
//! Structures are read with [`pdbtbx`]; tabular results are returned as Polars
//! DataFrames so they can be written to any supported format with
//! [`write_df_to_file`].

pub mod alignment;
pub mod bfactor;
pub mod chains;
pub mod cooccurrence;
pub mod error;
pub mod order_parameters;
pub mod pairing;
pub mod plots;
pub mod proximity;
pub mod reflections;
pub mod residues;
pub mod statistics;
pub mod survey;
pub mod utils;

// Re-export key public types
pub use error::{AnalysisError, Result};
pub use residues::{AtomSite, Coord, ResidueExt, ResidueKey};
pub use utils::{
    file_stem, list_files_with_extension, load_and_report, load_model, read_csv, read_table,
    run_with_threads, write_df_to_file, DataFrameFileType,
};

use pdbtbx::*;
use polars::prelude::*;
use tracing::debug;

/// Minimum distance from a target residue to every other residue of a structure.
///
/// # Arguments
///
/// * `pdb` - Reference to a PDB structure; only the first model is used
/// * `chain` - Chain of the target residue
/// * `resi` - Residue number of the target residue
///
/// # Returns
///
/// A Polars DataFrame with columns `resi, chain, distance`, sorted by chain and
/// residue number.
///
/// # Example
///
/// ```no_run
/// use proteasekit::{get_residue_distances, load_model};
/// use std::path::Path;
///
/// let (pdb, _warnings) = load_model(Path::new("path/to/1QNJ.pdb")).unwrap();
/// let df = get_residue_distances(&pdb, "A", 195).unwrap();
/// println!("{df}");
/// ```
pub fn get_residue_distances(pdb: &PDB, chain: &str, resi: isize) -> Result<DataFrame> {
    let target = ResidueKey::new(chain, resi, "");
    let distances = proximity::residue_distances(pdb, &target)?;
    debug!("Distances from {target} to {} residues", distances.len());
    proximity::residue_distances_to_df(&distances)
}

/// Alpha-carbon RMSD between a chain of one structure and a chain of another.
///
/// CA atoms are paired by residue number and insertion code before the optimal
/// superposition.
///
/// # Example
///
/// ```no_run
/// use proteasekit::{get_ca_rmsd, load_model};
/// use std::path::Path;
///
/// let (apo, _) = load_model(Path::new("2GCH.pdb")).unwrap();
/// let (tsa, _) = load_model(Path::new("3VGC.pdb")).unwrap();
/// let rmsd = get_ca_rmsd(&apo, "A", &tsa, "A").unwrap();
/// println!("RMSD: {rmsd:.3} Å");
/// ```
pub fn get_ca_rmsd(pdb1: &PDB, chain1: &str, pdb2: &PDB, chain2: &str) -> Result<f64> {
    Ok(alignment::ca_rmsd(pdb1, chain1, pdb2, chain2)?.rmsd)
}

/// Per-residue B-factors of an ensemble, averaged over the models containing each residue.
///
/// Returns a DataFrame with columns `chain, resi, insertion, resn, n_models, bfactor`.
pub fn get_ensemble_bfactors(pdb: &PDB, excluded_chains: &[String]) -> Result<DataFrame> {
    bfactor::bfactors_to_df(&bfactor::ensemble_bfactors(pdb, excluded_chains))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::tests::load_test_model;

    #[test]
    fn residue_distance_table() {
        let pdb = load_test_model("ligand_complex.pdb");
        let df = get_residue_distances(&pdb, "A", 195).unwrap();
        assert_eq!(df.height(), 5);
        assert!(get_residue_distances(&pdb, "A", 196).is_err());
    }

    #[test]
    fn rmsd_of_moved_copy() {
        let reference = load_test_model("ca_reference.pdb");
        let moved = load_test_model("ca_moved.pdb");
        assert!(get_ca_rmsd(&reference, "A", &moved, "B").unwrap() < 1e-3);
    }

    #[test]
    fn ensemble_table() {
        let pdb = load_test_model("ensemble.pdb");
        let df = get_ensemble_bfactors(&pdb, &[]).unwrap();
        assert_eq!(df.height(), 3);
    }
}
