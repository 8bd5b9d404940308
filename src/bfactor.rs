//! Per-residue B-factors of refined ensembles.

use crate::error::{AnalysisError, Result};
use crate::residues::{first_model, ResidueExt, ResidueKey};
use pdbtbx::*;
use polars::prelude::*;
use std::collections::BTreeMap;

/// Average B-factor of one residue over an ensemble.
#[derive(Debug, Clone, PartialEq)]
pub struct ResidueBFactor {
    pub key: ResidueKey,
    pub resn: String,
    /// Number of models in which the residue has at least one heavy atom
    pub n_models: usize,
    pub bfactor: f64,
}

/// Mean heavy-atom B-factor of each standard residue, averaged over the models containing it.
///
/// HETATM records (waters, ligands, ions) and hydrogens are ignored, as are all
/// chains listed in `excluded_chains`. A residue missing from some models is
/// averaged over the models where it is present only. The result is sorted by residue key.
pub fn ensemble_bfactors(pdb: &PDB, excluded_chains: &[String]) -> Vec<ResidueBFactor> {
    let mut per_model: BTreeMap<ResidueKey, (String, Vec<f64>)> = BTreeMap::new();

    for model in pdb.models() {
        for chain in model
            .chains()
            .filter(|c| !excluded_chains.iter().any(|x| x == c.id()))
        {
            for residue in chain.residues() {
                let Some(mean) = residue.mean_heavy_b_factor() else {
                    continue;
                };
                per_model
                    .entry(ResidueKey::from_parts(chain, residue))
                    .or_insert_with(|| (residue.name().unwrap_or("").to_string(), Vec::new()))
                    .1
                    .push(mean);
            }
        }
    }

    per_model
        .into_iter()
        .map(|(key, (resn, means))| ResidueBFactor {
            key,
            resn,
            n_models: means.len(),
            bfactor: means.iter().sum::<f64>() / means.len() as f64,
        })
        .collect()
}

/// Convert ensemble B-factors into a DataFrame with columns
/// `chain, resi, insertion, resn, n_models, bfactor`.
pub fn bfactors_to_df(rows: &[ResidueBFactor]) -> Result<DataFrame> {
    Ok(df!(
        "chain" => rows.iter().map(|r| r.key.chain.to_owned()).collect::<Vec<String>>(),
        "resi" => rows.iter().map(|r| r.key.resi as i64).collect::<Vec<i64>>(),
        "insertion" => rows.iter().map(|r| r.key.insertion.to_owned()).collect::<Vec<String>>(),
        "resn" => rows.iter().map(|r| r.resn.to_owned()).collect::<Vec<String>>(),
        "n_models" => rows.iter().map(|r| r.n_models as u32).collect::<Vec<u32>>(),
        "bfactor" => rows.iter().map(|r| r.bfactor).collect::<Vec<f64>>(),
    )?)
}

/// CA B-factors of the first model, in file order across all chains.
pub fn ca_bfactors(pdb: &PDB) -> Vec<f64> {
    first_model(pdb)
        .into_iter()
        .flat_map(|model| model.atoms())
        .filter(|atom| atom.name() == "CA")
        .map(|atom| atom.b_factor())
        .collect()
}

/// A labelled CA B-factor trace.
#[derive(Debug, Clone, PartialEq)]
pub struct BFactorProfile {
    pub label: String,
    pub values: Vec<f64>,
}

/// Truncate CA B-factor traces to the length of the shortest one, so they can share an axis.
pub fn ca_bfactor_profiles(structures: &[(String, &PDB)]) -> Result<Vec<BFactorProfile>> {
    let traces: Vec<BFactorProfile> = structures
        .iter()
        .map(|(label, pdb)| BFactorProfile {
            label: label.to_owned(),
            values: ca_bfactors(pdb),
        })
        .collect();

    let min_len = traces.iter().map(|t| t.values.len()).min().unwrap_or(0);
    if min_len == 0 {
        return Err(AnalysisError::EmptySelection(
            "at least one structure has no CA atoms".into(),
        ));
    }
    Ok(traces
        .into_iter()
        .map(|mut t| {
            t.values.truncate(min_len);
            t
        })
        .collect())
}

/// Long-form table of profiles: `label, index, bfactor`, with 1-based indices.
pub fn profiles_to_df(profiles: &[BFactorProfile]) -> Result<DataFrame> {
    let mut labels = Vec::new();
    let mut indices = Vec::new();
    let mut values = Vec::new();
    for profile in profiles {
        for (i, b) in profile.values.iter().enumerate() {
            labels.push(profile.label.to_owned());
            indices.push(i as i64 + 1);
            values.push(*b);
        }
    }
    Ok(df!(
        "label" => labels,
        "index" => indices,
        "bfactor" => values,
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::tests::{column_names, load_test_model};

    fn find<'a>(rows: &'a [ResidueBFactor], chain: &str, resi: isize) -> Option<&'a ResidueBFactor> {
        rows.iter().find(|r| r.key == ResidueKey::new(chain, resi, ""))
    }

    #[test]
    fn averages_over_all_models() {
        let pdb = load_test_model("ensemble.pdb");
        let rows = ensemble_bfactors(&pdb, &["S".to_string()]);

        // Heavy atoms average 15 * k in model k, hydrogens are ignored
        let ser = find(&rows, "A", 1).unwrap();
        assert_eq!(ser.resn, "SER");
        assert_eq!(ser.n_models, 5);
        assert!((ser.bfactor - 45.0).abs() < 1e-6);
    }

    #[test]
    fn residue_absent_from_some_models() {
        let pdb = load_test_model("ensemble.pdb");
        let rows = ensemble_bfactors(&pdb, &["S".to_string()]);

        // Present in 3 of 5 models with B = 10, 20, 30
        let gly = find(&rows, "A", 2).unwrap();
        assert_eq!(gly.n_models, 3);
        assert!((gly.bfactor - 20.0).abs() < 1e-6);
    }

    #[test]
    fn hydrogen_only_hetero_and_excluded_residues_are_absent() {
        let pdb = load_test_model("ensemble.pdb");
        let rows = ensemble_bfactors(&pdb, &["S".to_string()]);
        assert!(find(&rows, "A", 3).is_none());
        assert!(find(&rows, "A", 101).is_none());
        assert!(rows.iter().all(|r| r.key.chain != "S"));
        assert_eq!(rows.len(), 2);

        let with_s = ensemble_bfactors(&pdb, &[]);
        let s = find(&with_s, "S", 1).unwrap();
        assert!((s.bfactor - 5.0).abs() < 1e-6);

        let df = bfactors_to_df(&rows).unwrap();
        assert_eq!(
            column_names(&df),
            ["chain", "resi", "insertion", "resn", "n_models", "bfactor"]
        );
    }

    #[test]
    fn profiles_are_truncated_to_shortest() {
        let ensemble = load_test_model("ensemble.pdb");
        let reference = load_test_model("ca_reference.pdb");
        let profiles = ca_bfactor_profiles(&[
            ("ensemble".to_string(), &ensemble),
            ("reference".to_string(), &reference),
        ])
        .unwrap();
        // Three CA atoms in the first ensemble model, four in the reference
        assert!(profiles.iter().all(|p| p.values.len() == 3));
        assert_eq!(profiles[0].values, vec![20.0, 10.0, 5.0]);

        let df = profiles_to_df(&profiles).unwrap();
        assert_eq!(df.height(), 6);
        assert_eq!(
            df.column("index").unwrap().i64().unwrap().into_iter().collect::<Vec<_>>(),
            vec![Some(1), Some(2), Some(3), Some(1), Some(2), Some(3)]
        );
    }
}
