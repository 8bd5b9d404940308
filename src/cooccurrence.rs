//! Residue co-occurrence network: how often two residues are in contact across structures.

use crate::error::{AnalysisError, Result};
use crate::proximity::min_distance;
use crate::residues::{first_model, Coord, ResidueExt, ResidueKey};
use pdbtbx::*;
use polars::prelude::*;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Two residues in contact, ordered so that `first < second`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResiduePair {
    pub first: ResidueKey,
    pub second: ResidueKey,
}

impl ResiduePair {
    pub fn new(a: ResidueKey, b: ResidueKey) -> Self {
        if a <= b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }
}

/// All residue pairs of the first model whose heavy-atom minimum distance is at most `threshold`.
///
/// Each unordered pair appears once. The second element of the tuple maps every
/// residue key of the model to its output label.
pub fn residue_contacts(
    pdb: &PDB,
    threshold: f64,
) -> Result<(BTreeSet<ResiduePair>, BTreeMap<ResidueKey, String>)> {
    let model = first_model(pdb)
        .ok_or_else(|| AnalysisError::EmptySelection("structure has no models".into()))?;

    let residues: Vec<(ResidueKey, String, Vec<Coord>)> = model
        .chains()
        .flat_map(|chain| {
            chain.residues().map(move |residue| {
                let key = ResidueKey::from_parts(chain, residue);
                let label = key.label(residue.name().unwrap_or(""));
                (key, label, residue.heavy_atom_positions())
            })
        })
        .collect();

    let contacts: BTreeSet<ResiduePair> = (0..residues.len())
        .into_par_iter()
        .flat_map_iter(|i| {
            let (key_i, _, pos_i) = &residues[i];
            residues[i + 1..]
                .iter()
                .filter(move |(key_j, _, pos_j)| {
                    key_j != key_i
                        && min_distance(pos_i, pos_j).is_ok_and(|c| c.distance <= threshold)
                })
                .map(move |(key_j, _, _)| ResiduePair::new(key_i.clone(), key_j.clone()))
        })
        .collect::<Vec<_>>()
        .into_iter()
        .collect();

    let labels = residues
        .into_iter()
        .map(|(key, label, _)| (key, label))
        .collect();
    Ok((contacts, labels))
}

/// Contact counts accumulated over a set of structures.
#[derive(Debug, Default, Clone)]
pub struct CooccurrenceCounts {
    pub counts: BTreeMap<ResiduePair, usize>,
    pub labels: BTreeMap<ResidueKey, String>,
    pub n_structures: usize,
}

impl CooccurrenceCounts {
    /// Add the contacts of one structure; each pair counts at most once.
    pub fn add_structure(
        &mut self,
        contacts: BTreeSet<ResiduePair>,
        labels: BTreeMap<ResidueKey, String>,
    ) {
        for pair in contacts {
            *self.counts.entry(pair).or_insert(0) += 1;
        }
        for (key, label) in labels {
            self.labels.entry(key).or_insert(label);
        }
        self.n_structures += 1;
    }

    /// Count-derived weights in `[0, 1]`: the fraction of structures in which each pair is in contact.
    pub fn normalize(&self) -> Vec<WeightedPair> {
        if self.n_structures == 0 {
            return Vec::new();
        }
        let weights: Vec<WeightedPair> = self
            .counts
            .iter()
            .map(|(pair, &count)| WeightedPair {
                pair: pair.clone(),
                weight: count as f64 / self.n_structures as f64,
            })
            .collect();
        let max_weight = weights.iter().map(|w| w.weight).fold(0.0, f64::max);
        debug!("Maximum co-occurrence weight: {max_weight:.3}");
        weights
    }

    fn label(&self, key: &ResidueKey) -> String {
        self.labels
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    /// Network edges as a DataFrame with columns `Residue1, Residue2, Weight`.
    pub fn to_df(&self) -> Result<DataFrame> {
        let weights = self.normalize();
        Ok(df!(
            "Residue1" => weights.iter().map(|w| self.label(&w.pair.first)).collect::<Vec<String>>(),
            "Residue2" => weights.iter().map(|w| self.label(&w.pair.second)).collect::<Vec<String>>(),
            "Weight" => weights.iter().map(|w| w.weight).collect::<Vec<f64>>(),
        )?)
    }

    /// Edges with their labels, for drawing.
    pub fn labelled_edges(&self) -> Vec<(String, String, f64)> {
        self.normalize()
            .into_iter()
            .map(|w| (self.label(&w.pair.first), self.label(&w.pair.second), w.weight))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeightedPair {
    pub pair: ResiduePair,
    pub weight: f64,
}

/// Count residue contacts over several structures.
pub fn count_cooccurrence<'a, I>(structures: I, threshold: f64) -> Result<CooccurrenceCounts>
where
    I: IntoIterator<Item = &'a PDB>,
{
    let mut counts = CooccurrenceCounts::default();
    for pdb in structures {
        let (contacts, labels) = residue_contacts(pdb, threshold)?;
        counts.add_structure(contacts, labels);
    }
    info!(
        "Found {} residue pairs over {} structures",
        counts.counts.len(),
        counts.n_structures
    );
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::tests::{column_names, load_test_model};
    use crate::utils::{write_df_to_file, DataFrameFileType};

    fn pair(a: (&str, isize), b: (&str, isize)) -> ResiduePair {
        ResiduePair::new(ResidueKey::new(a.0, a.1, ""), ResidueKey::new(b.0, b.1, ""))
    }

    #[test]
    fn pairs_are_unordered() {
        assert_eq!(pair(("B", 10), ("A", 57)), pair(("A", 57), ("B", 10)));
        assert_eq!(pair(("B", 10), ("A", 57)).first, ResidueKey::new("A", 57, ""));
    }

    #[test]
    fn contacts_follow_threshold() {
        let pdb = load_test_model("ligand_complex.pdb");
        let (contacts, labels) = residue_contacts(&pdb, 4.0).unwrap();

        let expected: BTreeSet<ResiduePair> = [
            pair(("A", 57), ("A", 195)),
            pair(("A", 57), ("B", 10)),
            pair(("A", 195), ("A", 301)),
            pair(("A", 195), ("B", 10)),
            pair(("A", 301), ("B", 10)),
        ]
        .into_iter()
        .collect();
        assert_eq!(contacts, expected);
        assert_eq!(labels[&ResidueKey::new("A", 195, "")], "A:SER195");

        // A:57 and A:195 are 2.8 Å apart
        let (tight, _) = residue_contacts(&pdb, 2.5).unwrap();
        assert!(!tight.contains(&pair(("A", 57), ("A", 195))));
        assert!(tight.contains(&pair(("A", 195), ("B", 10))));
    }

    #[test]
    fn pair_counts_once_per_structure() {
        let pdb = load_test_model("ligand_complex.pdb");
        let counts = count_cooccurrence([&pdb, &pdb], 4.0).unwrap();
        assert_eq!(counts.n_structures, 2);
        assert!(counts.counts.values().all(|&c| c == 2));

        let weights = counts.normalize();
        assert_eq!(weights.len(), 5);
        assert!(weights.iter().all(|w| w.weight == 1.0));
    }

    #[test]
    fn weights_are_fractions_of_structures() {
        let mut counts = CooccurrenceCounts::default();
        let contact = pair(("A", 57), ("A", 195));
        counts.add_structure([contact.clone()].into_iter().collect(), BTreeMap::new());
        counts.add_structure(BTreeSet::new(), BTreeMap::new());
        counts.add_structure(BTreeSet::new(), BTreeMap::new());
        counts.add_structure([contact.clone()].into_iter().collect(), BTreeMap::new());

        let weights = counts.normalize();
        assert_eq!(weights, vec![WeightedPair { pair: contact, weight: 0.5 }]);

        let df = counts.to_df().unwrap();
        assert_eq!(column_names(&df), ["Residue1", "Residue2", "Weight"]);
        // Unlabelled residues fall back to the key
        assert_eq!(
            df.column("Residue1").unwrap().str().unwrap().get(0),
            Some("A:57")
        );
    }

    #[test]
    fn network_table_is_identical_across_runs() {
        let pdb = load_test_model("ligand_complex.pdb");
        let dir = tempfile::tempdir().unwrap();
        let mut outputs = Vec::new();
        for (i, threads) in [1, 3].into_iter().enumerate() {
            let counts = crate::utils::run_with_threads(threads, || {
                count_cooccurrence([&pdb], 4.0)
            })
            .unwrap()
            .unwrap();
            let path = dir.path().join(format!("network_{i}.csv"));
            write_df_to_file(&mut counts.to_df().unwrap(), &path, DataFrameFileType::Csv)
                .unwrap();
            outputs.push(std::fs::read(&path).unwrap());
        }
        assert_eq!(outputs[0], outputs[1]);
    }
}
