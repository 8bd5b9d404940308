//! Alpha-carbon superposition and RMSD.

use crate::error::{AnalysisError, Result};
use crate::residues::{first_model, Coord, ResidueKey};
use crate::utils::load_and_report;
use nalgebra::{Matrix3, Point3, Rotation3, Vector3};
use pdbtbx::*;
use polars::prelude::*;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Default chain compared by the batch RMSD step.
pub const DEFAULT_CHAIN: &str = "A";

/// Optimal rigid-body superposition of a mobile point set onto a reference.
#[derive(Debug, Clone)]
pub struct Superposition {
    /// Root mean square deviation after superposition
    pub rmsd: f64,
    /// Rotation applied to the mobile points
    pub rotation: Rotation3<f64>,
    /// Translation applied after the rotation
    pub translation: Vector3<f64>,
    /// Number of point pairs used
    pub n_atoms: usize,
}

impl Superposition {
    /// Move a mobile point onto the reference frame.
    pub fn apply(&self, point: &Coord) -> Coord {
        let moved = self.rotation * Vector3::new(point.0, point.1, point.2) + self.translation;
        (moved.x, moved.y, moved.z)
    }
}

fn to_point(c: &Coord) -> Point3<f64> {
    Point3::new(c.0, c.1, c.2)
}

fn centroid(points: &[Point3<f64>]) -> Point3<f64> {
    let sum: Vector3<f64> = points.iter().map(|p| p.coords).sum();
    Point3::from(sum / points.len() as f64)
}

/// Kabsch superposition of `mobile` onto `reference`, paired by index.
pub fn superpose(reference: &[Coord], mobile: &[Coord]) -> Result<Superposition> {
    if reference.is_empty() || mobile.is_empty() {
        return Err(AnalysisError::EmptySelection(
            "superposition needs at least one atom pair".into(),
        ));
    }
    if reference.len() != mobile.len() {
        return Err(AnalysisError::Argument(format!(
            "cannot superpose {} reference atoms onto {} mobile atoms",
            reference.len(),
            mobile.len()
        )));
    }

    let to_points: Vec<Point3<f64>> = reference.iter().map(to_point).collect();
    let from_points: Vec<Point3<f64>> = mobile.iter().map(to_point).collect();
    let to_centroid = centroid(&to_points);
    let from_centroid = centroid(&from_points);

    let h = from_points
        .iter()
        .zip(to_points.iter())
        .fold(Matrix3::zeros(), |acc, (f, t)| {
            acc + (t - to_centroid) * (f - from_centroid).transpose()
        });

    let svd = h.svd(true, true);
    let (u, v_t) = match (svd.u, svd.v_t) {
        (Some(u), Some(v_t)) => (u, v_t),
        _ => {
            return Err(AnalysisError::Argument(
                "singular value decomposition did not converge".into(),
            ))
        }
    };

    // Flip the smallest axis to keep a proper rotation
    let mut correction = Matrix3::identity();
    if (u * v_t).determinant() < 0.0 {
        correction[(2, 2)] = -1.0;
    }
    let rotation = Rotation3::from_matrix_unchecked(u * correction * v_t);
    let translation = to_centroid.coords - rotation * from_centroid.coords;

    let squared_sum: f64 = from_points
        .iter()
        .zip(to_points.iter())
        .map(|(f, t)| (rotation * f.coords + translation - t.coords).norm_squared())
        .sum();

    Ok(Superposition {
        rmsd: (squared_sum / reference.len() as f64).sqrt(),
        rotation,
        translation,
        n_atoms: reference.len(),
    })
}

/// CA atoms of a chain in the first model, one per residue, in file order.
pub fn alpha_carbons(pdb: &PDB, chain_id: &str) -> Result<Vec<(ResidueKey, Coord)>> {
    let cas: Vec<(ResidueKey, Coord)> = first_model(pdb)
        .into_iter()
        .flat_map(|model| model.chains())
        .filter(|chain| chain.id() == chain_id)
        .flat_map(|chain| {
            chain.residues().filter_map(move |residue| {
                residue
                    .atoms()
                    .find(|atom| atom.name() == "CA")
                    .map(|atom| (ResidueKey::from_parts(chain, residue), atom.pos()))
            })
        })
        .collect();

    if cas.is_empty() {
        return Err(AnalysisError::ChainNotFound {
            chain: chain_id.to_string(),
        });
    }
    Ok(cas)
}

/// RMSD between the CA atoms of two chains after optimal superposition.
///
/// Residues are matched by sequence number and insertion code; residues present
/// in only one chain are left out.
pub fn ca_rmsd(pdb1: &PDB, chain1: &str, pdb2: &PDB, chain2: &str) -> Result<Superposition> {
    let reference = alpha_carbons(pdb1, chain1)?;
    let mobile: HashMap<(isize, String), Coord> = alpha_carbons(pdb2, chain2)?
        .into_iter()
        .map(|(key, pos)| ((key.resi, key.insertion), pos))
        .collect();

    let (matched_ref, matched_mob): (Vec<Coord>, Vec<Coord>) = reference
        .iter()
        .filter_map(|(key, pos)| {
            mobile
                .get(&(key.resi, key.insertion.clone()))
                .map(|other| (*pos, *other))
        })
        .unzip();

    if matched_ref.len() < reference.len() || matched_mob.len() < mobile.len() {
        warn!(
            "Only {} of {}/{} CA atoms share residue numbers between chain {chain1} and chain {chain2}",
            matched_ref.len(),
            reference.len(),
            mobile.len()
        );
    }
    if matched_ref.is_empty() {
        return Err(AnalysisError::EmptySelection(format!(
            "no CA atoms with matching residue numbers in chain {chain1} and chain {chain2}"
        )));
    }
    superpose(&matched_ref, &matched_mob)
}

/// Name of the report written for a single comparison.
pub fn rmsd_report_name(structure1: &Path, chain1: &str, structure2: &Path, chain2: &str) -> String {
    format!(
        "{}_chain{chain1}_vs_{}_chain{chain2}_RMSD.txt",
        crate::utils::file_stem(structure1),
        crate::utils::file_stem(structure2)
    )
}

/// Plain-text report of a single comparison.
pub fn rmsd_report(
    structure1: &Path,
    chain1: &str,
    structure2: &Path,
    chain2: &str,
    superposition: &Superposition,
) -> String {
    format!(
        "Structure 1 (Chain {chain1}): {}\nStructure 2 (Chain {chain2}): {}\nAligned CA atoms: {}\nAlpha Carbon RMSD: {:.3} Å\n",
        structure1.display(),
        structure2.display(),
        superposition.n_atoms,
        superposition.rmsd
    )
}

/// Parse a pair list: one pair of structure paths per line, separated by whitespace.
///
/// Blank lines are ignored; lines without exactly two fields are skipped with a warning.
pub fn parse_pair_list(text: &str) -> Vec<(String, String)> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(i, line)| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            match fields.as_slice() {
                [a, b] => Some((a.to_string(), b.to_string())),
                _ => {
                    warn!("Skipping line {}: expected two structure paths", i + 1);
                    None
                }
            }
        })
        .collect()
}

/// One row of the batch RMSD table.
#[derive(Debug, Clone, PartialEq)]
pub struct PairRmsd {
    pub structure1: String,
    pub structure2: String,
    pub rmsd: f64,
}

fn pair_rmsd(path1: &Path, path2: &Path, chain: &str) -> Result<f64> {
    let pdb1 = load_and_report(path1)?;
    let pdb2 = load_and_report(path2)?;
    Ok(ca_rmsd(&pdb1, chain, &pdb2, chain)?.rmsd)
}

/// CA RMSD of the same chain for every pair of structure paths.
///
/// A pair that cannot be loaded or aligned is logged and left out, so one bad
/// structure never stops the batch.
pub fn batch_pair_rmsds(pairs: &[(String, String)], chain: &str) -> Vec<PairRmsd> {
    let mut rows = Vec::new();
    for (structure1, structure2) in pairs {
        match pair_rmsd(Path::new(structure1), Path::new(structure2), chain) {
            Ok(rmsd) => {
                debug!("{structure1} vs {structure2}: {rmsd:.3} Å");
                rows.push(PairRmsd {
                    structure1: structure1.to_owned(),
                    structure2: structure2.to_owned(),
                    rmsd,
                });
            }
            Err(e) => warn!("Skipping {structure1} vs {structure2}: {} - {e}", e.kind()),
        }
    }
    rows
}

/// Batch RMSD table with columns `Structure 1`, `Structure 2`, `Alpha Carbon RMSD (Å)`.
///
/// Values are rounded to three decimals.
pub fn pair_rmsds_to_df(rows: &[PairRmsd]) -> Result<DataFrame> {
    Ok(df!(
        "Structure 1" => rows.iter().map(|r| r.structure1.to_owned()).collect::<Vec<String>>(),
        "Structure 2" => rows.iter().map(|r| r.structure2.to_owned()).collect::<Vec<String>>(),
        "Alpha Carbon RMSD (Å)" => rows.iter().map(|r| (r.rmsd * 1000.0).round() / 1000.0).collect::<Vec<f64>>(),
    )?)
}
