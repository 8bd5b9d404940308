//! Brute-force nearest-neighbour and proximity searches.
//!
//! Every search compares all atom pairs. Selections are a few residues or
//! chains, so no spatial index is built.

use crate::error::{AnalysisError, Result};
use crate::residues::{first_model, AtomSite, Coord, ResidueExt, ResidueKey};
use pdbtbx::*;
use polars::prelude::*;
use rayon::prelude::*;

/// Default distance (Å) under which two residues are considered in contact.
pub const DEFAULT_CONTACT_THRESHOLD: f64 = 4.0;

/// Default upper bound (Å) when looking for an oxygen bonded to a carbon.
pub const DEFAULT_OXYGEN_CUTOFF: f64 = 2.2;

/// Euclidean distance between two points.
pub fn distance(a: &Coord, b: &Coord) -> f64 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2) + (a.2 - b.2).powi(2)).sqrt()
}

/// Result of a minimum-distance search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Closest {
    /// Minimum distance between the two point sets
    pub distance: f64,
    /// Position of the candidate point achieving the minimum
    pub position: Coord,
}

/// Minimum distance between any `target` point and any `candidate` point.
///
/// Fails with [`AnalysisError::EmptySelection`] if either set is empty.
/// When several pairs share the minimum, the first one encountered wins.
pub fn min_distance(target: &[Coord], candidate: &[Coord]) -> Result<Closest> {
    if target.is_empty() || candidate.is_empty() {
        return Err(AnalysisError::EmptySelection(format!(
            "{} target and {} candidate atoms",
            target.len(),
            candidate.len()
        )));
    }

    let mut best = Closest {
        distance: f64::INFINITY,
        position: candidate[0],
    };
    for t in target {
        for c in candidate {
            let d = distance(t, c);
            if d < best.distance {
                best = Closest {
                    distance: d,
                    position: *c,
                };
            }
        }
    }
    Ok(best)
}

/// Heavy-atom minimum distance between two residues, `None` if either has no heavy atom.
pub fn residue_min_distance(a: &Residue, b: &Residue) -> Option<f64> {
    min_distance(&a.heavy_atom_positions(), &b.heavy_atom_positions())
        .ok()
        .map(|c| c.distance)
}

/// An atom found by [`nearest_atom_within`].
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyAtom {
    pub site: AtomSite,
    pub distance: f64,
}

/// The atom of `sites` closest to `reference`, provided it lies within `cutoff`.
///
/// Atoms beyond the cutoff are never reported, even if nothing else qualifies.
pub fn nearest_atom_within<'a, I>(reference: &Coord, sites: I, cutoff: f64) -> Option<NearbyAtom>
where
    I: IntoIterator<Item = &'a AtomSite>,
{
    let mut nearest: Option<NearbyAtom> = None;
    for site in sites {
        let d = distance(reference, &site.position);
        if d > cutoff {
            continue;
        }
        if nearest.as_ref().map_or(true, |n| d < n.distance) {
            nearest = Some(NearbyAtom {
                site: site.clone(),
                distance: d,
            });
        }
    }
    nearest
}

/// A residue with its minimum distance to a target residue.
#[derive(Debug, Clone, PartialEq)]
pub struct ResidueDistance {
    pub key: ResidueKey,
    pub resn: String,
    pub distance: f64,
}

fn model_of(pdb: &PDB) -> Result<&Model> {
    first_model(pdb).ok_or_else(|| AnalysisError::EmptySelection("structure has no models".into()))
}

/// Residues of the first model together with the requested atom positions.
fn residue_positions(
    model: &Model,
    heavy_only: bool,
) -> Vec<(ResidueKey, String, Vec<Coord>)> {
    model
        .chains()
        .flat_map(|chain| {
            chain.residues().map(move |residue| {
                let positions = if heavy_only {
                    residue.heavy_atom_positions()
                } else {
                    residue.atom_positions()
                };
                (
                    ResidueKey::from_parts(chain, residue),
                    residue.name().unwrap_or("").to_string(),
                    positions,
                )
            })
        })
        .collect()
}

fn distances_to_target(
    pdb: &PDB,
    target: &ResidueKey,
    heavy_only: bool,
) -> Result<Vec<ResidueDistance>> {
    let residues = residue_positions(model_of(pdb)?, heavy_only);
    let target_positions: Vec<Coord> = residues
        .iter()
        .filter(|(key, _, _)| key == target)
        .flat_map(|(_, _, positions)| positions.iter().copied())
        .collect();
    if target_positions.is_empty() {
        return Err(AnalysisError::EmptySelection(format!(
            "target residue {target}"
        )));
    }

    let mut distances: Vec<ResidueDistance> = residues
        .par_iter()
        .filter(|(key, _, positions)| key != target && !positions.is_empty())
        .filter_map(|(key, resn, positions)| {
            min_distance(&target_positions, positions)
                .ok()
                .map(|closest| ResidueDistance {
                    key: key.clone(),
                    resn: resn.clone(),
                    distance: closest.distance,
                })
        })
        .collect();
    distances.sort_by(|a, b| a.key.cmp(&b.key));
    distances.dedup_by(|a, b| a.key == b.key);
    Ok(distances)
}

/// Minimum distance (over all atoms) from `target` to every other residue of the first model.
///
/// The result is sorted by residue key.
pub fn residue_distances(pdb: &PDB, target: &ResidueKey) -> Result<Vec<ResidueDistance>> {
    distances_to_target(pdb, target, false)
}

/// Residues whose heavy-atom minimum distance to `target` is at most `threshold`.
pub fn close_residues(
    pdb: &PDB,
    target: &ResidueKey,
    threshold: f64,
) -> Result<Vec<ResidueDistance>> {
    Ok(distances_to_target(pdb, target, true)?
        .into_iter()
        .filter(|r| r.distance <= threshold)
        .collect())
}

/// Convert residue distances into a DataFrame with columns `resi, chain, distance`.
pub fn residue_distances_to_df(distances: &[ResidueDistance]) -> Result<DataFrame> {
    Ok(df!(
        "resi" => distances.iter().map(|x| x.key.resi as i64).collect::<Vec<i64>>(),
        "chain" => distances.iter().map(|x| x.key.chain.to_owned()).collect::<Vec<String>>(),
        "distance" => distances.iter().map(|x| x.distance).collect::<Vec<f64>>(),
    )?)
}

/// The atom a search is anchored on, e.g. `OG` of `SER 195` in chain `A`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetAtom {
    pub chain: String,
    pub resi: isize,
    pub resn: String,
    pub atom_name: String,
}

impl TargetAtom {
    fn matches(&self, site: &AtomSite) -> bool {
        site.key.chain == self.chain
            && site.key.resi == self.resi
            && site.resn == self.resn
            && site.name == self.atom_name
    }
}

/// A carbon close to the target atom and the oxygen bonded to it, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalyticPartner {
    pub carbon: AtomSite,
    pub distance: f64,
    pub nearest_oxygen: Option<NearbyAtom>,
}

/// Look for the carbon outside the target chain closest to the target atom.
///
/// Only carbons within `threshold` of the target qualify. For the selected carbon,
/// the nearest atom named `O` within `oxygen_cutoff` is reported alongside.
/// Returns `Ok(None)` if no carbon qualifies, and an
/// [`AnalysisError::EmptySelection`] if the target atom is absent.
pub fn find_catalytic_partner(
    pdb: &PDB,
    target: &TargetAtom,
    threshold: f64,
    oxygen_cutoff: f64,
) -> Result<Option<CatalyticPartner>> {
    let sites = AtomSite::collect(model_of(pdb)?);
    let target_positions: Vec<Coord> = sites
        .iter()
        .filter(|site| target.matches(site))
        .map(|site| site.position)
        .collect();
    if target_positions.is_empty() {
        return Err(AnalysisError::EmptySelection(format!(
            "atom {} of residue {} {} in chain {}",
            target.atom_name, target.resi, target.resn, target.chain
        )));
    }

    let mut closest: Option<(AtomSite, f64)> = None;
    for site in sites
        .iter()
        .filter(|site| site.key.chain != target.chain && site.name.contains('C'))
    {
        let d = min_distance(&target_positions, &[site.position])?.distance;
        if d <= threshold && closest.as_ref().map_or(true, |(_, best)| d < *best) {
            closest = Some((site.clone(), d));
        }
    }

    Ok(closest.map(|(carbon, distance)| {
        let oxygens = sites.iter().filter(|site| site.name == "O");
        let nearest_oxygen = nearest_atom_within(&carbon.position, oxygens, oxygen_cutoff);
        CatalyticPartner {
            carbon,
            distance,
            nearest_oxygen,
        }
    }))
}

/// Minimum distance between a ligand and a target residue.
#[derive(Debug, Clone, PartialEq)]
pub struct LigandContact {
    /// Residue of the first ligand atom
    pub ligand: ResidueKey,
    pub distance: f64,
}

/// Minimum distance between the target residue and all atoms of residues named `ligand_code`.
pub fn ligand_distance(
    pdb: &PDB,
    target: &ResidueKey,
    ligand_code: &str,
) -> Result<LigandContact> {
    let sites = AtomSite::collect(model_of(pdb)?);
    let ligand_sites: Vec<&AtomSite> = sites.iter().filter(|s| s.resn == ligand_code).collect();
    let first_ligand = ligand_sites.first().ok_or_else(|| {
        AnalysisError::EmptySelection(format!("ligand {ligand_code}"))
    })?;
    let target_positions: Vec<Coord> = sites
        .iter()
        .filter(|s| s.key.chain == target.chain && s.key.resi == target.resi)
        .map(|s| s.position)
        .collect();
    let ligand_positions: Vec<Coord> = ligand_sites.iter().map(|s| s.position).collect();

    let closest = min_distance(&target_positions, &ligand_positions)?;
    Ok(LigandContact {
        ligand: first_ligand.key.clone(),
        distance: closest.distance,
    })
}
