use pdbtbx::*;
use std::fmt;

/// A 3-D coordinate as stored by [`pdbtbx::Atom::pos`].
pub type Coord = (f64, f64, f64);

/// Structural identity of a residue: chain, sequence number and insertion code.
///
/// Ordering follows the field order, so sorted keys group by chain first.
#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct ResidueKey {
    /// Chain identifier
    pub chain: String,
    /// Residue sequence number
    pub resi: isize,
    /// Residue insertion code, empty if there is none
    pub insertion: String,
}

impl ResidueKey {
    pub fn new(chain: impl Into<String>, resi: isize, insertion: impl Into<String>) -> Self {
        Self {
            chain: chain.into(),
            resi,
            insertion: insertion.into(),
        }
    }

    /// Key of `residue` as found in `chain`.
    pub fn from_parts(chain: &Chain, residue: &Residue) -> Self {
        let (resi, insertion) = residue.id();
        Self::new(chain.id(), resi, insertion.unwrap_or(""))
    }

    /// Output label combining the key with a residue name, e.g. `A:SER195` or `A:GLY184A`.
    pub fn label(&self, resn: &str) -> String {
        format!(
            "{chain}:{resn}{resi}{insertion}",
            chain = self.chain,
            resi = self.resi,
            insertion = self.insertion
        )
    }
}

impl fmt::Display for ResidueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}{}", self.chain, self.resi, self.insertion)
    }
}

/// A flattened atom with the hierarchy information needed for selections.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomSite {
    pub key: ResidueKey,
    pub resn: String,
    pub name: String,
    pub is_hydrogen: bool,
    pub hetero: bool,
    pub b_factor: f64,
    pub position: Coord,
}

impl AtomSite {
    pub fn new(chain: &Chain, residue: &Residue, atom: &Atom) -> Self {
        Self {
            key: ResidueKey::from_parts(chain, residue),
            resn: residue.name().unwrap_or("").to_string(),
            name: atom.name().to_string(),
            is_hydrogen: is_hydrogen(atom),
            hetero: atom.hetero(),
            b_factor: atom.b_factor(),
            position: atom.pos(),
        }
    }

    /// All atoms of a model, in file order.
    pub fn collect(model: &Model) -> Vec<AtomSite> {
        model
            .chains()
            .flat_map(|chain| {
                chain.residues().flat_map(move |residue| {
                    residue
                        .atoms()
                        .map(move |atom| AtomSite::new(chain, residue, atom))
                })
            })
            .collect()
    }
}

/// Hydrogen atoms are recognized by element; atoms without an element count as heavy.
pub fn is_hydrogen(atom: &Atom) -> bool {
    matches!(atom.element(), Some(Element::H))
}

/// The first model of a structure, which is what single-state analyses work on.
pub fn first_model(pdb: &PDB) -> Option<&Model> {
    pdb.models().next()
}

pub trait ResidueExt {
    /// Positions of all atoms of the residue.
    fn atom_positions(&self) -> Vec<Coord>;

    /// Positions of the non-hydrogen atoms of the residue.
    fn heavy_atom_positions(&self) -> Vec<Coord>;

    /// Whether the residue comes from HETATM records (ligands, waters, ions).
    fn is_hetero(&self) -> bool;

    /// Mean B-factor over the non-hydrogen ATOM records, `None` if there are none.
    fn mean_heavy_b_factor(&self) -> Option<f64>;
}

impl ResidueExt for Residue {
    fn atom_positions(&self) -> Vec<Coord> {
        self.atoms().map(|atom| atom.pos()).collect()
    }

    fn heavy_atom_positions(&self) -> Vec<Coord> {
        self.atoms()
            .filter(|atom| !is_hydrogen(atom))
            .map(|atom| atom.pos())
            .collect()
    }

    fn is_hetero(&self) -> bool {
        self.atoms().any(|atom| atom.hetero())
    }

    fn mean_heavy_b_factor(&self) -> Option<f64> {
        let b_factors: Vec<f64> = self
            .atoms()
            .filter(|atom| !atom.hetero() && !is_hydrogen(atom))
            .map(|atom| atom.b_factor())
            .collect();
        if b_factors.is_empty() {
            None
        } else {
            Some(b_factors.iter().sum::<f64>() / b_factors.len() as f64)
        }
    }
}
