//! Crystal structure pairs that are comparable across catalytic states.

use crate::error::{AnalysisError, Result};
use crate::utils::{f64_values, require_columns, str_values};
use polars::prelude::*;
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

/// Catalytic state of a deposited structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CatalyticState {
    Apo,
    GsaBound,
    TsaBound,
}

impl CatalyticState {
    const ALL: [CatalyticState; 3] = [
        CatalyticState::Apo,
        CatalyticState::GsaBound,
        CatalyticState::TsaBound,
    ];

    /// Label as written in the annotation table.
    pub fn label(&self) -> &'static str {
        match self {
            CatalyticState::Apo => "APO",
            CatalyticState::GsaBound => "GSA-bound",
            CatalyticState::TsaBound => "TSA-bound",
        }
    }

    /// Short name used in report headings.
    pub fn short_name(&self) -> &'static str {
        match self {
            CatalyticState::Apo => "APO",
            CatalyticState::GsaBound => "GSA",
            CatalyticState::TsaBound => "TSA",
        }
    }

    /// The state label occurring first in free text, e.g. `"TSA-bound (boronic acid)"`.
    pub fn extract(text: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .filter_map(|state| text.find(state.label()).map(|pos| (pos, *state)))
            .min_by_key(|(pos, _)| *pos)
            .map(|(_, state)| state)
    }
}

impl fmt::Display for CatalyticState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Crystallographic metadata of one deposited structure.
#[derive(Debug, Clone, PartialEq)]
pub struct CrystalRecord {
    pub pdb_id: String,
    pub space_group: String,
    /// Unit cell lengths a, b, c in Å
    pub lengths: [f64; 3],
    /// Unit cell angles alpha, beta, gamma in degrees
    pub angles: [f64; 3],
    /// Resolution in Å
    pub resolution: f64,
    pub state: CatalyticState,
}

/// Strict upper bounds on the differences between two comparable structures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairTolerances {
    pub length: f64,
    pub angle: f64,
    pub resolution: f64,
}

pub const DEFAULT_LENGTH_TOLERANCE: f64 = 1.0;
pub const DEFAULT_ANGLE_TOLERANCE: f64 = 0.1;
pub const DEFAULT_RESOLUTION_TOLERANCE: f64 = 0.2;

impl Default for PairTolerances {
    fn default() -> Self {
        Self {
            length: DEFAULT_LENGTH_TOLERANCE,
            angle: DEFAULT_ANGLE_TOLERANCE,
            resolution: DEFAULT_RESOLUTION_TOLERANCE,
        }
    }
}

const LENGTH_COLUMNS: [&str; 3] = ["UnitCell_L1", "UnitCell_L2", "UnitCell_L3"];
const ANGLE_COLUMNS: [&str; 3] = ["UnitCell_A1", "UnitCell_A2", "UnitCell_A3"];
const RESOLUTION_COLUMNS: [&str; 2] = ["Resolution", "Resolution (Å)"];

/// Parse the annotation table into crystal records.
///
/// Rows without a recognizable state or with a non-numeric resolution are dropped.
/// Non-numeric unit cell entries become NaN, which never pairs.
pub fn crystal_records(df: &DataFrame, path: &Path) -> Result<Vec<CrystalRecord>> {
    require_columns(df, &["PDB ID", "SpaceGroup"], path)?;
    require_columns(df, &LENGTH_COLUMNS, path)?;
    require_columns(df, &ANGLE_COLUMNS, path)?;
    require_columns(df, &["State"], path)?;
    let resolution_column = RESOLUTION_COLUMNS
        .iter()
        .find(|c| df.get_column_index(c).is_some())
        .ok_or_else(|| AnalysisError::MissingColumn {
            column: RESOLUTION_COLUMNS[0].to_string(),
            path: path.to_path_buf(),
        })?;

    let ids = str_values(df, "PDB ID")?;
    let space_groups = str_values(df, "SpaceGroup")?;
    let states = str_values(df, "State")?;
    let resolutions = f64_values(df, resolution_column)?;
    let lengths = LENGTH_COLUMNS
        .iter()
        .map(|c| f64_values(df, c))
        .collect::<Result<Vec<_>>>()?;
    let angles = ANGLE_COLUMNS
        .iter()
        .map(|c| f64_values(df, c))
        .collect::<Result<Vec<_>>>()?;

    let mut records = Vec::new();
    for i in 0..df.height() {
        let state = states[i].as_deref().and_then(CatalyticState::extract);
        let (Some(state), Some(resolution)) = (state, resolutions[i]) else {
            debug!("Dropping row {}: no state or resolution", i + 1);
            continue;
        };
        let cell = |columns: &Vec<Vec<Option<f64>>>| -> [f64; 3] {
            [0, 1, 2].map(|j| columns[j][i].unwrap_or(f64::NAN))
        };
        records.push(CrystalRecord {
            pdb_id: ids[i].clone().unwrap_or_default(),
            space_group: space_groups[i].clone().unwrap_or_default(),
            lengths: cell(&lengths),
            angles: cell(&angles),
            resolution,
            state,
        });
    }
    Ok(records)
}

/// Whether two structures satisfy every tolerance. NaN differences fail.
pub fn is_comparable(a: &CrystalRecord, b: &CrystalRecord, tolerances: &PairTolerances) -> bool {
    a.space_group == b.space_group
        && a.lengths
            .iter()
            .zip(b.lengths.iter())
            .all(|(x, y)| (x - y).abs() < tolerances.length)
        && a.angles
            .iter()
            .zip(b.angles.iter())
            .all(|(x, y)| (x - y).abs() < tolerances.angle)
        && (a.resolution - b.resolution).abs() < tolerances.resolution
}

/// All cross pairs of `group1` and `group2` that are comparable, in input order.
pub fn find_pairs(
    group1: &[&CrystalRecord],
    group2: &[&CrystalRecord],
    tolerances: &PairTolerances,
) -> Vec<(String, String)> {
    group1
        .iter()
        .flat_map(|a| {
            group2
                .iter()
                .filter(move |b| is_comparable(a, b, tolerances))
                .map(move |b| (a.pdb_id.clone(), b.pdb_id.clone()))
        })
        .collect()
}

/// Pairs found for one state comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct StateComparison {
    pub first: CatalyticState,
    pub second: CatalyticState,
    pub pairs: Vec<(String, String)>,
}

impl StateComparison {
    pub fn name(&self) -> String {
        format!("{}_vs_{}", self.first.short_name(), self.second.short_name())
    }
}

/// Compare APO with GSA-bound, APO with TSA-bound, and GSA-bound with TSA-bound structures.
pub fn compare_states(
    records: &[CrystalRecord],
    tolerances: &PairTolerances,
) -> Vec<StateComparison> {
    let by_state = |state: CatalyticState| -> Vec<&CrystalRecord> {
        records.iter().filter(|r| r.state == state).collect()
    };
    let comparisons = [
        (CatalyticState::Apo, CatalyticState::GsaBound),
        (CatalyticState::Apo, CatalyticState::TsaBound),
        (CatalyticState::GsaBound, CatalyticState::TsaBound),
    ];
    comparisons
        .into_iter()
        .map(|(first, second)| {
            let pairs = find_pairs(&by_state(first), &by_state(second), tolerances);
            if pairs.is_empty() {
                warn!(
                    "No comparable pairs between {} and {} structures",
                    first.label(),
                    second.label()
                );
            }
            StateComparison {
                first,
                second,
                pairs,
            }
        })
        .collect()
}

/// Plain-text report listing every comparison and its pairs.
pub fn pair_report(comparisons: &[StateComparison]) -> String {
    let mut report = String::from("=== Comparable PDB Pairs ===\n");
    for comparison in comparisons {
        report.push_str(&format!(
            "\n{} pairs ({} found):\n",
            comparison.name(),
            comparison.pairs.len()
        ));
        for (a, b) in &comparison.pairs {
            report.push_str(&format!("{a} <-> {b}\n"));
        }
    }
    report
}
