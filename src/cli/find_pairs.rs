use clap::Parser;
use proteasekit::pairing::{
    compare_states, crystal_records, pair_report, PairTolerances, DEFAULT_ANGLE_TOLERANCE,
    DEFAULT_LENGTH_TOLERANCE, DEFAULT_RESOLUTION_TOLERANCE,
};
use proteasekit::{read_csv, Result};
use std::path::PathBuf;
use tracing::{info, trace};

#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub(crate) struct Args {
    /// Annotation table with space group, unit cell, resolution and state of each structure
    #[arg(short, long)]
    input: PathBuf,

    /// Output report
    #[arg(short, long, default_value = "comparable_pairs.txt")]
    output: PathBuf,

    /// Largest difference of a unit cell length (Å)
    #[arg(long, default_value_t = DEFAULT_LENGTH_TOLERANCE)]
    length_tolerance: f64,

    /// Largest difference of a unit cell angle (degrees)
    #[arg(long, default_value_t = DEFAULT_ANGLE_TOLERANCE)]
    angle_tolerance: f64,

    /// Largest difference of resolution (Å)
    #[arg(long, default_value_t = DEFAULT_RESOLUTION_TOLERANCE)]
    resolution_tolerance: f64,
}

pub(crate) fn run(args: &Args) -> Result<()> {
    trace!("{args:?}");

    let df = read_csv(&args.input)?;
    let records = crystal_records(&df, &args.input)?;
    info!("{} structures with a catalytic state", records.len());

    let tolerances = PairTolerances {
        length: args.length_tolerance,
        angle: args.angle_tolerance,
        resolution: args.resolution_tolerance,
    };
    let comparisons = compare_states(&records, &tolerances);
    let report = pair_report(&comparisons);

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&args.output, &report)?;
    print!("{report}");
    info!("Report saved to {}", args.output.display());
    Ok(())
}
