use clap::Parser;
use proteasekit::alignment::{ca_rmsd, rmsd_report, rmsd_report_name, DEFAULT_CHAIN};
use proteasekit::{load_and_report, Result};
use std::path::PathBuf;
use tracing::{info, trace};

#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub(crate) struct Args {
    /// First structure (PDB or mmCIF)
    #[arg(long = "pdb1")]
    pdb1: PathBuf,

    /// Chain of the first structure
    #[arg(long = "chain1", default_value_t = String::from(DEFAULT_CHAIN))]
    chain1: String,

    /// Second structure (PDB or mmCIF)
    #[arg(long = "pdb2")]
    pdb2: PathBuf,

    /// Chain of the second structure
    #[arg(long = "chain2", default_value_t = String::from(DEFAULT_CHAIN))]
    chain2: String,

    /// Directory the report is written to
    #[arg(short, long, default_value = ".")]
    output: PathBuf,
}

pub(crate) fn run(args: &Args) -> Result<()> {
    trace!("{args:?}");

    let pdb1 = load_and_report(&args.pdb1)?;
    let pdb2 = load_and_report(&args.pdb2)?;
    let superposition = ca_rmsd(&pdb1, &args.chain1, &pdb2, &args.chain2)?;
    info!(
        "Alpha Carbon RMSD: {:.3} Å over {} atoms",
        superposition.rmsd, superposition.n_atoms
    );

    std::fs::create_dir_all(&args.output)?;
    let report_path = args.output.join(rmsd_report_name(
        &args.pdb1,
        &args.chain1,
        &args.pdb2,
        &args.chain2,
    ));
    let report = rmsd_report(
        &args.pdb1,
        &args.chain1,
        &args.pdb2,
        &args.chain2,
        &superposition,
    );
    std::fs::write(&report_path, &report)?;
    print!("{report}");
    info!("Report saved to {}", report_path.display());
    Ok(())
}
