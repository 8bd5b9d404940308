mod cli;

use clap::{Parser, Subcommand};
use tracing::{error, trace};
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity of the program:
    /// -v for info, -vv for debug, and -vvv for trace
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Turn off all logging
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Alpha-carbon RMSD between two chains after superposition
    Rmsd(cli::rmsd::Args),

    /// Alpha-carbon RMSD for every structure pair of a list
    BatchRmsd(cli::batch_rmsd::Args),

    /// Strip plot of RMSD values per category
    RmsdPlot(cli::rmsd_plot::Args),

    /// Per-residue B-factors averaged over the models of an ensemble
    Bfactor(cli::bfactor::Args),

    /// Compare CA B-factor traces of several structures
    BfactorCompare(cli::bfactor_compare::Args),

    /// Minimum distance from a target residue to every other residue
    Distances(cli::distances::Args),

    /// Survey the active site of a directory of structures
    CloseResidues(cli::close_residues::Args),

    /// Find the chain holding a residue in every structure of a directory
    FindChain(cli::find_chain::Args),

    /// Rename chains of a structure
    RenameChains(cli::rename_chains::Args),

    /// Residue co-occurrence network over a directory of structures
    Cooccurrence(cli::cooccurrence::Args),

    /// Find comparable structure pairs across catalytic states
    FindPairs(cli::find_pairs::Args),

    /// Order parameter differences of structure pairs
    OpCompare(cli::op_compare::Args),

    /// Heatmap of order parameter differences of structure pairs
    OpHeatmap(cli::op_heatmap::Args),

    /// Histogram and summary statistics of a table column
    Histogram(cli::histogram::Args),

    /// Add a SIGFOBS column to exported reflection tables
    AddSigma(cli::add_sigma::Args),
}

fn setup_logging(verbosity: u8, quiet: bool) {
    let level_filter = if quiet {
        LevelFilter::OFF
    } else {
        match verbosity {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    tracing_subscriber::registry()
        .with(level_filter)
        .with(stderr_layer)
        .init();
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            std::process::exit(if e.use_stderr() { 1 } else { 0 });
        }
    };
    setup_logging(cli.verbose, cli.quiet);
    trace!("{cli:?}");

    let result = match &cli.command {
        Commands::Rmsd(args) => cli::rmsd::run(args),
        Commands::BatchRmsd(args) => cli::batch_rmsd::run(args),
        Commands::RmsdPlot(args) => cli::rmsd_plot::run(args),
        Commands::Bfactor(args) => cli::bfactor::run(args),
        Commands::BfactorCompare(args) => cli::bfactor_compare::run(args),
        Commands::Distances(args) => cli::distances::run(args),
        Commands::CloseResidues(args) => cli::close_residues::run(args),
        Commands::FindChain(args) => cli::find_chain::run(args),
        Commands::RenameChains(args) => cli::rename_chains::run(args),
        Commands::Cooccurrence(args) => cli::cooccurrence::run(args),
        Commands::FindPairs(args) => cli::find_pairs::run(args),
        Commands::OpCompare(args) => cli::op_compare::run(args),
        Commands::OpHeatmap(args) => cli::op_heatmap::run(args),
        Commands::Histogram(args) => cli::histogram::run(args),
        Commands::AddSigma(args) => cli::add_sigma::run(args),
    };

    if let Err(e) = result {
        error!("{e}");
        if cli.quiet {
            eprintln!("Error: {e}");
        }
        std::process::exit(1);
    }
}
