use clap::Parser;
use proteasekit::reflections::{
    process_directory, process_table, SigmaOutcome, DEFAULT_OUTPUT_SUFFIX, SIGFOBS,
};
use proteasekit::Result;
use std::path::PathBuf;
use tracing::{info, trace, warn};

#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub(crate) struct Args {
    /// Reflection table exported to CSV, or a directory of them
    #[arg(short, long)]
    input: PathBuf,

    /// Suffix appended to the file name of processed tables
    #[arg(short, long, default_value_t = String::from(DEFAULT_OUTPUT_SUFFIX))]
    suffix: String,
}

pub(crate) fn run(args: &Args) -> Result<()> {
    trace!("{args:?}");

    if args.input.is_dir() {
        let written = process_directory(&args.input, &args.suffix)?;
        info!("Processed {} tables", written.len());
        return Ok(());
    }
    match process_table(&args.input, &args.suffix)? {
        SigmaOutcome::Written(path) => info!("Generated {}", path.display()),
        SigmaOutcome::AlreadyPresent => warn!(
            "{} already contains a {SIGFOBS} column, skipping",
            args.input.display()
        ),
    }
    Ok(())
}
