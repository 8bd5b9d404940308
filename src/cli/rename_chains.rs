use clap::Parser;
use proteasekit::chains::{parse_chain_mapping, rename_chains_in_file};
use proteasekit::Result;
use std::path::PathBuf;
use tracing::{trace, warn};

#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub(crate) struct Args {
    /// Structure to rename chains in
    #[arg(short, long)]
    input: PathBuf,

    /// Output structure
    #[arg(short, long)]
    output: PathBuf,

    /// Chain renames as OLD:NEW, e.g. `E:A,I:B`.
    /// New IDs are stored upper-cased, so `E:a` names the chain `A`
    #[arg(short, long, value_delimiter = ',', required = true)]
    mapping: Vec<String>,
}

pub(crate) fn run(args: &Args) -> Result<()> {
    trace!("{args:?}");

    let mapping = parse_chain_mapping(&args.mapping)?;
    let renamed = rename_chains_in_file(&args.input, &args.output, &mapping)?;
    if renamed == 0 {
        warn!("None of the chains {:?} were found", mapping.keys());
    }
    Ok(())
}
