use clap::Parser;
use proteasekit::alignment::{batch_pair_rmsds, pair_rmsds_to_df, parse_pair_list, DEFAULT_CHAIN};
use proteasekit::{write_df_to_file, DataFrameFileType, Result};
use std::path::PathBuf;
use tracing::{debug, info, trace};

#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub(crate) struct Args {
    /// Text file with two structure paths per line, separated by whitespace
    #[arg(short, long)]
    input: PathBuf,

    /// Output table
    #[arg(short, long, default_value = "rmsd_results.tsv")]
    output: PathBuf,

    /// Chain compared in both structures
    #[arg(short, long, default_value_t = String::from(DEFAULT_CHAIN))]
    chain: String,

    /// Output file type
    #[arg(short = 't', long, default_value_t = DataFrameFileType::Tsv)]
    output_format: DataFrameFileType,
}

pub(crate) fn run(args: &Args) -> Result<()> {
    trace!("{args:?}");

    let pairs = parse_pair_list(&std::fs::read_to_string(&args.input)?);
    info!("Read {} structure pairs", pairs.len());

    let rows = batch_pair_rmsds(&pairs, &args.chain);
    info!("Computed RMSD for {} of {} pairs", rows.len(), pairs.len());

    let mut df = pair_rmsds_to_df(&rows)?;
    debug!("{df}");
    write_df_to_file(&mut df, &args.output, args.output_format)?;
    info!("Results saved to {}", args.output.display());
    Ok(())
}
