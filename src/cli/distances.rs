use clap::Parser;
use proteasekit::proximity::residue_distances_to_df;
use proteasekit::{
    file_stem, load_and_report, proximity, run_with_threads, write_df_to_file, DataFrameFileType,
    ResidueKey, Result,
};
use std::path::PathBuf;
use tracing::{debug, info, trace};

#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub(crate) struct Args {
    /// Path to the PDB or mmCIF file to be analyzed
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Chain of the target residue
    #[arg(short, long, default_value_t = String::from("A"))]
    chain: String,

    /// Residue number of the target residue
    #[arg(short, long, default_value_t = 195)]
    resi: isize,

    /// Output file type
    #[arg(short = 't', long, default_value_t = DataFrameFileType::Csv)]
    output_format: DataFrameFileType,

    /// Number of threads to use for parallel processing
    #[arg(short = 'j', long = "num-threads", default_value_t = 1)]
    num_threads: usize,
}

pub(crate) fn run(args: &Args) -> Result<()> {
    trace!("{args:?}");

    let pdb = load_and_report(&args.input)?;
    let target = ResidueKey::new(args.chain.as_str(), args.resi, "");
    let distances =
        run_with_threads(args.num_threads, || proximity::residue_distances(&pdb, &target))??;
    debug!("Distances from {target} to {} residues", distances.len());

    let mut df = residue_distances_to_df(&distances)?;
    let output_file = args.output.join(format!(
        "{}_all_distances.{}",
        file_stem(&args.input),
        args.output_format
    ));
    write_df_to_file(&mut df, &output_file, args.output_format)?;
    info!("Results saved to {}", output_file.display());
    Ok(())
}
