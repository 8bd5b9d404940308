use clap::Parser;
use proteasekit::chains::residue_chain_table;
use proteasekit::{list_files_with_extension, write_df_to_file, DataFrameFileType, Result};
use std::path::PathBuf;
use tracing::{debug, info, trace};

#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub(crate) struct Args {
    /// Directory of `.pdb` files
    #[arg(short, long)]
    input: PathBuf,

    /// Output table
    #[arg(short, long, default_value = "residue_chains.csv")]
    output: PathBuf,

    /// Residue number to look for
    #[arg(short, long, default_value_t = 195)]
    resi: isize,

    /// Residue name to look for
    #[arg(long, default_value_t = String::from("SER"))]
    resn: String,
}

pub(crate) fn run(args: &Args) -> Result<()> {
    trace!("{args:?}");

    let files = list_files_with_extension(&args.input, "pdb")?;
    info!("Searching {} structures for {} {}", files.len(), args.resn, args.resi);

    let mut df = residue_chain_table(&files, args.resi, &args.resn)?;
    debug!("{df}");
    write_df_to_file(&mut df, &args.output, DataFrameFileType::Csv)?;
    info!("Results saved to {}", args.output.display());
    Ok(())
}
