use clap::Parser;
use proteasekit::proximity::{DEFAULT_CONTACT_THRESHOLD, DEFAULT_OXYGEN_CUTOFF};
use proteasekit::survey::{read_chain_mapping, survey_structures, SurveyTarget};
use proteasekit::{list_files_with_extension, write_df_to_file, DataFrameFileType, Result};
use std::path::PathBuf;
use tracing::{info, trace};

#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub(crate) struct Args {
    /// Directory of `.pdb` files named by PDB ID
    #[arg(short, long)]
    input: PathBuf,

    /// Chain-mapping table with columns `PDB_ID, Chain_ID, Ligand`
    #[arg(short, long)]
    mapping: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Residue number of the target residue
    #[arg(short, long, default_value_t = 195)]
    resi: isize,

    /// Residue name of the target residue
    #[arg(long, default_value_t = String::from("SER"))]
    resn: String,

    /// Target atom of the residue
    #[arg(short, long, default_value_t = String::from("OG"))]
    atom: String,

    /// Distance cutoff for carbons near the target atom
    #[arg(short, long, default_value_t = DEFAULT_CONTACT_THRESHOLD)]
    dist_cutoff: f64,

    /// Distance cutoff for the oxygen bonded to the selected carbon
    #[arg(long, default_value_t = DEFAULT_OXYGEN_CUTOFF)]
    oxygen_cutoff: f64,
}

pub(crate) fn run(args: &Args) -> Result<()> {
    trace!("{args:?}");

    let mappings = read_chain_mapping(&args.mapping)?;
    let files = list_files_with_extension(&args.input, "pdb")?;
    info!(
        "Surveying {} structures with {} mapping entries",
        files.len(),
        mappings.len()
    );

    let target = SurveyTarget {
        resi: args.resi,
        resn: args.resn.to_owned(),
        atom_name: args.atom.to_owned(),
        threshold: args.dist_cutoff,
        oxygen_cutoff: args.oxygen_cutoff,
    };
    let results = survey_structures(&files, &mappings, &target);

    let partners_path = args.output.join("closest_carbons.csv");
    write_df_to_file(&mut results.partners_df()?, &partners_path, DataFrameFileType::Csv)?;
    info!(
        "{} closest carbons saved to {}",
        results.partners.len(),
        partners_path.display()
    );

    let ligands_path = args.output.join("ligand_distances.csv");
    write_df_to_file(&mut results.ligands_df()?, &ligands_path, DataFrameFileType::Csv)?;
    info!(
        "{} ligand distances saved to {}",
        results.ligands.len(),
        ligands_path.display()
    );
    Ok(())
}
