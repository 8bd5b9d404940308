use clap::Parser;
use proteasekit::cooccurrence::count_cooccurrence;
use proteasekit::plots::network_plot;
use proteasekit::proximity::DEFAULT_CONTACT_THRESHOLD;
use proteasekit::{
    list_files_with_extension, load_and_report, run_with_threads, write_df_to_file, AnalysisError,
    DataFrameFileType, Result,
};
use std::path::PathBuf;
use tracing::{debug, info, trace, warn};

#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub(crate) struct Args {
    /// Directory of `.pdb` files
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Maximum number of structures to read, in file name order
    #[arg(short, long)]
    limit: Option<usize>,

    /// Residues whose heavy atoms come this close (Å) are in contact
    #[arg(short, long, default_value_t = DEFAULT_CONTACT_THRESHOLD)]
    dist_cutoff: f64,

    /// Name of the output files
    #[arg(short = 'f', long = "filename", default_value_t = String::from("cooccurrence_network"))]
    filename: String,

    /// Output file type
    #[arg(short = 't', long, default_value_t = DataFrameFileType::Csv)]
    output_format: DataFrameFileType,

    /// Number of threads to use for parallel processing
    #[arg(short = 'j', long = "num-threads", default_value_t = 1)]
    num_threads: usize,
}

pub(crate) fn run(args: &Args) -> Result<()> {
    trace!("{args:?}");

    let mut files = list_files_with_extension(&args.input, "pdb")?;
    if let Some(limit) = args.limit {
        files.truncate(limit);
    }
    let structures: Vec<_> = files
        .iter()
        .filter_map(|file| match load_and_report(file) {
            Ok(pdb) => Some(pdb),
            Err(e) => {
                warn!("Skipping {}: {e}", file.display());
                None
            }
        })
        .collect();
    if structures.is_empty() {
        return Err(AnalysisError::EmptySelection(format!(
            "no readable structures in {}",
            args.input.display()
        )));
    }
    info!("Loaded {} structures", structures.len());

    let counts = run_with_threads(args.num_threads, || {
        count_cooccurrence(structures.iter(), args.dist_cutoff)
    })??;

    let mut df = counts.to_df()?;
    debug!("{df}");
    let table_path = args
        .output
        .join(format!("{}.{}", args.filename, args.output_format));
    write_df_to_file(&mut df, &table_path, args.output_format)?;
    info!("Edges saved to {}", table_path.display());

    let plot_path = args.output.join(format!("{}.png", args.filename));
    network_plot(
        &plot_path,
        &counts.labelled_edges(),
        "Residue co-occurrence network",
    )?;
    info!("Network saved to {}", plot_path.display());
    Ok(())
}
