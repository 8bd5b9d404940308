use clap::Parser;
use proteasekit::bfactor::{ca_bfactor_profiles, profiles_to_df};
use proteasekit::plots::line_plot;
use proteasekit::{
    file_stem, load_and_report, write_df_to_file, AnalysisError, DataFrameFileType, Result,
};
use std::path::PathBuf;
use tracing::{debug, info, trace};

#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub(crate) struct Args {
    /// Structures to compare
    #[arg(short, long, num_args = 1.., required = true)]
    input: Vec<PathBuf>,

    /// Legend labels, one per structure; defaults to the file names
    #[arg(short, long, num_args = 1..)]
    labels: Vec<String>,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Name of the output files
    #[arg(short = 'f', long = "filename", default_value_t = String::from("bfactor_comparison"))]
    filename: String,

    /// Output file type
    #[arg(short = 't', long, default_value_t = DataFrameFileType::Csv)]
    output_format: DataFrameFileType,
}

pub(crate) fn run(args: &Args) -> Result<()> {
    trace!("{args:?}");

    if !args.labels.is_empty() && args.labels.len() != args.input.len() {
        return Err(AnalysisError::Argument(format!(
            "{} labels given for {} structures",
            args.labels.len(),
            args.input.len()
        )));
    }

    let structures = args
        .input
        .iter()
        .map(|path| load_and_report(path))
        .collect::<Result<Vec<_>>>()?;
    let labelled: Vec<(String, &pdbtbx::PDB)> = structures
        .iter()
        .enumerate()
        .map(|(i, pdb)| {
            let label = args
                .labels
                .get(i)
                .cloned()
                .unwrap_or_else(|| file_stem(&args.input[i]));
            (label, pdb)
        })
        .collect();

    let profiles = ca_bfactor_profiles(&labelled)?;
    debug!(
        "Comparing {} CA atoms per structure",
        profiles.first().map_or(0, |p| p.values.len())
    );

    let mut df = profiles_to_df(&profiles)?;
    let table_path = args
        .output
        .join(format!("{}.{}", args.filename, args.output_format));
    write_df_to_file(&mut df, &table_path, args.output_format)?;
    info!("Profiles saved to {}", table_path.display());

    let series: Vec<(String, Vec<(f64, f64)>)> = profiles
        .iter()
        .map(|p| {
            let points = p
                .values
                .iter()
                .enumerate()
                .map(|(i, b)| ((i + 1) as f64, *b))
                .collect();
            (p.label.to_owned(), points)
        })
        .collect();
    let plot_path = args.output.join(format!("{}.png", args.filename));
    line_plot(
        &plot_path,
        &series,
        "CA B-factor comparison",
        "CA atom index",
        "B-factor (Å²)",
    )?;
    info!("Plot saved to {}", plot_path.display());
    Ok(())
}
