use clap::Parser;
use proteasekit::bfactor::{bfactors_to_df, ensemble_bfactors};
use proteasekit::plots::line_plot;
use proteasekit::{file_stem, load_and_report, write_df_to_file, DataFrameFileType, Result};
use std::path::PathBuf;
use tracing::{debug, info, trace};

#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub(crate) struct Args {
    /// Multi-model structure of the ensemble
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Chains left out of the averages, e.g. `S,W`
    #[arg(short, long, value_delimiter = ',')]
    exclude_chains: Vec<String>,

    /// Output file type
    #[arg(short = 't', long, default_value_t = DataFrameFileType::Csv)]
    output_format: DataFrameFileType,
}

pub(crate) fn run(args: &Args) -> Result<()> {
    trace!("{args:?}");

    let pdb = load_and_report(&args.input)?;
    info!("Loaded ensemble of {} models", pdb.model_count());

    let rows = ensemble_bfactors(&pdb, &args.exclude_chains);
    let mut df = bfactors_to_df(&rows)?;
    debug!("{df}");

    let stem = file_stem(&args.input);
    let table_path = args
        .output
        .join(format!("{stem}_bfactors.{}", args.output_format));
    write_df_to_file(&mut df, &table_path, args.output_format)?;
    info!("B-factors saved to {}", table_path.display());

    let mut series: Vec<(String, Vec<(f64, f64)>)> = Vec::new();
    for row in &rows {
        let point = (row.key.resi as f64, row.bfactor);
        match series.iter_mut().find(|(chain, _)| *chain == row.key.chain) {
            Some((_, points)) => points.push(point),
            None => series.push((row.key.chain.to_owned(), vec![point])),
        }
    }
    let plot_path = args.output.join(format!("{stem}_bfactors.png"));
    line_plot(
        &plot_path,
        &series,
        &format!("Ensemble B-factors of {stem}"),
        "Residue number",
        "B-factor (Å²)",
    )?;
    info!("Plot saved to {}", plot_path.display());
    Ok(())
}
