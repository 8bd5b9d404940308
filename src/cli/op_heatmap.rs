use clap::Parser;
use proteasekit::order_parameters::{pool_merged, read_merged_tables, read_pairs, HeatmapGrid};
use proteasekit::plots::heatmap_plot;
use proteasekit::{write_df_to_file, DataFrameFileType, Result};
use std::path::PathBuf;
use tracing::{debug, info, trace};

#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub(crate) struct Args {
    /// Table of structure pairs
    #[arg(short, long)]
    pairs: PathBuf,

    /// Column of the first structure of each pair
    #[arg(long, default_value_t = String::from("APO"))]
    column1: String,

    /// Column of the second structure of each pair
    #[arg(long, default_value_t = String::from("GSA"))]
    column2: String,

    /// Directory of the merged comparison tables
    #[arg(short, long)]
    merged_dir: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    output: PathBuf,
}

pub(crate) fn run(args: &Args) -> Result<()> {
    trace!("{args:?}");

    let pairs = read_pairs(&args.pairs, &args.column1, &args.column2)?;
    let tables = read_merged_tables(&pairs, &args.merged_dir);
    info!("Read {} of {} merged tables", tables.len(), pairs.len());

    let mut pooled = pool_merged(&tables)?;
    let pooled_path = args.output.join(format!(
        "pooled_s2calc_diff_{}_{}.csv",
        args.column1, args.column2
    ));
    write_df_to_file(&mut pooled, &pooled_path, DataFrameFileType::Csv)?;
    info!("Pooled table saved to {}", pooled_path.display());

    let grid = HeatmapGrid::from_pooled(&pooled)?;
    debug!(
        "Heatmap of {} pairs by {} residues, max |Δ| {:.3}",
        grid.rows.len(),
        grid.columns.len(),
        grid.max_abs()
    );
    let plot_path = args.output.join(format!(
        "s2calc_diff_heatmap_{}_{}.png",
        args.column1, args.column2
    ));
    heatmap_plot(
        &plot_path,
        &grid,
        &format!("Δs2calc ({} - {})", args.column2, args.column1),
    )?;
    info!("Heatmap saved to {}", plot_path.display());
    Ok(())
}
