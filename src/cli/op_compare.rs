use clap::Parser;
use proteasekit::order_parameters::{
    compare_pairs, differences_by_category, pooled_differences, read_pairs, DistanceTable,
    ResidueCategory, CATALYTIC_RESIDUES,
};
use proteasekit::plots::density_plot;
use proteasekit::statistics::Kde;
use proteasekit::{read_csv, write_df_to_file, AnalysisError, DataFrameFileType, Result};
use std::path::PathBuf;
use tracing::{debug, info, trace, warn};

/// Density curves sampled per category.
const KDE_POINTS: usize = 200;
/// Bandwidths the curves extend past the data.
const KDE_CUT: f64 = 3.0;

#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub(crate) struct Args {
    /// Table of structure pairs
    #[arg(short, long)]
    pairs: PathBuf,

    /// Column of the first structure of each pair
    #[arg(long, default_value_t = String::from("GSA"))]
    column1: String,

    /// Column of the second structure of each pair
    #[arg(long, default_value_t = String::from("TSA"))]
    column2: String,

    /// Directory of `<ID>_OP.out` order parameter tables
    #[arg(long)]
    op_dir: PathBuf,

    /// Residue-to-ligand distances with columns `resi, distance`
    #[arg(short, long)]
    distances: PathBuf,

    /// Residue numbers counted as catalytic
    #[arg(short, long, value_delimiter = ',', default_values_t = CATALYTIC_RESIDUES)]
    catalytic: Vec<i64>,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    output: PathBuf,
}

pub(crate) fn run(args: &Args) -> Result<()> {
    trace!("{args:?}");

    let pairs = read_pairs(&args.pairs, &args.column1, &args.column2)?;
    let distance_df = read_csv(&args.distances)?;
    let distances = DistanceTable::from_df(&distance_df, &args.distances)?;
    info!("Comparing {} structure pairs", pairs.len());

    let merged = compare_pairs(
        &pairs,
        &args.op_dir,
        &distances,
        &args.catalytic,
        &args.output,
    );
    if merged.is_empty() {
        return Err(AnalysisError::EmptySelection(
            "no pair had order parameters for both structures".into(),
        ));
    }
    info!("Merged {} of {} pairs", merged.len(), pairs.len());
    let tables: Vec<_> = merged.into_iter().map(|m| m.table).collect();

    let mut pooled = pooled_differences(&tables)?;
    let pooled_path = args.output.join("pooled_s2calc_diff.csv");
    write_df_to_file(&mut pooled, &pooled_path, DataFrameFileType::Csv)?;
    info!("Pooled differences saved to {}", pooled_path.display());

    let groups = differences_by_category(&pooled)?;
    let mut curves = Vec::new();
    for category in [
        ResidueCategory::Catalytic,
        ResidueCategory::Binding,
        ResidueCategory::Distal,
    ] {
        let values = groups.get(&category).map(Vec::as_slice).unwrap_or(&[]);
        match Kde::new(values) {
            Some(kde) => {
                debug!("{category}: {} values, bandwidth {:.4}", values.len(), kde.bandwidth);
                curves.push((category.to_string(), kde.curve(KDE_POINTS, KDE_CUT)));
            }
            None => warn!("Not enough {category} values for a density estimate"),
        }
    }
    let plot_path = args.output.join("s2calc_diff_kde.png");
    density_plot(
        &plot_path,
        &curves,
        &format!("Δs2calc ({} - {})", args.column2, args.column1),
        "s2calc_diff",
    )?;
    info!("Density plot saved to {}", plot_path.display());
    Ok(())
}
