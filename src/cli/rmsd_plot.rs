use clap::Parser;
use proteasekit::plots::strip_plot;
use proteasekit::utils::{f64_values, str_values};
use proteasekit::{read_table, AnalysisError, Result};
use std::path::PathBuf;
use tracing::{debug, info, trace};

#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub(crate) struct Args {
    /// CSV table with one row per comparison
    #[arg(short, long)]
    input: PathBuf,

    /// Column holding the category of each row; empty cells continue the previous category
    #[arg(long, default_value_t = String::from("Category"))]
    category_column: String,

    /// Column holding the plotted values
    #[arg(long, default_value_t = String::from("RMSD"))]
    value_column: String,

    /// Output image
    #[arg(short, long, default_value = "rmsd_plot.png")]
    output: PathBuf,

    /// Plot title
    #[arg(long, default_value_t = String::from("Alpha Carbon RMSD"))]
    title: String,

    /// Lower limit of the y axis
    #[arg(long, requires = "y_max")]
    y_min: Option<f64>,

    /// Upper limit of the y axis
    #[arg(long, requires = "y_min")]
    y_max: Option<f64>,
}

pub(crate) fn run(args: &Args) -> Result<()> {
    trace!("{args:?}");

    let df = read_table(
        &args.input,
        &[args.category_column.as_str(), args.value_column.as_str()],
    )?;
    let categories = str_values(&df, &args.category_column)?;
    let values = f64_values(&df, &args.value_column)?;

    // Forward-fill the categories, keeping the first-appearance order
    let mut groups: Vec<(String, Vec<f64>)> = Vec::new();
    let mut current: Option<String> = None;
    for (category, value) in categories.into_iter().zip(values) {
        if let Some(c) = category.filter(|c| !c.is_empty()) {
            current = Some(c);
        }
        let (Some(category), Some(value)) = (current.as_ref(), value) else {
            continue;
        };
        match groups.iter_mut().find(|(name, _)| name == category) {
            Some((_, group)) => group.push(value),
            None => groups.push((category.to_owned(), vec![value])),
        }
    }
    if groups.is_empty() {
        return Err(AnalysisError::EmptySelection(format!(
            "no values in column '{}'",
            args.value_column
        )));
    }
    debug!("{} categories", groups.len());

    let y_range = args.y_min.zip(args.y_max);
    strip_plot(&args.output, &groups, &args.title, "RMSD (Å)", y_range)?;
    info!("Plot saved to {}", args.output.display());
    Ok(())
}
