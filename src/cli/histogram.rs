use clap::Parser;
use proteasekit::plots::histogram_plot;
use proteasekit::statistics::{histogram, numeric_column, Summary};
use proteasekit::{read_csv, AnalysisError, Result};
use std::path::PathBuf;
use tracing::{debug, info, trace};

#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub(crate) struct Args {
    /// CSV table
    #[arg(short, long)]
    input: PathBuf,

    /// Column to summarize
    #[arg(short, long)]
    column: String,

    /// Output image
    #[arg(short, long, default_value = "histogram.png")]
    output: PathBuf,

    /// Number of bins
    #[arg(short, long, default_value_t = 20)]
    bins: usize,

    /// Lower edge of the binned range
    #[arg(long, requires = "max")]
    min: Option<f64>,

    /// Upper edge of the binned range
    #[arg(long, requires = "min")]
    max: Option<f64>,

    /// Decimals shown in the summary
    #[arg(long, default_value_t = 2)]
    precision: usize,

    /// Unit appended to the summary values, e.g. `Å`
    #[arg(long, default_value_t = String::new())]
    unit: String,

    /// Plot title
    #[arg(long, default_value_t = String::from("Distribution"))]
    title: String,
}

pub(crate) fn run(args: &Args) -> Result<()> {
    trace!("{args:?}");

    let df = read_csv(&args.input)?;
    let values = numeric_column(&df, &args.column, &args.input)?;
    let summary = Summary::from_values(&values).ok_or_else(|| {
        AnalysisError::EmptySelection(format!("no numeric values in column '{}'", args.column))
    })?;
    let text = summary.text(args.precision, &args.unit);
    println!("{text}");

    let hist = histogram(&values, args.bins, args.min.zip(args.max))?;
    debug!("Bin counts: {:?}", hist.counts);
    histogram_plot(&args.output, &hist, Some(text.as_str()), &args.title, &args.column)?;
    info!("Histogram saved to {}", args.output.display());
    Ok(())
}
