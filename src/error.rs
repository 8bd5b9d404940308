use polars::prelude::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("No atoms in selection: {0}")]
    EmptySelection(String),

    #[error("Chain {chain} not found or contains no CA atoms")]
    ChainNotFound { chain: String },

    #[error("Required column '{column}' not found in {}", .path.display())]
    MissingColumn { column: String, path: PathBuf },

    #[error("Failed to parse structure '{}': {message}", .path.display())]
    StructureParsing { path: PathBuf, message: String },

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error("Plotting error: {0}")]
    Plot(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

impl AnalysisError {
    /// Short name of the error kind, used when a batch item is skipped.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::EmptySelection(_) => "EmptySelection",
            AnalysisError::ChainNotFound { .. } => "ChainNotFound",
            AnalysisError::MissingColumn { .. } => "MissingColumn",
            AnalysisError::StructureParsing { .. } => "StructureParsing",
            AnalysisError::Argument(_) => "Argument",
            AnalysisError::Plot(_) => "Plot",
            AnalysisError::Io(_) => "Io",
            AnalysisError::Polars(_) => "Polars",
        }
    }
}

/// Convert any plotting backend error into an [`AnalysisError`].
pub(crate) fn plot_err<E: std::fmt::Display>(e: E) -> AnalysisError {
    AnalysisError::Plot(e.to_string())
}
