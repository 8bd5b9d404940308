//! Summary statistics, histograms and kernel density estimates of table columns.

use crate::error::{AnalysisError, Result};
use crate::utils::{f64_values, require_columns};
use polars::prelude::*;
use std::f64::consts::PI;
use std::path::Path;

/// Numeric values of a column. Entries that are missing or not numbers are dropped.
pub fn numeric_column(df: &DataFrame, name: &str, path: &Path) -> Result<Vec<f64>> {
    require_columns(df, &[name], path)?;
    Ok(f64_values(df, name)?
        .into_iter()
        .flatten()
        .filter(|v| !v.is_nan())
        .collect())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    /// Sample standard deviation (n - 1 denominator), NaN for a single value
    pub std: f64,
}

impl Summary {
    /// Summarize a set of values, `None` if there are none.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len();
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let mean = values.iter().sum::<f64>() / n as f64;
        let median = if n % 2 == 1 {
            sorted[n / 2]
        } else {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        };
        let std = if n > 1 {
            (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64).sqrt()
        } else {
            f64::NAN
        };

        Some(Self {
            count: n,
            mean,
            median,
            min: sorted[0],
            max: sorted[n - 1],
            std,
        })
    }

    /// Multi-line text block shown next to a histogram.
    pub fn text(&self, precision: usize, unit: &str) -> String {
        let unit = if unit.is_empty() {
            String::new()
        } else {
            format!(" {unit}")
        };
        format!(
            "Dataset Summary:\nTotal entries: {}\nMean: {:.p$}{unit}\nMedian: {:.p$}{unit}\nMin: {:.p$}{unit}\nMax: {:.p$}{unit}\nStd Dev: {:.p$}{unit}",
            self.count,
            self.mean,
            self.median,
            self.min,
            self.max,
            self.std,
            p = precision
        )
    }
}

/// Equal-width histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// `counts.len() + 1` bin edges
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

/// Count values into `bins` equal-width bins over `range`, or over the data range if `None`.
///
/// Bins are half-open except the last one, which includes its upper edge. Values
/// outside the range are ignored. A degenerate range is widened by 0.5 on each side.
pub fn histogram(values: &[f64], bins: usize, range: Option<(f64, f64)>) -> Result<Histogram> {
    if bins == 0 {
        return Err(AnalysisError::Argument(
            "number of bins must be positive".into(),
        ));
    }
    let (mut lo, mut hi) = match range {
        Some(r) => r,
        None => values
            .iter()
            .fold(None, |acc: Option<(f64, f64)>, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
            .unwrap_or((0.0, 1.0)),
    };
    if !(lo.is_finite() && hi.is_finite()) || lo > hi {
        return Err(AnalysisError::Argument(format!(
            "invalid histogram range ({lo}, {hi})"
        )));
    }
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    let width = (hi - lo) / bins as f64;
    let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();
    let mut counts = vec![0; bins];
    for &v in values.iter().filter(|v| **v >= lo && **v <= hi) {
        let index = (((v - lo) / width) as usize).min(bins - 1);
        counts[index] += 1;
    }
    Ok(Histogram { edges, counts })
}

/// Gaussian kernel density estimate with Scott's bandwidth.
#[derive(Debug, Clone, PartialEq)]
pub struct Kde {
    pub values: Vec<f64>,
    pub bandwidth: f64,
}

impl Kde {
    /// `None` with fewer than two values or no spread, where no bandwidth can be derived.
    pub fn new(values: &[f64]) -> Option<Self> {
        let summary = Summary::from_values(values)?;
        if summary.count < 2 || summary.std == 0.0 {
            return None;
        }
        let bandwidth = summary.std * (summary.count as f64).powf(-0.2);
        Some(Self {
            values: values.to_vec(),
            bandwidth,
        })
    }

    pub fn density(&self, x: f64) -> f64 {
        let norm = 1.0 / (self.values.len() as f64 * self.bandwidth * (2.0 * PI).sqrt());
        norm * self
            .values
            .iter()
            .map(|v| (-0.5 * ((x - v) / self.bandwidth).powi(2)).exp())
            .sum::<f64>()
    }

    /// Density sampled on `points` evenly spaced positions, extending `cut` bandwidths past the data.
    pub fn curve(&self, points: usize, cut: f64) -> Vec<(f64, f64)> {
        let min = self.values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = self.values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let lo = min - cut * self.bandwidth;
        let hi = max + cut * self.bandwidth;
        let step = (hi - lo) / (points.max(2) - 1) as f64;
        (0..points.max(2))
            .map(|i| {
                let x = lo + step * i as f64;
                (x, self.density(x))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_of_small_sample() {
        let s = Summary::from_values(&[0.20, 0.18, 0.25, 0.21]).unwrap();
        assert_eq!(s.count, 4);
        assert!((s.mean - 0.21).abs() < 1e-12);
        assert!((s.median - 0.205).abs() < 1e-12);
        assert_eq!(s.min, 0.18);
        assert_eq!(s.max, 0.25);
        // Sample variance: (0.0001 + 0.0009 + 0.0016 + 0) / 3
        assert!((s.std - (0.0026f64 / 3.0).sqrt()).abs() < 1e-12);

        assert!(Summary::from_values(&[]).is_none());
        assert!(Summary::from_values(&[1.0]).unwrap().std.is_nan());
    }

    #[test]
    fn summary_text_uses_precision() {
        let s = Summary::from_values(&[1.0, 2.0, 3.0]).unwrap();
        let text = s.text(2, "Å");
        assert!(text.starts_with("Dataset Summary:\nTotal entries: 3\nMean: 2.00 Å\n"));
        assert!(text.ends_with("Std Dev: 1.00 Å"));
    }

    #[test]
    fn non_numeric_entries_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.csv");
        std::fs::write(&path, "PDB ID,R_free\n1AAA,0.21\n2BBB,n/a\n3CCC,\n4DDD,0.19\n").unwrap();
        let df = crate::utils::read_csv(&path).unwrap();
        assert_eq!(numeric_column(&df, "R_free", &path).unwrap(), vec![0.21, 0.19]);
        assert!(matches!(
            numeric_column(&df, "Resolution", &path),
            Err(AnalysisError::MissingColumn { .. })
        ));
    }

    #[test]
    fn histogram_with_explicit_range() {
        let values = [0.10, 0.14, 0.15, 0.20, 0.26, 0.30];
        let h = histogram(&values, 3, Some((0.14, 0.26))).unwrap();
        assert_eq!(h.edges.len(), 4);
        // Out-of-range values are ignored and the upper edge is inclusive
        assert_eq!(h.counts, vec![2, 1, 1]);
        assert_eq!(h.counts.iter().sum::<usize>(), 4);
    }

    #[test]
    fn histogram_over_data_range() {
        let h = histogram(&[1.0, 2.0, 2.5, 4.0], 3, None).unwrap();
        assert_eq!(h.edges, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(h.counts, vec![1, 2, 1]);

        let flat = histogram(&[2.0, 2.0], 2, None).unwrap();
        assert_eq!(flat.edges, vec![1.5, 2.0, 2.5]);
        assert_eq!(flat.counts, vec![0, 2]);

        assert!(histogram(&[1.0], 0, None).is_err());
        assert!(histogram(&[1.0], 3, Some((2.0, 1.0))).is_err());
    }

    #[test]
    fn kde_integrates_to_one() {
        let kde = Kde::new(&[-0.1, 0.0, 0.05, 0.2, 0.15]).unwrap();
        let curve = kde.curve(400, 3.0);
        let step = curve[1].0 - curve[0].0;
        let area: f64 = curve.iter().map(|(_, y)| y * step).sum();
        assert!((area - 1.0).abs() < 1e-2, "area {area}");

        assert!(Kde::new(&[0.1]).is_none());
        assert!(Kde::new(&[0.1, 0.1]).is_none());
    }
}
