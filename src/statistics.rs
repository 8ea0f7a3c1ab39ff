/// A simple statistics module with utility functions for the summary figures of a run.
use statrs::statistics::Statistics;

/// Arithmetic mean, or None when there are no numbers to average.
pub fn mean(numbers: &[f64]) -> Option<f64> {
    (!numbers.is_empty()).then(|| Statistics::mean(numbers.iter()))
}

pub fn min(numbers: &[f64]) -> Option<f64> {
    (!numbers.is_empty()).then(|| Statistics::min(numbers.iter()))
}

pub fn max(numbers: &[f64]) -> Option<f64> {
    (!numbers.is_empty()).then(|| Statistics::max(numbers.iter()))
}
