use crate::models::{BoxSummary, HistogramBin};

/// Rounds to two decimals, ties to even.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

pub fn mean(values: &[i64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let total: i64 = values.iter().sum();
    Some(total as f64 / values.len() as f64)
}

/// Middle value of the sorted input; even counts average the two middle values.
pub fn median(values: &[i64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) as f64 / 2.0)
    } else {
        Some(sorted[mid] as f64)
    }
}

/// Quantile `p` of sorted values, interpolating linearly between ranks.
pub fn quantile(sorted: &[i64], p: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let rank = p.clamp(0.0, 1.0) * last as f64;
    let below = rank.floor() as usize;
    let above = rank.ceil() as usize;
    let fraction = rank - below as f64;
    Some(sorted[below] as f64 + (sorted[above] - sorted[below]) as f64 * fraction)
}

pub fn box_summary(values: &[i64]) -> Option<BoxSummary> {
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    Some(BoxSummary {
        count: sorted.len(),
        min: *sorted.first()?,
        q1: round2(quantile(&sorted, 0.25)?),
        median: round2(quantile(&sorted, 0.5)?),
        q3: round2(quantile(&sorted, 0.75)?),
        max: *sorted.last()?,
    })
}

pub fn histogram(values: &[i64], bins: usize) -> Vec<HistogramBin> {
    let (Some(&min), Some(&max)) = (values.iter().min(), values.iter().max()) else {
        return Vec::new();
    };
    let bins = bins.max(1);

    if min == max {
        return vec![HistogramBin {
            lower: min as f64,
            upper: max as f64,
            count: values.len(),
        }];
    }

    let lower = min as f64;
    let range = max - min;
    let width = range as f64 / bins as f64;
    let mut output: Vec<HistogramBin> = (0..bins)
        .map(|index| HistogramBin {
            lower: lower + width * index as f64,
            upper: lower + width * (index + 1) as f64,
            count: 0,
        })
        .collect();

    // Integer arithmetic so values on a bin edge open the upper bin.
    for value in values {
        let index = ((*value - min) as i128 * bins as i128 / range as i128) as usize;
        output[index.min(bins - 1)].count += 1;
    }

    output
}
