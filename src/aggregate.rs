use std::collections::{BTreeMap, BTreeSet};

use chrono::Datelike;
use tracing::{debug, info};

use crate::error::AnalysisError;
use crate::models::{
    AdmissionRecord, BloodDiagnosisMatrix, BloodTypeShare, BoxSummary, DiagnosisStats,
    GlobalStats, GroupStats, HistogramBin, MatrixCell, RankedDiagnoses, ResultBundle, Table,
};
use crate::stats::{self, round2};

pub const DEFAULT_TOP_DIAGNOSES: usize = 10;
pub const DEFAULT_HISTOGRAM_BINS: usize = 20;
pub const DEFAULT_BOX_PLOT_DIAGNOSES: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisConfig {
    pub top_diagnoses: usize,
    pub histogram_bins: usize,
    pub box_plot_diagnoses: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_diagnoses: DEFAULT_TOP_DIAGNOSES,
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
            box_plot_diagnoses: DEFAULT_BOX_PLOT_DIAGNOSES,
        }
    }
}

/// Stay summaries keyed by blood type.
pub type StayBoxes = BTreeMap<String, BoxSummary>;

pub fn summarize(table: &Table) -> Result<ResultBundle, AnalysisError> {
    summarize_with(table, &AnalysisConfig::default())
}

pub fn summarize_with(
    table: &Table,
    config: &AnalysisConfig,
) -> Result<ResultBundle, AnalysisError> {
    if table.is_empty() {
        return Err(AnalysisError::EmptyDataset);
    }

    let global = global_stats(table)?;
    let bundle = ResultBundle {
        global,
        blood_type_stats: blood_type_stats(table),
        diagnosis_stats: diagnosis_stats(table, config.top_diagnoses),
        blood_diagnosis_matrix: blood_diagnosis_matrix(table),
        monthly_trend: monthly_trend(table),
    };

    info!(
        patients = bundle.global.total_patients,
        blood_types = bundle.blood_type_stats.len(),
        months = bundle.monthly_trend.len(),
        "summarized admissions"
    );
    Ok(bundle)
}

pub fn global_stats(table: &Table) -> Result<GlobalStats, AnalysisError> {
    let stays = table.stays();
    let (Some(avg), Some(median), Some(&min), Some(&max)) = (
        stats::mean(&stays),
        stats::median(&stays),
        stays.iter().min(),
        stays.iter().max(),
    ) else {
        return Err(AnalysisError::EmptyDataset);
    };

    Ok(GlobalStats {
        total_patients: stays.len(),
        avg_stay: round2(avg),
        median_stay: round2(median),
        min_stay: min,
        max_stay: max,
    })
}

pub fn blood_type_stats(table: &Table) -> BTreeMap<String, GroupStats> {
    group_stays(table, |record| record.blood_type.as_str())
        .into_iter()
        .filter_map(|(blood_type, stays)| {
            Some((
                blood_type.to_string(),
                GroupStats {
                    mean: round2(stats::mean(&stays)?),
                    median: round2(stats::median(&stays)?),
                    count: stays.len(),
                },
            ))
        })
        .collect()
}

/// Diagnoses ranked by admission count, keeping the first `limit`.
///
/// Equal counts are ordered by diagnosis name so the cut is deterministic.
pub fn diagnosis_stats(table: &Table, limit: usize) -> RankedDiagnoses {
    let mut ranked: Vec<(String, DiagnosisStats)> =
        group_stays(table, |record| record.diagnosis.as_str())
            .into_iter()
            .filter_map(|(diagnosis, stays)| {
                Some((
                    diagnosis.to_string(),
                    DiagnosisStats {
                        mean: round2(stats::mean(&stays)?),
                        count: stays.len(),
                    },
                ))
            })
            .collect();

    ranked.sort_by(|a, b| b.1.count.cmp(&a.1.count).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(limit);
    debug!(kept = ranked.len(), "ranked diagnoses");
    RankedDiagnoses(ranked)
}

/// Mean stay for every blood type and diagnosis pair.
///
/// Every row carries a cell for every observed diagnosis; pairs without
/// admissions hold `MatrixCell::NoData`.
pub fn blood_diagnosis_matrix(table: &Table) -> BloodDiagnosisMatrix {
    let diagnoses: BTreeSet<&str> = table
        .records
        .iter()
        .map(|record| record.diagnosis.as_str())
        .collect();

    let mut pairs: BTreeMap<(&str, &str), Vec<i64>> = BTreeMap::new();
    for record in &table.records {
        pairs
            .entry((record.blood_type.as_str(), record.diagnosis.as_str()))
            .or_default()
            .push(record.length_of_stay);
    }

    let blood_types: BTreeSet<&str> = pairs.keys().map(|(blood_type, _)| *blood_type).collect();

    blood_types
        .into_iter()
        .map(|blood_type| {
            let row = diagnoses
                .iter()
                .map(|diagnosis| {
                    let cell = pairs
                        .get(&(blood_type, *diagnosis))
                        .and_then(|stays| stats::mean(stays))
                        .map(|mean| MatrixCell::Mean(round2(mean)))
                        .unwrap_or(MatrixCell::NoData);
                    (diagnosis.to_string(), cell)
                })
                .collect();
            (blood_type.to_string(), row)
        })
        .collect()
}

/// Admission counts per calendar month, keyed `YYYY-MM`.
pub fn monthly_trend(table: &Table) -> BTreeMap<String, usize> {
    let mut trend = BTreeMap::new();
    for record in &table.records {
        let date = record.admission_date.date();
        *trend
            .entry(format!("{:04}-{:02}", date.year(), date.month()))
            .or_insert(0) += 1;
    }
    trend
}

pub fn stay_histogram(table: &Table, bins: usize) -> Vec<HistogramBin> {
    stats::histogram(&table.stays(), bins)
}

pub fn stay_boxes_by_blood_type(table: &Table) -> StayBoxes {
    group_stays(table, |record| record.blood_type.as_str())
        .into_iter()
        .filter_map(|(blood_type, stays)| {
            Some((blood_type.to_string(), stats::box_summary(&stays)?))
        })
        .collect()
}

/// Stay summaries per blood type for the `limit` most frequent diagnoses.
///
/// Diagnoses follow the same ranking as [`diagnosis_stats`].
pub fn stay_boxes_by_top_diagnosis(table: &Table, limit: usize) -> Vec<(String, StayBoxes)> {
    diagnosis_stats(table, limit)
        .iter()
        .map(|(diagnosis, _)| {
            let mut by_blood_type: BTreeMap<&str, Vec<i64>> = BTreeMap::new();
            for record in table.records.iter().filter(|r| r.diagnosis == diagnosis) {
                by_blood_type
                    .entry(record.blood_type.as_str())
                    .or_default()
                    .push(record.length_of_stay);
            }
            let boxes = by_blood_type
                .into_iter()
                .filter_map(|(blood_type, stays)| {
                    Some((blood_type.to_string(), stats::box_summary(&stays)?))
                })
                .collect();
            (diagnosis.to_string(), boxes)
        })
        .collect()
}

/// Share of admissions per blood type, as whole-table percentages.
pub fn blood_type_share(bundle: &ResultBundle) -> Vec<BloodTypeShare> {
    let total = bundle.global.total_patients;
    bundle
        .blood_type_stats
        .iter()
        .map(|(blood_type, group)| BloodTypeShare {
            blood_type: blood_type.clone(),
            count: group.count,
            percent: if total == 0 {
                0.0
            } else {
                round2(group.count as f64 * 100.0 / total as f64)
            },
        })
        .collect()
}

fn group_stays<'a, F>(table: &'a Table, key: F) -> BTreeMap<&'a str, Vec<i64>>
where
    F: Fn(&'a AdmissionRecord) -> &'a str,
{
    let mut groups: BTreeMap<&str, Vec<i64>> = BTreeMap::new();
    for record in &table.records {
        groups.entry(key(record)).or_default().push(record.length_of_stay);
    }
    groups
}
