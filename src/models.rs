use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Rows exactly as they came out of the file reader, before any validation.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based line in the source file; the header is line 1.
    pub line: u64,
    pub cells: Vec<String>,
}

impl RawRow {
    pub fn cell(&self, index: usize) -> &str {
        self.cells.get(index).map(String::as_str).unwrap_or("")
    }
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }
}

#[derive(Debug, Clone)]
pub struct AdmissionRecord {
    pub patient_id: String,
    pub blood_type: String,
    pub diagnosis: String,
    pub admission_date: NaiveDateTime,
    pub discharge_date: NaiveDateTime,
    pub length_of_stay: i64,
}

#[derive(Debug, Clone, Default)]
pub struct Table {
    pub records: Vec<AdmissionRecord>,
}

impl Table {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn stays(&self) -> Vec<i64> {
        self.records.iter().map(|record| record.length_of_stay).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStats {
    pub total_patients: usize,
    pub avg_stay: f64,
    pub median_stay: f64,
    pub min_stay: i64,
    pub max_stay: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStats {
    pub mean: f64,
    pub median: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosisStats {
    pub mean: f64,
    pub count: usize,
}

/// Ranked diagnoses, most frequent first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankedDiagnoses(pub Vec<(String, DiagnosisStats)>);

impl RankedDiagnoses {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DiagnosisStats)> {
        self.0.iter().map(|(name, stats)| (name.as_str(), stats))
    }
}

// Keeps the ranking order in the emitted JSON object.
impl Serialize for RankedDiagnoses {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (diagnosis, stats) in &self.0 {
            map.serialize_entry(diagnosis, stats)?;
        }
        map.end()
    }
}

/// One cell of the blood type by diagnosis pivot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatrixCell {
    Mean(f64),
    NoData,
}

pub const NO_DATA_MARKER: &str = "-";

impl std::fmt::Display for MatrixCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatrixCell::Mean(value) => write!(f, "{value:.2}"),
            MatrixCell::NoData => f.write_str(NO_DATA_MARKER),
        }
    }
}

impl Serialize for MatrixCell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MatrixCell::Mean(value) => serializer.serialize_f64(*value),
            MatrixCell::NoData => serializer.serialize_str(NO_DATA_MARKER),
        }
    }
}

pub type BloodDiagnosisMatrix = BTreeMap<String, BTreeMap<String, MatrixCell>>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultBundle {
    #[serde(flatten)]
    pub global: GlobalStats,
    pub blood_type_stats: BTreeMap<String, GroupStats>,
    pub diagnosis_stats: RankedDiagnoses,
    pub blood_diagnosis_matrix: BloodDiagnosisMatrix,
    pub monthly_trend: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Five-number summary of a group of stays, quartiles interpolated linearly.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxSummary {
    pub count: usize,
    pub min: i64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BloodTypeShare {
    pub blood_type: String,
    pub count: usize,
    pub percent: f64,
}
