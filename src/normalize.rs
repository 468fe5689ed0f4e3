use std::collections::HashSet;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, warn};

use crate::error::AnalysisError;
use crate::models::{AdmissionRecord, RawRow, RawTable, Table};

pub const PATIENT_ID: &str = "PatientID";
pub const BLOOD_TYPE: &str = "BloodType";
pub const DIAGNOSIS: &str = "Diagnosis";
pub const ADMISSION_DATE: &str = "AdmissionDate";
pub const DISCHARGE_DATE: &str = "DischargeDate";

pub const REQUIRED_FIELDS: [&str; 5] = [
    PATIENT_ID,
    BLOOD_TYPE,
    DIAGNOSIS,
    ADMISSION_DATE,
    DISCHARGE_DATE,
];

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

const SECONDS_PER_DAY: i64 = 86_400;

/// Validates the schema of `raw` and builds the normalized table.
///
/// Every name in `required_fields` must be a header of `raw`. The five
/// canonical columns are then read by name; extra columns are ignored.
/// Negative stays and repeated patient ids are kept and reported through
/// `tracing`.
pub fn normalize(raw: &RawTable, required_fields: &[&str]) -> Result<Table, AnalysisError> {
    let missing: Vec<String> = required_fields
        .iter()
        .filter(|field| raw.column_index(field).is_none())
        .map(|field| field.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(AnalysisError::Schema { missing });
    }

    let columns = Columns::locate(raw)?;
    let mut records = Vec::with_capacity(raw.rows.len());

    for row in &raw.rows {
        let admission_date = parse_cell(row, columns.admission_date, ADMISSION_DATE)?;
        let discharge_date = parse_cell(row, columns.discharge_date, DISCHARGE_DATE)?;

        records.push(AdmissionRecord {
            patient_id: row.cell(columns.patient_id).to_string(),
            blood_type: row.cell(columns.blood_type).to_string(),
            diagnosis: row.cell(columns.diagnosis).to_string(),
            admission_date,
            discharge_date,
            length_of_stay: length_of_stay(admission_date, discharge_date),
        });
    }

    report_suspect_rows(&records);
    debug!(records = records.len(), "normalized admission table");

    Ok(Table { records })
}

/// Whole days between two instants, floored like a timedelta's day component.
pub fn length_of_stay(admission: NaiveDateTime, discharge: NaiveDateTime) -> i64 {
    (discharge - admission)
        .num_seconds()
        .div_euclid(SECONDS_PER_DAY)
}

pub fn parse_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

struct Columns {
    patient_id: usize,
    blood_type: usize,
    diagnosis: usize,
    admission_date: usize,
    discharge_date: usize,
}

impl Columns {
    fn locate(raw: &RawTable) -> Result<Self, AnalysisError> {
        let find = |name: &str| {
            raw.column_index(name).ok_or_else(|| AnalysisError::Schema {
                missing: vec![name.to_string()],
            })
        };

        Ok(Self {
            patient_id: find(PATIENT_ID)?,
            blood_type: find(BLOOD_TYPE)?,
            diagnosis: find(DIAGNOSIS)?,
            admission_date: find(ADMISSION_DATE)?,
            discharge_date: find(DISCHARGE_DATE)?,
        })
    }
}

fn parse_cell(row: &RawRow, index: usize, column: &str) -> Result<NaiveDateTime, AnalysisError> {
    let value = row.cell(index);
    parse_date(value).ok_or_else(|| AnalysisError::Parse {
        column: column.to_string(),
        line: row.line,
        value: value.to_string(),
    })
}

fn report_suspect_rows(records: &[AdmissionRecord]) {
    let negative = records
        .iter()
        .filter(|record| record.length_of_stay < 0)
        .count();
    if negative > 0 {
        warn!(rows = negative, "discharge precedes admission; stay statistics include negative values");
    }

    let mut seen = HashSet::new();
    let duplicates = records
        .iter()
        .filter(|record| !seen.insert(record.patient_id.as_str()))
        .count();
    if duplicates > 0 {
        warn!(rows = duplicates, "repeated PatientID values are counted as separate admissions");
    }
}
