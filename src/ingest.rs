use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context};
use tracing::debug;

use crate::models::{RawRow, RawTable};

pub const SAMPLE_CSV: &str = "\
PatientID,BloodType,Diagnosis,AdmissionDate,DischargeDate
1,A+,Pneumonia,2023-01-05,2023-01-12
2,O-,Appendicitis,2023-01-06,2023-01-09
3,B+,Diabetes,2023-01-07,2023-01-14
4,AB-,Heart Failure,2023-01-08,2023-01-18
5,A-,Stroke,2023-01-09,2023-01-20
6,O+,Pneumonia,2023-01-10,2023-01-15
7,B-,Fracture,2023-01-11,2023-01-14
8,AB+,COVID-19,2023-01-12,2023-01-22
9,A+,Diabetes,2023-01-13,2023-01-19
10,O-,Pneumonia,2023-01-14,2023-01-21
11,B+,Stroke,2023-01-15,2023-01-25
12,AB-,Appendicitis,2023-01-16,2023-01-19
13,A-,Heart Failure,2023-01-17,2023-01-24
14,O+,COVID-19,2023-01-18,2023-01-28
15,B-,Pneumonia,2023-01-19,2023-01-26
16,AB+,Diabetes,2023-01-20,2023-01-27
17,A+,Fracture,2023-01-21,2023-01-24
18,O-,Stroke,2023-01-22,2023-01-30
19,B+,Heart Failure,2023-01-23,2023-01-31
20,AB-,COVID-19,2023-01-24,2023-02-05
";

pub fn read_csv(csv_path: &Path) -> anyhow::Result<RawTable> {
    let is_csv = csv_path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if !is_csv {
        bail!("unsupported file format: {}", csv_path.display());
    }

    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    read_csv_from(file).with_context(|| format!("failed to read {}", csv_path.display()))
}

pub fn read_csv_from<R: Read>(input: R) -> anyhow::Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(input);

    let headers = reader
        .headers()
        .context("missing header row")?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let line = record
            .position()
            .map(|position| position.line())
            .context("csv record has no source position")?;
        rows.push(RawRow {
            line,
            cells: record.iter().map(str::to_string).collect(),
        });
    }

    debug!(rows = rows.len(), "read csv rows");
    Ok(RawTable { headers, rows })
}

pub fn sample_table() -> anyhow::Result<RawTable> {
    read_csv_from(SAMPLE_CSV.as_bytes())
}
