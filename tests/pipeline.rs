use admission_stay_analytics::ingest::{read_csv_from, sample_table};
use admission_stay_analytics::models::MatrixCell;
use admission_stay_analytics::{normalize, summarize, AnalysisError, REQUIRED_FIELDS};

#[test]
fn sample_counts_add_up() {
    let table = normalize(&sample_table().unwrap(), &REQUIRED_FIELDS).unwrap();
    let bundle = summarize(&table).unwrap();

    assert_eq!(bundle.global.total_patients, 20);
    let by_blood_type: usize = bundle.blood_type_stats.values().map(|g| g.count).sum();
    assert_eq!(by_blood_type, 20);
    assert_eq!(bundle.monthly_trend.values().sum::<usize>(), 20);
    assert_eq!(bundle.diagnosis_stats.len(), 7);
}

#[test]
fn matrix_no_data_iff_pair_absent() {
    let table = normalize(&sample_table().unwrap(), &REQUIRED_FIELDS).unwrap();
    let bundle = summarize(&table).unwrap();

    for (blood_type, row) in &bundle.blood_diagnosis_matrix {
        for (diagnosis, cell) in row {
            let observed = table
                .records
                .iter()
                .any(|r| &r.blood_type == blood_type && &r.diagnosis == diagnosis);
            assert_eq!(observed, !matches!(cell, MatrixCell::NoData));
        }
    }
}

#[test]
fn header_only_csv_is_an_empty_dataset() {
    let raw = read_csv_from("PatientID,BloodType,Diagnosis,AdmissionDate,DischargeDate\n".as_bytes())
        .unwrap();
    let table = normalize(&raw, &REQUIRED_FIELDS).unwrap();
    assert_eq!(summarize(&table).unwrap_err(), AnalysisError::EmptyDataset);
}

#[test]
fn missing_column_reported_before_dates_are_read() {
    let raw = read_csv_from("PatientID,BloodType,AdmissionDate\n1,A+,garbage\n".as_bytes()).unwrap();
    let err = normalize(&raw, &REQUIRED_FIELDS).unwrap_err();
    assert_eq!(
        err,
        AnalysisError::Schema {
            missing: vec!["Diagnosis".to_string(), "DischargeDate".to_string()],
        }
    );
}

#[test]
fn repeated_patient_id_counts_every_admission() {
    let raw = read_csv_from(
        "PatientID,BloodType,Diagnosis,AdmissionDate,DischargeDate\n\
         7,A+,Flu,2023-01-01,2023-01-03\n\
         7,A+,Flu,2023-03-01,2023-03-05\n\
         8,O-,Gout,2023-03-02,2023-03-03\n"
            .as_bytes(),
    )
    .unwrap();
    let bundle = summarize(&normalize(&raw, &REQUIRED_FIELDS).unwrap()).unwrap();
    assert_eq!(bundle.global.total_patients, 3);
    assert_eq!(bundle.blood_type_stats["A+"].count, 2);
    assert_eq!(bundle.monthly_trend["2023-03"], 2);
}

#[test]
fn parse_error_points_at_the_file_line_after_blank_rows() {
    let raw = read_csv_from(
        "PatientID,BloodType,Diagnosis,AdmissionDate,DischargeDate\n\
         1,A+,Flu,2023-01-01,2023-01-03\n\
         ,,,,\n\
         2,B+,Flu,not a date,2023-01-03\n"
            .as_bytes(),
    )
    .unwrap();
    let err = normalize(&raw, &REQUIRED_FIELDS).unwrap_err();
    assert_eq!(
        err,
        AnalysisError::Parse {
            column: "AdmissionDate".to_string(),
            line: 4,
            value: "not a date".to_string(),
        }
    );
}

#[test]
fn same_table_gives_the_same_bundle() {
    let table = normalize(&sample_table().unwrap(), &REQUIRED_FIELDS).unwrap();
    let first = summarize(&table).unwrap();
    let second = summarize(&table).unwrap();
    assert_eq!(first, second);
}
