use std::fmt::Write;

use anyhow::Context;
use serde::Serialize;
use uuid::Uuid;

use crate::aggregate::StayBoxes;
use crate::models::{BloodTypeShare, BoxSummary, HistogramBin, ResultBundle};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RunOutput<'a> {
    run_id: Uuid,
    #[serde(flatten)]
    bundle: &'a ResultBundle,
}

pub fn render_json(run_id: Uuid, bundle: &ResultBundle) -> anyhow::Result<String> {
    serde_json::to_string_pretty(&RunOutput { run_id, bundle })
        .context("failed to serialize result bundle")
}

/// Chart data rendered next to the bundle in the markdown report.
pub struct Distributions<'a> {
    pub shares: &'a [BloodTypeShare],
    pub histogram: &'a [HistogramBin],
    pub blood_type_boxes: &'a StayBoxes,
    pub diagnosis_boxes: &'a [(String, StayBoxes)],
}

pub fn build_report(
    source: &str,
    run_id: Uuid,
    bundle: &ResultBundle,
    distributions: &Distributions<'_>,
) -> String {
    let mut output = String::new();
    let global = &bundle.global;
    let shares = distributions.shares;
    let histogram = distributions.histogram;

    let _ = writeln!(output, "# Blood Type and Length of Stay Report");
    let _ = writeln!(output, "Generated from {} (run {})", source, run_id);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Overview");
    let _ = writeln!(output, "- Patients: {}", global.total_patients);
    let _ = writeln!(output, "- Average stay: {:.2} days", global.avg_stay);
    let _ = writeln!(output, "- Median stay: {:.2} days", global.median_stay);
    let _ = writeln!(
        output,
        "- Range: {} to {} days",
        global.min_stay, global.max_stay
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Blood Type Distribution");
    for share in shares {
        let _ = writeln!(
            output,
            "- {}: {} patients ({:.0}%)",
            share.blood_type,
            share.count,
            share.percent.round()
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Stay by Blood Type");
    for (blood_type, stats) in &bundle.blood_type_stats {
        let _ = writeln!(
            output,
            "- {}: mean {:.2}, median {:.2} across {} patients",
            blood_type, stats.mean, stats.median, stats.count
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Stay Spread by Blood Type");
    write_boxes(&mut output, distributions.blood_type_boxes);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Top Diagnoses");
    if bundle.diagnosis_stats.is_empty() {
        let _ = writeln!(output, "No diagnoses recorded.");
    } else {
        for (diagnosis, stats) in bundle.diagnosis_stats.iter() {
            let _ = writeln!(
                output,
                "- {}: mean {:.2} days ({} cases)",
                diagnosis, stats.mean, stats.count
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Mean Stay by Diagnosis and Blood Type");
    write_matrix(&mut output, bundle);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Stay Spread by Diagnosis and Blood Type");
    if distributions.diagnosis_boxes.is_empty() {
        let _ = writeln!(output, "No diagnoses recorded.");
    }
    for (diagnosis, boxes) in distributions.diagnosis_boxes {
        let _ = writeln!(output, "### {}", diagnosis);
        write_boxes(&mut output, boxes);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Monthly Admissions");
    for (month, count) in &bundle.monthly_trend {
        let _ = writeln!(output, "- {}: {}", month, count);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Stay Distribution");
    if histogram.is_empty() {
        let _ = writeln!(output, "No stays recorded.");
    } else {
        for bin in histogram.iter().filter(|bin| bin.count > 0) {
            let _ = writeln!(
                output,
                "- {:.1} to {:.1} days: {}",
                bin.lower, bin.upper, bin.count
            );
        }
    }

    output
}

fn write_boxes(output: &mut String, boxes: &StayBoxes) {
    let _ = writeln!(output, "| Blood Type | Min | Q1 | Median | Q3 | Max | Patients |");
    let _ = writeln!(output, "|---|---|---|---|---|---|---|");
    for (blood_type, summary) in boxes {
        let BoxSummary {
            count,
            min,
            q1,
            median,
            q3,
            max,
        } = summary;
        let _ = writeln!(
            output,
            "| {} | {} | {:.2} | {:.2} | {:.2} | {} | {} |",
            blood_type, min, q1, median, q3, max, count
        );
    }
}

// Diagnoses down the side, blood types across the top.
fn write_matrix(output: &mut String, bundle: &ResultBundle) {
    let blood_types: Vec<&String> = bundle.blood_diagnosis_matrix.keys().collect();
    let Some(first_row) = bundle.blood_diagnosis_matrix.values().next() else {
        let _ = writeln!(output, "No admissions recorded.");
        return;
    };

    let _ = write!(output, "| Diagnosis |");
    for blood_type in &blood_types {
        let _ = write!(output, " {} |", blood_type);
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "|---|{}", "---|".repeat(blood_types.len()));

    for diagnosis in first_row.keys() {
        let _ = write!(output, "| {} |", diagnosis);
        for blood_type in &blood_types {
            let cell = &bundle.blood_diagnosis_matrix[*blood_type][diagnosis];
            let _ = write!(output, " {} |", cell);
        }
        let _ = writeln!(output);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{
        blood_type_share, stay_boxes_by_blood_type, stay_boxes_by_top_diagnosis, stay_histogram,
        summarize,
    };
    use crate::ingest;
    use crate::normalize::{normalize, REQUIRED_FIELDS};

    fn render(bundle: &ResultBundle, shares: &[BloodTypeShare], boxes: &StayBoxes) -> String {
        let distributions = Distributions {
            shares,
            histogram: &[],
            blood_type_boxes: boxes,
            diagnosis_boxes: &[],
        };
        build_report("test", Uuid::nil(), bundle, &distributions)
    }

    fn sample_report() -> (ResultBundle, String) {
        let table = normalize(&ingest::sample_table().unwrap(), &REQUIRED_FIELDS).unwrap();
        let bundle = summarize(&table).unwrap();
        let shares = blood_type_share(&bundle);
        let histogram = stay_histogram(&table, 20);
        let blood_type_boxes = stay_boxes_by_blood_type(&table);
        let diagnosis_boxes = stay_boxes_by_top_diagnosis(&table, 5);
        let distributions = Distributions {
            shares: &shares,
            histogram: &histogram,
            blood_type_boxes: &blood_type_boxes,
            diagnosis_boxes: &diagnosis_boxes,
        };
        let report = build_report("sample", Uuid::nil(), &bundle, &distributions);
        (bundle, report)
    }

    #[test]
    fn report_contains_every_section() {
        let (_, report) = sample_report();
        for heading in [
            "## Overview",
            "## Blood Type Distribution",
            "## Stay by Blood Type",
            "## Top Diagnoses",
            "## Mean Stay by Diagnosis and Blood Type",
            "## Monthly Admissions",
            "## Stay Distribution",
            "## Stay Spread by Blood Type",
            "## Stay Spread by Diagnosis and Blood Type",
            "### Pneumonia",
        ] {
            assert!(report.contains(heading), "missing {heading}");
        }
        assert!(report.contains("- Patients: 20"));
        assert!(report.contains("- 2023-01: 20"));
        assert!(report.contains("- Pneumonia: mean 6.50 days (4 cases)"));
        assert!(report.contains("| A+ | 3 | 4.50 | 6.00 | 6.50 | 7 | 3 |"));
        assert!(!report.contains("### Appendicitis"));
    }

    #[test]
    fn share_percentages_round_half_up() {
        let (bundle, _) = sample_report();
        let shares = vec![
            BloodTypeShare {
                blood_type: "A+".to_string(),
                count: 1,
                percent: 12.5,
            },
            BloodTypeShare {
                blood_type: "O-".to_string(),
                count: 7,
                percent: 87.5,
            },
        ];
        let report = render(&bundle, &shares, &StayBoxes::new());
        assert!(report.contains("- A+: 1 patients (13%)"));
        assert!(report.contains("- O-: 7 patients (88%)"));
    }

    #[test]
    fn matrix_table_shows_no_data_marker() {
        let (_, report) = sample_report();
        let stroke_row = report
            .lines()
            .find(|line| line.starts_with("| Stroke |"))
            .unwrap();
        // A+ is the first column and has no stroke admissions.
        assert!(stroke_row.starts_with("| Stroke | - |"));
    }

    #[test]
    fn json_uses_camel_case_keys() {
        let (bundle, _) = sample_report();
        let run_id = Uuid::new_v4();
        let json: serde_json::Value =
            serde_json::from_str(&render_json(run_id, &bundle).unwrap()).unwrap();
        assert_eq!(json["totalPatients"], 20);
        assert_eq!(json["avgStay"], 7.2);
        assert_eq!(json["bloodTypeStats"]["A+"]["count"], 3);
        assert_eq!(json["bloodDiagnosisMatrix"]["A+"]["Stroke"], "-");
        assert_eq!(json["monthlyTrend"]["2023-01"], 20);
        assert_eq!(json["runId"], run_id.to_string());
    }
}
