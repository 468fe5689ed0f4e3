use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use uuid::Uuid;

use admission_stay_analytics::aggregate::{
    self, AnalysisConfig, DEFAULT_BOX_PLOT_DIAGNOSES, DEFAULT_HISTOGRAM_BINS,
    DEFAULT_TOP_DIAGNOSES,
};
use admission_stay_analytics::models::RawTable;
use admission_stay_analytics::{ingest, logging, normalize, report, REQUIRED_FIELDS};

#[derive(Parser)]
#[command(name = "admission-stay-analytics")]
#[command(about = "Length of stay statistics by blood type and diagnosis", long_about = None)]
struct Cli {
    /// Increase log verbosity (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize an admissions CSV file
    Summarize {
        #[arg(long)]
        csv: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Summarize the built-in 20 patient sample dataset
    Sample {
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Write the built-in sample dataset as CSV
    ExportSample {
        #[arg(long, default_value = "blood_type_data.csv")]
        out: PathBuf,
    },
}

#[derive(clap::Args)]
struct OutputArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
    /// Write to this file instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,
    #[arg(long, default_value_t = DEFAULT_TOP_DIAGNOSES)]
    top_diagnoses: usize,
    #[arg(long, default_value_t = DEFAULT_HISTOGRAM_BINS)]
    histogram_bins: usize,
    /// Diagnoses broken down by blood type in the stay spread section
    #[arg(long, default_value_t = DEFAULT_BOX_PLOT_DIAGNOSES)]
    box_plot_diagnoses: usize,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Markdown,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    match cli.command {
        Commands::Summarize { csv, output } => {
            let raw = ingest::read_csv(&csv)?;
            run(&csv.display().to_string(), &raw, &output)?;
        }
        Commands::Sample { output } => {
            let raw = ingest::sample_table()?;
            run("built-in sample", &raw, &output)?;
        }
        Commands::ExportSample { out } => {
            std::fs::write(&out, ingest::SAMPLE_CSV)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Sample dataset written to {}.", out.display());
        }
    }

    Ok(())
}

fn run(source: &str, raw: &RawTable, args: &OutputArgs) -> anyhow::Result<()> {
    let config = AnalysisConfig {
        top_diagnoses: args.top_diagnoses,
        histogram_bins: args.histogram_bins,
        box_plot_diagnoses: args.box_plot_diagnoses,
    };

    let run_id = Uuid::new_v4();
    let table = normalize(raw, &REQUIRED_FIELDS)?;
    let bundle = aggregate::summarize_with(&table, &config)?;
    info!(%run_id, source, "analysis complete");

    let rendered = match args.format {
        OutputFormat::Json => report::render_json(run_id, &bundle)?,
        OutputFormat::Markdown => {
            let shares = aggregate::blood_type_share(&bundle);
            let histogram = aggregate::stay_histogram(&table, config.histogram_bins);
            let blood_type_boxes = aggregate::stay_boxes_by_blood_type(&table);
            let diagnosis_boxes =
                aggregate::stay_boxes_by_top_diagnosis(&table, config.box_plot_diagnoses);
            let distributions = report::Distributions {
                shares: &shares,
                histogram: &histogram,
                blood_type_boxes: &blood_type_boxes,
                diagnosis_boxes: &diagnosis_boxes,
            };
            report::build_report(source, run_id, &bundle, &distributions)
        }
    };

    match &args.out {
        Some(path) => write_output(path, &rendered)?,
        None => println!("{rendered}"),
    }
    Ok(())
}

fn write_output(path: &Path, rendered: &str) -> anyhow::Result<()> {
    std::fs::write(path, rendered)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "report written");
    println!("Report written to {}.", path.display());
    Ok(())
}
