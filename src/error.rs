use thiserror::Error;

/// Failures of the normalize and summarize stages.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalysisError {
    /// One or more required columns are absent from the input.
    #[error("missing required columns: {}", missing.join(", "))]
    Schema { missing: Vec<String> },

    /// A date cell could not be parsed. `line` is the source line, header included.
    #[error("could not parse {column} value '{value}' on line {line}")]
    Parse {
        column: String,
        line: u64,
        value: String,
    },

    #[error("dataset contains no admission records")]
    EmptyDataset,
}
