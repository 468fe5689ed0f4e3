//! Length of stay analytics for hospital admissions.
//!
//! [`normalize::normalize`] validates a raw table and derives each stay;
//! [`aggregate::summarize`] turns the normalized table into a
//! [`models::ResultBundle`].

pub mod aggregate;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod models;
pub mod normalize;
pub mod report;
pub mod stats;

pub use aggregate::{summarize, summarize_with, AnalysisConfig};
pub use error::AnalysisError;
pub use normalize::{normalize, REQUIRED_FIELDS};
