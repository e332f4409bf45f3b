//! Typed error taxonomy for the pipeline. Each per-site failure is local: it
//! is logged and causes that site to be skipped, never the whole run.

use thiserror::Error;

/// Errors that can terminate processing for a single site, surfaced all the
/// way up to the orchestrator's per-site log line.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("could not fetch HTML for {url}: {reason}")]
    FetchError { url: String, reason: String },

    #[error("no logo candidates discovered for {website}")]
    NoCandidates { website: String },

    #[error("no candidate for {website} had fetchable image bytes")]
    SelectionEmpty { website: String },

    #[error("normalization failed for {website}: {reason}")]
    InvalidImage { website: String, reason: String },

    #[error("asset write failed for {website}: {reason}")]
    AssetIOError { website: String, reason: String },
}

/// One extractor in Component B failed; swallowed by the orchestrator, which
/// logs at debug and continues with the remaining extractors.
#[derive(Debug, Error)]
#[error("extractor {extractor} failed: {reason}")]
pub struct ExtractorError {
    pub extractor: &'static str,
    pub reason: String,
}

/// A single report file (`groups.json`, `pairs_sample.csv`, `metrics.json`)
/// could not be written. Logged at error level; the other files are still
/// attempted.
#[derive(Debug, Error)]
#[error("failed to write report file {path}: {source}")]
pub struct ReportError {
    pub path: String,
    #[source]
    pub source: std::io::Error,
}
