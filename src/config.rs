//! CLI surface (§6) and ambient configuration knobs (§10.1), derived with
//! `clap` exactly the way the teacher derives its own `Config`
//! (`#[derive(Parser)]`, `#[arg(long, env = "...")]` throughout).

use std::path::PathBuf;

use clap::Parser;

fn default_concurrency() -> usize {
    std::thread::available_parallelism().map(std::num::NonZero::get).unwrap_or(4)
}

/// Logo discovery, fingerprinting and visual-similarity grouping pipeline.
#[derive(Parser, Debug, Clone)]
#[command(name = "brandmark", version, about = "Logo discovery and visual-similarity grouping pipeline", long_about = None)]
pub struct Config {
    /// Path to a text file with one website URL per line (§6).
    #[arg(long, env = "LOGO_INPUT")]
    pub input: PathBuf,

    /// Output directory for `features.<table>`, `groups.json`,
    /// `pairs_sample.csv` and `metrics.json`.
    #[arg(long, env = "LOGO_OUT")]
    pub out: PathBuf,

    /// Directory for per-site original/normalized/preview image assets.
    #[arg(long, env = "LOGO_ASSETS", default_value = "out/extracted")]
    pub assets: PathBuf,

    /// Skip byte fetches during candidate scoring; the single chosen
    /// candidate's bytes are still fetched once, for normalization.
    #[arg(long, env = "LOGO_LAZY_SELECTION")]
    pub lazy_selection: bool,

    /// Log per-site HTML fetch diagnostics at debug level.
    #[arg(long, env = "LOGO_DEBUG_FETCH")]
    pub debug_fetch: bool,

    /// Log per-site candidate discovery diagnostics at debug level.
    #[arg(long, env = "LOGO_DEBUG_CANDIDATES")]
    pub debug_candidates: bool,

    /// Log the top N pairwise edges at debug level (defaults to 20 when the
    /// flag is present with no value).
    #[arg(long, env = "LOGO_DEBUG_PAIRS", num_args = 0..=1, default_missing_value = "20")]
    pub debug_pairs: Option<usize>,

    /// Bounded per-site concurrency for the fetch/discover/select/normalize
    /// pipeline (§5).
    #[arg(long, env = "LOGO_CONCURRENCY", default_value_t = default_concurrency())]
    pub concurrency: usize,

    /// User-Agent header sent on HTML and image fetches.
    #[arg(long, env = "LOGO_USER_AGENT", default_value = "brandmark/0.1 (+logo discovery bot)")]
    pub user_agent: String,

    /// Optional log file; when unset, logs go to stderr only.
    #[arg(long, env = "LOGO_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

impl Config {
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
