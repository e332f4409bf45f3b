#![deny(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::sync::Arc;

use brandmark::config::Config;
use brandmark::fetch::HtmlFetcher;
use brandmark::logging::init_logging;
use brandmark::orchestrator::Orchestrator;
use brandmark::urlutil;
use brandmark::{report, shortlist};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse_args();

    let _log_guards = init_logging(config.log_file.as_deref());

    tracing::info!("=== Configuration ===");
    tracing::info!("Input: {}", config.input.display());
    tracing::info!("Output: {}", config.out.display());
    tracing::info!("Assets: {}", config.assets.display());
    tracing::info!("Lazy selection: {}", config.lazy_selection);
    tracing::info!("Concurrency: {}", config.concurrency);
    tracing::info!("User-Agent: {}", config.user_agent);
    tracing::info!("====================");

    let urls = read_input(&config.input)?;
    if urls.is_empty() {
        anyhow::bail!("no URLs found in {}", config.input.display());
    }

    std::fs::create_dir_all(&config.out).map_err(|err| anyhow::anyhow!("failed to create output directory {}: {err}", config.out.display()))?;
    std::fs::create_dir_all(&config.assets).map_err(|err| anyhow::anyhow!("failed to create assets directory {}: {err}", config.assets.display()))?;

    let html_fetcher = HtmlFetcher::new(config.user_agent.clone());
    let image_client = reqwest::Client::builder()
        .user_agent(config.user_agent.clone())
        .build()
        .unwrap_or_else(|_| reqwest::Client::new());

    let orchestrator = Arc::new(Orchestrator::new(
        html_fetcher,
        image_client,
        config.assets.clone(),
        config.lazy_selection,
        config.concurrency,
        config.debug_fetch,
        config.debug_candidates,
    ));

    let total = urls.len();
    let (features, images) = orchestrator.run(urls).await;
    tracing::info!(total, extracted = features.len(), "finished per-site processing");

    write_features(&config.out, &features)?;

    let keys: Vec<String> = features.keys().cloned().collect();
    let edges = shortlist::build_edges(&features, &images);

    if let Some(limit) = config.debug_pairs {
        let mut top: Vec<_> = edges.iter().collect();
        top.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        for edge in top.into_iter().take(limit) {
            tracing::debug!(left = edge.left, right = edge.right, score = edge.score, "candidate pair");
        }
    }

    let groups = report::build_groups(&keys, &edges);
    let metrics = report::compute_metrics(total, features.len(), &edges, &groups, brandmark::model::T_LINK);
    report::write_reports(&config.out, &groups, &edges, &metrics);

    Ok(())
}

/// Read `--input`: one URL per line, UTF-8 BOM stripped, blank lines
/// ignored, each non-blank line passed through [`urlutil::coerce_scheme`].
fn read_input(path: &std::path::Path) -> anyhow::Result<Vec<String>> {
    let raw = std::fs::read_to_string(path).map_err(|err| anyhow::anyhow!("failed to read {}: {err}", path.display()))?;
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(&raw);

    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(urlutil::coerce_scheme)
        .collect())
}

/// Write the per-site feature dump as JSON Lines, one [`brandmark::model::LogoFeatures`]
/// record per line, sorted by website (§6's `features.<table>` is
/// implementation-defined; JSON Lines round-trips every field and streams
/// cleanly for large runs).
fn write_features(out_dir: &std::path::Path, features: &std::collections::BTreeMap<String, brandmark::model::LogoFeatures>) -> anyhow::Result<()> {
    let path = out_dir.join("features.jsonl");
    let mut body = String::new();
    for record in features.values() {
        body.push_str(&serde_json::to_string(record)?);
        body.push('\n');
    }
    std::fs::write(&path, body).map_err(|err| anyhow::anyhow!("failed to write {}: {err}", path.display()))?;
    Ok(())
}
