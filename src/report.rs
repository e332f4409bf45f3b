//! Component L: reporter. Grounded on the original pipeline's
//! `group/group_and_metrics.py::group_and_report` — same three output files,
//! same per-file try/write-and-continue policy (`ReportIOError`, §7), same
//! five-line console summary.

use std::path::Path;

use crate::error::ReportError;
use crate::model::{Edge, Group, Metrics};
use crate::unionfind::UnionFind;

const PAIRS_SAMPLE_LIMIT: usize = 500;

/// Run Component K over the full feature-key set and `edges`, returning
/// groups sorted by `(size desc, group_id asc)` with members sorted asc.
#[must_use]
pub fn build_groups(website_keys: &[String], edges: &[Edge]) -> Vec<Group> {
    let mut uf = UnionFind::new();
    uf.add_all(website_keys.iter().map(String::as_str));
    for edge in edges {
        uf.union(&edge.left, &edge.right);
    }

    let mut groups: Vec<Group> = uf
        .groups()
        .into_iter()
        .map(|(group_id, members)| Group { group_id, members })
        .collect();
    groups.sort_by(|a, b| b.members.len().cmp(&a.members.len()).then_with(|| a.group_id.cmp(&b.group_id)));
    groups
}

#[must_use]
pub fn compute_metrics(total: usize, extracted: usize, edges: &[Edge], groups: &[Group], threshold: f64) -> Metrics {
    let coverage = if total == 0 { 0.0 } else { extracted as f64 / total as f64 };
    let largest_group = groups.iter().map(|g| g.members.len()).max().unwrap_or(0);
    Metrics {
        total,
        extracted,
        coverage,
        pairs: edges.len(),
        groups: groups.len(),
        largest_group,
        threshold,
    }
}

/// Write all three report files to `out_dir`, independently: a failure on
/// one is logged and the others are still attempted. Finishes with a
/// five-line human summary on stdout.
pub fn write_reports(out_dir: &Path, groups: &[Group], edges: &[Edge], metrics: &Metrics) {
    if let Err(err) = write_groups(out_dir, groups) {
        tracing::error!(error = %err, "failed to write groups.json");
    }
    if let Err(err) = write_pairs_sample(out_dir, edges) {
        tracing::error!(error = %err, "failed to write pairs_sample.csv");
    }
    if let Err(err) = write_metrics(out_dir, metrics) {
        tracing::error!(error = %err, "failed to write metrics.json");
    }
    print_summary(metrics);
}

fn write_groups(out_dir: &Path, groups: &[Group]) -> Result<(), ReportError> {
    let path = out_dir.join("groups.json");
    let body = serde_json::to_string_pretty(groups).unwrap_or_else(|_| "[]".to_string());
    std::fs::write(&path, body).map_err(|source| ReportError { path: path.display().to_string(), source })
}

fn write_pairs_sample(out_dir: &Path, edges: &[Edge]) -> Result<(), ReportError> {
    let path = out_dir.join("pairs_sample.csv");
    let mut top: Vec<&Edge> = edges.iter().collect();
    top.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    top.truncate(PAIRS_SAMPLE_LIMIT);

    let file = std::fs::File::create(&path).map_err(|source| ReportError { path: path.display().to_string(), source })?;
    let mut writer = csv::Writer::from_writer(file);
    let io_err = |source: csv::Error| ReportError {
        path: path.display().to_string(),
        source: std::io::Error::other(source),
    };
    writer.write_record(["left", "right", "score"]).map_err(io_err)?;
    for edge in top {
        writer
            .write_record([edge.left.as_str(), edge.right.as_str(), &format!("{:.6}", edge.score)])
            .map_err(io_err)?;
    }
    writer.flush().map_err(|e| ReportError { path: path.display().to_string(), source: e })
}

fn write_metrics(out_dir: &Path, metrics: &Metrics) -> Result<(), ReportError> {
    let path = out_dir.join("metrics.json");
    let body = serde_json::to_string_pretty(metrics).unwrap_or_else(|_| "{}".to_string());
    std::fs::write(&path, body).map_err(|source| ReportError { path: path.display().to_string(), source })
}

fn print_summary(metrics: &Metrics) {
    println!("Total sites: {}", metrics.total);
    println!("Extracted: {} (coverage {:.1}%)", metrics.extracted, metrics.coverage * 100.0);
    println!("Groups: {}", metrics.groups);
    println!("Largest group: {} logos", metrics.largest_group);
    println!("Threshold: {:.2}", metrics.threshold);
}
