//! Default `fetch_html` collaborator: a `reqwest`-backed GET with a 10s
//! timeout, retried up to 3 times with exponential backoff on transport
//! errors or 5xx, grounded on the sibling scraper crate's
//! `retry_with_backoff`/`is_retriable` split.

use std::time::Duration;

use reqwest::StatusCode;

const TIMEOUT: Duration = Duration::from_secs(10);
const MAX_RETRIES: u32 = 3;
const BACKOFF_BASE_SECS: u64 = 1;

#[derive(Debug)]
enum FetchOutcome {
    Success { final_url: String, html: String },
    Retriable(String),
    Fatal,
}

fn is_retriable(outcome: &FetchOutcome) -> bool {
    matches!(outcome, FetchOutcome::Retriable(_))
}

/// Shared, thread-safe HTTP client for fetching HTML pages.
pub struct HtmlFetcher {
    client: reqwest::Client,
    user_agent: String,
}

impl HtmlFetcher {
    #[must_use]
    pub fn new(user_agent: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            user_agent: user_agent.into(),
        }
    }

    /// Best-effort fetch: never returns an `Err`, only `(None, None)` on
    /// exhausted retries or a non-retriable failure.
    pub async fn fetch_html(&self, url: &str) -> (Option<String>, Option<String>) {
        let mut attempt = 0u32;
        loop {
            match self.try_fetch(url).await {
                FetchOutcome::Success { final_url, html } => return (Some(final_url), Some(html)),
                outcome if is_retriable(&outcome) && attempt < MAX_RETRIES => {
                    let delay = BACKOFF_BASE_SECS.saturating_mul(1u64 << attempt.min(62));
                    tracing::warn!(url, attempt, delay_secs = delay, "retrying HTML fetch after backoff");
                    tokio::time::sleep(Duration::from_secs(delay)).await;
                    attempt += 1;
                }
                _ => {
                    tracing::warn!(url, "giving up on HTML fetch");
                    return (None, None);
                }
            }
        }
    }

    async fn try_fetch(&self, url: &str) -> FetchOutcome {
        let response = match self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => return FetchOutcome::Retriable(e.to_string()),
        };

        let status = response.status();
        let final_url = response.url().to_string();
        if status.is_server_error() {
            return FetchOutcome::Retriable(format!("HTTP {status}"));
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return FetchOutcome::Retriable("HTTP 429".to_string());
        }
        if !status.is_success() {
            return FetchOutcome::Fatal;
        }

        match response.text().await {
            Ok(html) => FetchOutcome::Success { final_url, html },
            Err(e) => FetchOutcome::Retriable(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retriable_classification_matches_transient_conditions() {
        assert!(is_retriable(&FetchOutcome::Retriable("boom".into())));
        assert!(!is_retriable(&FetchOutcome::Fatal));
        assert!(!is_retriable(&FetchOutcome::Success {
            final_url: "https://example.com".into(),
            html: String::new()
        }));
    }
}
