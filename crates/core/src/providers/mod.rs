//! External market-data providers and the chains that try them in priority order.
//!
//! Every provider call goes through [`guarded`], which bounds it by a timeout and turns
//! errors, timeouts and empty results into a recorded [`ProviderAttempt`]. A chain stops at the
//! first provider that returns data.

pub mod news;
pub mod quote;

use anyhow::Context;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::time::{Duration, Instant};

const USER_AGENT: &str = "Mozilla/5.0 (compatible; StockMind/0.1; +https://stockmind.app)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptOutcome {
    Succeeded,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderAttempt {
    pub provider: String,
    pub outcome: AttemptOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub elapsed_ms: u64,
}

impl ProviderAttempt {
    pub fn skipped(provider: &str, reason: &str) -> Self {
        tracing::debug!(provider, reason, "provider skipped");
        Self {
            provider: provider.to_string(),
            outcome: AttemptOutcome::Skipped,
            reason: Some(reason.to_string()),
            elapsed_ms: 0,
        }
    }
}

/// Runs one provider call under `timeout`. `Ok(None)` and errors both count as failure.
pub async fn guarded<T, F>(provider: &str, timeout: Duration, call: F) -> (Option<T>, ProviderAttempt)
where
    F: Future<Output = anyhow::Result<Option<T>>>,
{
    let t0 = Instant::now();
    let res = tokio::time::timeout(timeout, call).await;
    let elapsed_ms = u64::try_from(t0.elapsed().as_millis()).unwrap_or(u64::MAX);

    let (value, outcome, reason) = match res {
        Ok(Ok(Some(v))) => (Some(v), AttemptOutcome::Succeeded, None),
        Ok(Ok(None)) => (None, AttemptOutcome::Failed, Some("no usable data".to_string())),
        Ok(Err(err)) => (None, AttemptOutcome::Failed, Some(format!("{err:#}"))),
        Err(_) => (
            None,
            AttemptOutcome::Failed,
            Some(format!("timed out after {}ms", timeout.as_millis())),
        ),
    };

    match &reason {
        None => tracing::info!(provider, elapsed_ms, "provider returned data"),
        Some(reason) => tracing::warn!(provider, elapsed_ms, %reason, "provider failed; trying next"),
    }

    (
        value,
        ProviderAttempt {
            provider: provider.to_string(),
            outcome,
            reason,
            elapsed_ms,
        },
    )
}

pub(crate) fn build_http(timeout: Duration) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .context("failed to build provider http client")
}

/// GET `url` and decode the body as JSON. Non-2xx statuses are errors.
pub(crate) async fn get_json(
    http: &reqwest::Client,
    url: &str,
    query: &[(&str, &str)],
) -> anyhow::Result<Value> {
    let res = http
        .get(url)
        .query(query)
        .send()
        .await
        .context("provider request failed")?;

    let status = res.status();
    let text = res
        .text()
        .await
        .context("failed to read provider response")?;
    if !status.is_success() {
        anyhow::bail!("provider HTTP {status}: {}", truncate_chars(&text, 200));
    }

    serde_json::from_str::<Value>(&text).with_context(|| {
        format!(
            "provider response is not valid JSON: {}",
            truncate_chars(&text, 200)
        )
    })
}

/// Appends an exchange suffix (".NS", ".BSE") to bare symbols.
pub fn exchange_symbol(symbol: &str, suffix: &str) -> String {
    let symbol = symbol.trim().to_ascii_uppercase();
    if symbol.contains('.') {
        symbol
    } else {
        format!("{symbol}{suffix}")
    }
}

/// Strips a trailing exchange suffix, e.g. "TCS.NS" -> "TCS".
pub fn bare_symbol(symbol: &str) -> &str {
    symbol.split('.').next().unwrap_or(symbol)
}

/// Truncates to at most `max` characters, on a char boundary.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_suffix_only_to_bare_symbols() {
        assert_eq!(exchange_symbol("tcs", ".NS"), "TCS.NS");
        assert_eq!(exchange_symbol("RELIANCE.BO", ".NS"), "RELIANCE.BO");
        assert_eq!(bare_symbol("TCS.NS"), "TCS");
        assert_eq!(bare_symbol("M&M"), "M&M");
    }

    #[test]
    fn truncates_on_char_boundary() {
        assert_eq!(truncate_chars("abc", 5), "abc");
        assert_eq!(truncate_chars("₹₹₹₹", 2), "₹₹…");
    }

    #[tokio::test]
    async fn guarded_records_success_failure_and_timeout() {
        let (v, attempt) = guarded("ok", Duration::from_secs(1), async { Ok(Some(1)) }).await;
        assert_eq!(v, Some(1));
        assert_eq!(attempt.outcome, AttemptOutcome::Succeeded);
        assert!(attempt.reason.is_none());

        let (v, attempt) =
            guarded::<i32, _>("empty", Duration::from_secs(1), async { Ok(None) }).await;
        assert!(v.is_none());
        assert_eq!(attempt.outcome, AttemptOutcome::Failed);

        let (v, attempt) = guarded::<i32, _>("err", Duration::from_secs(1), async {
            Err(anyhow::anyhow!("provider HTTP 503"))
        })
        .await;
        assert!(v.is_none());
        assert!(attempt.reason.unwrap().contains("503"));

        let (v, attempt) = guarded::<i32, _>("slow", Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(Some(1))
        })
        .await;
        assert!(v.is_none());
        assert!(attempt.reason.unwrap().starts_with("timed out"));
    }
}
