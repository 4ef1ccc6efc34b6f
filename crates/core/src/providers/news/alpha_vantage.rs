use crate::providers::news::{NewsProvider, NewsQuery, RawArticle};
use crate::providers::quote::alpha_vantage::{ensure_not_throttled, BASE_URL};
use crate::providers::{bare_symbol, build_http, get_json};
use anyhow::Context;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

const FEED_LIMIT: &str = "20";

/// `NEWS_SENTIMENT` feed. Ticker-scoped, so it only runs when a symbol is known.
#[derive(Debug, Clone)]
pub struct AlphaVantageNewsProvider {
    http: reqwest::Client,
    api_key: Option<String>,
}

impl AlphaVantageNewsProvider {
    pub fn new(api_key: Option<String>, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            http: build_http(timeout)?,
            api_key,
        })
    }
}

#[async_trait::async_trait]
impl NewsProvider for AlphaVantageNewsProvider {
    fn name(&self) -> &'static str {
        "alpha_vantage"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn requires_symbol(&self) -> bool {
        true
    }

    async fn fetch_articles(&self, query: &NewsQuery) -> anyhow::Result<Vec<RawArticle>> {
        let Some(api_key) = self.api_key.as_deref() else {
            anyhow::bail!("ALPHA_VANTAGE_API_KEY is not set");
        };
        let Some(symbol) = query.symbol.as_deref() else {
            anyhow::bail!("NEWS_SENTIMENT needs a ticker");
        };
        let raw = get_json(
            &self.http,
            BASE_URL,
            &[
                ("function", "NEWS_SENTIMENT"),
                ("tickers", bare_symbol(symbol)),
                ("sort", "LATEST"),
                ("limit", FEED_LIMIT),
                ("apikey", api_key),
            ],
        )
        .await?;
        articles_from_feed(&raw)
    }
}

pub fn articles_from_feed(raw: &Value) -> anyhow::Result<Vec<RawArticle>> {
    ensure_not_throttled(raw)?;
    let body = serde_json::from_value::<FeedResponse>(raw.clone())
        .context("failed to decode Alpha Vantage news feed")?;

    Ok(body
        .feed
        .into_iter()
        .map(|item| RawArticle {
            title: item.title,
            description: item.summary.unwrap_or_default(),
            source: item.source.unwrap_or_else(|| "Alpha Vantage".to_string()),
            url: item.url,
            published_at: item.time_published.as_deref().and_then(parse_time_published),
            sentiment_label: item.overall_sentiment_label,
        })
        .collect())
}

// "20260105T053000", UTC.
fn parse_time_published(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%S")
        .ok()
        .map(|dt| dt.and_utc())
}

#[derive(Debug, Deserialize)]
struct FeedResponse {
    #[serde(default)]
    feed: Vec<FeedItem>,
}

#[derive(Debug, Deserialize)]
struct FeedItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    time_published: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    overall_sentiment_label: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn maps_feed_with_sentiment_labels() {
        let raw = json!({
            "items": "1",
            "sentiment_score_definition": "x <= -0.35: Bearish",
            "feed": [{
                "title": "Infosys wins large deal",
                "url": "https://example.com/infy",
                "time_published": "20260105T053000",
                "summary": "The contract spans five years.",
                "source": "Benzinga",
                "overall_sentiment_score": 0.31,
                "overall_sentiment_label": "Somewhat-Bullish"
            }]
        });

        let out = articles_from_feed(&raw).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].source, "Benzinga");
        assert_eq!(out[0].sentiment_label.as_deref(), Some("Somewhat-Bullish"));
        assert_eq!(
            out[0].published_at,
            Some(Utc.with_ymd_and_hms(2026, 1, 5, 5, 30, 0).unwrap())
        );
    }

    #[test]
    fn information_body_is_a_failure() {
        let raw = json!({"Information": "Invalid inputs. Please refer to the API documentation."});
        assert!(articles_from_feed(&raw).is_err());
    }

    #[test]
    fn needs_a_symbol() {
        let p = AlphaVantageNewsProvider::new(Some("k".to_string()), Duration::from_secs(1))
            .unwrap();
        assert!(p.requires_symbol());
        assert!(p.is_configured());
    }
}
