use crate::providers::news::{NewsProvider, NewsQuery, RawArticle};
use crate::providers::{build_http, get_json};
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

const BASE_URL: &str = "https://gnews.io/api/v4/search";
const MAX_RESULTS: &str = "10";

#[derive(Debug, Clone)]
pub struct GNewsProvider {
    http: reqwest::Client,
    api_key: Option<String>,
}

impl GNewsProvider {
    pub fn new(api_key: Option<String>, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            http: build_http(timeout)?,
            api_key,
        })
    }
}

#[async_trait::async_trait]
impl NewsProvider for GNewsProvider {
    fn name(&self) -> &'static str {
        "gnews"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch_articles(&self, query: &NewsQuery) -> anyhow::Result<Vec<RawArticle>> {
        let Some(api_key) = self.api_key.as_deref() else {
            anyhow::bail!("GNEWS_API_KEY is not set");
        };
        let q = any_of_terms(&query.keywords);
        let raw = get_json(
            &self.http,
            BASE_URL,
            &[
                ("q", q.as_str()),
                ("lang", "en"),
                ("country", "in"),
                ("max", MAX_RESULTS),
                ("sortby", "publishedAt"),
                ("apikey", api_key),
            ],
        )
        .await?;
        articles_from_search(&raw)
    }
}

/// GNews treats space-separated terms as AND; widen to any of them. Tokens such as the `&` in
/// "Larsen & Toubro" are not search terms and are dropped.
pub fn any_of_terms(keywords: &str) -> String {
    keywords
        .split_whitespace()
        .filter(|t| t.chars().any(char::is_alphanumeric))
        .collect::<Vec<_>>()
        .join(" OR ")
}

pub fn articles_from_search(raw: &Value) -> anyhow::Result<Vec<RawArticle>> {
    if let Some(errors) = raw.get("errors") {
        anyhow::bail!("GNews errors: {errors}");
    }
    let body = serde_json::from_value::<SearchResponse>(raw.clone())
        .context("failed to decode GNews response")?;

    Ok(body
        .articles
        .into_iter()
        .map(|a| RawArticle {
            title: a.title,
            description: a.description.unwrap_or_default(),
            source: a
                .source
                .and_then(|s| s.name)
                .unwrap_or_else(|| "GNews".to_string()),
            url: a.url,
            published_at: a
                .published_at
                .as_deref()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| dt.with_timezone(&Utc)),
            sentiment_label: None,
        })
        .collect())
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    articles: Vec<GNewsArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GNewsArticle {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    url: String,
    #[serde(default)]
    published_at: Option<String>,
    #[serde(default)]
    source: Option<GNewsSource>,
}

#[derive(Debug, Deserialize)]
struct GNewsSource {
    #[serde(default)]
    name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn maps_articles() {
        let raw = json!({
            "totalArticles": 1,
            "articles": [{
                "title": "Nifty closes at record high",
                "description": "Broad-based buying lifts the index.",
                "content": "...",
                "url": "https://example.in/nifty",
                "image": null,
                "publishedAt": "2026-01-05T10:15:00Z",
                "source": {"name": "Business Standard", "url": "https://www.business-standard.com"}
            }]
        });

        let out = articles_from_search(&raw).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].source, "Business Standard");
        assert_eq!(
            out[0].published_at,
            Some(Utc.with_ymd_and_hms(2026, 1, 5, 10, 15, 0).unwrap())
        );
        assert!(out[0].sentiment_label.is_none());
    }

    #[test]
    fn keywords_become_or_terms_without_punctuation() {
        let q = NewsQuery::for_symbol(Some("M&M"));
        let terms = any_of_terms(&q.keywords);
        assert!(terms.starts_with("M&M OR Mahindra OR Mahindra OR NSE"));
        assert!(!terms.contains(" & "));
        assert!(!terms.contains("OR & OR"));

        assert_eq!(any_of_terms("Larsen & Toubro"), "Larsen OR Toubro");
        assert_eq!(any_of_terms("  "), "");
    }

    #[test]
    fn error_body_is_a_failure() {
        let raw = json!({"errors": ["You did not provide an API key."]});
        assert!(articles_from_search(&raw).is_err());
    }
}
