use crate::providers::news::{NewsProvider, NewsQuery, RawArticle};
use crate::providers::{build_http, get_json};
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

const BASE_URL: &str = "https://api.currentsapi.services/v1/search";

#[derive(Debug, Clone)]
pub struct CurrentsProvider {
    http: reqwest::Client,
    api_key: Option<String>,
}

impl CurrentsProvider {
    pub fn new(api_key: Option<String>, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            http: build_http(timeout)?,
            api_key,
        })
    }
}

#[async_trait::async_trait]
impl NewsProvider for CurrentsProvider {
    fn name(&self) -> &'static str {
        "currents"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch_articles(&self, query: &NewsQuery) -> anyhow::Result<Vec<RawArticle>> {
        let Some(api_key) = self.api_key.as_deref() else {
            anyhow::bail!("CURRENTS_API_KEY is not set");
        };
        let raw = get_json(
            &self.http,
            BASE_URL,
            &[
                ("keywords", query.keywords.as_str()),
                ("language", "en"),
                ("country", "IN"),
                ("category", "finance"),
                ("apiKey", api_key),
            ],
        )
        .await?;
        articles_from_search(&raw)
    }
}

pub fn articles_from_search(raw: &Value) -> anyhow::Result<Vec<RawArticle>> {
    let body = serde_json::from_value::<SearchResponse>(raw.clone())
        .context("failed to decode Currents response")?;

    if body.status.as_deref().is_some_and(|s| s != "ok") {
        anyhow::bail!("Currents status {:?}", body.status);
    }

    Ok(body
        .news
        .into_iter()
        .map(|n| RawArticle {
            source: n
                .author
                .filter(|a| !a.trim().is_empty())
                .unwrap_or_else(|| source_from_url(&n.url)),
            title: n.title,
            description: n.description.unwrap_or_default(),
            published_at: n.published.as_deref().and_then(parse_published),
            url: n.url,
            sentiment_label: None,
        })
        .collect())
}

// Currents publishes "2026-01-05 06:00:00 +0000".
fn parse_published(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S %z")
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn source_from_url(url: &str) -> String {
    url.split("://")
        .nth(1)
        .and_then(|rest| rest.split('/').next())
        .map(|host| host.trim_start_matches("www.").to_string())
        .filter(|host| !host.is_empty())
        .unwrap_or_else(|| "Currents".to_string())
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    news: Vec<CurrentsArticle>,
}

#[derive(Debug, Deserialize)]
struct CurrentsArticle {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    url: String,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    published: Option<String>,
}
