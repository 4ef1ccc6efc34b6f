pub mod alpha_vantage;
pub mod classify;
pub mod currents;
pub mod fallback;
pub mod gnews;

use crate::config::{NewsProviderKind, Settings};
use crate::domain::news::{Article, NewsResult, Sentiment};
use crate::providers::{guarded, truncate_chars, ProviderAttempt};
use crate::symbol::company_aliases;
use crate::time::in_market::time_ago;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

pub const MAX_ARTICLES: usize = 8;
const MAX_DESCRIPTION_CHARS: usize = 300;
const GENERIC_KEYWORDS: &str = "Indian stock market Sensex Nifty";

/// An article as a provider returned it, before classification.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawArticle {
    pub title: String,
    pub description: String,
    pub source: String,
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,
    /// Provider-assigned sentiment label, e.g. "Somewhat-Bullish".
    pub sentiment_label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsQuery {
    pub symbol: Option<String>,
    pub keywords: String,
}

impl NewsQuery {
    /// Symbol plus company names and exchange words, or a market-wide query without a symbol.
    pub fn for_symbol(symbol: Option<&str>) -> Self {
        let Some(symbol) = symbol else {
            return Self {
                symbol: None,
                keywords: GENERIC_KEYWORDS.to_string(),
            };
        };

        let mut terms = vec![symbol.to_string()];
        terms.extend(company_aliases(symbol).into_iter().map(str::to_string));
        terms.extend(["NSE", "BSE", "India"].map(str::to_string));
        Self {
            symbol: Some(symbol.to_string()),
            keywords: terms.join(" "),
        }
    }

    /// What the articles are about, for headlines and prompts.
    pub fn topic(&self) -> &str {
        self.symbol.as_deref().unwrap_or("Indian stock market")
    }
}

#[async_trait::async_trait]
pub trait NewsProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn is_configured(&self) -> bool {
        true
    }

    /// Providers that can only search by ticker are skipped when no symbol was extracted.
    fn requires_symbol(&self) -> bool {
        false
    }

    async fn fetch_articles(&self, query: &NewsQuery) -> anyhow::Result<Vec<RawArticle>>;
}

#[derive(Debug, Clone)]
pub struct NewsLookup {
    pub result: NewsResult,
    pub attempts: Vec<ProviderAttempt>,
}

#[derive(Clone)]
pub struct NewsChain {
    providers: Vec<Arc<dyn NewsProvider>>,
    timeout: Duration,
}

impl NewsChain {
    pub fn new(providers: Vec<Arc<dyn NewsProvider>>, timeout: Duration) -> Self {
        Self { providers, timeout }
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let mut providers: Vec<Arc<dyn NewsProvider>> = Vec::new();
        for kind in &settings.news_providers {
            match kind {
                NewsProviderKind::Currents => {
                    providers.push(Arc::new(currents::CurrentsProvider::new(
                        settings.currents_api_key.clone(),
                        settings.provider_timeout,
                    )?));
                }
                NewsProviderKind::AlphaVantage => {
                    providers.push(Arc::new(alpha_vantage::AlphaVantageNewsProvider::new(
                        settings.alpha_vantage_api_key.clone(),
                        settings.provider_timeout,
                    )?));
                }
                NewsProviderKind::GNews => {
                    providers.push(Arc::new(gnews::GNewsProvider::new(
                        settings.gnews_api_key.clone(),
                        settings.provider_timeout,
                    )?));
                }
            }
        }
        Ok(Self::new(providers, settings.provider_timeout))
    }

    pub fn providers(&self) -> impl Iterator<Item = &dyn NewsProvider> {
        self.providers.iter().map(|p| p.as_ref())
    }

    /// Always yields a result: live articles from the first provider that has any, else the
    /// synthetic set from [`fallback::fallback_news`].
    pub async fn lookup(&self, query: &NewsQuery, now: DateTime<Utc>) -> NewsLookup {
        let mut attempts = Vec::with_capacity(self.providers.len());

        for provider in &self.providers {
            if !provider.is_configured() {
                attempts.push(ProviderAttempt::skipped(provider.name(), "not configured"));
                continue;
            }
            if provider.requires_symbol() && query.symbol.is_none() {
                attempts.push(ProviderAttempt::skipped(provider.name(), "needs a symbol"));
                continue;
            }

            let call = async {
                let raw = provider.fetch_articles(query).await?;
                let articles = normalize(raw, now);
                Ok::<_, anyhow::Error>((!articles.is_empty()).then_some(articles))
            };
            let (articles, attempt) = guarded(provider.name(), self.timeout, call).await;
            attempts.push(attempt);

            if let Some(articles) = articles {
                return NewsLookup {
                    result: NewsResult {
                        source: provider.name().to_string(),
                        articles,
                        timestamp: now,
                        fallback: false,
                    },
                    attempts,
                };
            }
        }

        tracing::warn!(
            symbol = query.symbol.as_deref().unwrap_or("-"),
            "no news provider returned articles; using fallback headlines"
        );
        NewsLookup {
            result: fallback::fallback_news(query, now),
            attempts,
        }
    }
}

/// Classifies and caps provider articles. Entries without a title are dropped.
pub fn normalize(raw: Vec<RawArticle>, now: DateTime<Utc>) -> Vec<Article> {
    raw.into_iter()
        .filter(|a| !a.title.trim().is_empty())
        .take(MAX_ARTICLES)
        .map(|a| {
            let title = a.title.trim().to_string();
            let description = truncate_chars(a.description.trim(), MAX_DESCRIPTION_CHARS);
            let category = classify::categorize(&title, &description);
            let sentiment = a
                .sentiment_label
                .as_deref()
                .map(classify::sentiment_from_label)
                .unwrap_or(Sentiment::Neutral);
            let published_at = a.published_at.unwrap_or(now);

            Article {
                title,
                description,
                source: a.source,
                published_at,
                url: a.url,
                category,
                sentiment,
                sentiment_glyph: sentiment.glyph().to_string(),
                time_ago: time_ago(published_at, now),
            }
        })
        .collect()
}
