use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewsCategory {
    Earnings,
    Corporate,
    Technical,
    Regulatory,
    Market,
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub fn glyph(self) -> &'static str {
        match self {
            Sentiment::Positive => "📈",
            Sentiment::Negative => "📉",
            Sentiment::Neutral => "➖",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub title: String,
    pub description: String,
    pub source: String,
    pub published_at: DateTime<Utc>,
    pub url: String,
    pub category: NewsCategory,
    pub sentiment: Sentiment,
    pub sentiment_glyph: String,
    pub time_ago: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsResult {
    pub source: String,
    pub articles: Vec<Article>,
    pub timestamp: DateTime<Utc>,
    /// Set when the articles are synthetic placeholders rather than live data.
    pub fallback: bool,
}
