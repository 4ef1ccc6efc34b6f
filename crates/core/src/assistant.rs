//! The chat pipeline: extract a ticker, gather quote and news data, build one prompt, make one
//! completion call. Provider failures only narrow the prompt; the completion call is the single
//! failure that reaches the caller.

use crate::config::Settings;
use crate::domain::chat::{ChatRequest, ChatResponse, PlainChatResponse};
use crate::llm::gemini::GeminiClient;
use crate::llm::{GenerationConfig, LlmClient};
use crate::prompt::{build_prompt, plain_chat_prompt, PromptInput};
use crate::providers::news::{NewsChain, NewsLookup, NewsQuery};
use crate::providers::quote::{QuoteChain, QuoteLookup};
use crate::symbol::extract_symbol;
use crate::time::in_market::{market_session, MarketSession};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::Instrument;

pub const LIVE_PRICES_LABEL: &str = "Live Stock Prices";
pub const LIVE_NEWS_LABEL: &str = "Enhanced Multi-Source News";
pub const FALLBACK_NEWS_LABEL: &str = "Curated News Headlines (offline)";

#[derive(Debug)]
pub enum ChatError {
    /// The completion call failed. Nothing else in the pipeline is fatal.
    Llm(anyhow::Error),
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatError::Llm(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ChatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            // Display already shows the outermost message.
            ChatError::Llm(err) => err.chain().nth(1),
        }
    }
}

/// Everything gathered for one message before the prompt is built.
#[derive(Debug, Clone)]
pub struct MarketData {
    pub symbol: Option<String>,
    pub session: MarketSession,
    /// `None` when no symbol was extracted and the quote chain never ran.
    pub quote: Option<QuoteLookup>,
    pub news: NewsLookup,
}

impl MarketData {
    pub fn prompt_input<'a>(&'a self, req: &'a ChatRequest) -> PromptInput<'a> {
        PromptInput {
            message: &req.message,
            context: &req.context,
            session: self.session,
            symbol: self.symbol.as_deref(),
            quote: self.quote.as_ref().and_then(|l| l.quote.as_ref()),
            news: Some(&self.news.result),
        }
    }

    pub fn web_data_used(&self) -> Vec<String> {
        let mut out = Vec::new();
        if self.quote.as_ref().is_some_and(|l| l.quote.is_some()) {
            out.push(LIVE_PRICES_LABEL.to_string());
        }
        if !self.news.result.articles.is_empty() {
            let label = if self.news.result.fallback {
                FALLBACK_NEWS_LABEL
            } else {
                LIVE_NEWS_LABEL
            };
            out.push(label.to_string());
        }
        out
    }

    fn debug_json(&self, prompt_len: usize) -> serde_json::Value {
        let quote = self.quote.as_ref();
        json!({
            "quoteAttempts": quote.map(|l| &l.attempts),
            "quoteSource": quote.and_then(|l| l.quote.as_ref()).map(|q| &q.source),
            "quoteUnavailableReason": quote.and_then(|l| l.unavailable_reason.as_deref()),
            "newsAttempts": &self.news.attempts,
            "newsSource": &self.news.result.source,
            "newsFallback": self.news.result.fallback,
            "newsArticles": self.news.result.articles.len(),
            "marketSession": self.session,
            "promptLength": prompt_len,
        })
    }
}

/// Runs extraction and both provider chains, one after the other.
pub async fn gather(
    quotes: &QuoteChain,
    news: &NewsChain,
    message: &str,
    now: DateTime<Utc>,
) -> MarketData {
    let symbol = extract_symbol(message);

    let quote = match symbol.as_deref() {
        Some(symbol) => Some(quotes.lookup(symbol).await),
        None => None,
    };

    let query = NewsQuery::for_symbol(symbol.as_deref());
    let news = news.lookup(&query, now).await;

    MarketData {
        symbol,
        session: market_session(now),
        quote,
        news,
    }
}

#[derive(Clone)]
pub struct ChatAssistant {
    quotes: QuoteChain,
    news: NewsChain,
    llm: Arc<dyn LlmClient>,
}

impl ChatAssistant {
    pub fn new(quotes: QuoteChain, news: NewsChain, llm: Arc<dyn LlmClient>) -> Self {
        Self { quotes, news, llm }
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Ok(Self::new(
            QuoteChain::from_settings(settings)?,
            NewsChain::from_settings(settings)?,
            Arc::new(GeminiClient::from_settings(settings)?),
        ))
    }

    pub async fn gather(&self, message: &str, now: DateTime<Utc>) -> MarketData {
        gather(&self.quotes, &self.news, message, now).await
    }

    /// Provider name to "has the key it needs".
    pub fn api_sources(&self) -> BTreeMap<String, bool> {
        let quotes = self
            .quotes
            .providers()
            .map(|p| (format!("quote.{}", p.name()), p.is_configured()));
        let news = self
            .news
            .providers()
            .map(|p| (format!("news.{}", p.name()), p.is_configured()));
        quotes.chain(news).collect()
    }

    pub async fn respond(&self, req: &ChatRequest) -> Result<ChatResponse, ChatError> {
        self.respond_at(req, Utc::now()).await
    }

    pub async fn respond_at(
        &self,
        req: &ChatRequest,
        now: DateTime<Utc>,
    ) -> Result<ChatResponse, ChatError> {
        let data = self.gather(&req.message, now).await;
        let prompt = build_prompt(&data.prompt_input(req));
        let web_data_used = data.web_data_used();

        let span = tracing::info_span!(
            "completion",
            symbol = data.symbol.as_deref().unwrap_or("-"),
            prompt_len = prompt.len(),
        );
        tracing::info!(
            symbol = data.symbol.as_deref().unwrap_or("-"),
            data = ?web_data_used,
            "sending chat prompt"
        );

        let response = self
            .llm
            .complete(&prompt, &GenerationConfig::CHAT)
            .instrument(span)
            .await
            .map_err(|err| {
                tracing::error!(error = %err, "chat completion failed");
                ChatError::Llm(err)
            })?;

        Ok(ChatResponse {
            response,
            web_data_used,
            stock_symbol: data.symbol.clone(),
            timestamp: now,
            debug: Some(data.debug_json(prompt.len())),
            api_sources: Some(self.api_sources()),
        })
    }

    /// The simple assistant: no data gathering, a single conversational turn.
    pub async fn plain_chat(&self, req: &ChatRequest) -> Result<PlainChatResponse, ChatError> {
        let prompt = plain_chat_prompt(&req.message, &req.context);
        let response = self
            .llm
            .complete(&prompt, &GenerationConfig::PLAIN)
            .await
            .map_err(|err| {
                tracing::error!(error = %err, "plain chat completion failed");
                ChatError::Llm(err)
            })?;

        Ok(PlainChatResponse {
            response,
            timestamp: Utc::now(),
        })
    }
}
