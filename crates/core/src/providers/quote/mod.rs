pub mod alpha_vantage;
pub mod yahoo;

use crate::config::{QuoteProviderKind, Settings};
use crate::domain::quote::QuoteResult;
use crate::providers::{guarded, AttemptOutcome, ProviderAttempt};
use std::sync::Arc;
use std::time::Duration;

// Company names longer than this are cut before they reach a prompt.
pub const MAX_COMPANY_NAME_CHARS: usize = 120;

#[async_trait::async_trait]
pub trait QuoteProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// False when a required API key is missing. Unconfigured providers are never called.
    fn is_configured(&self) -> bool {
        true
    }

    /// `Ok(None)` means the provider answered but had nothing usable for `symbol`.
    async fn fetch_quote(&self, symbol: &str) -> anyhow::Result<Option<QuoteResult>>;
}

#[derive(Debug, Clone)]
pub struct QuoteLookup {
    pub quote: Option<QuoteResult>,
    pub attempts: Vec<ProviderAttempt>,
    pub unavailable_reason: Option<String>,
}

#[derive(Clone)]
pub struct QuoteChain {
    providers: Vec<Arc<dyn QuoteProvider>>,
    timeout: Duration,
}

impl QuoteChain {
    pub fn new(providers: Vec<Arc<dyn QuoteProvider>>, timeout: Duration) -> Self {
        Self { providers, timeout }
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let mut providers: Vec<Arc<dyn QuoteProvider>> = Vec::new();
        for kind in &settings.quote_providers {
            match kind {
                QuoteProviderKind::Yahoo => {
                    providers.push(Arc::new(yahoo::YahooChartProvider::new(
                        settings.yahoo_chart_base_url.as_str(),
                        settings.provider_timeout,
                    )?));
                }
                QuoteProviderKind::AlphaVantage => {
                    providers.push(Arc::new(alpha_vantage::AlphaVantageQuoteProvider::new(
                        settings.alpha_vantage_api_key.clone(),
                        settings.provider_timeout,
                    )?));
                }
            }
        }
        Ok(Self::new(providers, settings.provider_timeout))
    }

    pub fn providers(&self) -> impl Iterator<Item = &dyn QuoteProvider> {
        self.providers.iter().map(|p| p.as_ref())
    }

    /// Tries each provider once, in order, and keeps the first quote returned.
    pub async fn lookup(&self, symbol: &str) -> QuoteLookup {
        let mut attempts = Vec::with_capacity(self.providers.len());

        for provider in &self.providers {
            if !provider.is_configured() {
                attempts.push(ProviderAttempt::skipped(provider.name(), "not configured"));
                continue;
            }

            let (quote, attempt) =
                guarded(provider.name(), self.timeout, provider.fetch_quote(symbol)).await;
            attempts.push(attempt);

            if let Some(quote) = quote {
                return QuoteLookup {
                    quote: Some(quote),
                    attempts,
                    unavailable_reason: None,
                };
            }
        }

        let reason = unavailable_reason(&attempts);
        tracing::warn!(%symbol, %reason, "no quote provider returned data");
        QuoteLookup {
            quote: None,
            attempts,
            unavailable_reason: Some(reason),
        }
    }
}

fn unavailable_reason(attempts: &[ProviderAttempt]) -> String {
    if attempts.is_empty() {
        return "no quote providers configured".to_string();
    }
    if attempts
        .iter()
        .all(|a| a.outcome == AttemptOutcome::Skipped)
    {
        return "all quote providers unconfigured".to_string();
    }
    let failed: Vec<&str> = attempts
        .iter()
        .filter(|a| a.outcome == AttemptOutcome::Failed)
        .map(|a| a.provider.as_str())
        .collect();
    format!("quote providers failed: {}", failed.join(", "))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub(crate) fn sample_quote(source: &str, symbol: &str, price: f64) -> QuoteResult {
        QuoteResult {
            source: source.to_string(),
            symbol: symbol.to_string(),
            price,
            previous_close: price - 10.0,
            change: 10.0,
            change_percent: 10.0 / (price - 10.0) * 100.0,
            volume: 1_000_000,
            market_cap: None,
            company_name: Some(format!("{symbol} Ltd")),
            exchange: Some("NSE".to_string()),
            timestamp: Utc.with_ymd_and_hms(2026, 1, 5, 6, 0, 0).unwrap(),
        }
    }

    pub(crate) enum Behavior {
        Fail,
        Empty,
        Hang,
        Succeed(f64),
    }

    pub(crate) struct FakeQuoteProvider {
        pub name: &'static str,
        pub configured: bool,
        pub behavior: Behavior,
        pub calls: AtomicUsize,
    }

    impl FakeQuoteProvider {
        pub(crate) fn new(name: &'static str, behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                name,
                configured: true,
                behavior,
                calls: AtomicUsize::new(0),
            })
        }

        pub(crate) fn unconfigured(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                configured: false,
                behavior: Behavior::Succeed(1.0),
                calls: AtomicUsize::new(0),
            })
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl QuoteProvider for FakeQuoteProvider {
        fn name(&self) -> &'static str {
            self.name
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn fetch_quote(&self, symbol: &str) -> anyhow::Result<Option<QuoteResult>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behavior {
                Behavior::Fail => anyhow::bail!("provider HTTP 429 Too Many Requests"),
                Behavior::Empty => Ok(None),
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok(None)
                }
                Behavior::Succeed(price) => Ok(Some(sample_quote(self.name, symbol, price))),
            }
        }
    }

    #[tokio::test]
    async fn second_provider_wins_when_first_fails() {
        let first = FakeQuoteProvider::new("primary", Behavior::Fail);
        let second = FakeQuoteProvider::new("backup", Behavior::Succeed(3900.0));
        let providers: Vec<Arc<dyn QuoteProvider>> = vec![first.clone(), second.clone()];
        let chain = QuoteChain::new(providers, Duration::from_secs(1));

        let lookup = chain.lookup("TCS").await;
        let quote = lookup.quote.unwrap();
        assert_eq!(quote.source, "backup");
        assert_eq!(quote, sample_quote("backup", "TCS", 3900.0));
        assert_eq!(lookup.attempts.len(), 2);
        assert_eq!(lookup.attempts[0].outcome, AttemptOutcome::Failed);
        assert_eq!(lookup.attempts[1].outcome, AttemptOutcome::Succeeded);
        assert!(lookup.unavailable_reason.is_none());
    }

    #[tokio::test]
    async fn stops_at_first_success() {
        let first = FakeQuoteProvider::new("primary", Behavior::Succeed(100.0));
        let second = FakeQuoteProvider::new("backup", Behavior::Succeed(200.0));
        let providers: Vec<Arc<dyn QuoteProvider>> = vec![first.clone(), second.clone()];
        let chain = QuoteChain::new(providers, Duration::from_secs(1));

        let lookup = chain.lookup("INFY").await;
        assert_eq!(lookup.quote.unwrap().source, "primary");
        assert_eq!(first.calls(), 1);
        assert_eq!(second.calls(), 0);
    }

    #[tokio::test]
    async fn unconfigured_providers_are_skipped_without_a_call() {
        let keyed = FakeQuoteProvider::unconfigured("keyed");
        let providers: Vec<Arc<dyn QuoteProvider>> = vec![keyed.clone()];
        let chain = QuoteChain::new(providers, Duration::from_secs(1));

        let lookup = chain.lookup("TCS").await;
        assert!(lookup.quote.is_none());
        assert_eq!(keyed.calls(), 0);
        assert_eq!(lookup.attempts[0].outcome, AttemptOutcome::Skipped);
        assert_eq!(
            lookup.unavailable_reason.as_deref(),
            Some("all quote providers unconfigured")
        );
    }

    #[tokio::test]
    async fn timeouts_and_empty_results_advance_the_chain() {
        let slow = FakeQuoteProvider::new("slow", Behavior::Hang);
        let empty = FakeQuoteProvider::new("empty", Behavior::Empty);
        let providers: Vec<Arc<dyn QuoteProvider>> = vec![slow.clone(), empty.clone()];
        let chain = QuoteChain::new(providers, Duration::from_millis(20));

        let lookup = chain.lookup("TCS").await;
        assert!(lookup.quote.is_none());
        assert_eq!(slow.calls(), 1);
        assert_eq!(empty.calls(), 1);
        assert_eq!(
            lookup.unavailable_reason.as_deref(),
            Some("quote providers failed: slow, empty")
        );
    }
}
