pub mod assistant;
pub mod domain;
pub mod llm;
pub mod prompt;
pub mod providers;
pub mod symbol;
pub mod time;

pub mod config {
    use anyhow::Context;
    use std::time::Duration;

    const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 8;
    const DEFAULT_GEMINI_TIMEOUT_SECS: u64 = 60;
    pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash-latest";
    pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
    pub const DEFAULT_YAHOO_CHART_BASE_URL: &str =
        "https://query1.finance.yahoo.com/v8/finance/chart";

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum QuoteProviderKind {
        Yahoo,
        AlphaVantage,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum NewsProviderKind {
        Currents,
        AlphaVantage,
        GNews,
    }

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub gemini_api_key: Option<String>,
        pub gemini_model: String,
        pub gemini_base_url: String,
        pub gemini_timeout: Duration,
        pub yahoo_chart_base_url: String,
        pub alpha_vantage_api_key: Option<String>,
        pub currents_api_key: Option<String>,
        pub gnews_api_key: Option<String>,
        pub sentry_dsn: Option<String>,
        pub provider_timeout: Duration,
        pub quote_providers: Vec<QuoteProviderKind>,
        pub news_providers: Vec<NewsProviderKind>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                gemini_api_key: non_empty_var("GEMINI_API_KEY"),
                gemini_model: non_empty_var("GEMINI_MODEL")
                    .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
                gemini_base_url: non_empty_var("GEMINI_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
                gemini_timeout: parse_timeout(
                    "GEMINI_TIMEOUT_SECS",
                    non_empty_var("GEMINI_TIMEOUT_SECS"),
                    DEFAULT_GEMINI_TIMEOUT_SECS,
                )?,
                yahoo_chart_base_url: non_empty_var("YAHOO_CHART_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_YAHOO_CHART_BASE_URL.to_string()),
                alpha_vantage_api_key: non_empty_var("ALPHA_VANTAGE_API_KEY"),
                currents_api_key: non_empty_var("CURRENTS_API_KEY"),
                gnews_api_key: non_empty_var("GNEWS_API_KEY"),
                sentry_dsn: non_empty_var("SENTRY_DSN"),
                provider_timeout: parse_timeout(
                    "PROVIDER_TIMEOUT_SECS",
                    non_empty_var("PROVIDER_TIMEOUT_SECS"),
                    DEFAULT_PROVIDER_TIMEOUT_SECS,
                )?,
                quote_providers: parse_quote_providers(std::env::var("QUOTE_PROVIDERS").ok()),
                news_providers: parse_news_providers(std::env::var("NEWS_PROVIDERS").ok()),
            })
        }

        pub fn require_gemini_api_key(&self) -> anyhow::Result<&str> {
            self.gemini_api_key
                .as_deref()
                .context("GEMINI_API_KEY is required")
        }
    }

    impl Default for Settings {
        /// No keys configured: only the keyless quote provider and the news fallback are usable.
        fn default() -> Self {
            Self {
                gemini_api_key: None,
                gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
                gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
                gemini_timeout: Duration::from_secs(DEFAULT_GEMINI_TIMEOUT_SECS),
                yahoo_chart_base_url: DEFAULT_YAHOO_CHART_BASE_URL.to_string(),
                alpha_vantage_api_key: None,
                currents_api_key: None,
                gnews_api_key: None,
                sentry_dsn: None,
                provider_timeout: Duration::from_secs(DEFAULT_PROVIDER_TIMEOUT_SECS),
                quote_providers: parse_quote_providers(None),
                news_providers: parse_news_providers(None),
            }
        }
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Whole seconds, at least one. Unset means `default_secs`.
    pub fn parse_timeout(
        key: &str,
        v: Option<String>,
        default_secs: u64,
    ) -> anyhow::Result<Duration> {
        let Some(v) = v else {
            return Ok(Duration::from_secs(default_secs));
        };
        let secs = v
            .trim()
            .parse::<u64>()
            .with_context(|| format!("{key} is not a number: {v}"))?;
        anyhow::ensure!(secs > 0, "{key} must be at least 1 second");
        Ok(Duration::from_secs(secs))
    }

    pub fn parse_quote_providers(v: Option<String>) -> Vec<QuoteProviderKind> {
        let mut out = Vec::new();
        if let Some(v) = v {
            for part in v.split(',') {
                let kind = match normalize_name(part).as_str() {
                    "yahoo" => QuoteProviderKind::Yahoo,
                    "alphavantage" => QuoteProviderKind::AlphaVantage,
                    _ => continue,
                };
                if !out.contains(&kind) {
                    out.push(kind);
                }
            }
        }
        if out.is_empty() {
            out.push(QuoteProviderKind::Yahoo);
            out.push(QuoteProviderKind::AlphaVantage);
        }
        out
    }

    pub fn parse_news_providers(v: Option<String>) -> Vec<NewsProviderKind> {
        let mut out = Vec::new();
        if let Some(v) = v {
            for part in v.split(',') {
                let kind = match normalize_name(part).as_str() {
                    "currents" => NewsProviderKind::Currents,
                    "alphavantage" => NewsProviderKind::AlphaVantage,
                    "gnews" => NewsProviderKind::GNews,
                    _ => continue,
                };
                if !out.contains(&kind) {
                    out.push(kind);
                }
            }
        }
        if out.is_empty() {
            out.push(NewsProviderKind::Currents);
            out.push(NewsProviderKind::AlphaVantage);
            out.push(NewsProviderKind::GNews);
        }
        out
    }

    // "alpha_vantage", "Alpha-Vantage" and "alphavantage" all name the same provider.
    fn normalize_name(s: &str) -> String {
        s.trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect()
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn provider_lists_keep_configured_order() {
            let quotes = parse_quote_providers(Some("alpha_vantage, yahoo".to_string()));
            assert_eq!(
                quotes,
                vec![QuoteProviderKind::AlphaVantage, QuoteProviderKind::Yahoo]
            );

            let news = parse_news_providers(Some("GNews,Currents,gnews".to_string()));
            assert_eq!(
                news,
                vec![NewsProviderKind::GNews, NewsProviderKind::Currents]
            );
        }

        #[test]
        fn timeouts_must_be_positive_whole_seconds() {
            assert_eq!(
                parse_timeout("GEMINI_TIMEOUT_SECS", None, 60).unwrap(),
                Duration::from_secs(60)
            );
            assert_eq!(
                parse_timeout("PROVIDER_TIMEOUT_SECS", Some(" 3 ".to_string()), 8).unwrap(),
                Duration::from_secs(3)
            );

            let zero = parse_timeout("PROVIDER_TIMEOUT_SECS", Some("0".to_string()), 8);
            assert!(zero.unwrap_err().to_string().contains("at least 1 second"));

            let junk = parse_timeout("GEMINI_TIMEOUT_SECS", Some("soon".to_string()), 60);
            assert!(junk.unwrap_err().to_string().contains("GEMINI_TIMEOUT_SECS"));
        }

        #[test]
        fn defaults_carry_endpoints() {
            let s = Settings::default();
            assert_eq!(s.gemini_model, DEFAULT_GEMINI_MODEL);
            assert_eq!(s.yahoo_chart_base_url, DEFAULT_YAHOO_CHART_BASE_URL);
            assert!(s.provider_timeout > Duration::ZERO);
        }

        #[test]
        fn unknown_or_empty_lists_fall_back_to_default_order() {
            assert_eq!(
                parse_quote_providers(Some("bloomberg".to_string())),
                vec![QuoteProviderKind::Yahoo, QuoteProviderKind::AlphaVantage]
            );
            assert_eq!(parse_news_providers(Some(String::new())).len(), 3);
            assert_eq!(parse_news_providers(None)[0], NewsProviderKind::Currents);
        }
    }
}
