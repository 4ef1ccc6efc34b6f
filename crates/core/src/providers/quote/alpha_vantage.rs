use crate::domain::quote::QuoteResult;
use crate::providers::quote::QuoteProvider;
use crate::providers::{bare_symbol, build_http, exchange_symbol, get_json};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use std::time::Duration;

pub(crate) const BASE_URL: &str = "https://www.alphavantage.co/query";
pub(crate) const BSE_SUFFIX: &str = ".BSE";

/// Keyed backup quote source (`GLOBAL_QUOTE`).
#[derive(Debug, Clone)]
pub struct AlphaVantageQuoteProvider {
    http: reqwest::Client,
    api_key: Option<String>,
}

impl AlphaVantageQuoteProvider {
    pub fn new(api_key: Option<String>, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            http: build_http(timeout)?,
            api_key,
        })
    }
}

#[async_trait::async_trait]
impl QuoteProvider for AlphaVantageQuoteProvider {
    fn name(&self) -> &'static str {
        "alpha_vantage"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch_quote(&self, symbol: &str) -> anyhow::Result<Option<QuoteResult>> {
        let Some(api_key) = self.api_key.as_deref() else {
            anyhow::bail!("ALPHA_VANTAGE_API_KEY is not set");
        };
        let ticker = exchange_symbol(symbol, BSE_SUFFIX);
        let raw = get_json(
            &self.http,
            BASE_URL,
            &[
                ("function", "GLOBAL_QUOTE"),
                ("symbol", ticker.as_str()),
                ("apikey", api_key),
            ],
        )
        .await?;
        quote_from_global_quote(self.name(), symbol, &raw, Utc::now())
    }
}

/// Alpha Vantage answers rate limiting and bad keys with HTTP 200 and a message body.
pub(crate) fn ensure_not_throttled(raw: &Value) -> anyhow::Result<()> {
    for key in ["Error Message", "Note", "Information"] {
        if let Some(msg) = raw.get(key) {
            anyhow::bail!("Alpha Vantage {key}: {msg}");
        }
    }
    Ok(())
}

pub fn quote_from_global_quote(
    source: &str,
    symbol: &str,
    raw: &Value,
    now: DateTime<Utc>,
) -> anyhow::Result<Option<QuoteResult>> {
    ensure_not_throttled(raw)?;

    let Some(q) = raw.get("Global Quote").filter(|q| {
        q.as_object().is_some_and(|o| !o.is_empty())
    }) else {
        return Ok(None);
    };

    let field = |name: &str| -> Option<f64> {
        q.get(name)
            .and_then(Value::as_str)
            .map(|s| s.trim().trim_end_matches('%'))
            .and_then(|s| s.parse::<f64>().ok())
    };

    let Some(price) = field("05. price").filter(|p| *p > 0.0) else {
        return Ok(None);
    };
    let previous_close = field("08. previous close").unwrap_or(price);

    let timestamp = q
        .get("07. latest trading day")
        .and_then(Value::as_str)
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or(now);

    let mut quote = QuoteResult {
        source: source.to_string(),
        symbol: bare_symbol(symbol).to_ascii_uppercase(),
        price,
        previous_close,
        change: 0.0,
        change_percent: 0.0,
        volume: field("06. volume").map(|v| v as u64).unwrap_or(0),
        market_cap: None,
        company_name: None,
        exchange: Some("BSE".to_string()),
        timestamp,
    }
    .with_derived_change();

    // Prefer the provider's own change figures when present.
    if let Some(change) = field("09. change") {
        quote.change = change;
    }
    if let Some(pct) = field("10. change percent") {
        quote.change_percent = pct;
    }

    Ok(Some(quote))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 5, 6, 0, 0).unwrap()
    }

    #[test]
    fn maps_global_quote() {
        let raw = json!({
            "Global Quote": {
                "01. symbol": "RELIANCE.BSE",
                "05. price": "2950.5000",
                "06. volume": "812345",
                "07. latest trading day": "2026-01-02",
                "08. previous close": "2900.0000",
                "09. change": "50.5000",
                "10. change percent": "1.7414%"
            }
        });

        let q = quote_from_global_quote("alpha_vantage", "RELIANCE", &raw, now())
            .unwrap()
            .unwrap();
        assert_eq!(q.symbol, "RELIANCE");
        assert_eq!(q.volume, 812_345);
        assert!((q.change - 50.5).abs() < 1e-9);
        assert!((q.change_percent - 1.7414).abs() < 1e-9);
        assert_eq!(q.timestamp, Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap());
        assert_eq!(q.exchange.as_deref(), Some("BSE"));
    }

    #[test]
    fn empty_global_quote_is_no_data() {
        let raw = json!({"Global Quote": {}});
        assert!(quote_from_global_quote("alpha_vantage", "XYZ", &raw, now())
            .unwrap()
            .is_none());
    }

    #[test]
    fn rate_limit_note_is_a_failure() {
        let raw = json!({"Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute"});
        let err = quote_from_global_quote("alpha_vantage", "TCS", &raw, now()).unwrap_err();
        assert!(err.to_string().contains("Note"));
    }

    #[test]
    fn unconfigured_without_key() {
        let p = AlphaVantageQuoteProvider::new(None, Duration::from_secs(1)).unwrap();
        assert!(!p.is_configured());
        let p = AlphaVantageQuoteProvider::new(Some("k".to_string()), Duration::from_secs(1))
            .unwrap();
        assert!(p.is_configured());
    }
}
