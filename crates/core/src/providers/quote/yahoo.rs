use crate::domain::quote::QuoteResult;
use crate::providers::quote::{QuoteProvider, MAX_COMPANY_NAME_CHARS};
use crate::providers::{bare_symbol, build_http, exchange_symbol, get_json, truncate_chars};
use anyhow::Context;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

const NSE_SUFFIX: &str = ".NS";

/// Keyless Yahoo Finance chart endpoint. Queried first since it needs no configuration.
#[derive(Debug, Clone)]
pub struct YahooChartProvider {
    http: reqwest::Client,
    base_url: String,
}

impl YahooChartProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            http: build_http(timeout)?,
            base_url: base_url.into(),
        })
    }
}

#[async_trait::async_trait]
impl QuoteProvider for YahooChartProvider {
    fn name(&self) -> &'static str {
        "yahoo_finance"
    }

    async fn fetch_quote(&self, symbol: &str) -> anyhow::Result<Option<QuoteResult>> {
        let ticker = exchange_symbol(symbol, NSE_SUFFIX);
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), ticker);
        let raw = get_json(&self.http, &url, &[("interval", "1d"), ("range", "1d")]).await?;
        quote_from_chart(self.name(), symbol, &raw, Utc::now())
    }
}

/// Maps `chart.result[0].meta` into a quote. `Ok(None)` when Yahoo has no price for the symbol.
pub fn quote_from_chart(
    source: &str,
    symbol: &str,
    raw: &Value,
    now: DateTime<Utc>,
) -> anyhow::Result<Option<QuoteResult>> {
    let body = serde_json::from_value::<ChartResponse>(raw.clone())
        .context("failed to decode Yahoo chart response")?;

    if let Some(err) = body.chart.error {
        anyhow::bail!("Yahoo chart error: {err}");
    }

    let Some(meta) = body
        .chart
        .result
        .into_iter()
        .flatten()
        .next()
        .map(|r| r.meta)
    else {
        return Ok(None);
    };
    let Some(price) = meta.regular_market_price.filter(|p| *p > 0.0) else {
        return Ok(None);
    };

    let previous_close = meta
        .chart_previous_close
        .or(meta.previous_close)
        .unwrap_or(price);

    let timestamp = meta
        .regular_market_time
        .and_then(|t| Utc.timestamp_opt(t, 0).single())
        .unwrap_or(now);

    let company_name = meta
        .long_name
        .or(meta.short_name)
        .map(|n| truncate_chars(n.trim(), MAX_COMPANY_NAME_CHARS));

    let quote = QuoteResult {
        source: source.to_string(),
        symbol: bare_symbol(symbol).to_ascii_uppercase(),
        price,
        previous_close,
        change: 0.0,
        change_percent: 0.0,
        volume: meta.regular_market_volume.unwrap_or(0),
        market_cap: None,
        company_name,
        exchange: meta.full_exchange_name.or(meta.exchange_name),
        timestamp,
    }
    .with_derived_change();

    Ok(Some(quote))
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    #[serde(default)]
    regular_market_price: Option<f64>,
    #[serde(default)]
    chart_previous_close: Option<f64>,
    #[serde(default)]
    previous_close: Option<f64>,
    #[serde(default)]
    regular_market_volume: Option<u64>,
    #[serde(default)]
    regular_market_time: Option<i64>,
    #[serde(default)]
    long_name: Option<String>,
    #[serde(default)]
    short_name: Option<String>,
    #[serde(default)]
    exchange_name: Option<String>,
    #[serde(default)]
    full_exchange_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 5, 6, 0, 0).unwrap()
    }

    #[test]
    fn maps_chart_meta_into_quote() {
        let raw = json!({
            "chart": {
                "result": [{
                    "meta": {
                        "currency": "INR",
                        "symbol": "TCS.NS",
                        "exchangeName": "NSI",
                        "fullExchangeName": "NSE",
                        "regularMarketPrice": 4000.0,
                        "chartPreviousClose": 3900.0,
                        "regularMarketVolume": 1234567,
                        "regularMarketTime": 1767592800,
                        "longName": "Tata Consultancy Services Limited"
                    }
                }],
                "error": null
            }
        });

        let q = quote_from_chart("yahoo_finance", "TCS", &raw, now())
            .unwrap()
            .unwrap();
        assert_eq!(q.symbol, "TCS");
        assert_eq!(q.source, "yahoo_finance");
        assert_eq!(q.volume, 1_234_567);
        assert_eq!(q.exchange.as_deref(), Some("NSE"));
        assert_eq!(
            q.company_name.as_deref(),
            Some("Tata Consultancy Services Limited")
        );
        assert!((q.change - 100.0).abs() < 1e-9);
        assert!((q.change_percent - 100.0 / 39.0).abs() < 1e-9);
        assert_eq!(q.timestamp, Utc.timestamp_opt(1767592800, 0).unwrap());
    }

    #[test]
    fn missing_price_is_no_data() {
        let raw = json!({"chart": {"result": [{"meta": {"symbol": "XYZ.NS"}}], "error": null}});
        assert!(quote_from_chart("yahoo_finance", "XYZ", &raw, now())
            .unwrap()
            .is_none());

        let empty = json!({"chart": {"result": [], "error": null}});
        assert!(quote_from_chart("yahoo_finance", "XYZ", &empty, now())
            .unwrap()
            .is_none());
    }

    #[test]
    fn chart_error_is_a_failure() {
        let raw = json!({
            "chart": {
                "result": null,
                "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}
            }
        });
        assert!(quote_from_chart("yahoo_finance", "XYZ", &raw, now()).is_err());
    }

    #[test]
    fn long_company_names_are_truncated() {
        let long_name = "A".repeat(500);
        let raw = json!({
            "chart": {"result": [{"meta": {"regularMarketPrice": 10.0, "longName": long_name}}]}
        });
        let q = quote_from_chart("yahoo_finance", "ABC", &raw, now())
            .unwrap()
            .unwrap();
        assert_eq!(
            q.company_name.unwrap().chars().count(),
            MAX_COMPANY_NAME_CHARS + 1
        );
        assert!((q.previous_close - 10.0).abs() < 1e-9);
    }
}
