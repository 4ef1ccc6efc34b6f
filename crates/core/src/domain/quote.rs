use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A normalized live quote. Always comes from exactly one provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResult {
    pub source: String,
    pub symbol: String,
    pub price: f64,
    pub previous_close: f64,
    pub change: f64,
    pub change_percent: f64,
    pub volume: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl QuoteResult {
    /// Fills `change`/`change_percent` from price and previous close.
    pub fn with_derived_change(mut self) -> Self {
        self.change = self.price - self.previous_close;
        self.change_percent = if self.previous_close != 0.0 {
            self.change / self.previous_close * 100.0
        } else {
            0.0
        };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn derives_change_from_previous_close() {
        let q = QuoteResult {
            source: "test".to_string(),
            symbol: "TCS".to_string(),
            price: 110.0,
            previous_close: 100.0,
            change: 0.0,
            change_percent: 0.0,
            volume: 1,
            market_cap: None,
            company_name: None,
            exchange: None,
            timestamp: Utc.with_ymd_and_hms(2026, 1, 5, 6, 0, 0).unwrap(),
        }
        .with_derived_change();

        assert!((q.change - 10.0).abs() < 1e-9);
        assert!((q.change_percent - 10.0).abs() < 1e-9);

        let v = serde_json::to_value(&q).unwrap();
        assert!(v.get("previousClose").is_some());
        assert!(v.get("marketCap").is_none());
    }
}
