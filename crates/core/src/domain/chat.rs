use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const CHAT_APOLOGY: &str = "I apologize for the technical difficulty. As your Indian stock market assistant, I can still help with general market analysis and investment guidance. Please try your question again, and I'll provide the best insights I can while recommending reliable sources for real-time data.";

pub const PLAIN_CHAT_APOLOGY: &str = "Sorry, I encountered an error. Please try again.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub context: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub response: String,
    pub web_data_used: Vec<String>,
    pub stock_symbol: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_sources: Option<BTreeMap<String, bool>>,
}

/// Reply of the plain assistant, which does no data gathering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlainChatResponse {
    pub response: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn request_context_is_optional() {
        let req: ChatRequest = serde_json::from_value(json!({"message": "hi"})).unwrap();
        assert_eq!(req.message, "hi");
        assert!(req.context.is_empty());
    }

    #[test]
    fn response_uses_wire_field_names() {
        let res = ChatResponse {
            response: "ok".to_string(),
            web_data_used: vec!["Live Stock Prices".to_string()],
            stock_symbol: None,
            timestamp: Utc.with_ymd_and_hms(2026, 1, 5, 6, 0, 0).unwrap(),
            debug: None,
            api_sources: None,
        };
        let v = serde_json::to_value(&res).unwrap();
        assert_eq!(v["webDataUsed"][0], "Live Stock Prices");
        assert!(v["stockSymbol"].is_null());
        assert!(v.get("debug").is_none());
        assert!(v.get("apiSources").is_none());
    }
}
