use crate::llm::Provider;
use serde_json::Value;
use std::fmt;

/// A failed completion, with enough of the provider's answer kept to debug it.
#[derive(Debug, Clone)]
pub struct LlmDiagnosticsError {
    pub provider: Provider,
    /// "http" for a non-2xx status, "decode" for an unusable body.
    pub stage: &'static str,
    pub detail: String,
    pub raw_output: Option<String>,
    pub raw_response_json: Option<Value>,
}

impl LlmDiagnosticsError {
    /// HTTP status carried in `detail` for `stage == "http"`.
    pub fn status_code(&self) -> Option<u16> {
        if self.stage != "http" {
            return None;
        }
        self.detail
            .strip_prefix("status=")
            .and_then(|s| s.split_whitespace().next())
            .and_then(|s| s.parse().ok())
    }
}

impl fmt::Display for LlmDiagnosticsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "completion failed (provider={:?}, stage={}): {}",
            self.provider, self.stage, self.detail
        )
    }
}

impl std::error::Error for LlmDiagnosticsError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_status_from_http_errors() {
        let err = LlmDiagnosticsError {
            provider: Provider::Gemini,
            stage: "http",
            detail: "status=503 Service Unavailable".to_string(),
            raw_output: None,
            raw_response_json: None,
        };
        assert_eq!(err.status_code(), Some(503));
        assert!(err.to_string().contains("stage=http"));

        let anyhow_err: anyhow::Error = err.into();
        let back = anyhow_err.downcast_ref::<LlmDiagnosticsError>().unwrap();
        assert_eq!(back.provider, Provider::Gemini);
    }

    #[test]
    fn decode_errors_have_no_status() {
        let err = LlmDiagnosticsError {
            provider: Provider::Gemini,
            stage: "decode",
            detail: "no candidates".to_string(),
            raw_output: Some("{}".to_string()),
            raw_response_json: None,
        };
        assert_eq!(err.status_code(), None);
    }
}
