//! LLM ドライバーの実装
//!
//! プロバイダに依存しない共通処理（ペイロード生成 → 送信 → 抽出）を提供する。

use crate::error::Error;
use crate::llm::provider::{LlmProvider, Message};

/// LLM ドライバー
pub struct LlmDriver<P: LlmProvider> {
    provider: P,
}

impl<P: LlmProvider> LlmDriver<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// LLM にクエリを送信してレスポンステキストを取得する
    pub fn query(
        &self,
        query: &str,
        system_instruction: Option<&str>,
        history: &[Message],
    ) -> Result<String, Error> {
        let payload = self
            .provider
            .make_request_payload(query, system_instruction, history)?;
        let request_json = serde_json::to_string(&payload)
            .map_err(|e| Error::json(format!("Failed to serialize request: {}", e)))?;
        let response_json = self.provider.make_http_request(&request_json)?;
        let text = self
            .provider
            .parse_response_text(&response_json)?
            .ok_or_else(|| Error::http("No text in response".to_string()))?;
        Ok(text)
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    struct MockProvider {
        response: &'static str,
    }

    impl LlmProvider for MockProvider {
        fn name(&self) -> &str {
            "mock"
        }

        fn make_request_payload(
            &self,
            query: &str,
            _system_instruction: Option<&str>,
            _history: &[Message],
        ) -> Result<Value, Error> {
            Ok(json!({ "q": query }))
        }

        fn make_http_request(&self, _request_json: &str) -> Result<String, Error> {
            Ok(self.response.to_string())
        }

        fn parse_response_text(&self, response_json: &str) -> Result<Option<String>, Error> {
            let v: Value = serde_json::from_str(response_json)
                .map_err(|e| Error::json(e.to_string()))?;
            Ok(v["text"].as_str().map(|s| s.to_string()))
        }
    }

    #[test]
    fn test_query_extracts_text() {
        let driver = LlmDriver::new(MockProvider {
            response: r#"{"text":"Hello, world!"}"#,
        });
        assert_eq!(driver.query("test", None, &[]).unwrap(), "Hello, world!");
    }

    #[test]
    fn test_query_no_text_is_http_error() {
        let driver = LlmDriver::new(MockProvider {
            response: r#"{"other":1}"#,
        });
        let err = driver.query("test", None, &[]).unwrap_err();
        assert_eq!(err.exit_code(), 69);
    }

    #[test]
    fn test_provider_accessor() {
        let driver = LlmDriver::new(MockProvider { response: "{}" });
        assert_eq!(driver.provider().name(), "mock");
    }
}
