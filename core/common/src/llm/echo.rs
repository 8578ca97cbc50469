//! Echo プロバイダの実装
//!
//! 実際に LLM API を呼び出さず、固定レスポンスを返す。
//! ネットワークに出ないテスト・ドライラン用。

use crate::error::Error;
use crate::llm::provider::{LlmProvider, Message};
use serde_json::{json, Value};

/// Echo プロバイダ
#[derive(Debug, Clone, Default)]
pub struct EchoProvider;

impl EchoProvider {
    pub fn new() -> Self {
        Self
    }
}

impl LlmProvider for EchoProvider {
    fn name(&self) -> &str {
        "echo"
    }

    fn make_request_payload(
        &self,
        query: &str,
        system_instruction: Option<&str>,
        history: &[Message],
    ) -> Result<Value, Error> {
        Ok(json!({
            "echo": true,
            "query": query,
            "system": system_instruction,
            "history_len": history.len(),
        }))
    }

    fn make_http_request(&self, _request_json: &str) -> Result<String, Error> {
        Ok(r#"{"echo": "This is a dummy response from echo provider"}"#.to_string())
    }

    fn parse_response_text(&self, _response_json: &str) -> Result<Option<String>, Error> {
        Ok(Some(
            "[Echo Provider] Query received (no actual LLM call made)".to_string(),
        ))
    }
}
