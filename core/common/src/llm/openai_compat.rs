//! OpenAI Chat Completions 互換 (/chat/completions) プロバイダ
//!
//! base_url で任意のエンドポイントを指定可能（既定はローカルの Ollama 互換 API）。
//! API キーは環境変数名（api_key_env）経由でのみ参照し、設定ファイルには書かない。

use crate::error::Error;
use crate::llm::provider::{LlmProvider, Message};
use serde_json::{json, Value};
use std::env;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://localhost:11434/v1";
const DEFAULT_MODEL: &str = "llama3.1";
const DEFAULT_TEMPERATURE: f64 = 0.6;
const DEFAULT_MAX_TOKENS: u32 = 350;
const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// OpenAI Chat Completions 互換プロバイダ
pub struct OpenAiCompatProvider {
    model: String,
    base_url: String,
    api_key_env: Option<String>,
    temperature: f64,
    max_tokens: u32,
    timeout: Duration,
}

impl OpenAiCompatProvider {
    /// 新しいプロバイダを作成
    ///
    /// * `model` - モデル名（None のとき "llama3.1"）
    /// * `base_url` - ベース URL（None のとき DEFAULT_BASE_URL）
    /// * `api_key_env` - API キーを読む環境変数名（None のとき Authorization を付けない）
    /// * `temperature` - 温度（None のとき 0.6）
    /// * `max_tokens` - 最大トークン数（None のとき 350）
    pub fn new(
        model: Option<String>,
        base_url: Option<String>,
        api_key_env: Option<String>,
        temperature: Option<f32>,
        max_tokens: Option<u32>,
    ) -> Self {
        let model = model.unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let temperature = temperature.map(f64::from).unwrap_or(DEFAULT_TEMPERATURE);
        let max_tokens = max_tokens.unwrap_or(DEFAULT_MAX_TOKENS);
        Self {
            model,
            base_url,
            api_key_env,
            temperature,
            max_tokens,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// リクエストタイムアウトを差し替える
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn auth_header(&self) -> Option<String> {
        self.api_key_env.as_ref().and_then(|name| {
            env::var(name)
                .ok()
                .filter(|k| !k.is_empty())
                .map(|key| format!("Bearer {}", key))
        })
    }

    fn error_message(status: reqwest::StatusCode, body: &str) -> String {
        if let Ok(v) = serde_json::from_str::<Value>(body) {
            if let Some(msg) = v["error"]["message"].as_str() {
                return msg.to_string();
            }
        }
        format!("HTTP {}: {}", status, body)
    }
}

impl LlmProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        "openai_compat"
    }

    fn make_request_payload(
        &self,
        query: &str,
        system_instruction: Option<&str>,
        history: &[Message],
    ) -> Result<Value, Error> {
        let mut messages: Vec<Value> = Vec::new();
        if let Some(s) = system_instruction {
            messages.push(json!({ "role": "system", "content": s }));
        }
        for msg in history {
            messages.push(json!({ "role": msg.role, "content": msg.content }));
        }
        messages.push(json!({ "role": "user", "content": query }));

        Ok(json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        }))
    }

    fn make_http_request(&self, request_json: &str) -> Result<String, Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        let mut builder = client
            .post(self.url())
            .header("Content-Type", "application/json")
            .body(request_json.to_string());
        if let Some(auth) = self.auth_header() {
            builder = builder.header("Authorization", auth);
        }

        let response = builder
            .send()
            .map_err(|e| Error::http(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let response_text = response
            .text()
            .map_err(|e| Error::http(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(Error::http(format!(
                "Chat completions error: {}",
                Self::error_message(status, &response_text)
            )));
        }
        Ok(response_text)
    }

    fn parse_response_text(&self, response_json: &str) -> Result<Option<String>, Error> {
        let v: Value = serde_json::from_str(response_json)
            .map_err(|e| Error::json(format!("Failed to parse response JSON: {}", e)))?;

        if let Some(err) = v.get("error") {
            let msg = err["message"].as_str().unwrap_or("Unknown error");
            return Err(Error::http(format!("API error: {}", msg)));
        }

        let text = v["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.trim().to_string());
        Ok(text)
    }
}
