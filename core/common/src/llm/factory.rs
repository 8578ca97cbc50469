//! プロバイダファクトリー
//!
//! 解決済みプロファイルから適切なプロバイダとドライバーを作成する。

use crate::error::Error;
use crate::llm::driver::LlmDriver;
use crate::llm::echo::EchoProvider;
use crate::llm::openai_compat::OpenAiCompatProvider;
use crate::llm::provider::{LlmProvider, Message};
use crate::llm::resolver::ResolvedProvider;
use serde_json::Value;

/// プロバイダタイプ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    /// OpenAI Chat Completions 互換 (/chat/completions)
    OpenAiCompat,
    /// Echo（固定レスポンスを返すだけ）
    Echo,
}

impl ProviderType {
    /// 文字列からプロバイダタイプを解析
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "openai_compat" | "openai" | "ollama" => Some(Self::OpenAiCompat),
            "echo" => Some(Self::Echo),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAiCompat => "openai_compat",
            Self::Echo => "echo",
        }
    }
}

/// プロバイダの enum ラッパー
///
/// 異なるプロバイダタイプを型安全に扱うために使用する。
pub enum AnyProvider {
    OpenAiCompat(OpenAiCompatProvider),
    Echo(EchoProvider),
}

impl LlmProvider for AnyProvider {
    fn name(&self) -> &str {
        match self {
            Self::OpenAiCompat(p) => p.name(),
            Self::Echo(p) => p.name(),
        }
    }

    fn make_request_payload(
        &self,
        query: &str,
        system_instruction: Option<&str>,
        history: &[Message],
    ) -> Result<Value, Error> {
        match self {
            Self::OpenAiCompat(p) => p.make_request_payload(query, system_instruction, history),
            Self::Echo(p) => p.make_request_payload(query, system_instruction, history),
        }
    }

    fn make_http_request(&self, request_json: &str) -> Result<String, Error> {
        match self {
            Self::OpenAiCompat(p) => p.make_http_request(request_json),
            Self::Echo(p) => p.make_http_request(request_json),
        }
    }

    fn parse_response_text(&self, response_json: &str) -> Result<Option<String>, Error> {
        match self {
            Self::OpenAiCompat(p) => p.parse_response_text(response_json),
            Self::Echo(p) => p.parse_response_text(response_json),
        }
    }
}

impl AnyProvider {
    /// openai_compat のとき base_url を返す（local-only ガード用）
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::OpenAiCompat(p) => Some(p.base_url()),
            Self::Echo(_) => None,
        }
    }
}

/// 解決済みプロファイルからドライバーを作成する
pub fn create_driver(resolved: &ResolvedProvider) -> LlmDriver<AnyProvider> {
    let provider = match resolved.provider_type {
        ProviderType::OpenAiCompat => {
            let mut provider = OpenAiCompatProvider::new(
                resolved.model.clone(),
                resolved.base_url.clone(),
                resolved.api_key_env.clone(),
                resolved.temperature,
                resolved.max_tokens,
            );
            if let Some(secs) = resolved.timeout_secs {
                provider = provider.with_timeout(std::time::Duration::from_secs(secs));
            }
            AnyProvider::OpenAiCompat(provider)
        }
        ProviderType::Echo => AnyProvider::Echo(EchoProvider::new()),
    };
    LlmDriver::new(provider)
}
