//! LLM ドライバーとプロバイダ
//!
//! 本ツールが話すのは OpenAI Chat Completions 互換エンドポイントのみ。
//! Echo プロバイダはネットワークに出ないテスト・ドライラン用。

pub mod config;
pub mod driver;
pub mod echo;
pub mod factory;
pub mod openai_compat;
pub mod provider;
pub mod resolver;

pub use config::{LlmSection, ProviderProfile, ProviderTypeKind};
pub use driver::LlmDriver;
pub use echo::EchoProvider;
pub use factory::{create_driver, AnyProvider, ProviderType};
pub use openai_compat::OpenAiCompatProvider;
pub use provider::{LlmProvider, Message};
pub use resolver::{resolve_provider, ResolvedProvider};

/// エンドポイントがローカルホストかを判定する（local-only ガード用）
pub fn is_local_endpoint(endpoint: &str) -> bool {
    let Ok(url) = reqwest::Url::parse(endpoint) else {
        return false;
    };
    matches!(
        url.host_str().map(|h| h.to_ascii_lowercase()).as_deref(),
        Some("localhost") | Some("127.0.0.1") | Some("::1") | Some("[::1]")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_local_endpoint() {
        assert!(is_local_endpoint("http://localhost:11434/v1/chat/completions"));
        assert!(is_local_endpoint("http://127.0.0.1:8080/v1"));
        assert!(is_local_endpoint("http://[::1]:9000/v1"));
        assert!(!is_local_endpoint("https://api.openai.com/v1"));
        assert!(!is_local_endpoint("not a url"));
    }
}
