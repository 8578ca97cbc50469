//! llm セクションからのプロバイダ解決

use crate::domain::ProviderName;
use crate::error::Error;
use crate::llm::config::{LlmSection, ProviderTypeKind};
use crate::llm::factory::ProviderType;

/// 解決済みプロバイダ（ProviderType + オプション）
#[derive(Debug, Clone)]
pub struct ResolvedProvider {
    /// 解決に使ったプロファイル名（例: "local", "echo"）。エラー表示用
    pub profile_name: String,
    pub provider_type: ProviderType,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub api_key_env: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout_secs: Option<u64>,
}

fn kind_to_type(k: ProviderTypeKind) -> ProviderType {
    match k {
        ProviderTypeKind::OpenaiCompat => ProviderType::OpenAiCompat,
        ProviderTypeKind::Echo => ProviderType::Echo,
    }
}

/// ビルトインプロバイダ名
fn builtin_provider_names() -> &'static [&'static str] {
    &["openai_compat", "openai", "ollama", "echo"]
}

/// 要求されたプロファイル名（None の場合は default）と LlmSection から ResolvedProvider を解決する。
/// 不明な名前は Error::invalid_argument（is_usage == true）で利用可能一覧を返す。
pub fn resolve_provider(
    requested: Option<&ProviderName>,
    cfg: Option<&LlmSection>,
) -> Result<ResolvedProvider, Error> {
    let effective_name: &str = requested.map(|r| r.as_ref()).unwrap_or_else(|| {
        cfg.and_then(|c| c.default_provider.as_deref())
            .unwrap_or("openai_compat")
    });

    // 1) cfg.providers に名前があればそれを優先
    if let Some(cfg) = cfg {
        if let Some(profile) = cfg.providers.get(effective_name) {
            return Ok(ResolvedProvider {
                profile_name: effective_name.to_string(),
                provider_type: kind_to_type(profile.type_),
                base_url: profile.base_url.clone(),
                model: profile.model.clone(),
                api_key_env: profile.api_key_env.clone(),
                temperature: profile.temperature,
                max_tokens: profile.max_tokens,
                timeout_secs: profile.timeout_secs,
            });
        }
    }

    // 2) ビルトイン名を試す
    if let Some(provider_type) = ProviderType::from_str(effective_name) {
        return Ok(ResolvedProvider {
            profile_name: effective_name.to_string(),
            provider_type,
            base_url: None,
            model: None,
            api_key_env: None,
            temperature: None,
            max_tokens: None,
            timeout_secs: None,
        });
    }

    let mut available: Vec<String> = cfg
        .map(|c| c.providers.keys().cloned().collect())
        .unwrap_or_default();
    available.extend(builtin_provider_names().iter().map(|s| s.to_string()));
    available.sort();
    available.dedup();
    Err(Error::invalid_argument(format!(
        "Unknown provider profile: {}. Available: {}",
        effective_name,
        available.join(", ")
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn section() -> LlmSection {
        LlmSection::from_value(&json!({
            "default": "local",
            "providers": {
                "local": {
                    "type": "openai_compat",
                    "base_url": "http://localhost:11434/v1",
                    "model": "llama3.1"
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_resolve_default_from_config() {
        let r = resolve_provider(None, Some(&section())).unwrap();
        assert_eq!(r.profile_name, "local");
        assert_eq!(r.provider_type, ProviderType::OpenAiCompat);
        assert_eq!(r.base_url.as_deref(), Some("http://localhost:11434/v1"));
    }

    #[test]
    fn test_resolve_builtin_without_config() {
        let name = ProviderName::new("echo");
        let r = resolve_provider(Some(&name), None).unwrap();
        assert_eq!(r.provider_type, ProviderType::Echo);
        assert!(r.base_url.is_none());
    }

    #[test]
    fn test_resolve_unknown_is_usage_error() {
        let name = ProviderName::new("bogus");
        let err = resolve_provider(Some(&name), Some(&section())).unwrap_err();
        assert!(err.is_usage());
        assert!(err.to_string().contains("local"));
        assert!(err.to_string().contains("echo"));
    }

    #[test]
    fn test_resolve_without_any_config_defaults_to_compat() {
        let r = resolve_provider(None, None).unwrap();
        assert_eq!(r.provider_type, ProviderType::OpenAiCompat);
    }
}
