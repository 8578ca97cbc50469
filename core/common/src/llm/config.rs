//! 設定ファイルの llm セクション用の型
//!
//! プロファイル名から ProviderTypeKind とオプション
//! （base_url / model / api_key_env / temperature / max_tokens）を解決するための構造体。

use serde::Deserialize;
use std::collections::HashMap;

/// config.json の "llm" セクション
#[derive(Debug, Clone, Default)]
pub struct LlmSection {
    /// 未指定時に使うプロファイル名
    pub default_provider: Option<String>,
    /// プロファイル名 -> プロファイル
    pub providers: HashMap<String, ProviderProfile>,
}

/// 1 プロファイル分の設定
#[derive(Debug, Clone)]
pub struct ProviderProfile {
    /// プロバイダ種別: openai_compat | echo
    pub type_: ProviderTypeKind,
    /// API のベース URL（省略時はプロバイダのデフォルト）
    pub base_url: Option<String>,
    /// モデル名（省略時はプロバイダのデフォルト）
    pub model: Option<String>,
    /// API キーを読む環境変数名（省略時は Authorization を付けない）
    pub api_key_env: Option<String>,
    /// 温度（省略時はデフォルト）
    pub temperature: Option<f32>,
    /// 最大トークン数（省略時はデフォルト）
    pub max_tokens: Option<u32>,
    /// リクエストタイムアウト秒（省略時は 20 秒）
    pub timeout_secs: Option<u64>,
}

/// JSON の "type" で使うプロバイダ種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderTypeKind {
    OpenaiCompat,
    Echo,
}

impl ProviderTypeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenaiCompat => "openai_compat",
            Self::Echo => "echo",
        }
    }
}

/// serde 用の内部構造（type が予約語のため）
#[derive(Debug, Deserialize)]
struct LlmSectionRaw {
    #[serde(alias = "default")]
    default_provider: Option<String>,
    providers: Option<HashMap<String, ProviderProfileRaw>>,
}

#[derive(Debug, Deserialize)]
struct ProviderProfileRaw {
    #[serde(rename = "type", alias = "provider")]
    type_: ProviderTypeKindSerde,
    base_url: Option<String>,
    #[serde(alias = "default_model")]
    model: Option<String>,
    api_key_env: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ProviderTypeKindSerde {
    #[serde(rename = "openai_compat", alias = "openai", alias = "ollama")]
    OpenaiCompat,
    Echo,
}

impl From<ProviderTypeKindSerde> for ProviderTypeKind {
    fn from(s: ProviderTypeKindSerde) -> Self {
        match s {
            ProviderTypeKindSerde::OpenaiCompat => ProviderTypeKind::OpenaiCompat,
            ProviderTypeKindSerde::Echo => ProviderTypeKind::Echo,
        }
    }
}

impl LlmSection {
    /// JSON 値からパース（ファイル読みは呼び出し側で行う）
    pub fn from_value(value: &serde_json::Value) -> Result<Self, serde_json::Error> {
        let raw: LlmSectionRaw = serde_json::from_value(value.clone())?;
        let providers = raw
            .providers
            .unwrap_or_default()
            .into_iter()
            .map(|(k, v)| (k, v.into()))
            .collect();
        Ok(LlmSection {
            default_provider: raw.default_provider,
            providers,
        })
    }
}

impl From<ProviderProfileRaw> for ProviderProfile {
    fn from(r: ProviderProfileRaw) -> Self {
        ProviderProfile {
            type_: r.type_.into(),
            base_url: r.base_url,
            model: r.model,
            api_key_env: r.api_key_env,
            temperature: r.temperature,
            max_tokens: r.max_tokens,
            timeout_secs: r.timeout_secs,
        }
    }
}
