//! 設定の読み込み
//!
//! `<home>/config.json` を読む。ファイルが無ければデフォルト、壊れていればエラー。
//! すべてのフィールドは省略可能で、デフォルトは元ツールの定数に合わせてある。
//! API キーは設定に書かず、llm プロファイルの api_key_env で環境変数名を指す。

use common::error::Error;
use common::llm::LlmSection;
use common::ports::outbound::{EnvResolver, FileSystem};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// 有界メモリファイルの設定（設定に書くときは 3 フィールドとも必須）
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryBound {
    pub file: String,
    pub max_items: usize,
    pub max_bytes: usize,
}

fn assistant_memory_default() -> MemoryBound {
    MemoryBound {
        file: "ai_memory.jsonl".to_string(),
        max_items: 12,
        max_bytes: 200_000,
    }
}

fn mod_memory_default() -> MemoryBound {
    MemoryBound {
        file: "ai_mod_memory.jsonl".to_string(),
        max_items: 30,
        max_bytes: 200_000,
    }
}

/// アプリ全体の設定
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// OSC 受信
    pub listen_host: String,
    pub listen_port: u16,
    /// OSC 送信（VRChat 本体）
    pub send_host: String,
    pub send_port: u16,
    /// 購読アドレスパターン
    pub subscribe: String,

    /// 定期アナウンスの間隔（秒）と本文
    pub announce_interval_secs: u64,
    pub announcements: Vec<String>,
    pub quick_announcements: Vec<String>,

    /// VRChat ログのポーリング間隔（秒、最低 1）
    pub poll_interval_secs: u64,
    /// VRChat ログの明示パス（未指定なら自動探索）
    pub log_file: Option<PathBuf>,

    /// モデレーション
    pub keywords: Vec<String>,
    /// 生の正規表現（不正なものは警告して読み飛ばす）
    pub blocked_patterns: Vec<String>,
    /// 平文フレーズ（難読化耐性パターンにコンパイルする）
    pub blocked_phrases: Vec<String>,
    pub synonyms: HashMap<String, Vec<String>>,
    pub morphology: String,
    pub warn_threshold: i32,
    pub remove_threshold: i32,
    pub escalate_threshold: i32,
    pub use_llm_review: bool,
    pub use_mod_memory: bool,
    pub post_alerts: bool,

    /// アシスタント
    pub use_assistant_memory: bool,
    pub prefer_amd: bool,

    /// LLM（ローカル以外のエンドポイントを拒否するか）
    pub local_only: bool,
    /// llm プロファイルセクション（common::llm::LlmSection の形）
    pub llm: serde_json::Value,

    /// メモリ・ログのファイル名（home からの相対）
    pub assistant_memory: MemoryBound,
    pub mod_memory: MemoryBound,
    pub word_memory_file: String,
    pub word_memory_retention_days: u64,
    pub event_log_file: String,
    pub transcript_file: String,
    pub json_log_file: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            listen_host: "127.0.0.1".to_string(),
            listen_port: 9001,
            send_host: "127.0.0.1".to_string(),
            send_port: 9000,
            subscribe: "/*".to_string(),
            announce_interval_secs: 300,
            announcements: [
                "Welcome! Please follow the world rules.",
                "This instance is moderated. Be respectful.",
                "Admins are present. Harassment will not be tolerated.",
                "If you need help, contact an admin.",
                "Reminder: Keep language and behavior appropriate.",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            quick_announcements: [
                "Quick reminder: keep it friendly and respectful.",
                "Please avoid yelling or mic spam. Thanks!",
                "No hate speech or harassment. Be kind.",
                "Keep conversations PG-13 in public areas.",
                "If you need help, ping an admin.",
                "Please respect personal space and boundaries.",
                "No disruptive avatars or effects in shared areas.",
                "We are recording moderation actions. Behave accordingly.",
                "New here? Ask for the rules anytime.",
                "Let's keep the room chill and welcoming.",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            poll_interval_secs: 2,
            log_file: None,
            keywords: ["dox", "swat", "doxx", "leak", "threat", "harass", "slur", "nazi"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            blocked_patterns: Vec::new(),
            blocked_phrases: vec!["kill yourself".to_string(), "kys".to_string()],
            synonyms: {
                let mut m = HashMap::new();
                m.insert(
                    "bully".to_string(),
                    vec!["harass".to_string(), "intimidate".to_string()],
                );
                m
            },
            morphology: "stem".to_string(),
            warn_threshold: 30,
            remove_threshold: 60,
            escalate_threshold: 80,
            use_llm_review: true,
            use_mod_memory: true,
            post_alerts: false,
            use_assistant_memory: true,
            prefer_amd: true,
            local_only: true,
            llm: serde_json::Value::Null,
            assistant_memory: assistant_memory_default(),
            mod_memory: mod_memory_default(),
            word_memory_file: "word_memory.jsonl".to_string(),
            word_memory_retention_days: 30,
            event_log_file: "vrcadm_events.log".to_string(),
            transcript_file: "transcript.jsonl".to_string(),
            json_log_file: "logs/vrcadm.jsonl".to_string(),
        }
    }
}

impl AdminConfig {
    /// `<home>/config.json` を読み込む。無ければデフォルト、壊れていればパス入りのエラー。
    pub fn load(fs: &dyn FileSystem, env: &dyn EnvResolver) -> Result<Self, Error> {
        let path = env.resolve_config_path()?;
        if !fs.exists(&path) {
            return Ok(Self::default());
        }
        let contents = fs.read_to_string(&path)?;
        let mut config: Self = serde_json::from_str(&contents)
            .map_err(|e| Error::json(format!("{}: {}", path.display(), e)))?;
        if config.poll_interval_secs == 0 {
            config.poll_interval_secs = 1;
        }
        Ok(config)
    }

    /// llm セクションを解釈する（未指定ならデフォルト = ビルトイン openai_compat）
    pub fn llm_section(&self) -> Result<Option<LlmSection>, Error> {
        if self.llm.is_null() {
            return Ok(None);
        }
        LlmSection::from_value(&self.llm)
            .map(Some)
            .map_err(|e| Error::json(format!("llm section: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::adapter::{FixedHomeResolver, StdFileSystem};

    #[test]
    fn test_defaults_match_original_constants() {
        let c = AdminConfig::default();
        assert_eq!(c.listen_port, 9001);
        assert_eq!(c.send_port, 9000);
        assert_eq!(c.subscribe, "/*");
        assert_eq!(c.announce_interval_secs, 300);
        assert_eq!(c.announcements.len(), 5);
        assert_eq!(c.quick_announcements.len(), 10);
        assert_eq!(c.poll_interval_secs, 2);
        assert!(c.keywords.contains(&"dox".to_string()));
        assert_eq!(c.assistant_memory.max_items, 12);
        assert_eq!(c.mod_memory.max_items, 30);
        assert_eq!(c.mod_memory.max_bytes, 200_000);
        assert_eq!(c.escalate_threshold, 80);
        assert!(c.local_only);
        assert!(!c.post_alerts);
    }

    #[test]
    fn test_load_missing_file_is_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let env = FixedHomeResolver(dir.path().to_path_buf());
        let c = AdminConfig::load(&StdFileSystem, &env).unwrap();
        assert_eq!(c.listen_port, 9001);
    }

    #[test]
    fn test_load_partial_file_overrides() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.json"),
            r#"{
                "listen_port": 9101,
                "post_alerts": true,
                "poll_interval_secs": 0,
                "keywords": ["grief"],
                "llm": { "default": "local", "providers": { "local": { "type": "ollama" } } }
            }"#,
        )
        .unwrap();
        let env = FixedHomeResolver(dir.path().to_path_buf());
        let c = AdminConfig::load(&StdFileSystem, &env).unwrap();
        assert_eq!(c.listen_port, 9101);
        assert!(c.post_alerts);
        // 0 は最低 1 秒に繰り上げ
        assert_eq!(c.poll_interval_secs, 1);
        assert_eq!(c.keywords, vec!["grief".to_string()]);
        // 省略フィールドはデフォルト
        assert_eq!(c.send_port, 9000);
        let llm = c.llm_section().unwrap().unwrap();
        assert_eq!(llm.default_provider.as_deref(), Some("local"));
    }

    #[test]
    fn test_load_broken_json_is_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.json"), "{ not json").unwrap();
        let env = FixedHomeResolver(dir.path().to_path_buf());
        let err = AdminConfig::load(&StdFileSystem, &env).unwrap_err();
        assert!(err.to_string().contains("config.json"));
    }

    #[test]
    fn test_llm_section_absent() {
        let c = AdminConfig::default();
        assert!(c.llm_section().unwrap().is_none());
    }
}
