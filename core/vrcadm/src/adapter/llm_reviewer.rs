//! LLM によるモデレーションレビュー実装
//!
//! 失敗（未設定・local-only ブロック・HTTP エラー・パース不能）はすべて
//! 安全側の allow Verdict に落とす。エラーは構造化ログにのみ残す。

use crate::domain::{ChatMessage, ModAction, Verdict};
use crate::ports::outbound::ModReviewer;
use common::error::Error;
use common::llm::{is_local_endpoint, AnyProvider, LlmDriver};
use common::ports::outbound::{now_iso8601, Log, LogLevel, LogRecord};
use std::collections::BTreeMap;
use std::sync::Arc;

const SYSTEM_INSTRUCTION: &str = "You are a helpful assistant.";

/// LLM ドライバーを使う ModReviewer 実装
pub struct LlmReviewer {
    driver: LlmDriver<AnyProvider>,
    local_only: bool,
    log: Arc<dyn Log>,
}

impl LlmReviewer {
    pub fn new(driver: LlmDriver<AnyProvider>, local_only: bool, log: Arc<dyn Log>) -> Self {
        Self {
            driver,
            local_only,
            log,
        }
    }

    fn build_prompt(message: &ChatMessage, recent_context: &[String], memory_block: &str) -> String {
        let context = recent_context.join("\n");
        let memory = if memory_block.is_empty() {
            String::new()
        } else {
            format!("\n\nRecent moderation memory:\n{}", memory_block)
        };
        format!(
            "You are a VRChat moderation assistant. Review the latest chat message and context. \
             Decide if it is safe, needs a warning, should be removed, or should be escalated \
             to a moderator for advice. Return JSON only with keys: action (allow|warn|remove|escalate), \
             reason (short), confidence (0-1).\n\n\
             Recent context:\n{}{}\n\n\
             New message:\n{}: {}",
            context, memory, message.user, message.text
        )
    }

    fn log_degraded(&self, note: &str, error: Option<&Error>) {
        let mut fields = BTreeMap::new();
        fields.insert("note".to_string(), serde_json::json!(note));
        if let Some(e) = error {
            fields.insert("error".to_string(), serde_json::json!(e.to_string()));
        }
        let _ = self.log.log(&LogRecord {
            ts: now_iso8601(),
            level: LogLevel::Warn,
            message: "moderation review degraded to allow".to_string(),
            layer: Some("adapter".to_string()),
            kind: Some("moderation".to_string()),
            fields: Some(fields),
        });
    }
}

impl ModReviewer for LlmReviewer {
    fn review(
        &self,
        message: &ChatMessage,
        recent_context: &[String],
        memory_block: &str,
    ) -> Verdict {
        if self.local_only {
            if let Some(endpoint) = self.driver.provider().endpoint() {
                if !is_local_endpoint(endpoint) {
                    self.log_degraded("non-local endpoint with local-only enabled", None);
                    return Verdict::allow("AI blocked by local-only setting", 0.3);
                }
            }
        }
        let prompt = Self::build_prompt(message, recent_context, memory_block);
        match self.driver.query(&prompt, Some(SYSTEM_INSTRUCTION), &[]) {
            Ok(response) => parse_verdict(&response),
            Err(e) => {
                self.log_degraded("LLM request failed", Some(&e));
                Verdict::allow("No AI response", 0.3)
            }
        }
    }
}

/// LLM 応答を Verdict に解釈する。
/// JSON でなければ 1 行目を理由として allow に落とす。
pub fn parse_verdict(response: &str) -> Verdict {
    let trimmed = response.trim();
    if trimmed.is_empty() {
        return Verdict::allow("No AI response", 0.3);
    }
    let Ok(data) = serde_json::from_str::<serde_json::Value>(trimmed) else {
        let first_line: String = trimmed.lines().next().unwrap_or("").chars().take(120).collect();
        let reason = if first_line.is_empty() {
            "Unstructured AI output".to_string()
        } else {
            first_line
        };
        return Verdict::allow(reason, 0.35);
    };
    let action = ModAction::parse(data["action"].as_str().unwrap_or("allow"));
    let reason = data["reason"]
        .as_str()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "AI review".to_string());
    let confidence = data["confidence"].as_f64().unwrap_or(0.5).clamp(0.0, 1.0);
    Verdict::new(action, reason, confidence)
}
