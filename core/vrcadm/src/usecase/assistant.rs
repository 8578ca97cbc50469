//! アシスタント（運営アイデア・コードスニペットの生成）
//!
//! LLM が使えないとき（未設定・local-only ブロック・失敗）は定型文に落ちる。
//! 生成結果は有界メモリに残し、次回のプロンプトに文脈として混ぜる。

use crate::adapter::JsonlStore;
use crate::domain::memory::{render_assistant_memory, AssistantMemoryRecord};
use crate::domain::AssistantMode;
use common::llm::{is_local_endpoint, AnyProvider, LlmDriver};
use common::ports::outbound::{now_iso8601, Clock, Log, LogLevel, LogRecord};
use std::sync::Arc;

const SYSTEM_INSTRUCTION: &str = "You are a helpful assistant.";

const FALLBACK_IDEAS: [&str; 5] = [
    "Instant Incident Review: summarize the last 15 minutes of joins, kicks, and warnings so admins can respond faster.",
    "Respect Radar: detect repeat offenders by matching names and join patterns to recent moderation actions.",
    "Quiet Hours Automations: auto-announce reduced volume rules and enforce stricter caps during late hours.",
    "Mentor Match: pair trusted users with newcomers based on shared interests to improve onboarding.",
    "Rapid Context Cards: one-click macros that explain rules with a short, calm, and consistent tone.",
];

const FALLBACK_SNIPPETS: [&str; 3] = [
    "```rust\nfn summarize_recent(lines: &[String], max_items: usize) -> String {\n    lines\n        .iter()\n        .rev()\n        .take(max_items)\n        .map(|l| l.splitn(2, \"] \").last().unwrap_or(l).to_string())\n        .collect::<Vec<_>>()\n        .join(\"\\n\")\n}\n```",
    "```rust\nfn should_warn_user(message: &str, banned_words: &[String]) -> bool {\n    let lowered = message.to_lowercase();\n    banned_words.iter().any(|w| lowered.contains(w.as_str()))\n}\n```",
    "```rust\nfn format_admin_alert(username: &str, action: &str) -> String {\n    format!(\"[ADMIN ALERT] {} -> {}\", username, action)\n}\n```",
];

/// アシスタントユースケース
pub struct AssistantUseCase {
    driver: Option<LlmDriver<AnyProvider>>,
    local_only: bool,
    prefer_amd: bool,
    memory: JsonlStore,
    use_memory: bool,
    clock: Arc<dyn Clock>,
    log: Arc<dyn Log>,
}

impl AssistantUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        driver: Option<LlmDriver<AnyProvider>>,
        local_only: bool,
        prefer_amd: bool,
        memory: JsonlStore,
        use_memory: bool,
        clock: Arc<dyn Clock>,
        log: Arc<dyn Log>,
    ) -> Self {
        Self {
            driver,
            local_only,
            prefer_amd,
            memory,
            use_memory,
            clock,
            log,
        }
    }

    /// 生成して結果を返す。失敗時は定型文。結果はメモリに残す。
    pub fn generate(&self, mode: AssistantMode) -> String {
        let output = self.generate_inner(mode);
        self.remember(mode, &output);
        output
    }

    fn generate_inner(&self, mode: AssistantMode) -> String {
        let Some(driver) = &self.driver else {
            return self.fallback(mode);
        };
        if self.local_only {
            if let Some(endpoint) = driver.provider().endpoint() {
                if !is_local_endpoint(endpoint) {
                    self.log_warn("assistant request blocked: non-local endpoint while local-only is enabled");
                    return self.fallback(mode);
                }
            }
        }
        let prompt = self.build_prompt(mode);
        match driver.query(&prompt, Some(SYSTEM_INSTRUCTION), &[]) {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => self.fallback(mode),
            Err(e) => {
                self.log_warn(&format!("assistant request failed: {}", e));
                self.fallback(mode)
            }
        }
    }

    fn build_prompt(&self, mode: AssistantMode) -> String {
        let hardware_hint = self.hardware_hint();
        let request = match mode {
            AssistantMode::Idea => {
                "Generate 5 concise, high-impact ideas to improve a VRChat admin tool. \
                 Focus on safety, automation, moderation workflows, and community health. \
                 Each idea should be 1-2 sentences with a short title."
            }
            AssistantMode::Snippet => {
                "Provide a Rust code snippet for a VRChat admin tool feature. \
                 Keep it under 40 lines, use the standard library only, and include brief comments."
            }
        };
        let mut prompt = format!(
            "You are an assistant for a VRChat admin tool that supports self-learning workflows. \
             Hardware hint: {}. Return plain text only.\n\n{}",
            hardware_hint, request
        );
        if self.use_memory {
            if let Ok(values) = self.memory.load_recent(usize::MAX) {
                let rendered = render_assistant_memory(&values);
                if !rendered.is_empty() {
                    prompt = format!(
                        "{}\n\nRecent local memory (for self-learning context):\n{}",
                        prompt, rendered
                    );
                }
            }
        }
        prompt
    }

    fn hardware_hint(&self) -> String {
        if !self.prefer_amd {
            return "GPU optional".to_string();
        }
        if detect_rocm() {
            "AMD GPU preferred".to_string()
        } else {
            "AMD GPU preferred (no AMD GPU detected locally)".to_string()
        }
    }

    fn fallback(&self, mode: AssistantMode) -> String {
        match mode {
            AssistantMode::Idea => FALLBACK_IDEAS
                .iter()
                .map(|idea| format!("- {}", idea))
                .collect::<Vec<_>>()
                .join("\n"),
            AssistantMode::Snippet => {
                let index = (self.clock.now_ms() as usize) % FALLBACK_SNIPPETS.len();
                FALLBACK_SNIPPETS[index].to_string()
            }
        }
    }

    fn remember(&self, mode: AssistantMode, output: &str) {
        if !self.use_memory || output.is_empty() {
            return;
        }
        let record = AssistantMemoryRecord {
            timestamp: self.clock.now_rfc3339(),
            mode: mode.as_str().to_string(),
            output: output.trim().to_string(),
        };
        let result = serde_json::to_value(&record)
            .map_err(|e| common::error::Error::json(e.to_string()))
            .and_then(|v| self.memory.append(&v));
        if let Err(e) = result {
            self.log_warn(&format!("assistant memory write failed: {}", e));
        }
    }

    fn log_warn(&self, message: &str) {
        let _ = self.log.log(&LogRecord {
            ts: now_iso8601(),
            level: LogLevel::Warn,
            message: message.to_string(),
            layer: Some("usecase".to_string()),
            kind: Some("assistant".to_string()),
            fields: None,
        });
    }
}

/// ROCm らしきパスが見えるか（プロンプトのハードウェアヒント用）
#[cfg(unix)]
fn detect_rocm() -> bool {
    ["/sys/module/amdgpu", "/opt/rocm", "/dev/kfd"]
        .iter()
        .any(|p| std::path::Path::new(p).exists())
}

#[cfg(not(unix))]
fn detect_rocm() -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::adapter::{NoopLog, StdClock, StdFileSystem};
    use common::llm::{create_driver, ProviderType, ResolvedProvider};
    use std::path::Path;

    fn store(dir: &Path) -> JsonlStore {
        JsonlStore::new(
            Arc::new(StdFileSystem),
            dir.join("ai_memory.jsonl"),
            12,
            200_000,
        )
    }

    fn echo_driver() -> LlmDriver<AnyProvider> {
        create_driver(&ResolvedProvider {
            profile_name: "echo".to_string(),
            provider_type: ProviderType::Echo,
            base_url: None,
            model: None,
            api_key_env: None,
            temperature: None,
            max_tokens: None,
            timeout_secs: None,
        })
    }

    fn usecase(dir: &Path, driver: Option<LlmDriver<AnyProvider>>) -> AssistantUseCase {
        AssistantUseCase::new(
            driver,
            true,
            false,
            store(dir),
            true,
            Arc::new(StdClock),
            Arc::new(NoopLog),
        )
    }

    #[test]
    fn test_no_driver_falls_back_and_remembers() {
        let dir = tempfile::tempdir().unwrap();
        let uc = usecase(dir.path(), None);
        let out = uc.generate(AssistantMode::Idea);
        assert!(out.contains("Instant Incident Review"));
        assert_eq!(out.lines().count(), 5);

        let remembered = store(dir.path()).load_recent(10).unwrap();
        assert_eq!(remembered.len(), 1);
        assert_eq!(remembered[0]["mode"], "idea");
    }

    #[test]
    fn test_snippet_fallback_is_code_block() {
        let dir = tempfile::tempdir().unwrap();
        let uc = usecase(dir.path(), None);
        let out = uc.generate(AssistantMode::Snippet);
        assert!(out.starts_with("```rust"));
    }

    #[test]
    fn test_echo_driver_output_used() {
        let dir = tempfile::tempdir().unwrap();
        let uc = usecase(dir.path(), Some(echo_driver()));
        let out = uc.generate(AssistantMode::Idea);
        assert!(out.contains("Echo Provider"));
    }

    #[test]
    fn test_prompt_includes_memory_context() {
        let dir = tempfile::tempdir().unwrap();
        store(dir.path())
            .append(&serde_json::json!({
                "timestamp": "t",
                "mode": "idea",
                "output": "previous idea"
            }))
            .unwrap();
        let uc = usecase(dir.path(), None);
        let prompt = uc.build_prompt(AssistantMode::Idea);
        assert!(prompt.contains("Recent local memory"));
        assert!(prompt.contains("previous idea"));
        assert!(prompt.contains("Hardware hint: GPU optional"));
    }

    #[test]
    fn test_memory_disabled_skips_remember() {
        let dir = tempfile::tempdir().unwrap();
        let uc = AssistantUseCase::new(
            None,
            true,
            false,
            store(dir.path()),
            false,
            Arc::new(StdClock),
            Arc::new(NoopLog),
        );
        uc.generate(AssistantMode::Idea);
        assert!(store(dir.path()).load_recent(10).unwrap().is_empty());
    }
}
