//! モデレーションパイプライン
//!
//! ログから抽出したチャット 1 件を、キーワード短絡 → LLM レビュー → スコアリング
//! の順で判定し、結果をモデレーションメモリに残す。allow 以外はアラートを作り、
//! 設定によってはチャットボックスにも投稿する。

use crate::adapter::{JsonlStore, WordMemory};
use crate::domain::memory::{render_mod_memory, ModMemoryRecord};
use crate::domain::{ChatMessage, ModAction, Verdict};
use crate::moderation::{Decision, DecisionContext, DecisionEngine, HistoryStats};
use crate::ports::outbound::{ChatboxSink, ModReviewer};
use common::notice_hub::NoticeHubHandle;
use common::ports::outbound::Clock;
use std::collections::VecDeque;
use std::sync::Arc;

const RECENT_CONTEXT_CAP: usize = 8;
const KEYWORD_CONFIDENCE: f64 = 0.8;
const DEFAULT_CONFIDENCE: f64 = 0.4;

/// 1 件分の処理結果
#[derive(Debug, Clone)]
pub struct ModerationOutcome {
    pub action: ModAction,
    pub reason: String,
    pub confidence: f64,
    pub alert: Option<String>,
    /// スコアリングの内訳（キーワード短絡時は None）
    pub context: Option<DecisionContext>,
}

/// モデレーションユースケース
pub struct ModerationUseCase {
    engine: DecisionEngine,
    reviewer: Option<Arc<dyn ModReviewer>>,
    chatbox: Option<Arc<dyn ChatboxSink>>,
    post_alerts: bool,
    word_memory: WordMemory,
    mod_memory: JsonlStore,
    use_memory: bool,
    recent: VecDeque<String>,
    notices: NoticeHubHandle,
    clock: Arc<dyn Clock>,
}

impl ModerationUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        engine: DecisionEngine,
        reviewer: Option<Arc<dyn ModReviewer>>,
        chatbox: Option<Arc<dyn ChatboxSink>>,
        post_alerts: bool,
        word_memory: WordMemory,
        mod_memory: JsonlStore,
        use_memory: bool,
        notices: NoticeHubHandle,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            engine,
            reviewer,
            chatbox,
            post_alerts,
            word_memory,
            mod_memory,
            use_memory,
            recent: VecDeque::with_capacity(RECENT_CONTEXT_CAP),
            notices,
            clock,
        }
    }

    /// チャット 1 件を処理する
    pub fn process(&mut self, message: &ChatMessage) -> ModerationOutcome {
        self.push_recent(message);

        // 履歴統計は今回の発言を数える前に取る
        let keyword = self.engine.scan_keyword(&message.text);
        let stats = HistoryStats {
            total_recent_tokens: self.word_memory.total_tokens(&message.user),
            matched_keyword_repeats: keyword
                .as_deref()
                .map(|k| self.word_memory.token_count(&message.user, k))
                .unwrap_or(0),
        };

        let (action, reason, confidence, context) = if let Some(keyword) = &keyword {
            // キーワード一致は LLM を呼ばず即エスカレーション
            (
                ModAction::Escalate,
                format!("Keyword match: {}", keyword),
                KEYWORD_CONFIDENCE,
                None,
            )
        } else {
            let verdict = self.llm_review(message);
            let decision = self.engine.evaluate(message, &stats, verdict.as_ref());
            let (reason, confidence) = summarize(&decision, verdict.as_ref());
            (decision.action, reason, confidence, Some(decision.context))
        };

        self.word_memory.record_message(&message.user, &message.text);
        self.remember(message, action, confidence);

        let alert = if action != ModAction::Allow {
            let alert = format!(
                "MOD ALERT -> {}: {} (confidence {:.2}) Reason: {}",
                message.user,
                action.as_str().to_uppercase(),
                confidence,
                reason
            );
            self.notices.emit("moderation", alert.clone());
            self.post_alert(message, action, &reason);
            Some(alert)
        } else {
            None
        };

        ModerationOutcome {
            action,
            reason,
            confidence,
            alert,
            context,
        }
    }

    fn push_recent(&mut self, message: &ChatMessage) {
        if self.recent.len() == RECENT_CONTEXT_CAP {
            self.recent.pop_front();
        }
        self.recent
            .push_back(format!("{}: {}", message.user, message.text));
    }

    fn llm_review(&self, message: &ChatMessage) -> Option<Verdict> {
        let reviewer = self.reviewer.as_ref()?;
        let memory_block = if self.use_memory {
            self.mod_memory
                .load_recent(usize::MAX)
                .map(|values| render_mod_memory(&values))
                .unwrap_or_default()
        } else {
            String::new()
        };
        let context: Vec<String> = self.recent.iter().cloned().collect();
        Some(reviewer.review(message, &context, &memory_block))
    }

    fn remember(&self, message: &ChatMessage, action: ModAction, confidence: f64) {
        if !self.use_memory {
            return;
        }
        let record = ModMemoryRecord {
            timestamp: self.clock.now_rfc3339(),
            user: message.user.clone(),
            text: message.text.clone(),
            action: action.as_str().to_string(),
            confidence,
        };
        let result = serde_json::to_value(&record)
            .map_err(|e| common::error::Error::json(e.to_string()))
            .and_then(|v| self.mod_memory.append(&v));
        if let Err(e) = result {
            self.notices
                .emit("error", format!("MOD MEMORY WRITE FAILED -> {}", e));
        }
    }

    fn post_alert(&self, message: &ChatMessage, action: ModAction, reason: &str) {
        if !self.post_alerts {
            return;
        }
        let Some(chatbox) = &self.chatbox else { return };
        let text = format!(
            "[MOD ALERT] {} -> {}: {}",
            message.user,
            action.as_str(),
            reason
        );
        if let Err(e) = chatbox.send_chatbox(&text) {
            self.notices
                .emit("error", format!("MOD ALERT SEND FAILED -> {}", e));
        }
    }
}

fn summarize(decision: &Decision, verdict: Option<&Verdict>) -> (String, f64) {
    let context: &DecisionContext = &decision.context;
    if let Some(pattern) = &context.blocked_pattern {
        return (
            format!("Blocked pattern: {}", pattern),
            verdict.map(|v| v.confidence).unwrap_or(KEYWORD_CONFIDENCE),
        );
    }
    if let Some(verdict) = verdict {
        if decision.action != ModAction::Allow {
            return (verdict.reason.clone(), verdict.confidence);
        }
    }
    if decision.action == ModAction::Allow {
        let confidence = verdict.map(|v| v.confidence).unwrap_or(DEFAULT_CONFIDENCE);
        return ("No issues detected".to_string(), confidence);
    }
    (
        context.review_note.clone(),
        verdict.map(|v| v.confidence).unwrap_or(DEFAULT_CONFIDENCE),
    )
}
