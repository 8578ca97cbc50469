//! リスクスコアによるモデレーション判定エンジン
//!
//! ルール一致（禁止フレーズ・キーワード）、メッセージ形状（長さ・リンク・大文字率）、
//! 発言履歴、LLM 判定によるスコア下限を合算し、しきい値でアクションに落とす。
//! 判定後に 2 段のレビュー（quick-think / 最終）で過剰な措置を引き下げる。

use super::normalize::TextNormalizer;
use super::patterns::keyword_pattern;
use crate::domain::{ChatMessage, ModAction, Verdict};
use regex::Regex;

/// アクションしきい値
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    pub warn: i32,
    pub remove: i32,
    pub escalate: i32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            warn: 30,
            remove: 60,
            escalate: 80,
        }
    }
}

/// ワードメモリ由来の履歴統計
#[derive(Debug, Clone, Copy, Default)]
pub struct HistoryStats {
    /// 対象ユーザーの直近トークン総数
    pub total_recent_tokens: u64,
    /// 一致したキーワードの過去出現回数
    pub matched_keyword_repeats: u64,
}

/// 判定の内訳（通知・ログ用）
#[derive(Debug, Clone)]
pub struct DecisionContext {
    pub matched_keyword: Option<String>,
    pub blocked_pattern: Option<String>,
    pub base_score: i32,
    pub format_score: i32,
    pub history_score: i32,
    pub llm_floor: i32,
    pub total_score: i32,
    pub message_length: usize,
    pub link_count: usize,
    pub uppercase_ratio: f64,
    pub review_note: String,
}

/// 最終判定
#[derive(Debug, Clone)]
pub struct Decision {
    pub action: ModAction,
    pub context: DecisionContext,
}

/// 判定エンジン
pub struct DecisionEngine {
    keywords: Vec<(String, Regex)>,
    blocked: Vec<(String, Regex)>,
    normalizer: TextNormalizer,
    thresholds: Thresholds,
    link: Regex,
    minor_ref: Regex,
    adult_ref: Regex,
    relationship_ctx: Regex,
    report_ctx: Regex,
}

impl DecisionEngine {
    /// キーワードは難読化耐性パターンにコンパイルする。
    /// 禁止パターンは設定由来の正規表現をそのまま（コンパイル済みで）受け取る。
    pub fn new(
        keywords: &[String],
        blocked: Vec<(String, Regex)>,
        normalizer: TextNormalizer,
        thresholds: Thresholds,
    ) -> Self {
        let fixed = |p: &str| Regex::new(p).expect("fixed pattern");
        Self {
            keywords: keywords
                .iter()
                .filter(|k| !k.trim().is_empty())
                .map(|k| (k.trim().to_string(), keyword_pattern(k)))
                .collect(),
            blocked,
            normalizer,
            thresholds,
            link: fixed(r"(?i)https?://\S+"),
            minor_ref: fixed(r"(?i)\b(?:minor|underage|child|kid|teen|1[3-7])\b"),
            adult_ref: fixed(r"(?i)(?:\b(?:adult|18\s*plus|over\s*18)\b|\b18\s*\+)"),
            relationship_ctx: fixed(
                r"(?i)\b(?:cuddle|cuddling|dating|relationship|boyfriend|girlfriend|bf|gf|romantic|flirt|kiss|sexual|dm|dms|messages|screenshots|evidence|proof|gifting|gifted)\b",
            ),
            report_ctx: fixed(r"(?i)\b(?:report|reported|reporting|screenshots|evidence|proof|log|logs)\b"),
        }
    }

    /// キーワード走査のみ行う（ユースケースの短絡経路用）
    pub fn scan_keyword(&self, text: &str) -> Option<String> {
        let (normalized, expanded) = self.normalizer.normalize_and_expand(text);
        self.match_keyword(text, &normalized, &expanded)
    }

    fn match_keyword(&self, content: &str, normalized: &str, expanded: &str) -> Option<String> {
        for (keyword, re) in &self.keywords {
            if matches_any(re, content, normalized, expanded) {
                return Some(keyword.clone());
            }
        }
        None
    }

    /// 1 メッセージを評価する
    pub fn evaluate(
        &self,
        message: &ChatMessage,
        history: &HistoryStats,
        llm: Option<&Verdict>,
    ) -> Decision {
        let content = message.text.as_str();
        let (normalized, expanded) = self.normalizer.normalize_and_expand(content);

        let mut matched_keyword = self.match_keyword(content, &normalized, &expanded);
        if matched_keyword.is_none() && self.is_age_gap_concern(content, &normalized, &expanded) {
            matched_keyword = Some("age gap (adult/minor)".to_string());
        }

        let blocked_pattern = self
            .blocked
            .iter()
            .find(|(_, re)| matches_any(re, content, &normalized, &expanded))
            .map(|(src, _)| src.clone());

        let message_length = content.chars().count();
        let link_count = self.link.find_iter(content).count();
        let uppercase_ratio = uppercase_ratio(content);
        let format_score = score_message_format(message_length, link_count, uppercase_ratio);
        let history_score = score_history(history);

        let mut base_score = 0;
        if blocked_pattern.is_some() {
            base_score += 70;
        }
        if matched_keyword.is_some() {
            base_score += 30;
        }

        let llm_floor = match llm.map(|v| v.action) {
            Some(ModAction::Escalate) => self.thresholds.escalate,
            Some(ModAction::Remove) => self.thresholds.remove,
            Some(ModAction::Warn) => self.thresholds.warn,
            Some(ModAction::Allow) | None => 0,
        };

        let total_score = (base_score + format_score + history_score).max(llm_floor);

        let action = if total_score >= self.thresholds.escalate {
            ModAction::Escalate
        } else if total_score >= self.thresholds.remove {
            ModAction::Remove
        } else if total_score >= self.thresholds.warn {
            ModAction::Warn
        } else {
            ModAction::Allow
        };

        let adjusted = self.quick_think_review(
            action,
            matched_keyword.as_deref(),
            blocked_pattern.is_some(),
            llm.map(|v| v.action),
            format_score,
            history_score,
            content,
            &normalized,
            &expanded,
        );

        let (action, review_note) = self.final_review(
            adjusted,
            matched_keyword.as_deref(),
            blocked_pattern.is_some(),
            llm.map(|v| v.action),
            format_score,
            history_score,
        );

        Decision {
            action,
            context: DecisionContext {
                matched_keyword,
                blocked_pattern,
                base_score,
                format_score,
                history_score,
                llm_floor,
                total_score,
                message_length,
                link_count,
                uppercase_ratio,
                review_note,
            },
        }
    }

    fn is_age_gap_concern(&self, content: &str, normalized: &str, expanded: &str) -> bool {
        matches_any(&self.minor_ref, content, normalized, expanded)
            && matches_any(&self.adult_ref, content, normalized, expanded)
            && matches_any(&self.relationship_ctx, content, normalized, expanded)
    }

    /// remove を出す前の見直し: 裏付けの弱い削除は警告へ落とし、
    /// 年齢差の懸念はモデレーターへのエスカレーションに上げる。
    #[allow(clippy::too_many_arguments)]
    fn quick_think_review(
        &self,
        proposed: ModAction,
        matched_keyword: Option<&str>,
        blocked: bool,
        llm_action: Option<ModAction>,
        format_score: i32,
        history_score: i32,
        content: &str,
        normalized: &str,
        expanded: &str,
    ) -> ModAction {
        if proposed != ModAction::Remove {
            return proposed;
        }
        if blocked {
            return proposed;
        }
        if llm_action == Some(ModAction::Escalate) {
            return proposed;
        }
        let report_context = matches_any(&self.report_ctx, content, normalized, expanded);
        let soft_signals = format_score < 10 && history_score < 5;
        if report_context || soft_signals {
            return ModAction::Warn;
        }
        if matched_keyword.is_some_and(|k| k.contains("age gap")) {
            return ModAction::Escalate;
        }
        proposed
    }

    /// 最終確認: ルール一致も履歴・形状シグナルも無い措置は allow に戻す
    fn final_review(
        &self,
        proposed: ModAction,
        matched_keyword: Option<&str>,
        blocked: bool,
        llm_action: Option<ModAction>,
        format_score: i32,
        history_score: i32,
    ) -> (ModAction, String) {
        if proposed == ModAction::Allow {
            return (ModAction::Allow, "No moderation action required.".to_string());
        }
        if blocked || matched_keyword.is_some() {
            return (proposed, "Rule match present; keep action.".to_string());
        }
        if llm_action.is_some_and(|a| a != ModAction::Allow) {
            return (proposed, "LLM risk elevated; keep action.".to_string());
        }
        if history_score > 0 {
            return (
                proposed,
                "Recent history indicates spam; keep action.".to_string(),
            );
        }
        if format_score >= 12 {
            return (
                proposed,
                "Message formatting indicates spam; keep action.".to_string(),
            );
        }
        (
            ModAction::Allow,
            "Low risk with no rule matches; action downgraded.".to_string(),
        )
    }
}

fn matches_any(re: &Regex, content: &str, normalized: &str, expanded: &str) -> bool {
    [content, normalized, expanded]
        .iter()
        .any(|c| !c.is_empty() && re.is_match(c))
}

fn score_message_format(length: usize, link_count: usize, uppercase_ratio: f64) -> i32 {
    let mut score = 0;
    if length >= 800 {
        score += 20;
    } else if length >= 400 {
        score += 10;
    }
    if link_count >= 2 {
        score += 12;
    } else if link_count == 1 {
        score += 6;
    }
    if uppercase_ratio >= 0.7 {
        score += 8;
    }
    score
}

fn score_history(history: &HistoryStats) -> i32 {
    let mut score = 0;
    if history.total_recent_tokens >= 2000 {
        score += 12;
    } else if history.total_recent_tokens >= 800 {
        score += 6;
    }
    if history.matched_keyword_repeats > 0 {
        score += (history.matched_keyword_repeats as i32 * 5).min(25);
    }
    score
}

/// 英字 12 文字未満は 0 扱い（短文の全大文字を罰しない）
fn uppercase_ratio(content: &str) -> f64 {
    let mut letters = 0usize;
    let mut uppercase = 0usize;
    for c in content.chars() {
        if c.is_alphabetic() {
            letters += 1;
            if c.is_uppercase() {
                uppercase += 1;
            }
        }
    }
    if letters < 12 {
        return 0.0;
    }
    uppercase as f64 / letters as f64
}
