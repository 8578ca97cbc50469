//! LLM モデレーションレビュー Outbound ポート

use crate::domain::{ChatMessage, Verdict};

/// 最新の発言を直近文脈・メモリとともにレビューする。
/// 失敗は実装側で安全側（allow）の Verdict に落とし、エラーを伝播しない。
pub trait ModReviewer: Send + Sync {
    fn review(&self, message: &ChatMessage, recent_context: &[String], memory_block: &str)
        -> Verdict;
}
