//! 運用者向け通知の Sink ポート
//!
//! 1 回の emit で複数 sink へ配信するための trait。構造化ログ（Log）とは別の契約で、
//! こちらは画面・イベントログファイルなど人が読む出力先を担当する。

use serde::Serialize;

/// 1 件分の通知（画面 1 行・イベントログ 1 行・transcript JSONL 1 行に対応）
#[derive(Debug, Clone, Serialize)]
pub struct NoticeRecord {
    /// ISO8601 形式のタイムスタンプ
    pub ts: String,
    /// hub 内の通し番号
    pub seq: u64,
    /// 例: lifecycle, osc, roster, moderation, announce, assistant, error
    pub kind: String,
    pub message: String,
}

/// NoticeRecord を 1 件受け取る Sink（&mut self: BufWriter 等の内部状態を許容）
pub trait NoticeSink: Send {
    fn emit(&mut self, rec: &NoticeRecord) -> anyhow::Result<()>;
}
