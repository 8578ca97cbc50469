//! 時刻 Outbound ポート

/// 現在時刻の取得。テストでは固定時刻の実装に差し替える。
pub trait Clock: Send + Sync {
    /// UNIX エポックからのミリ秒
    fn now_ms(&self) -> u64;

    /// ISO8601 (RFC3339) 形式の現在時刻文字列
    fn now_rfc3339(&self) -> String;
}
