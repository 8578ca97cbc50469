//! 通知を stdout に 1 行で表示する Sink
//!
//! デーモン実行時の画面出力。`[ts] MESSAGE` 形式。

use crate::ports::outbound::{NoticeRecord, NoticeSink};

/// stdout へ `[ts] MESSAGE` を出力する Sink
#[derive(Debug, Clone, Default)]
pub struct HumanLogSink;

impl HumanLogSink {
    pub fn new() -> Self {
        Self
    }

    fn format(rec: &NoticeRecord) -> String {
        format!("[{}] {}", rec.ts, rec.message)
    }
}

impl NoticeSink for HumanLogSink {
    fn emit(&mut self, rec: &NoticeRecord) -> anyhow::Result<()> {
        println!("{}", Self::format(rec));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format() {
        let rec = NoticeRecord {
            ts: "2026-08-06T00:00:00+00:00".to_string(),
            seq: 1,
            kind: "osc".to_string(),
            message: "OSC /avatar/parameters/x -> 1".to_string(),
        };
        assert_eq!(
            HumanLogSink::format(&rec),
            "[2026-08-06T00:00:00+00:00] OSC /avatar/parameters/x -> 1"
        );
    }
}
