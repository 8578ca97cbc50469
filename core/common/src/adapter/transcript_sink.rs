//! 通知を JSONL で保存する Sink
//!
//! 後から機械処理できるよう、NoticeRecord をそのまま 1 行 1 JSON で追記する。

use crate::ports::outbound::{FileSystem, NoticeRecord, NoticeSink};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// NoticeRecord を JSONL 追記する Sink
pub struct TranscriptSink {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
}

impl TranscriptSink {
    pub fn new(fs: Arc<dyn FileSystem>, path: impl AsRef<Path>) -> Self {
        Self {
            fs,
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl NoticeSink for TranscriptSink {
    fn emit(&mut self, rec: &NoticeRecord) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            self.fs.create_dir_all(parent)?;
        }
        let line = serde_json::to_string(rec)?;
        let mut w = self.fs.open_append(&self.path)?;
        writeln!(w, "{}", line)?;
        w.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::StdFileSystem;

    #[test]
    fn test_appends_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transcript.jsonl");
        let mut sink = TranscriptSink::new(Arc::new(StdFileSystem), &path);
        sink.emit(&NoticeRecord {
            ts: "2026-08-06T00:00:00+00:00".to_string(),
            seq: 7,
            kind: "moderation".to_string(),
            message: "MOD ALERT -> Niko: WARN".to_string(),
        })
        .unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        let v: serde_json::Value = serde_json::from_str(contents.trim()).unwrap();
        assert_eq!(v["seq"], 7);
        assert_eq!(v["kind"], "moderation");
    }
}
