//! 通知をイベントログファイルへ 1 行ずつ追記する Sink
//!
//! 旧来のイベントログ互換: `[ts] MESSAGE` をそのまま追記する。

use crate::ports::outbound::{FileSystem, NoticeRecord, NoticeSink};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// `[ts] MESSAGE` をファイルへ追記する Sink
pub struct PlainLogSink {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
}

impl PlainLogSink {
    pub fn new(fs: Arc<dyn FileSystem>, path: impl AsRef<Path>) -> Self {
        Self {
            fs,
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl NoticeSink for PlainLogSink {
    fn emit(&mut self, rec: &NoticeRecord) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            self.fs.create_dir_all(parent)?;
        }
        let mut w = self.fs.open_append(&self.path)?;
        writeln!(w, "[{}] {}", rec.ts, rec.message)?;
        w.flush()?;
        Ok(())
    }
}
