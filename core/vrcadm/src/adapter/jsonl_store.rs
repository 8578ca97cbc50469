//! 有界 JSONL ストア
//!
//! 追記のたびに「最新 max_items 件・合計 max_bytes 以内」へ切り詰めて書き戻す。
//! バイト上限の切り詰めでも最低 1 件は残す。読み込みは壊れた行を読み飛ばす。

use common::error::Error;
use common::ports::outbound::FileSystem;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// 1 ファイル分の有界 JSONL ストア
pub struct JsonlStore {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
    max_items: usize,
    max_bytes: usize,
}

impl JsonlStore {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        path: impl AsRef<Path>,
        max_items: usize,
        max_bytes: usize,
    ) -> Self {
        Self {
            fs,
            path: path.as_ref().to_path_buf(),
            max_items,
            max_bytes,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 1 レコードを追記し、上限まで切り詰める
    pub fn append(&self, record: &serde_json::Value) -> Result<(), Error> {
        let line = serde_json::to_string(record).map_err(|e| Error::json(e.to_string()))?;

        let mut lines: Vec<String> = if self.fs.exists(&self.path) {
            self.fs
                .read_to_string(&self.path)?
                .lines()
                .filter(|l| !l.trim().is_empty())
                .map(|l| l.to_string())
                .collect()
        } else {
            Vec::new()
        };
        lines.push(line);

        if self.max_items > 0 && lines.len() > self.max_items {
            lines.drain(..lines.len() - self.max_items);
        }
        if self.max_bytes > 0 {
            // +1 は改行の分
            let total = |ls: &[String]| ls.iter().map(|l| l.len() + 1).sum::<usize>();
            while lines.len() > 1 && total(&lines) > self.max_bytes {
                lines.remove(0);
            }
        }

        if let Some(parent) = self.path.parent() {
            self.fs.create_dir_all(parent)?;
        }
        let mut contents = lines.join("\n");
        contents.push('\n');
        self.fs.write(&self.path, &contents)
    }

    /// 新しい順ではなくファイル順（古い → 新しい）で末尾 limit 件を返す
    pub fn load_recent(&self, limit: usize) -> Result<Vec<serde_json::Value>, Error> {
        if !self.fs.exists(&self.path) {
            return Ok(Vec::new());
        }
        let contents = self.fs.read_to_string(&self.path)?;
        let lines: Vec<&str> = contents
            .lines()
            .filter(|l| !l.trim().is_empty())
            .collect();
        let start = lines.len().saturating_sub(limit);
        Ok(lines[start..]
            .iter()
            .filter_map(|l| serde_json::from_str(l).ok())
            .collect())
    }
}
