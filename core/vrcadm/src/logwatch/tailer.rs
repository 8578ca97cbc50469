//! バイトオフセットによるログ追尾
//!
//! 新規作成時はファイル末尾にアンカーし、以降の poll で増分だけを読む。
//! ファイルが縮んだとき（ローテーション・切り詰め）は新しい末尾に再アンカーする。
//! 行末まで届いていない断片は持ち越し、完成した行だけを返す。

use common::error::Error;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// 1 ファイルを追尾するリーダー
pub struct LogTailer {
    path: PathBuf,
    pos: u64,
    partial: String,
}

impl LogTailer {
    /// ファイル末尾にアンカーした tailer を作る（既存内容は読まない）
    pub fn anchored(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let len = std::fs::metadata(&path)
            .map_err(|e| Error::io_msg(format!("stat {}: {}", path.display(), e)))?
            .len();
        Ok(Self {
            path,
            pos: len,
            partial: String::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 前回位置からの新しい完成行を返す
    pub fn poll(&mut self) -> Result<Vec<String>, Error> {
        let len = std::fs::metadata(&self.path)
            .map_err(|e| Error::io_msg(format!("stat {}: {}", self.path.display(), e)))?
            .len();

        if len < self.pos {
            // 縮んだ: 切り詰めとみなして末尾へ再アンカー
            self.pos = len;
            self.partial.clear();
            return Ok(Vec::new());
        }
        if len == self.pos {
            return Ok(Vec::new());
        }

        let mut file = File::open(&self.path)
            .map_err(|e| Error::io_msg(format!("open {}: {}", self.path.display(), e)))?;
        file.seek(SeekFrom::Start(self.pos))
            .map_err(|e| Error::io_msg(format!("seek {}: {}", self.path.display(), e)))?;
        let mut buf = Vec::with_capacity((len - self.pos) as usize);
        let read = file
            .take(len - self.pos)
            .read_to_end(&mut buf)
            .map_err(|e| Error::io_msg(format!("read {}: {}", self.path.display(), e)))?;
        self.pos += read as u64;

        let chunk = String::from_utf8_lossy(&buf);
        let mut text = std::mem::take(&mut self.partial);
        text.push_str(&chunk);

        let mut lines: Vec<String> = Vec::new();
        let ends_complete = text.ends_with('\n');
        for line in text.split('\n') {
            lines.push(line.trim_end_matches('\r').to_string());
        }
        // split は末尾に空要素（完結時）または未完の断片を残す
        if let Some(last) = lines.pop() {
            if !ends_complete {
                self.partial = last;
            }
        }
        lines.retain(|l| !l.is_empty());
        Ok(lines)
    }
}
