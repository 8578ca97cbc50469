//! ユーザー別ワード頻度メモリ
//!
//! 発言をトークン化（ユニグラム + 隣接バイグラム）して JSONL に永続化し、
//! ユーザーごとの直近トークン数・特定トークンの出現回数を返す。
//! 保持期間を過ぎたイベントは読み込み時に落とし、落としたときはファイルを書き直す。

use common::error::Error;
use common::ports::outbound::{Clock, FileSystem};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const DEFAULT_RETENTION_DAYS: u64 = 30;

/// JSONL の 1 行（1 発言分のイベント）
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WordEvent {
    ts_ms: u64,
    user: String,
    content: String,
    tokens: BTreeMap<String, u32>,
}

/// ワード頻度メモリ
pub struct WordMemory {
    fs: Arc<dyn FileSystem>,
    clock: Arc<dyn Clock>,
    path: PathBuf,
    retention_ms: u64,
    events: VecDeque<WordEvent>,
    counts: HashMap<String, HashMap<String, u32>>,
}

impl WordMemory {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        clock: Arc<dyn Clock>,
        path: impl AsRef<Path>,
        retention_days: Option<u64>,
    ) -> Self {
        let days = retention_days.unwrap_or(DEFAULT_RETENTION_DAYS);
        Self {
            fs,
            clock,
            path: path.as_ref().to_path_buf(),
            retention_ms: days * 24 * 60 * 60 * 1000,
            events: VecDeque::new(),
            counts: HashMap::new(),
        }
    }

    /// ファイルから読み込む。期限切れ・壊れた行は落とし、落としたら書き直す。
    pub fn load(&mut self) -> Result<(), Error> {
        if !self.fs.exists(&self.path) {
            return Ok(());
        }
        let now = self.clock.now_ms();
        let contents = self.fs.read_to_string(&self.path)?;
        let mut compact_needed = false;
        for line in contents.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<WordEvent>(line) {
                Ok(event) if !self.is_expired(&event, now) => self.add_event(event),
                _ => compact_needed = true,
            }
        }
        if compact_needed {
            self.rewrite_file()?;
        }
        Ok(())
    }

    /// 1 発言を記録して追記する。古いイベントを落としたときは書き直す。
    pub fn record_message(&mut self, user: &str, content: &str) {
        let content = content.trim();
        if content.is_empty() {
            return;
        }
        let tokens = token_counts(content);
        if tokens.is_empty() {
            return;
        }
        let now = self.clock.now_ms();
        let event = WordEvent {
            ts_ms: now,
            user: user.to_string(),
            content: content.to_string(),
            tokens,
        };
        let pruned = self.prune(now);
        self.add_event(event.clone());
        let result = if pruned {
            self.rewrite_file()
        } else {
            self.append_event(&event)
        };
        if let Err(e) = result {
            eprintln!("[word_memory] persist failed: {}", e);
        }
    }

    /// ユーザーの直近トークン総数
    pub fn total_tokens(&self, user: &str) -> u64 {
        self.counts
            .get(user)
            .map(|m| m.values().map(|&v| v as u64).sum())
            .unwrap_or(0)
    }

    /// ユーザーの特定トークンの出現回数
    pub fn token_count(&self, user: &str, token: &str) -> u64 {
        let normalized = token.trim().to_lowercase();
        if normalized.is_empty() {
            return 0;
        }
        self.counts
            .get(user)
            .and_then(|m| m.get(&normalized))
            .copied()
            .unwrap_or(0) as u64
    }

    fn is_expired(&self, event: &WordEvent, now: u64) -> bool {
        now.saturating_sub(event.ts_ms) > self.retention_ms
    }

    fn add_event(&mut self, event: WordEvent) {
        let user_counts = self.counts.entry(event.user.clone()).or_default();
        for (token, n) in &event.tokens {
            *user_counts.entry(token.clone()).or_insert(0) += n;
        }
        self.events.push_back(event);
    }

    fn prune(&mut self, now: u64) -> bool {
        let mut removed = false;
        while self
            .events
            .front()
            .is_some_and(|e| self.is_expired(e, now))
        {
            let Some(expired) = self.events.pop_front() else {
                break;
            };
            removed = true;
            if let Some(user_counts) = self.counts.get_mut(&expired.user) {
                for (token, n) in &expired.tokens {
                    if let Some(count) = user_counts.get_mut(token) {
                        *count = count.saturating_sub(*n);
                        if *count == 0 {
                            user_counts.remove(token);
                        }
                    }
                }
                if user_counts.is_empty() {
                    self.counts.remove(&expired.user);
                }
            }
        }
        removed
    }

    fn append_event(&self, event: &WordEvent) -> Result<(), Error> {
        self.ensure_parent()?;
        let line = serde_json::to_string(event).map_err(|e| Error::json(e.to_string()))?;
        let mut w = self.fs.open_append(&self.path)?;
        writeln!(w, "{}", line).map_err(|e| Error::io_msg(e.to_string()))?;
        w.flush().map_err(|e| Error::io_msg(e.to_string()))?;
        Ok(())
    }

    fn rewrite_file(&self) -> Result<(), Error> {
        self.ensure_parent()?;
        let mut contents = String::new();
        for event in &self.events {
            let line = serde_json::to_string(event).map_err(|e| Error::json(e.to_string()))?;
            contents.push_str(&line);
            contents.push('\n');
        }
        self.fs.write(&self.path, &contents)
    }

    fn ensure_parent(&self) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            self.fs.create_dir_all(parent)?;
        }
        Ok(())
    }
}

/// ユニグラム + 隣接バイグラムのトークン数を数える
fn token_counts(content: &str) -> BTreeMap<String, u32> {
    let lowered = content.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    let mut counts = BTreeMap::new();
    for w in &words {
        *counts.entry(w.to_string()).or_insert(0) += 1;
    }
    for pair in words.windows(2) {
        *counts.entry(format!("{} {}", pair[0], pair[1])).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::adapter::StdFileSystem;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// テスト用の可変時刻
    struct TestClock(AtomicU64);

    impl Clock for TestClock {
        fn now_ms(&self) -> u64 {
            self.0.load(Ordering::Relaxed)
        }
        fn now_rfc3339(&self) -> String {
            format!("t{}", self.now_ms())
        }
    }

    fn memory(dir: &Path, clock: Arc<TestClock>) -> WordMemory {
        WordMemory::new(
            Arc::new(StdFileSystem),
            clock,
            dir.join("word_memory.jsonl"),
            Some(30),
        )
    }

    #[test]
    fn test_token_counts_unigrams_and_bigrams() {
        let counts = token_counts("Dox him, dox him");
        assert_eq!(counts["dox"], 2);
        assert_eq!(counts["him"], 2);
        assert_eq!(counts["dox him"], 2);
        assert_eq!(counts["him dox"], 1);
    }

    #[test]
    fn test_record_and_query() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(TestClock(AtomicU64::new(1_000)));
        let mut m = memory(dir.path(), Arc::clone(&clock));
        m.record_message("Niko", "leak the address");
        m.record_message("Niko", "leak it now");
        m.record_message("Ben", "hello");

        assert_eq!(m.token_count("Niko", "leak"), 2);
        assert_eq!(m.token_count("Niko", "LEAK "), 2);
        assert_eq!(m.token_count("Ben", "leak"), 0);
        assert!(m.total_tokens("Niko") > m.total_tokens("Ben"));
        // バイグラムも数えている
        assert_eq!(m.token_count("Niko", "leak it"), 1);
    }

    #[test]
    fn test_load_restores_counts() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(TestClock(AtomicU64::new(1_000)));
        {
            let mut m = memory(dir.path(), Arc::clone(&clock));
            m.record_message("Niko", "dox threat");
        }
        let mut reloaded = memory(dir.path(), clock);
        reloaded.load().unwrap();
        assert_eq!(reloaded.token_count("Niko", "dox"), 1);
        assert_eq!(reloaded.token_count("Niko", "dox threat"), 1);
    }

    #[test]
    fn test_retention_prunes_and_compacts() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(TestClock(AtomicU64::new(1_000)));
        {
            let mut m = memory(dir.path(), Arc::clone(&clock));
            m.record_message("Niko", "old words");
        }
        // 31 日後
        clock
            .0
            .store(1_000 + 31 * 24 * 60 * 60 * 1000, Ordering::Relaxed);
        let mut reloaded = memory(dir.path(), Arc::clone(&clock));
        reloaded.load().unwrap();
        assert_eq!(reloaded.total_tokens("Niko"), 0);
        // 期限切れを落としたのでファイルも空になっている
        let contents =
            std::fs::read_to_string(dir.path().join("word_memory.jsonl")).unwrap();
        assert!(contents.trim().is_empty());
    }

    #[test]
    fn test_corrupt_lines_skipped_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("word_memory.jsonl");
        std::fs::write(&path, "garbage line\n").unwrap();
        let clock = Arc::new(TestClock(AtomicU64::new(1_000)));
        let mut m = memory(dir.path(), clock);
        m.load().unwrap();
        assert_eq!(m.total_tokens("anyone"), 0);
    }

    #[test]
    fn test_blank_message_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(TestClock(AtomicU64::new(1_000)));
        let mut m = memory(dir.path(), clock);
        m.record_message("Niko", "   ");
        m.record_message("Niko", "!!!");
        assert_eq!(m.total_tokens("Niko"), 0);
        assert!(!dir.path().join("word_memory.jsonl").exists());
    }
}
