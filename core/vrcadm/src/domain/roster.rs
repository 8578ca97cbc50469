//! アクティブプレイヤー名簿
//!
//! join/leave イベントを適用し、初出順を保ったままアクティブな名前を返す。
//! leave した名前も順序維持のため残し、非アクティブとしてマークする。

/// 順序付きプレイヤー名簿
#[derive(Debug, Clone, Default)]
pub struct Roster {
    /// (名前, アクティブか) を初出順で保持
    entries: Vec<(String, bool)>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_join(&mut self, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| n == name) {
            entry.1 = true;
        } else {
            self.entries.push((name.to_string(), true));
        }
    }

    pub fn apply_leave(&mut self, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| n == name) {
            entry.1 = false;
        } else {
            // join を見ていない leave も順序維持のため記録する
            self.entries.push((name.to_string(), false));
        }
    }

    /// 現在アクティブな名前を初出順で返す
    pub fn active(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, active)| *active)
            .map(|(n, _)| n.as_str())
            .collect()
    }

    pub fn active_count(&self) -> usize {
        self.entries.iter().filter(|(_, a)| *a).count()
    }
}
