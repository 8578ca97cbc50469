//! ログ行からの join / leave / chat イベント抽出

use crate::domain::ChatMessage;
use common::error::Error;
use regex::Regex;

/// ログから抽出したイベント
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEvent {
    Join(String),
    Leave(String),
    Chat(ChatMessage),
}

/// 固定の抽出パターンをコンパイル済みで保持するパーサ
pub struct EventParser {
    join: Regex,
    leave: Regex,
    chat: Vec<Regex>,
}

impl EventParser {
    pub fn new() -> Result<Self, Error> {
        let compile = |p: &str| {
            Regex::new(p).map_err(|e| Error::invalid_argument(format!("bad pattern {}: {}", p, e)))
        };
        Ok(Self {
            join: compile(r"OnPlayerJoined\s+(.+)$")?,
            leave: compile(r"OnPlayerLeft\s+(.+)$")?,
            chat: vec![
                compile(r"(?i)OnPlayerChat(?:Message)?\s+([^:]+):\s*(.+)$")?,
                compile(r"(?i)\[Chat\]\s+([^:]+):\s*(.+)$")?,
                compile(r"(?i)ChatMessage\s+from\s+(.+?):\s*(.+)$")?,
            ],
        })
    }

    /// 1 行を解析する。join / leave が chat より優先。
    pub fn parse_line(&self, line: &str) -> Option<LogEvent> {
        if let Some(c) = self.join.captures(line) {
            let name = c[1].trim();
            if !name.is_empty() {
                return Some(LogEvent::Join(name.to_string()));
            }
        }
        if let Some(c) = self.leave.captures(line) {
            let name = c[1].trim();
            if !name.is_empty() {
                return Some(LogEvent::Leave(name.to_string()));
            }
        }
        for re in &self.chat {
            if let Some(c) = re.captures(line) {
                let user = c[1].trim();
                let text = c[2].trim();
                if !user.is_empty() && !text.is_empty() {
                    return Some(LogEvent::Chat(ChatMessage::new(user, text)));
                }
            }
        }
        None
    }

    /// ファイル全体の join / leave を再生して現在アクティブな名前を初出順で返す
    pub fn active_players<'a>(&self, lines: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let mut roster = crate::domain::Roster::new();
        for line in lines {
            match self.parse_line(line) {
                Some(LogEvent::Join(name)) => roster.apply_join(&name),
                Some(LogEvent::Leave(name)) => roster.apply_leave(&name),
                _ => {}
            }
        }
        roster.active().into_iter().map(|s| s.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> EventParser {
        EventParser::new().unwrap()
    }

    #[test]
    fn test_join_leave_extraction() {
        let p = parser();
        assert_eq!(
            p.parse_line("2026.08.06 12:00:00 Log - [Behaviour] OnPlayerJoined Niko Tan"),
            Some(LogEvent::Join("Niko Tan".to_string()))
        );
        assert_eq!(
            p.parse_line("2026.08.06 12:05:00 Log - [Behaviour] OnPlayerLeft Niko Tan"),
            Some(LogEvent::Leave("Niko Tan".to_string()))
        );
    }

    #[test]
    fn test_chat_extraction_variants() {
        let p = parser();
        let expect = |user: &str, text: &str| {
            Some(LogEvent::Chat(ChatMessage::new(user, text)))
        };
        assert_eq!(
            p.parse_line("OnPlayerChat Niko: hello world"),
            expect("Niko", "hello world")
        );
        assert_eq!(
            p.parse_line("onplayerchatmessage Niko:  spaced out "),
            expect("Niko", "spaced out")
        );
        assert_eq!(
            p.parse_line("12:00 [chat] Ben: are you there?"),
            expect("Ben", "are you there?")
        );
        assert_eq!(
            p.parse_line("ChatMessage from Mira: ok"),
            expect("Mira", "ok")
        );
    }

    #[test]
    fn test_non_matching_lines() {
        let p = parser();
        assert_eq!(p.parse_line("ordinary log noise"), None);
        assert_eq!(p.parse_line("OnPlayerChat : no user"), None);
        assert_eq!(p.parse_line("OnPlayerChat Niko:"), None);
    }

    #[test]
    fn test_join_wins_over_chat_patterns() {
        // OnPlayerJoined を含む行がチャットとして誤抽出されないこと
        let p = parser();
        let event = p.parse_line("OnPlayerJoined Niko: the second");
        assert_eq!(event, Some(LogEvent::Join("Niko: the second".to_string())));
    }

    #[test]
    fn test_active_players_replay() {
        let p = parser();
        let lines = vec![
            "OnPlayerJoined Aki",
            "OnPlayerJoined Ben",
            "OnPlayerLeft Aki",
            "OnPlayerJoined Cho",
            "OnPlayerJoined Aki",
        ];
        assert_eq!(p.active_players(lines), vec!["Aki", "Ben", "Cho"]);
    }
}
