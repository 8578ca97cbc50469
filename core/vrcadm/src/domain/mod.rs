//! ドメイン型

pub mod command;
pub mod memory;
pub mod roster;

pub use command::Command;
pub use memory::{AssistantMemoryRecord, ModMemoryRecord};
pub use roster::Roster;

/// チャット 1 件（ログから抽出した発言）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub user: String,
    pub text: String,
}

impl ChatMessage {
    pub fn new(user: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            text: text.into(),
        }
    }
}

/// モデレーションアクション
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModAction {
    Allow,
    Warn,
    Remove,
    Escalate,
}

impl ModAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Warn => "warn",
            Self::Remove => "remove",
            Self::Escalate => "escalate",
        }
    }

    /// 文字列から解析する。未知のアクションは安全側の allow に落とす。
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "warn" => Self::Warn,
            "remove" => Self::Remove,
            "escalate" => Self::Escalate,
            _ => Self::Allow,
        }
    }
}

/// LLM レビューの判定
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub action: ModAction,
    pub reason: String,
    pub confidence: f64,
}

impl Verdict {
    pub fn new(action: ModAction, reason: impl Into<String>, confidence: f64) -> Self {
        Self {
            action,
            reason: reason.into(),
            confidence,
        }
    }

    /// 判定不能時の安全側デフォルト
    pub fn allow(reason: impl Into<String>, confidence: f64) -> Self {
        Self::new(ModAction::Allow, reason, confidence)
    }
}

/// アシスタントの生成モード
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssistantMode {
    Idea,
    Snippet,
}

impl AssistantMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idea => "idea",
            Self::Snippet => "snippet",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mod_action_parse_known() {
        assert_eq!(ModAction::parse("warn"), ModAction::Warn);
        assert_eq!(ModAction::parse("REMOVE"), ModAction::Remove);
        assert_eq!(ModAction::parse(" escalate "), ModAction::Escalate);
        assert_eq!(ModAction::parse("allow"), ModAction::Allow);
    }

    #[test]
    fn test_mod_action_parse_unknown_is_allow() {
        assert_eq!(ModAction::parse("ban"), ModAction::Allow);
        assert_eq!(ModAction::parse(""), ModAction::Allow);
    }

    #[test]
    fn test_verdict_allow_helper() {
        let v = Verdict::allow("No AI response", 0.3);
        assert_eq!(v.action, ModAction::Allow);
        assert_eq!(v.confidence, 0.3);
    }
}
