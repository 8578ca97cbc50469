//! LLM プロバイダのトレイト定義

use crate::error::Error;
use serde_json::Value;

/// LLM プロバイダのトレイト
///
/// ペイロード生成・HTTP 実行・テキスト抽出の 3 段に分け、
/// ネットワークを伴わない段だけを単体テストできるようにする。
pub trait LlmProvider {
    /// プロバイダ名を返す
    fn name(&self) -> &str;

    /// リクエストペイロードを生成する
    fn make_request_payload(
        &self,
        query: &str,
        system_instruction: Option<&str>,
        history: &[Message],
    ) -> Result<Value, Error>;

    /// HTTP リクエストを実行してレスポンス JSON 文字列を返す
    fn make_http_request(&self, request_json: &str) -> Result<String, Error>;

    /// レスポンス JSON からテキストを抽出する（存在しなければ None）
    fn parse_response_text(&self, response_json: &str) -> Result<Option<String>, Error>;
}

/// 会話メッセージ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_ctors() {
        assert_eq!(Message::system("s").role, "system");
        assert_eq!(Message::user("u").role, "user");
        assert_eq!(Message::assistant("a").role, "assistant");
        assert_eq!(Message::user("hello").content, "hello");
    }
}
