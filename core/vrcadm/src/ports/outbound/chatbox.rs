//! チャットボックス送信 Outbound ポート

use common::error::Error;

/// VRChat のチャットボックスへテキストを送る
pub trait ChatboxSink: Send + Sync {
    fn send_chatbox(&self, text: &str) -> Result<(), Error>;
}
