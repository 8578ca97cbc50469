//! Outbound ポート: ユースケースが外界（チャットボックス・LLM レビュー）を使うための trait

pub mod chatbox;
pub mod reviewer;

pub use chatbox::ChatboxSink;
pub use reviewer::ModReviewer;
