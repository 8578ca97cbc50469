//! VRChat クライアントログの追尾とイベント抽出

pub mod events;
pub mod locate;
pub mod tailer;

pub use events::{EventParser, LogEvent};
pub use locate::{find_latest_log, resolve_log_path};
pub use tailer::LogTailer;
