//! Outbound ポート: アプリが外界（時刻・FS・環境変数・ログ・通知）を使うための trait

pub mod clock;
pub mod env_resolver;
pub mod fs;
pub mod log;
pub mod notice_sink;

pub use clock::Clock;
pub use env_resolver::EnvResolver;
pub use fs::FileSystem;
pub use log::{now_iso8601, Log, LogLevel, LogRecord};
pub use notice_sink::{NoticeRecord, NoticeSink};
