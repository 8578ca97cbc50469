//! 標準アダプタ

pub mod file_json_log;
pub mod human_log_sink;
pub mod plain_log_sink;
pub mod std_clock;
pub mod std_env_resolver;
pub mod std_fs;
pub mod transcript_sink;

pub use file_json_log::{FileJsonLog, NoopLog};
pub use human_log_sink::HumanLogSink;
pub use plain_log_sink::PlainLogSink;
pub use std_clock::StdClock;
pub use std_env_resolver::{FixedHomeResolver, StdEnvResolver};
pub use std_fs::StdFileSystem;
pub use transcript_sink::TranscriptSink;
