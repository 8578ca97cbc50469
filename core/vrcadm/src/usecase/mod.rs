//! ユースケース

pub mod announce;
pub mod assistant;
pub mod moderation;
pub mod monitor;

pub use announce::Announcer;
pub use assistant::AssistantUseCase;
pub use moderation::{ModerationOutcome, ModerationUseCase};
pub use monitor::Monitor;
