//! アダプタ実装

pub mod jsonl_store;
pub mod llm_reviewer;
pub mod osc_chatbox;
pub mod word_memory;

pub use jsonl_store::JsonlStore;
pub use llm_reviewer::LlmReviewer;
pub use osc_chatbox::OscChatbox;
pub use word_memory::WordMemory;
