//! モデレーション判定（正規化・パターン・スコアリング）

pub mod engine;
pub mod normalize;
pub mod patterns;

pub use engine::{Decision, DecisionContext, DecisionEngine, HistoryStats, Thresholds};
pub use normalize::{Morphology, TextNormalizer};
