//! vrcadm 共通ライブラリ
//!
//! `vrcadm` バイナリから利用する基盤機能を提供します。

/// エラーハンドリング
pub mod error;

/// ドメイン型（Newtype）
pub mod domain;

/// Outbound ポート（時刻・FS・環境変数・構造化ログ・通知 Sink）
pub mod ports;

/// 標準アダプタ
pub mod adapter;

/// 運用者向け通知の配信（NoticeHub）
pub mod notice_hub;

/// LLM ドライバーとプロバイダ
pub mod llm;
