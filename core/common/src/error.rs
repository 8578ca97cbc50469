//! エラーハンドリング
//!
//! 全レイヤー共通の Error 型。メッセージと sysexits 互換の終了コードを対応付ける。

use thiserror::Error as ThisError;

/// 共通エラー型
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum Error {
    /// ファイル・ソケット等の I/O エラー
    #[error("{0}")]
    Io(String),

    /// JSON のシリアライズ・デシリアライズ失敗
    #[error("{0}")]
    Json(String),

    /// HTTP リクエスト失敗（接続・ステータス・ボディ読み取り）
    #[error("{0}")]
    Http(String),

    /// 環境変数が未設定・不正
    #[error("{0}")]
    Env(String),

    /// CLI 引数・設定値の不正（usage エラー）
    #[error("{0}")]
    InvalidArgument(String),

    /// 対象が見つからない
    #[error("{0}")]
    NotFound(String),
}

impl Error {
    pub fn io_msg(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    pub fn json(msg: impl Into<String>) -> Self {
        Self::Json(msg.into())
    }

    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    pub fn env(msg: impl Into<String>) -> Self {
        Self::Env(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// sysexits(3) 互換の終了コード
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io(_) => 74,
            Self::Json(_) => 65,
            Self::Http(_) => 69,
            Self::Env(_) => 78,
            Self::InvalidArgument(_) => 64,
            Self::NotFound(_) => 66,
        }
    }

    /// usage エラー（main で usage 行を表示するか）
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }
}
