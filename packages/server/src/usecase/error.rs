//! UseCase 層のエラー定義

use thiserror::Error;

/// ワンショット送信（`submit`）のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// 送信者の名前で有効なエンドポイントが登録されていない
    #[error("client '{0}' is not subscribed")]
    NotSubscribed(String),
}

/// 受信ストリーム（トランスポート層）が返すエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InboundError {
    /// 相手側によるキャンセル。通常の切断として扱う
    #[error("inbound stream cancelled by peer")]
    Cancelled,

    /// それ以外のトランスポートエラー。ログに記録した上で通常の切断と同様に後始末する
    #[error("inbound transport error: {0}")]
    Transport(String),
}
