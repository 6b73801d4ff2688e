//! UseCase: ワンショット送信
//!
//! 持続接続を持たない送信経路（`POST /api/messages`）。送信者は事前に
//! リスナーまたはセッションとして登録されている必要があります。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SubmitMessageUseCase::execute() メソッド
//!
//! ### なぜこのテストが必要か
//! - 未登録の送信者からのメッセージが配送されないことを保証
//! - 既に閉じたエンドポイントは「登録なし」と同じ扱いにする
//!
//! ### どのような状況を想定しているか
//! - 正常系：登録済みの送信者からのブロードキャスト
//! - 異常系：未登録、閉じたエンドポイント

use std::sync::Arc;

use crate::domain::{ChatMessage, ClientRegistry};

use super::{
    broadcast_message::{BroadcastMessageUseCase, BroadcastReport},
    error::SubmitError,
};

/// ワンショット送信のユースケース
pub struct SubmitMessageUseCase {
    /// Registry（データアクセス層の抽象化）
    registry: Arc<dyn ClientRegistry>,
    broadcast: BroadcastMessageUseCase,
}

impl SubmitMessageUseCase {
    /// 新しい SubmitMessageUseCase を作成
    pub fn new(registry: Arc<dyn ClientRegistry>) -> Self {
        Self {
            broadcast: BroadcastMessageUseCase::new(Arc::clone(&registry)),
            registry,
        }
    }

    /// ワンショット送信を実行
    ///
    /// # Returns
    ///
    /// * `Ok(BroadcastReport)` - ブロードキャスト結果
    /// * `Err(SubmitError::NotSubscribed)` - 送信者に有効なエンドポイントがない
    pub fn execute(&self, message: ChatMessage) -> Result<BroadcastReport, SubmitError> {
        // 1. 送信者の登録を確認
        let Some(endpoint) = self.registry.lookup(&message.from) else {
            return Err(SubmitError::NotSubscribed(message.from.into_string()));
        };
        if endpoint.is_closed() {
            self.registry.remove_if_current(&message.from, &endpoint);
            return Err(SubmitError::NotSubscribed(message.from.into_string()));
        }

        // 2. ブロードキャスト
        Ok(self.broadcast.execute(message))
    }
}
