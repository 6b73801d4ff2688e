//! UseCase: メッセージのブロードキャスト
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - BroadcastMessageUseCase::execute() メソッド
//! - 送信者以外の全登録者への配送と、配送に失敗した登録者の除去
//!
//! ### なぜこのテストが必要か
//! - 遅い・切断済みの受信者が他の受信者への配送を止めてはならない
//! - 配送失敗は送信者に伝播させず、Registry から取り除くことで回復する
//!
//! ### どのような状況を想定しているか
//! - 正常系：送信者以外の全員に配送される
//! - 異常系：受信側が切断済み・キューが満杯
//! - エッジケース：送信者のみが接続している場合（配送対象なし）

use std::sync::Arc;

use crate::domain::{ChatMessage, ClientName, ClientRegistry, DeliveredMessage, Timestamp};

/// ブロードキャストの結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// キューに積めた受信者
    pub delivered: Vec<ClientName>,
    /// 配送に失敗し Registry から除去した受信者
    pub pruned: Vec<ClientName>,
}

/// メッセージブロードキャストのユースケース
#[derive(Clone)]
pub struct BroadcastMessageUseCase {
    /// Registry（データアクセス層の抽象化）
    registry: Arc<dyn ClientRegistry>,
}

impl BroadcastMessageUseCase {
    /// 新しい BroadcastMessageUseCase を作成
    pub fn new(registry: Arc<dyn ClientRegistry>) -> Self {
        Self { registry }
    }

    /// ブロードキャストを実行
    ///
    /// 受信時刻を付与し、送信者以外の全登録者のキューへ非ブロッキングで積む。
    /// 積めなかった受信者は「まだ自分の登録なら削除」で Registry から外し、
    /// エンドポイントを close する。失敗は呼び出し側には返さない。
    ///
    /// # Arguments
    ///
    /// * `message` - 送信するメッセージ（Domain Model）
    ///
    /// # Returns
    ///
    /// 配送できた受信者と除去した受信者
    pub fn execute(&self, message: ChatMessage) -> BroadcastReport {
        let delivered = Arc::new(DeliveredMessage::new(message, Timestamp::now()));

        // 1. 送信者以外のスナップショットを取得（配送中の登録・削除と干渉しない）
        let recipients = self.registry.snapshot_except(delivered.from());

        // 2. 受信者ごとに独立して配送
        let mut report = BroadcastReport::default();
        for (name, endpoint) in recipients {
            match endpoint.try_deliver(Arc::clone(&delivered)) {
                Ok(()) => report.delivered.push(name),
                Err(err) => {
                    tracing::warn!(
                        "Dropping client '{}' ({}): delivery from '{}' failed: {}",
                        name,
                        endpoint.id(),
                        delivered.from(),
                        err
                    );
                    self.registry.remove_if_current(&name, &endpoint);
                    endpoint.close();
                    report.pruned.push(name);
                }
            }
        }

        tracing::debug!(
            "Broadcast from '{}' delivered to {} client(s), pruned {}",
            delivered.from(),
            report.delivered.len(),
            report.pruned.len()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use futures_util::FutureExt;

    use super::*;
    use crate::{
        domain::{Endpoint, MessageBody, MockClientRegistry},
        infrastructure::repository::InMemoryClientRegistry,
    };

    fn name(value: &str) -> ClientName {
        ClientName::try_from(value).unwrap()
    }

    fn message(from: &str, body: &str) -> ChatMessage {
        ChatMessage::new(name(from), MessageBody::new(body.to_string()).unwrap())
    }

    fn create_test_registry() -> Arc<InMemoryClientRegistry> {
        Arc::new(InMemoryClientRegistry::new())
    }

    #[tokio::test]
    async fn test_broadcast_reaches_everyone_but_sender() {
        // テスト項目: 送信者以外の全員に配送され、送信者には配送されない
        // given (前提条件):
        let registry = create_test_registry();
        let usecase = BroadcastMessageUseCase::new(registry.clone());
        let (alice, mut alice_rx) = Endpoint::channel(8);
        let (bob, mut bob_rx) = Endpoint::channel(8);
        let (charlie, mut charlie_rx) = Endpoint::channel(8);
        registry.register(name("alice"), alice);
        registry.register(name("bob"), bob);
        registry.register(name("charlie"), charlie);
        let before = Timestamp::now();

        // when (操作): alice がメッセージを送信
        let mut report = usecase.execute(message("alice", "Hello!"));

        // then (期待する結果):
        report.delivered.sort();
        assert_eq!(report.delivered, vec![name("bob"), name("charlie")]);
        assert!(report.pruned.is_empty());

        let to_bob = bob_rx.recv().now_or_never().flatten().unwrap();
        assert_eq!(to_bob.from(), &name("alice"));
        assert_eq!(to_bob.message.body.as_str(), "Hello!");
        assert!(to_bob.received_at >= before);
        assert!(charlie_rx.recv().now_or_never().flatten().is_some());
        assert!(alice_rx.recv().now_or_never().flatten().is_none());
    }

    #[tokio::test]
    async fn test_broadcast_no_recipients() {
        // テスト項目: 送信者のみが接続している場合、配送対象は空
        // given (前提条件):
        let registry = create_test_registry();
        let usecase = BroadcastMessageUseCase::new(registry.clone());
        let (alice, mut alice_rx) = Endpoint::channel(8);
        registry.register(name("alice"), alice);

        // when (操作):
        let report = usecase.execute(message("alice", "anyone?"));

        // then (期待する結果):
        assert_eq!(report, BroadcastReport::default());
        assert!(alice_rx.recv().now_or_never().flatten().is_none());
        assert_eq!(registry.names(), vec![name("alice")]);
    }

    #[tokio::test]
    async fn test_broadcast_prunes_closed_recipient() {
        // テスト項目: 切断済みの受信者は除去され、他の受信者には配送される
        // given (前提条件):
        let registry = create_test_registry();
        let usecase = BroadcastMessageUseCase::new(registry.clone());
        let (rouz, mut rouz_rx) = Endpoint::channel(8);
        let (igor, igor_rx) = Endpoint::channel(8);
        registry.register(name("rouz"), rouz);
        registry.register(name("igor"), igor.clone());
        drop(igor_rx);

        // when (操作):
        let report = usecase.execute(message("admin", "Hello"));

        // then (期待する結果):
        assert_eq!(report.delivered, vec![name("rouz")]);
        assert_eq!(report.pruned, vec![name("igor")]);
        let to_rouz = rouz_rx.recv().now_or_never().flatten().unwrap();
        assert_eq!(to_rouz.message.body.as_str(), "Hello");
        assert_eq!(registry.names(), vec![name("rouz")]);
        assert!(igor.is_closed());
    }

    #[tokio::test]
    async fn test_broadcast_prunes_full_recipient() {
        // テスト項目: キューが満杯の受信者は遅いクライアントとして除去される
        // given (前提条件):
        let registry = create_test_registry();
        let usecase = BroadcastMessageUseCase::new(registry.clone());
        let (slow, mut slow_rx) = Endpoint::channel(1);
        let (fast, mut fast_rx) = Endpoint::channel(8);
        registry.register(name("slow"), slow.clone());
        registry.register(name("fast"), fast);

        // when (操作): slow のキュー上限を超えて送信
        usecase.execute(message("sender", "1"));
        let report = usecase.execute(message("sender", "2"));

        // then (期待する結果):
        assert_eq!(report.delivered, vec![name("fast")]);
        assert_eq!(report.pruned, vec![name("slow")]);
        assert_eq!(registry.names(), vec![name("fast")]);
        assert!(slow.is_closed());

        // 既にキューにあった分は受信でき、その後ストリームは終了する
        assert_eq!(slow_rx.recv().await.unwrap().message.body.as_str(), "1");
        assert!(slow_rx.recv().await.is_none());
        assert_eq!(fast_rx.recv().await.unwrap().message.body.as_str(), "1");
        assert_eq!(fast_rx.recv().await.unwrap().message.body.as_str(), "2");
    }

    #[tokio::test]
    async fn test_broadcast_preserves_order_per_sender() {
        // テスト項目: 同じ送信者からのメッセージは送信順に届く
        // given (前提条件):
        let registry = create_test_registry();
        let usecase = BroadcastMessageUseCase::new(registry.clone());
        let (rouz, mut rouz_rx) = Endpoint::channel(64);
        registry.register(name("rouz"), rouz);

        // when (操作):
        for i in 0..20 {
            usecase.execute(message("igor", &i.to_string()));
        }

        // then (期待する結果):
        for i in 0..20 {
            let received = rouz_rx.recv().await.unwrap();
            assert_eq!(received.message.body.as_str(), i.to_string());
        }
    }

    #[tokio::test]
    async fn test_broadcast_does_not_prune_newer_registration() {
        // テスト項目: 配送失敗した古いエンドポイントの除去で、新しい登録は消えない
        // given (前提条件): スナップショット後に同名で再登録された状況を Mock で再現
        let (stale, stale_rx) = Endpoint::channel(8);
        drop(stale_rx);
        let stale_for_snapshot = stale.clone();

        let mut registry = MockClientRegistry::new();
        registry
            .expect_snapshot_except()
            .returning(move |_| vec![(name("igor"), stale_for_snapshot.clone())]);
        registry
            .expect_remove_if_current()
            .withf(move |client, endpoint| client.as_str() == "igor" && endpoint.same_as(&stale))
            .times(1)
            .returning(|_, _| None);
        let usecase = BroadcastMessageUseCase::new(Arc::new(registry));

        // when (操作):
        let report = usecase.execute(message("rouz", "hi"));

        // then (期待する結果): 条件付き削除のみが呼ばれる
        assert_eq!(report.pruned, vec![name("igor")]);
    }
}
