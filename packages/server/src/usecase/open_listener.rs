//! UseCase: 受信専用リスナーの登録
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - OpenListenerUseCase::execute() メソッド
//! - ListenerSubscription の受信と、破棄時の登録解除
//!
//! ### なぜこのテストが必要か
//! - 同名のリスナーが後から登録された場合、古いリスナーは閉じられなければならない
//! - リスナーが去った後に名前が残り続けてはならない
//!
//! ### どのような状況を想定しているか
//! - 正常系：リスナーがブロードキャストを受信する
//! - 置き換え：同名リスナーの後勝ち
//! - 破棄：置き換え済みのリスナーを破棄しても新しい登録は残る

use std::{
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use futures_util::Stream;

use crate::domain::{ClientName, ClientRegistry, DeliveredMessage, DeliveryStream, Endpoint};

/// 受信専用リスナー登録のユースケース
pub struct OpenListenerUseCase {
    /// Registry（データアクセス層の抽象化）
    registry: Arc<dyn ClientRegistry>,
    /// リスナーごとの送信キュー上限
    outbound_capacity: usize,
}

impl OpenListenerUseCase {
    /// 新しい OpenListenerUseCase を作成
    pub fn new(registry: Arc<dyn ClientRegistry>, outbound_capacity: usize) -> Self {
        Self {
            registry,
            outbound_capacity,
        }
    }

    /// リスナー登録を実行
    ///
    /// 同名の既存エンドポイントがあれば置き換えて close する（後勝ち）。
    pub fn execute(&self, name: ClientName) -> ListenerSubscription {
        let (endpoint, stream) = Endpoint::channel(self.outbound_capacity);

        if let Some(previous) = self.registry.register(name.clone(), endpoint.clone()) {
            tracing::info!(
                "Listener '{}' supersedes {}; closing the previous endpoint",
                name,
                previous.id()
            );
            previous.close();
        }
        tracing::info!("Listener '{}' registered ({})", name, endpoint.id());

        ListenerSubscription {
            name,
            endpoint,
            stream,
            registry: Some(Arc::clone(&self.registry)),
        }
    }

    /// 登録せず、既に閉じたサブスクリプションを返す（シャットダウン後の要求用）
    pub fn closed(&self, name: ClientName) -> ListenerSubscription {
        let (endpoint, stream) = Endpoint::channel(1);
        endpoint.close();
        ListenerSubscription {
            name,
            endpoint,
            stream,
            registry: None,
        }
    }
}

/// リスナーの受信ストリーム
///
/// 破棄されると、まだ自分の登録であれば Registry から外れる。
pub struct ListenerSubscription {
    name: ClientName,
    endpoint: Endpoint,
    stream: DeliveryStream,
    registry: Option<Arc<dyn ClientRegistry>>,
}

impl ListenerSubscription {
    pub fn name(&self) -> &ClientName {
        &self.name
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// 次の配送。置き換え・除去・シャットダウン後は `None`
    pub async fn recv(&mut self) -> Option<Arc<DeliveredMessage>> {
        self.stream.recv().await
    }
}

impl Stream for ListenerSubscription {
    type Item = Arc<DeliveredMessage>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.stream).poll_next(cx)
    }
}

impl Drop for ListenerSubscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.take()
            && registry
                .remove_if_current(&self.name, &self.endpoint)
                .is_some()
        {
            tracing::info!("Listener '{}' left ({})", self.name, self.endpoint.id());
        }
        self.endpoint.close();
    }
}
