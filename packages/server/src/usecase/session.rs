//! UseCase: 接続セッション
//!
//! 一つの双方向接続を扱う状態機械。
//!
//! ```text
//! AwaitingHello ──hello──▶ Active ──end / error / cancel / evicted──▶ Closing ──▶ Closed
//!       │                                                                        ▲
//!       └──────────────── end / error / cancel before hello ────────────────────┘
//! ```
//!
//! - AwaitingHello: 最初のメッセージで送信者名を知り、Registry に登録する
//! - Active: 以降のメッセージをすべてブロードキャストする
//! - Closing: 「まだ自分の登録なら削除」で Registry から外れる
//! - Closed: 自分のエンドポイントを close する（既に閉じていれば何もしない）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectionSession::run() の状態遷移と、その結果（SessionOutcome）
//!
//! ### なぜこのテストが必要か
//! - 切断・エラー・キャンセル・置き換えのいずれでも登録が確実に解放されること
//! - 置き換えられたセッションが新しいセッションの登録を消さないこと
//!
//! ### どのような状況を想定しているか
//! - 正常系：hello → チャット → 切断
//! - 異常系：hello 前の切断、トランスポートエラー、キャンセル
//! - 競合：同名での再接続、ハブのシャットダウン

use std::{fmt, sync::Arc};

use futures_util::{Stream, StreamExt};
use tokio::{sync::watch, task::JoinHandle};

use crate::{
    config::HelloPolicy,
    domain::{ChatMessage, ClientName, ClientRegistry, DeliveryStream, Endpoint},
};

use super::{broadcast_message::BroadcastMessageUseCase, error::InboundError};

/// セッションの状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    AwaitingHello,
    Active { name: ClientName },
    Closing { name: ClientName, outcome: SessionOutcome },
    Closed { outcome: SessionOutcome },
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::AwaitingHello => write!(f, "awaiting-hello"),
            SessionState::Active { name } => write!(f, "active({name})"),
            SessionState::Closing { name, .. } => write!(f, "closing({name})"),
            SessionState::Closed { .. } => write!(f, "closed"),
        }
    }
}

/// セッションが終了した理由
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// hello を受け取る前に受信ストリームが終了した
    StaleHandshake,
    /// 受信ストリームが正常に終了した
    Disconnected,
    /// 相手側のキャンセル、またはハブのシャットダウン
    Cancelled,
    /// 同名の新しい接続による置き換え、または配送失敗による除去
    Evicted,
    /// 予期しないトランスポートエラー
    TransportError(String),
}

impl fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionOutcome::StaleHandshake => write!(f, "closed before hello"),
            SessionOutcome::Disconnected => write!(f, "disconnected"),
            SessionOutcome::Cancelled => write!(f, "cancelled"),
            SessionOutcome::Evicted => write!(f, "evicted"),
            SessionOutcome::TransportError(reason) => write!(f, "transport error: {reason}"),
        }
    }
}

/// `ChatHub::handle_session` が返すハンドル
pub struct SessionHandle {
    /// クライアントへ書き出す配送ストリーム
    pub outbound: DeliveryStream,
    /// セッションのタスク
    pub task: JoinHandle<SessionOutcome>,
}

enum SessionEvent {
    Message(ChatMessage),
    End,
    Cancelled,
    Evicted,
    Failed(String),
}

/// 接続セッション
pub struct ConnectionSession<S> {
    inbound: S,
    /// このセッションの送信先（Registry にも同じものが登録される）
    endpoint: Endpoint,
    registry: Arc<dyn ClientRegistry>,
    broadcast: BroadcastMessageUseCase,
    hello_policy: HelloPolicy,
    shutdown: watch::Receiver<bool>,
}

impl<S> ConnectionSession<S>
where
    S: Stream<Item = Result<ChatMessage, InboundError>> + Unpin + Send,
{
    /// 新しい ConnectionSession を作成
    pub fn new(
        inbound: S,
        endpoint: Endpoint,
        registry: Arc<dyn ClientRegistry>,
        hello_policy: HelloPolicy,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            inbound,
            endpoint,
            broadcast: BroadcastMessageUseCase::new(Arc::clone(&registry)),
            registry,
            hello_policy,
            shutdown,
        }
    }

    /// Closed に到達するまで状態機械を進める
    pub async fn run(mut self) -> SessionOutcome {
        let mut state = SessionState::AwaitingHello;
        loop {
            tracing::debug!("Session {} is {}", self.endpoint.id(), state);
            state = match state {
                SessionState::AwaitingHello => self.await_hello().await,
                SessionState::Active { name } => self.relay(name).await,
                SessionState::Closing { name, outcome } => self.release(name, outcome),
                SessionState::Closed { outcome } => {
                    self.endpoint.close();
                    return outcome;
                }
            };
        }
    }

    async fn await_hello(&mut self) -> SessionState {
        let hello = match self.next_event().await {
            SessionEvent::Message(hello) => hello,
            SessionEvent::End => {
                tracing::debug!(
                    "Session {} ended before saying hello",
                    self.endpoint.id()
                );
                return SessionState::Closed {
                    outcome: SessionOutcome::StaleHandshake,
                };
            }
            SessionEvent::Cancelled => {
                return SessionState::Closed {
                    outcome: SessionOutcome::Cancelled,
                };
            }
            SessionEvent::Evicted => {
                return SessionState::Closed {
                    outcome: SessionOutcome::Evicted,
                };
            }
            SessionEvent::Failed(reason) => {
                tracing::error!(
                    "Session {} failed before saying hello: {}",
                    self.endpoint.id(),
                    reason
                );
                return SessionState::Closed {
                    outcome: SessionOutcome::TransportError(reason),
                };
            }
        };

        let name = hello.from.clone();
        if let Some(previous) = self.registry.register(name.clone(), self.endpoint.clone()) {
            tracing::info!(
                "Client '{}' connected again; closing superseded endpoint {}",
                name,
                previous.id()
            );
            previous.close();
        }
        tracing::info!("Client '{}' joined ({})", name, self.endpoint.id());

        if self.hello_policy == HelloPolicy::Broadcast {
            self.broadcast.execute(hello);
        }
        SessionState::Active { name }
    }

    async fn relay(&mut self, name: ClientName) -> SessionState {
        let outcome = loop {
            match self.next_event().await {
                SessionEvent::Message(message) => {
                    let message = if message.from == name {
                        message
                    } else {
                        tracing::debug!(
                            "Message from '{}' on the session of '{}'; sending as '{}'",
                            message.from,
                            name,
                            name
                        );
                        message.reattributed(name.clone())
                    };
                    self.broadcast.execute(message);
                }
                SessionEvent::End => break SessionOutcome::Disconnected,
                SessionEvent::Cancelled => break SessionOutcome::Cancelled,
                SessionEvent::Evicted => break SessionOutcome::Evicted,
                SessionEvent::Failed(reason) => {
                    tracing::error!("Client '{}' inbound stream failed: {}", name, reason);
                    break SessionOutcome::TransportError(reason);
                }
            }
        };
        SessionState::Closing { name, outcome }
    }

    fn release(&mut self, name: ClientName, outcome: SessionOutcome) -> SessionState {
        let removed = self
            .registry
            .remove_if_current(&name, &self.endpoint)
            .is_some();
        if removed {
            tracing::info!("Client '{}' left ({}): {}", name, self.endpoint.id(), outcome);
        } else {
            tracing::info!(
                "Client '{}' session {} ended ({}); registration already gone",
                name,
                self.endpoint.id(),
                outcome
            );
        }
        SessionState::Closed { outcome }
    }

    async fn next_event(&mut self) -> SessionEvent {
        tokio::select! {
            biased;
            _ = shutdown_requested(&mut self.shutdown) => SessionEvent::Cancelled,
            _ = self.endpoint.closed() => SessionEvent::Evicted,
            next = self.inbound.next() => match next {
                Some(Ok(message)) => SessionEvent::Message(message),
                Some(Err(InboundError::Cancelled)) => SessionEvent::Cancelled,
                Some(Err(InboundError::Transport(reason))) => SessionEvent::Failed(reason),
                None => SessionEvent::End,
            },
        }
    }
}

async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    // Err means the hub itself was dropped, which counts as a shutdown
    let _ = shutdown.wait_for(|stopped| *stopped).await;
}
