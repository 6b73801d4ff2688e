//! UseCase 層
//!
//! ハブのビジネスロジックを実装するレイヤー。
//! UI 層（WebSocket / HTTP ハンドラ）から `ChatHub` 経由で呼び出され、
//! Domain 層の ClientRegistry を操作します。

pub mod broadcast_message;
pub mod error;
pub mod hub;
pub mod open_listener;
pub mod session;
pub mod submit_message;

pub use broadcast_message::{BroadcastMessageUseCase, BroadcastReport};
pub use error::{InboundError, SubmitError};
pub use hub::ChatHub;
pub use open_listener::{ListenerSubscription, OpenListenerUseCase};
pub use session::{ConnectionSession, SessionHandle, SessionOutcome, SessionState};
pub use submit_message::SubmitMessageUseCase;
