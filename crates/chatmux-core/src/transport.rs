//! Transport boundary.
//!
//! A [`Connection`] is the real-time link to the chat service. chatmux does
//! not ship a network client; transports implement this trait and the runtime
//! drives it.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{TransportError, TransportResult};
use crate::event::BoxedEvent;

/// Something the connection reports to the runtime.
#[derive(Debug, Clone)]
pub enum ConnectionEvent {
    /// Authentication succeeded; carries the bot account's identity.
    Connected {
        /// The platform-assigned identity of the bot account.
        user_id: String,
    },
    /// The service rejected the credentials.
    InvalidAuth,
    /// An inbound conversational event.
    Message(BoxedEvent),
    /// A non-fatal error reported by the transport.
    Error(TransportError),
    /// Anything the router has no interest in (presence, pings, ...).
    Other,
}

/// A live connection to a chat service.
#[async_trait]
pub trait Connection: Send + Sync + 'static {
    /// Waits for the next event. `None` means the connection is gone for good.
    async fn next_event(&self) -> Option<ConnectionEvent>;

    /// Sends a text message to a channel.
    async fn send_message(&self, channel: &str, text: &str) -> TransportResult<()>;

    /// Shows a typing indicator in a channel.
    async fn send_typing(&self, channel: &str) -> TransportResult<()>;
}

/// A shared connection trait object.
pub type BoxedConnection = Arc<dyn Connection>;
