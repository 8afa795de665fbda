//! Bot trait and related types.
//!
//! This module defines the `Bot` trait which represents the authenticated bot
//! account as seen from handlers: its own identity plus the helpers used to
//! answer an event.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ApiResult;
use crate::event::Event;

/// The core Bot trait.
///
/// A Bot handle is placed in every routing context so handlers can reply
/// without holding their own reference to the transport.
#[async_trait]
pub trait Bot: Send + Sync + 'static {
    /// Returns the platform-assigned identity of the bot account.
    fn id(&self) -> &str;

    /// Replies to an event in the channel it was delivered on.
    async fn reply(&self, event: &dyn Event, text: &str) -> ApiResult<()>;

    /// Shows a typing indicator in the channel of `event`.
    async fn typing(&self, event: &dyn Event) -> ApiResult<()>;

    /// Returns self as an `Arc<dyn Any>` for safe downcasting.
    ///
    /// Implementors should simply return `self`.
    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// A shared Bot trait object.
pub type BoxedBot = Arc<dyn Bot>;
