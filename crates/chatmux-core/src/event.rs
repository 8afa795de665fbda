//! Event system for chatmux.
//!
//! This module provides the inbound event abstraction the router matches on:
//!
//! - [`Event`] - Base trait for all inbound conversational events
//! - [`ChannelKind`] - Delivery-channel shape (private vs. shared)
//! - [`BoxedEvent`] - Type-erased, cheaply clonable event container
//! - [`MessageEvent`] - The stock event type used by simple transports
//!
//! Transports are free to define their own event types; the router only relies
//! on the accessors of [`Event`].

use std::any::Any;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

// ============================================================================
// Channel Classification
// ============================================================================

/// The shape of the channel an event was delivered through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    /// A private one-to-one conversation with the bot.
    Private,
    /// A channel shared by several members.
    #[default]
    Shared,
}

impl ChannelKind {
    /// Derives the channel kind from a raw channel identifier.
    ///
    /// Identifiers of one-to-one conversations start with `D`; everything
    /// else is treated as shared.
    pub fn from_channel_id(channel: &str) -> Self {
        if channel.starts_with('D') {
            Self::Private
        } else {
            Self::Shared
        }
    }

    /// Returns `true` for private channels.
    pub fn is_private(self) -> bool {
        self == Self::Private
    }
}

// ============================================================================
// Core Event Trait
// ============================================================================

/// The base trait for inbound events.
///
/// Events are type-erased as `dyn Event` and can be downcast to concrete
/// types using [`as_any`](Event::as_any).
pub trait Event: Any + Send + Sync + std::fmt::Debug {
    /// The text body of the event.
    fn text(&self) -> &str;

    /// The identity of the author.
    fn user(&self) -> &str;

    /// The raw channel identifier the event was delivered on.
    fn channel(&self) -> &str;

    /// The delivery-channel shape.
    fn channel_kind(&self) -> ChannelKind {
        ChannelKind::from_channel_id(self.channel())
    }

    /// Returns the platform name (e.g. "console").
    fn platform(&self) -> &'static str {
        "unknown"
    }

    /// Returns a reference to self as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
}

// ============================================================================
// Boxed Event
// ============================================================================

/// A type-erased container for events that supports runtime downcasting.
///
/// `BoxedEvent` wraps any [`Event`] in an `Arc`, so cloning it into every
/// context along the matching pipeline is cheap. It derefs to `dyn Event`:
///
/// ```rust,ignore
/// let event: BoxedEvent = /* ... */;
/// let text = event.text();
/// let private = event.channel_kind().is_private();
/// ```
#[derive(Clone)]
pub struct BoxedEvent {
    inner: Arc<dyn Event>,
}

impl BoxedEvent {
    /// Creates a new `BoxedEvent` from any type implementing `Event`.
    pub fn new<E: Event>(event: E) -> Self {
        Self {
            inner: Arc::new(event),
        }
    }

    /// Returns the inner `Arc<dyn Event>`.
    pub fn inner(&self) -> &Arc<dyn Event> {
        &self.inner
    }

    /// Attempts to downcast to a concrete event type.
    pub fn downcast_ref<E: Event>(&self) -> Option<&E> {
        self.inner.as_any().downcast_ref()
    }

    /// Returns `true` if both handles point at the same event.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::ops::Deref for BoxedEvent {
    type Target = dyn Event;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

impl std::fmt::Debug for BoxedEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxedEvent")
            .field("platform", &self.platform())
            .field("user", &self.user())
            .field("channel", &self.channel())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// MessageEvent
// ============================================================================

/// A plain chat message.
///
/// When `kind` is absent the channel kind is derived from the channel id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEvent {
    /// Message body.
    #[serde(default)]
    pub text: String,
    /// Author identity.
    #[serde(default)]
    pub user: String,
    /// Raw channel identifier.
    #[serde(default)]
    pub channel: String,
    /// Explicit channel kind, overriding the id-based classification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ChannelKind>,
}

impl MessageEvent {
    /// Creates a message in the given channel.
    pub fn new(
        channel: impl Into<String>,
        user: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            user: user.into(),
            channel: channel.into(),
            kind: None,
        }
    }

    /// Overrides the channel kind.
    pub fn with_kind(mut self, kind: ChannelKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Parses a message from its JSON representation.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

impl Event for MessageEvent {
    fn text(&self) -> &str {
        &self.text
    }

    fn user(&self) -> &str {
        &self.user
    }

    fn channel(&self) -> &str {
        &self.channel
    }

    fn channel_kind(&self) -> ChannelKind {
        self.kind
            .unwrap_or_else(|| ChannelKind::from_channel_id(&self.channel))
    }

    fn platform(&self) -> &'static str {
        "message"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_kind_from_id() {
        assert_eq!(ChannelKind::from_channel_id("D024BE91L"), ChannelKind::Private);
        assert_eq!(ChannelKind::from_channel_id("C2147483705"), ChannelKind::Shared);
        assert_eq!(ChannelKind::from_channel_id(""), ChannelKind::Shared);
    }

    #[test]
    fn test_explicit_kind_overrides_channel_id() {
        let event = MessageEvent::new("C1", "U1", "hi").with_kind(ChannelKind::Private);
        assert!(event.channel_kind().is_private());
    }

    #[test]
    fn test_from_json() {
        let event =
            MessageEvent::from_json(r#"{"text":"ping","user":"U1","channel":"D1"}"#).unwrap();
        assert_eq!(event.text(), "ping");
        assert_eq!(event.channel_kind(), ChannelKind::Private);

        let event = MessageEvent::from_json(r#"{"text":"x","channel":"D1","kind":"shared"}"#)
            .unwrap();
        assert_eq!(event.channel_kind(), ChannelKind::Shared);
    }

    #[test]
    fn test_boxed_event_downcast() {
        let boxed = BoxedEvent::new(MessageEvent::new("C1", "U1", "hello"));
        assert_eq!(boxed.text(), "hello");
        assert_eq!(
            boxed.downcast_ref::<MessageEvent>().map(|m| m.user.as_str()),
            Some("U1")
        );
        assert!(boxed.ptr_eq(&boxed.clone()));
    }
}
