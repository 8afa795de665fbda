//! Routing context for chatmux.
//!
//! [`RouteContext`] carries the ambient state of one dispatch through the
//! whole matching and handling pipeline: the bot handle and the inbound event
//! being evaluated. Preprocessors and matchers derive new contexts from it
//! rather than mutating a shared one, so a rejected route can never leak state
//! into the next route.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use crate::bot::BoxedBot;
use crate::event::BoxedEvent;

type StateMap = HashMap<TypeId, Arc<dyn Any + Send + Sync>>;

/// The context object threaded through matchers and handed to handlers.
///
/// Cloning is cheap: the bot and event are reference-counted and the state
/// map is shared until a clone writes to it.
///
/// # Example
///
/// ```rust,ignore
/// use chatmux_core::{BoxedEvent, MessageEvent, RouteContext};
///
/// let ctx = RouteContext::new()
///     .with_event(BoxedEvent::new(MessageEvent::new("C1", "U1", "ping")));
///
/// assert_eq!(ctx.event().map(|e| e.text()), Some("ping"));
/// assert!(ctx.bot().is_none());
/// ```
#[derive(Clone, Default)]
pub struct RouteContext {
    bot: Option<BoxedBot>,
    event: Option<BoxedEvent>,
    state: Arc<StateMap>,
}

impl RouteContext {
    /// Creates an empty context with neither bot nor event.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a context carrying the given bot.
    pub fn with_bot(mut self, bot: BoxedBot) -> Self {
        self.bot = Some(bot);
        self
    }

    /// Returns a context carrying the given event.
    pub fn with_event(mut self, event: BoxedEvent) -> Self {
        self.event = Some(event);
        self
    }

    /// Returns the bot, if one was stored.
    pub fn bot(&self) -> Option<&BoxedBot> {
        self.bot.as_ref()
    }

    /// Returns the inbound event, if one was stored.
    pub fn event(&self) -> Option<&BoxedEvent> {
        self.event.as_ref()
    }

    /// Returns a context with `value` stored under its type.
    ///
    /// Only one value per type can be stored; later calls overwrite.
    pub fn with_state<T: Send + Sync + 'static>(mut self, value: T) -> Self {
        Arc::make_mut(&mut self.state).insert(TypeId::of::<T>(), Arc::new(value));
        self
    }

    /// Retrieves a value previously stored with [`with_state`](Self::with_state).
    pub fn get_state<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.state
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref::<T>())
    }

    /// Returns `true` if a value of type `T` is stored.
    pub fn has_state<T: Send + Sync + 'static>(&self) -> bool {
        self.state.contains_key(&TypeId::of::<T>())
    }
}

impl std::fmt::Debug for RouteContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteContext")
            .field("bot", &self.bot.as_ref().map(|b| b.id().to_string()))
            .field("event", &self.event)
            .field("state_entries", &self.state.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::Bot;
    use crate::error::{ApiError, ApiResult};
    use crate::event::{Event, MessageEvent};
    use async_trait::async_trait;

    struct MockBot;

    #[async_trait]
    impl Bot for MockBot {
        fn id(&self) -> &str {
            "UBOT"
        }

        async fn reply(&self, _event: &dyn Event, _text: &str) -> ApiResult<()> {
            Err(ApiError::NotConnected)
        }

        async fn typing(&self, _event: &dyn Event) -> ApiResult<()> {
            Err(ApiError::NotConnected)
        }

        fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
            self
        }
    }

    #[test]
    fn test_empty_context_has_nothing() {
        let ctx = RouteContext::new();
        assert!(ctx.bot().is_none());
        assert!(ctx.event().is_none());
        assert!(ctx.get_state::<u32>().is_none());
    }

    #[test]
    fn test_bot_round_trip() {
        let bot: BoxedBot = Arc::new(MockBot);
        let ctx = RouteContext::new().with_bot(Arc::clone(&bot));
        let stored = ctx.bot().unwrap();
        assert!(Arc::ptr_eq(stored, &bot));
        assert_eq!(stored.id(), "UBOT");
    }

    #[test]
    fn test_event_round_trip() {
        let event = BoxedEvent::new(MessageEvent::new("C1", "U1", "hello"));
        let ctx = RouteContext::new().with_event(event.clone());
        assert!(ctx.event().unwrap().ptr_eq(&event));
    }

    #[test]
    fn test_state_is_copy_on_write() {
        #[derive(Debug, PartialEq)]
        struct Lang(&'static str);

        let base = RouteContext::new().with_state(Lang("en"));
        let derived = base.clone().with_state(Lang("fr")).with_state(7u32);

        assert_eq!(base.get_state::<Lang>(), Some(&Lang("en")));
        assert!(!base.has_state::<u32>());
        assert_eq!(derived.get_state::<Lang>(), Some(&Lang("fr")));
        assert_eq!(derived.get_state::<u32>(), Some(&7));
    }
}
