//! Matcher system for chatmux.
//!
//! A [`Matcher`] is one predicate of a route. A route holds an ordered list of
//! matchers and only matches when all of them do. Each matcher may also derive
//! a new [`RouteContext`] for the matchers after it and for the handler.
//!
//! Built-in matchers:
//!
//! - [`PatternMatcher`] - regex over the message text, leading mention stripped
//! - [`TypesMatcher`] - direct message / direct mention classification
//! - [`FnMatcher`] - any closure over the context
//!
//! # Example
//!
//! ```rust,ignore
//! use chatmux_framework::{MessageType, Router};
//!
//! let mut router = Router::new();
//! router
//!     .messages([MessageType::DirectMessage, MessageType::DirectMention])
//!     .hear("(?i)^help$")
//!     .handler(help_handler)?;
//! ```

use regex::Regex;
use tracing::trace;

use chatmux_core::RouteContext;

use crate::error::{BuildError, BuildResult};
use crate::mention::{is_direct_mention, is_direct_message, strip_direct_mention};

/// A predicate over the routing context.
///
/// The bot identity may only become known after the matcher is built, so it
/// is pushed in through [`set_bot_id`](Matcher::set_bot_id).
pub trait Matcher: Send + Sync {
    /// Decides whether the context matches, returning the context to continue with.
    fn matches(&self, ctx: RouteContext) -> (bool, RouteContext);

    /// Receives the bot identity. Matchers that do not need it ignore it.
    fn set_bot_id(&mut self, bot_id: &str) {
        let _ = bot_id;
    }
}

// ============================================================================
// Pattern Matcher
// ============================================================================

/// Matches the message text against a regular expression.
///
/// Any leading direct mention is stripped before matching.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    regex: Regex,
}

impl PatternMatcher {
    /// Compiles `pattern` into a matcher.
    pub fn new(pattern: &str) -> BuildResult<Self> {
        Regex::new(pattern)
            .map(Self::from_regex)
            .map_err(|source| BuildError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    /// Wraps an already compiled regex.
    pub fn from_regex(regex: Regex) -> Self {
        Self { regex }
    }

    /// Returns the source pattern.
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }
}

impl Matcher for PatternMatcher {
    fn matches(&self, ctx: RouteContext) -> (bool, RouteContext) {
        let matched = ctx
            .event()
            .is_some_and(|event| self.regex.is_match(strip_direct_mention(event.text())));
        trace!(pattern = %self.regex, matched, "Pattern matcher evaluated");
        (matched, ctx)
    }
}

// ============================================================================
// Types Matcher
// ============================================================================

/// The classification tags understood by [`TypesMatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Delivered through a private one-to-one channel.
    DirectMessage,
    /// Opens by addressing the bot in a shared channel.
    DirectMention,
}

/// Matches if the event satisfies any of the requested [`MessageType`]s.
#[derive(Debug, Clone, Default)]
pub struct TypesMatcher {
    types: Vec<MessageType>,
    bot_id: String,
}

impl TypesMatcher {
    /// Creates a matcher for the given classification set.
    pub fn new(types: impl IntoIterator<Item = MessageType>) -> Self {
        Self {
            types: types.into_iter().collect(),
            bot_id: String::new(),
        }
    }

    /// Returns the requested classifications.
    pub fn types(&self) -> &[MessageType] {
        &self.types
    }
}

impl Matcher for TypesMatcher {
    fn matches(&self, ctx: RouteContext) -> (bool, RouteContext) {
        let Some(event) = ctx.event() else {
            return (false, ctx);
        };

        let matched = self.types.iter().any(|t| match t {
            MessageType::DirectMessage => is_direct_message(&**event),
            MessageType::DirectMention => is_direct_mention(&**event, &self.bot_id),
        });
        trace!(types = ?self.types, matched, "Types matcher evaluated");
        (matched, ctx)
    }

    fn set_bot_id(&mut self, bot_id: &str) {
        bot_id.clone_into(&mut self.bot_id);
    }
}

// ============================================================================
// Closure Matcher
// ============================================================================

/// Adapts a closure over the context into a [`Matcher`].
pub struct FnMatcher<F> {
    f: F,
}

impl<F> FnMatcher<F>
where
    F: Fn(&RouteContext) -> bool + Send + Sync,
{
    /// Creates a matcher from a check closure.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Matcher for FnMatcher<F>
where
    F: Fn(&RouteContext) -> bool + Send + Sync,
{
    fn matches(&self, ctx: RouteContext) -> (bool, RouteContext) {
        ((self.f)(&ctx), ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatmux_core::{BoxedEvent, ChannelKind, MessageEvent};

    fn ctx_with(event: MessageEvent) -> RouteContext {
        RouteContext::new().with_event(BoxedEvent::new(event))
    }

    #[test]
    fn test_pattern_strips_mention() {
        let matcher = PatternMatcher::new("^hello$").unwrap();
        let (mentioned, _) = matcher.matches(ctx_with(MessageEvent::new("C1", "U1", "@bot hello")));
        let (bare, _) = matcher.matches(ctx_with(MessageEvent::new("C1", "U1", "hello")));
        assert!(mentioned);
        assert!(bare);
    }

    #[test]
    fn test_pattern_sees_surrounding_whitespace() {
        let trailing = PatternMatcher::new("^ping $").unwrap();
        assert!(trailing.matches(ctx_with(MessageEvent::new("C1", "U1", "ping "))).0);
        assert!(trailing.matches(ctx_with(MessageEvent::new("C1", "U1", "@bot ping "))).0);

        let exact = PatternMatcher::new("^ping$").unwrap();
        assert!(!exact.matches(ctx_with(MessageEvent::new("C1", "U1", "  ping  "))).0);

        let leading = PatternMatcher::new(r"^\s").unwrap();
        assert!(leading.matches(ctx_with(MessageEvent::new("C1", "U1", " x"))).0);
    }

    #[test]
    fn test_pattern_without_event_never_matches() {
        let matcher = PatternMatcher::new(".*").unwrap();
        assert!(!matcher.matches(RouteContext::new()).0);
    }

    #[test]
    fn test_invalid_pattern() {
        let err = PatternMatcher::new("(unclosed").unwrap_err();
        assert!(matches!(err, BuildError::InvalidPattern { ref pattern, .. } if pattern == "(unclosed"));
    }

    #[test]
    fn test_types_matcher_is_or_combined() {
        let mut matcher =
            TypesMatcher::new([MessageType::DirectMessage, MessageType::DirectMention]);
        matcher.set_bot_id("bot");

        let dm = MessageEvent::new("D1", "U1", "hi");
        let mention = MessageEvent::new("C1", "U1", "@bot hi");
        let neither = MessageEvent::new("C1", "U1", "hi all");

        assert!(matcher.matches(ctx_with(dm)).0);
        assert!(matcher.matches(ctx_with(mention)).0);
        assert!(!matcher.matches(ctx_with(neither)).0);
    }

    #[test]
    fn test_types_matcher_needs_identity_for_mentions() {
        let mut matcher = TypesMatcher::new([MessageType::DirectMention]);
        let event = MessageEvent::new("C1", "U1", "@bot hi");
        assert!(!matcher.matches(ctx_with(event.clone())).0);

        matcher.set_bot_id("bot");
        assert!(matcher.matches(ctx_with(event)).0);
    }

    #[test]
    fn test_types_matcher_empty_set() {
        let matcher = TypesMatcher::new([]);
        let event = MessageEvent::new("C1", "U1", "hi").with_kind(ChannelKind::Private);
        assert!(!matcher.matches(ctx_with(event)).0);
    }

    #[test]
    fn test_fn_matcher() {
        let matcher = FnMatcher::new(|ctx: &RouteContext| {
            ctx.event().is_some_and(|e| e.user() == "U1")
        });
        assert!(matcher.matches(ctx_with(MessageEvent::new("C1", "U1", ""))).0);
        assert!(!matcher.matches(ctx_with(MessageEvent::new("C1", "U2", ""))).0);
    }
}
