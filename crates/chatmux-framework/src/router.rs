//! The ordered rule table.
//!
//! A [`Router`] evaluates its [`Route`]s in registration order and stops at the
//! first one that fully matches. Each route is evaluated against the context
//! the router received, so a route that fails halfway cannot leak the context
//! it derived into the next one.
//!
//! # Example
//!
//! ```rust,ignore
//! use chatmux_framework::{MessageType, Router};
//!
//! let mut router = Router::new();
//! router.hear("^ping$").handler(ping)?;
//! router.messages([MessageType::DirectMention]).handler(on_mention)?;
//!
//! let admin = router.hear("^admin\\b").subrouter();
//! admin.hear("^admin reload$").handler(reload)?;
//!
//! router.err().map_or(Ok(()), |e| Err(e.clone()))?;
//! ```

use std::future::Future;

use tracing::trace;

use chatmux_core::{BoxedBot, BoxedEvent, RouteContext};

use crate::error::{BuildError, BuildResult};
use crate::handler::Handler;
use crate::matcher::{Matcher, MessageType};
use crate::route::{Route, RouteMatch};

/// An ordered list of routes evaluated first-match-wins.
#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<Route>,
    bot_id: String,
    err: Option<BuildError>,
    talk_to_self: bool,
}

impl Router {
    /// Creates an empty router. New routes ignore the bot's own messages.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_parent(err: Option<BuildError>, bot_id: String) -> Self {
        Self {
            err,
            bot_id,
            ..Self::default()
        }
    }

    /// Finds the first route matching `ctx`.
    ///
    /// On a match, `out` names the route and handler and the returned context
    /// is the one that route produced. Otherwise the input context is returned
    /// unchanged.
    pub fn matches<'a>(
        &'a self,
        ctx: RouteContext,
        out: &mut RouteMatch<'a>,
    ) -> (bool, RouteContext) {
        if let Some(err) = self.err() {
            trace!(error = %err, "Router disabled by build error");
            return (false, ctx);
        }
        self.evaluate(ctx, out)
    }

    /// First-match-wins evaluation without the build error check.
    ///
    /// The error of a tree cannot change once it is shared, so callers holding
    /// a frozen router check [`err`](Self::err) once instead of per event.
    pub(crate) fn evaluate<'a>(
        &'a self,
        ctx: RouteContext,
        out: &mut RouteMatch<'a>,
    ) -> (bool, RouteContext) {
        for (index, route) in self.routes.iter().enumerate() {
            let (matched, derived) = route.evaluate(ctx.clone(), out);
            if matched {
                trace!(route_index = index, "Router matched");
                return (true, derived);
            }
        }

        (false, ctx)
    }

    /// Registers an empty route and returns it for configuration.
    fn new_route(&mut self, talk_to_self: bool) -> &mut Route {
        let route = Route::new(self.err().cloned(), self.bot_id.clone(), talk_to_self);
        let index = self.routes.len();
        self.routes.push(route);
        &mut self.routes[index]
    }

    // ========================================================================
    // Route builders
    // ========================================================================

    /// Adds a route matching message text against `pattern`.
    pub fn hear(&mut self, pattern: &str) -> &mut Route {
        self.new_route(self.talk_to_self).hear(pattern)
    }

    /// Adds a route matching any of the given message classifications.
    pub fn messages(&mut self, types: impl IntoIterator<Item = MessageType>) -> &mut Route {
        self.new_route(self.talk_to_self).messages(types)
    }

    /// Adds a route gated by a custom matcher.
    pub fn add_matcher<M: Matcher + 'static>(&mut self, matcher: M) -> &mut Route {
        self.new_route(self.talk_to_self).add_matcher(matcher)
    }

    /// Adds a route gated by a check closure.
    pub fn check<F>(&mut self, f: F) -> &mut Route
    where
        F: Fn(&RouteContext) -> bool + Send + Sync + 'static,
    {
        self.new_route(self.talk_to_self).check(f)
    }

    /// Adds a catch-all route with the given handler.
    pub fn handler<H: Handler>(&mut self, handler: H) -> BuildResult<()> {
        self.new_route(self.talk_to_self).handler(handler)
    }

    /// Adds a catch-all route with a handler receiving the bot and event.
    pub fn message_handler<F, Fut>(&mut self, f: F) -> BuildResult<()>
    where
        F: Fn(RouteContext, Option<BoxedBot>, Option<BoxedEvent>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.new_route(self.talk_to_self).message_handler(f)
    }

    /// Adds a route that matches the bot's own messages.
    pub fn talk_to_self(&mut self) -> &mut Route {
        self.new_route(true)
    }

    /// Adds a route that ignores the bot's own messages.
    pub fn no_talk_to_self(&mut self) -> &mut Route {
        self.new_route(false)
    }

    // ========================================================================
    // Router settings
    // ========================================================================

    /// Makes routes created from now on accept the bot's own messages.
    ///
    /// Existing routes keep their setting.
    pub fn always_talk_to_self(&mut self) -> &mut Self {
        self.talk_to_self = true;
        self
    }

    /// Makes routes created from now on ignore the bot's own messages.
    pub fn never_talk_to_self(&mut self) -> &mut Self {
        self.talk_to_self = false;
        self
    }

    /// Stores the bot identity and pushes it to every route, matcher and
    /// subrouter. Routes created later inherit it.
    pub fn set_bot_id(&mut self, bot_id: &str) {
        bot_id.clone_into(&mut self.bot_id);
        for route in &mut self.routes {
            route.set_bot_id(bot_id);
        }
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Returns the first build error anywhere in this router's tree.
    pub fn err(&self) -> Option<&BuildError> {
        self.err
            .as_ref()
            .or_else(|| self.routes.iter().find_map(Route::err))
    }

    /// Returns the bot identity.
    pub fn bot_id(&self) -> &str {
        &self.bot_id
    }

    /// Returns the number of routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if no route is registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Returns the routes in evaluation order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}
