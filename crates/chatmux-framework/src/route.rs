//! Routes: one matching rule of a [`Router`].
//!
//! A [`Route`] combines a self-talk policy, an optional preprocessor, an
//! ordered list of [`Matcher`]s, and either a terminal handler or a nested
//! subrouter. Routes are created through the [`Router`] builders and
//! configured in place:
//!
//! ```rust,ignore
//! router
//!     .hear("^deploy (\\w+)$")
//!     .messages([MessageType::DirectMessage])
//!     .name("deploy")
//!     .handler(deploy_handler)?;
//! ```

use std::future::Future;

use tracing::trace;

use chatmux_core::{BoxedBot, BoxedEvent, RouteContext};

use crate::error::{BuildError, BuildResult};
use crate::handler::{BoxedHandler, Handler, Preprocessor, into_handler};
use crate::matcher::{FnMatcher, Matcher, MessageType, PatternMatcher, TypesMatcher};
use crate::router::Router;

/// The output record of a successful match.
///
/// Filled in by [`Route::matches`] / [`Router::matches`]. When the match went
/// through a subrouter, `route` names the innermost route that matched.
#[derive(Default)]
pub struct RouteMatch<'a> {
    /// The route that matched.
    pub route: Option<&'a Route>,
    /// The handler to invoke.
    pub handler: Option<BoxedHandler>,
}

impl std::fmt::Debug for RouteMatch<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteMatch")
            .field("route", &self.route.and_then(Route::get_name))
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

/// A single matching rule.
pub struct Route {
    name: Option<String>,
    handler: Option<BoxedHandler>,
    err: Option<BuildError>,
    matchers: Vec<Box<dyn Matcher>>,
    subrouter: Option<Box<Router>>,
    preprocessor: Option<Preprocessor>,
    bot_id: String,
    talk_to_self: bool,
}

impl Route {
    pub(crate) fn new(err: Option<BuildError>, bot_id: String, talk_to_self: bool) -> Self {
        Self {
            name: None,
            handler: None,
            err,
            matchers: Vec::new(),
            subrouter: None,
            preprocessor: None,
            bot_id,
            talk_to_self,
        }
    }

    /// Evaluates this route against `ctx`.
    ///
    /// Steps run strictly in this order: build error check, handler presence,
    /// self-talk filter, preprocessor, matchers (first failure short-circuits),
    /// subrouter delegation. The returned context is the one the last step
    /// produced, whether or not the route matched.
    pub fn matches<'a>(
        &'a self,
        ctx: RouteContext,
        out: &mut RouteMatch<'a>,
    ) -> (bool, RouteContext) {
        if let Some(err) = self.err() {
            trace!(
                route = self.get_name().unwrap_or("unnamed"),
                error = %err,
                "Route disabled by build error"
            );
            return (false, ctx);
        }
        self.evaluate(ctx, out)
    }

    /// Runs every step after the build error check.
    ///
    /// Callers must have checked the error of the whole tree, which covers
    /// this route and everything nested below it.
    pub(crate) fn evaluate<'a>(
        &'a self,
        ctx: RouteContext,
        out: &mut RouteMatch<'a>,
    ) -> (bool, RouteContext) {
        let name = self.get_name().unwrap_or("unnamed");

        if self.handler.is_none() && self.subrouter.is_none() {
            trace!(route = name, "Route has nothing to dispatch to");
            return (false, ctx);
        }

        if !self.talk_to_self
            && !self.bot_id.is_empty()
            && ctx.event().is_some_and(|e| e.user() == self.bot_id)
        {
            trace!(route = name, "Skipping event authored by the bot");
            return (false, ctx);
        }

        let mut ctx = match &self.preprocessor {
            Some(preprocess) => preprocess(ctx),
            None => ctx,
        };

        for (index, matcher) in self.matchers.iter().enumerate() {
            let (matched, next) = matcher.matches(ctx);
            ctx = next;
            if !matched {
                trace!(route = name, matcher_index = index, "Matcher rejected event");
                return (false, ctx);
            }
        }

        if let Some(subrouter) = &self.subrouter {
            trace!(route = name, "Delegating to subrouter");
            return subrouter.evaluate(ctx, out);
        }

        trace!(route = name, "Route matched");
        out.route = Some(self);
        out.handler = self.handler.clone();
        (true, ctx)
    }

    // ========================================================================
    // Builders
    // ========================================================================

    /// Sets a label used in log output.
    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    /// Adds a regex matcher over the message text.
    ///
    /// An invalid pattern disables the route and is reported by [`err`](Self::err).
    pub fn hear(&mut self, pattern: &str) -> &mut Self {
        if self.err().is_some() {
            return self;
        }
        match PatternMatcher::new(pattern) {
            Ok(matcher) => self.push_matcher(Box::new(matcher)),
            Err(err) => self.err = Some(err),
        }
        self
    }

    /// Adds a message classification matcher, satisfied by any of `types`.
    pub fn messages(&mut self, types: impl IntoIterator<Item = MessageType>) -> &mut Self {
        self.add_matcher(TypesMatcher::new(types))
    }

    /// Adds a custom matcher.
    pub fn add_matcher<M: Matcher + 'static>(&mut self, matcher: M) -> &mut Self {
        if self.err().is_none() {
            self.push_matcher(Box::new(matcher));
        }
        self
    }

    /// Adds a matcher from a check closure.
    pub fn check<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&RouteContext) -> bool + Send + Sync + 'static,
    {
        self.add_matcher(FnMatcher::new(f))
    }

    /// Sets a context transform applied after the self-talk filter and
    /// before the matchers.
    pub fn preprocess<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(RouteContext) -> RouteContext + Send + Sync + 'static,
    {
        if self.err().is_none() {
            self.preprocessor = Some(std::sync::Arc::new(f));
        }
        self
    }

    /// Lets this route match events authored by the bot itself.
    pub fn talk_to_self(&mut self) -> &mut Self {
        if self.err().is_none() {
            self.talk_to_self = true;
        }
        self
    }

    /// Makes this route ignore events authored by the bot itself.
    pub fn no_talk_to_self(&mut self) -> &mut Self {
        if self.err().is_none() {
            self.talk_to_self = false;
        }
        self
    }

    /// Sets the terminal handler.
    ///
    /// Fails with the route's build error, if any, leaving the route unchanged.
    pub fn handler<H: Handler>(&mut self, handler: H) -> BuildResult<()> {
        if let Some(err) = self.err() {
            return Err(err.clone());
        }
        self.handler = Some(into_handler(handler));
        Ok(())
    }

    /// Sets a handler that receives the bot and event alongside the context.
    pub fn message_handler<F, Fut>(&mut self, f: F) -> BuildResult<()>
    where
        F: Fn(RouteContext, Option<BoxedBot>, Option<BoxedEvent>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.handler(move |ctx: RouteContext| {
            let bot = ctx.bot().cloned();
            let event = ctx.event().cloned();
            f(ctx, bot, event)
        })
    }

    /// Returns the nested router of this route, creating it on first use.
    ///
    /// Once a subrouter exists, the route's own matchers act as a gate and the
    /// subrouter decides the final match. The subrouter inherits this route's
    /// build error and bot identity but starts with self-talk disabled.
    pub fn subrouter(&mut self) -> &mut Router {
        let err = self.err.clone();
        let bot_id = self.bot_id.clone();
        self.subrouter
            .get_or_insert_with(|| Box::new(Router::with_parent(err, bot_id)))
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Returns the first build error of this route or its subrouter.
    pub fn err(&self) -> Option<&BuildError> {
        self.err
            .as_ref()
            .or_else(|| self.subrouter.as_deref().and_then(Router::err))
    }

    /// Returns the label set with [`name`](Self::name).
    pub fn get_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the bot identity this route filters on.
    pub fn bot_id(&self) -> &str {
        &self.bot_id
    }

    /// Returns whether this route matches events authored by the bot.
    pub fn allows_self_talk(&self) -> bool {
        self.talk_to_self
    }

    /// Returns the number of matchers.
    pub fn matcher_count(&self) -> usize {
        self.matchers.len()
    }

    /// Returns `true` if a terminal handler is set.
    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    /// Returns the nested router, if one was created.
    pub fn get_subrouter(&self) -> Option<&Router> {
        self.subrouter.as_deref()
    }

    pub(crate) fn set_bot_id(&mut self, bot_id: &str) {
        bot_id.clone_into(&mut self.bot_id);
        for matcher in &mut self.matchers {
            matcher.set_bot_id(bot_id);
        }
        if let Some(subrouter) = &mut self.subrouter {
            subrouter.set_bot_id(bot_id);
        }
    }

    fn push_matcher(&mut self, mut matcher: Box<dyn Matcher>) {
        matcher.set_bot_id(&self.bot_id);
        self.matchers.push(matcher);
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.name)
            .field("matcher_count", &self.matchers.len())
            .field("has_handler", &self.handler.is_some())
            .field("has_subrouter", &self.subrouter.is_some())
            .field("talk_to_self", &self.talk_to_self)
            .field("err", &self.err)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatmux_core::MessageEvent;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ctx(channel: &str, user: &str, text: &str) -> RouteContext {
        RouteContext::new().with_event(BoxedEvent::new(MessageEvent::new(channel, user, text)))
    }

    fn noop(_ctx: RouteContext) -> impl Future<Output = ()> {
        async {}
    }

    #[test]
    fn test_route_without_handler_never_matches() {
        let mut route = Route::new(None, String::new(), false);
        route.hear(".*");
        let mut out = RouteMatch::default();
        assert!(!route.matches(ctx("C1", "U1", "hi"), &mut out).0);
        assert!(out.route.is_none());
    }

    #[test]
    fn test_match_fills_output() {
        let mut route = Route::new(None, String::new(), false);
        route.hear("^hi$").name("greet");
        route.handler(noop).unwrap();

        let mut out = RouteMatch::default();
        assert!(route.matches(ctx("C1", "U1", "hi"), &mut out).0);
        assert_eq!(out.route.and_then(Route::get_name), Some("greet"));
        assert!(out.handler.is_some());
    }

    #[test]
    fn test_invalid_pattern_is_sticky() {
        let mut route = Route::new(None, String::new(), false);
        route.hear("(").hear("^ok$").check(|_| true);

        assert!(matches!(route.err(), Some(BuildError::InvalidPattern { .. })));
        assert_eq!(route.matcher_count(), 0);
        assert!(route.handler(noop).is_err());
        assert!(!route.has_handler());
    }

    #[test]
    fn test_self_talk_runs_before_preprocessor() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);

        let mut route = Route::new(None, "UBOT".to_string(), false);
        route.preprocess(move |ctx| {
            seen.fetch_add(1, Ordering::SeqCst);
            ctx
        });
        route.handler(noop).unwrap();

        let mut out = RouteMatch::default();
        assert!(!route.matches(ctx("C1", "UBOT", "hi"), &mut out).0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        route.talk_to_self();
        let mut out = RouteMatch::default();
        assert!(route.matches(ctx("C1", "UBOT", "hi"), &mut out).0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_preprocessor_output_reaches_matchers() {
        struct Locale(&'static str);

        let mut route = Route::new(None, String::new(), false);
        route
            .preprocess(|ctx| ctx.with_state(Locale("fr")))
            .check(|ctx| ctx.get_state::<Locale>().is_some_and(|l| l.0 == "fr"));
        route.handler(noop).unwrap();

        let mut out = RouteMatch::default();
        let (matched, ctx) = route.matches(ctx("C1", "U1", "salut"), &mut out);
        assert!(matched);
        assert!(ctx.has_state::<Locale>());
    }

    #[test]
    fn test_matchers_short_circuit() {
        let evaluated = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&evaluated);

        let mut route = Route::new(None, String::new(), false);
        route.check(|_| false).check(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        });
        route.handler(noop).unwrap();

        let mut out = RouteMatch::default();
        assert!(!route.matches(ctx("C1", "U1", "hi"), &mut out).0);
        assert_eq!(evaluated.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_set_bot_id_reaches_matchers() {
        let mut route = Route::new(None, String::new(), false);
        route.messages([MessageType::DirectMention]);
        route.handler(noop).unwrap();

        let mut out = RouteMatch::default();
        assert!(!route.matches(ctx("C1", "U1", "@bot hi"), &mut out).0);

        route.set_bot_id("bot");
        assert_eq!(route.bot_id(), "bot");
        let mut out = RouteMatch::default();
        assert!(route.matches(ctx("C1", "U1", "@bot hi"), &mut out).0);
    }

    #[test]
    fn test_subrouter_is_created_once() {
        let mut route = Route::new(None, "bot".to_string(), true);
        route.subrouter().hear("^a$");
        route.subrouter().hear("^b$");

        let subrouter = route.get_subrouter().unwrap();
        assert_eq!(subrouter.len(), 2);
        assert!(!subrouter.routes()[0].allows_self_talk());
        assert_eq!(subrouter.routes()[0].bot_id(), "bot");
    }
}
