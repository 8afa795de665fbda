//! Event dispatcher for chatmux.
//!
//! The [`Dispatcher`] turns an inbound event into a [`RouteContext`], runs the
//! top-level [`Router`] over it and, on a match, runs the selected handler on
//! its own task. Matching is synchronous and lock-free; only the handler is
//! asynchronous.
//!
//! # Tower Service Integration
//!
//! `Dispatcher` implements `tower::Service<BoxedEvent>`. Unlike
//! [`dispatch`](Dispatcher::dispatch), the service future awaits the handler,
//! so middleware such as timeouts wraps the whole handling of one event:
//!
//! ```rust,ignore
//! use tower::ServiceBuilder;
//! use tower::timeout::TimeoutLayer;
//!
//! let service = ServiceBuilder::new()
//!     .layer(TimeoutLayer::new(Duration::from_secs(5)))
//!     .service(dispatcher.clone());
//! ```

use std::convert::Infallible;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use tower::Service;
use tracing::{Instrument, Level, debug, span};

use chatmux_core::{BoxedBot, BoxedEvent, RouteContext};

use crate::error::BuildError;
use crate::handler::BoxedHandler;
use crate::route::{Route, RouteMatch};
use crate::router::Router;

/// Routes events through a shared, immutable [`Router`].
///
/// Cloning is cheap; all clones share the same router.
#[derive(Clone)]
pub struct Dispatcher {
    router: Arc<Router>,
    bot: Option<BoxedBot>,
    err: Option<BuildError>,
}

impl Dispatcher {
    /// Creates a dispatcher over a fully built router.
    ///
    /// The router's build error is recorded here once. A router carrying one
    /// never matches.
    pub fn new(router: impl Into<Arc<Router>>) -> Self {
        let router = router.into();
        let err = router.err().cloned();
        Self {
            router,
            bot: None,
            err,
        }
    }

    /// Sets the bot handle placed in every context.
    pub fn with_bot(mut self, bot: BoxedBot) -> Self {
        self.bot = Some(bot);
        self
    }

    /// Returns the router.
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Returns the bot handle, if one was set.
    pub fn bot(&self) -> Option<&BoxedBot> {
        self.bot.as_ref()
    }

    /// Returns the build error of the router, if any.
    pub fn err(&self) -> Option<&BuildError> {
        self.err.as_ref()
    }

    /// Builds the initial context for `event`.
    pub fn context_for(&self, event: BoxedEvent) -> RouteContext {
        let ctx = RouteContext::new().with_event(event);
        match &self.bot {
            Some(bot) => ctx.with_bot(Arc::clone(bot)),
            None => ctx,
        }
    }

    /// Runs the router over `event` and returns the handler to invoke with
    /// the context the matching route produced.
    pub fn resolve(&self, event: BoxedEvent) -> Option<(BoxedHandler, RouteContext)> {
        if let Some(err) = &self.err {
            debug!(error = %err, "Router disabled by build error");
            return None;
        }

        let mut out = RouteMatch::default();
        let (matched, ctx) = self.router.evaluate(self.context_for(event), &mut out);
        if !matched {
            return None;
        }

        debug!(
            route = out.route.and_then(Route::get_name).unwrap_or("unnamed"),
            "Event matched"
        );
        out.handler.map(|handler| (handler, ctx))
    }

    /// Dispatches `event`, spawning the matched handler on the current tokio
    /// runtime.
    ///
    /// Returns `true` if a handler was spawned. Must be called from within a
    /// tokio runtime.
    pub fn dispatch(&self, event: BoxedEvent) -> bool {
        let span = span!(
            Level::DEBUG,
            "dispatch",
            platform = event.platform(),
            channel = %event.channel(),
        );
        let _enter = span.enter();

        match self.resolve(event) {
            Some((handler, ctx)) => {
                tokio::spawn(handler.call(ctx).instrument(span.clone()));
                true
            }
            None => {
                debug!("No route matched");
                false
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("route_count", &self.router.len())
            .field("bot", &self.bot.as_ref().map(|b| b.id().to_string()))
            .field("err", &self.err)
            .finish()
    }
}

// ============================================================================
// Tower Service Implementation
// ============================================================================

/// The response of [`Dispatcher`] as a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchResponse {
    /// Whether a route matched and its handler ran to completion.
    pub matched: bool,
}

impl Service<BoxedEvent> for Dispatcher {
    type Response = DispatchResponse;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, event: BoxedEvent) -> Self::Future {
        let resolved = self.resolve(event);

        Box::pin(async move {
            let matched = match resolved {
                Some((handler, ctx)) => {
                    handler.call(ctx).await;
                    true
                }
                None => false,
            };
            Ok(DispatchResponse { matched })
        })
    }
}
