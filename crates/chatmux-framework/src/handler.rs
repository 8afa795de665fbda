//! Handler system for chatmux.
//!
//! A [`Handler`] is the terminal action of a route. It receives the context the
//! route produced (after preprocessing and matching) and runs as its own
//! future, so a slow handler never holds up matching of the next event.
//!
//! Any async closure taking a [`RouteContext`] is a handler:
//!
//! ```rust,ignore
//! router.hear("^ping$").handler(|ctx: RouteContext| async move {
//!     if let (Some(bot), Some(event)) = (ctx.bot(), ctx.event()) {
//!         bot.reply(&**event, "pong").await.ok();
//!     }
//! })?;
//! ```

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

use chatmux_core::RouteContext;

// ============================================================================
// Handler Trait
// ============================================================================

/// The terminal action invoked when a route fully matches.
pub trait Handler: Send + Sync + 'static {
    /// Runs the handler with the matched context.
    fn call(&self, ctx: RouteContext) -> BoxFuture<'static, ()>;
}

impl<F, Fut> Handler for F
where
    F: Fn(RouteContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn call(&self, ctx: RouteContext) -> BoxFuture<'static, ()> {
        Box::pin((self)(ctx))
    }
}

/// A type-erased handler that can be stored in routes and cloned into match results.
pub type BoxedHandler = Arc<dyn Handler>;

/// Converts a handler into a boxed handler.
pub fn into_handler<H: Handler>(handler: H) -> BoxedHandler {
    Arc::new(handler)
}

// ============================================================================
// Preprocessor
// ============================================================================

/// A pure context transform applied before a route's matchers run.
pub type Preprocessor = Arc<dyn Fn(RouteContext) -> RouteContext + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_closure_is_a_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);

        let handler = into_handler(move |_ctx: RouteContext| {
            let seen = Arc::clone(&seen);
            async move {
                seen.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio_test::block_on(handler.call(RouteContext::new()));
        tokio_test::block_on(Arc::clone(&handler).call(RouteContext::new()));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
