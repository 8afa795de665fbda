//! # chatmux framework
//!
//! Rule matching and dispatch for chat bots.
//!
//! This layer provides:
//! - [`Router`] / [`Route`]: an ordered rule table evaluated first-match-wins,
//!   with nested subrouters
//! - [`Matcher`]s: regex, message classification and closure predicates
//! - Self-talk filtering so the bot does not answer itself
//! - [`Dispatcher`]: runs the router over inbound events and spawns handlers
//!
//! Rules are assembled with builders. Malformed rules are captured as a sticky
//! [`BuildError`] and make the router refuse every event until fixed.

pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod matcher;
pub mod mention;
pub mod route;
pub mod router;

pub use dispatcher::{DispatchResponse, Dispatcher};
pub use error::{BuildError, BuildResult};
pub use handler::{BoxedHandler, Handler, Preprocessor, into_handler};
pub use matcher::{FnMatcher, Matcher, MessageType, PatternMatcher, TypesMatcher};
pub use mention::{
    is_direct_mention, is_direct_message, is_mentioned, parse_direct_mention,
    strip_direct_mention,
};
pub use route::{Route, RouteMatch};
pub use router::Router;

// =============================================================================
// Tests
// =============================================================================
