//! # chatmux core
//!
//! The fundamental types shared by every chatmux crate.
//!
//! - **Event System**: inbound events and their channel shape ([`Event`], [`BoxedEvent`])
//! - **Routing Context**: the ambient bot and event of one dispatch ([`RouteContext`])
//! - **Bot Handle**: identity and reply helpers for handlers ([`Bot`])
//! - **Transport Boundary**: the connection the runtime drives ([`Connection`])
//!
//! ```text
//! ┌────────────┐     ┌────────────┐     ┌────────────┐     ┌─────────┐
//! │ Connection │────▶│ Dispatcher │────▶│   Router   │────▶│ Handler │
//! └────────────┘     └────────────┘     └────────────┘     └─────────┘
//! ```

pub mod bot;
pub mod context;
pub mod error;
pub mod event;
pub mod transport;

pub use bot::{Bot, BoxedBot};
pub use context::RouteContext;
pub use error::{ApiError, ApiResult, TransportError, TransportResult};
pub use event::{BoxedEvent, ChannelKind, Event, MessageEvent};
pub use transport::{BoxedConnection, Connection, ConnectionEvent};
