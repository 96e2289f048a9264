//! Topic routing and packet-identifier correlation for MQTT v5 clients.
//!
//! This crate is the in-process runtime core of a client: it decides which
//! application handlers receive an inbound publish, and it correlates
//! outbound acknowledged exchanges (subscribe, unsubscribe, QoS > 0
//! publish) with their eventual acknowledgements over one shared
//! connection. The wire codec and the connection lifecycle are external
//! collaborators: this crate only sees already-decoded messages.
//!
//! # Routing
//!
//! A [`Router`] maps topic filters (with `+`/`#` wildcards and
//! shared-subscription syntax) to handlers, resolves v5 topic aliases, and
//! supports composable middleware:
//!
//! ```
//! use mqtt_dispatch::{handler_fn, middleware, Publish, Router};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let router = Router::new();
//! router.use_middleware(middleware::recoverer()).await;
//! router
//!     .register_handler(
//!         "sensors/+/status",
//!         handler_fn(|_ctx, msg| async move {
//!             println!("{} -> {} bytes", msg.topic, msg.payload.len());
//!         }),
//!     )
//!     .await;
//!
//! router
//!     .dispatch(Publish::new("sensors/temp/status", &b"ok"[..]))
//!     .await;
//! # }
//! ```
//!
//! # Correlation
//!
//! [`PacketIds`] allocates 16-bit packet identifiers and associates each
//! with an [`AckContext`]: a cancellation-aware waiter carrying a
//! single-shot reply channel. The receive loop resolves an inbound
//! acknowledgement back to the waiting caller by identifier:
//!
//! ```
//! use mqtt_dispatch::{AckContext, PacketIds};
//! use tokio_util::sync::CancellationToken;
//!
//! # fn main() -> mqtt_dispatch::Result<()> {
//! let ids: PacketIds<&'static str> = PacketIds::new();
//!
//! let (waiter, mut reply) = AckContext::new(CancellationToken::new());
//! let id = ids.request(waiter)?;
//!
//! // ... receive loop decodes an ack carrying `id` ...
//! if let Some(waiter) = ids.get(id) {
//!     waiter.complete("suback");
//! }
//! ids.free(id);
//!
//! assert_eq!(reply.try_recv().unwrap(), "suback");
//! # Ok(())
//! # }
//! ```
//!
//! # Concurrency
//!
//! All public operations are safe under concurrent use. Dispatches run in
//! parallel under the registry's shared lock and serialize against
//! registration changes; the alias cache and the correlation service carry
//! their own locks. Instances share nothing, so a process can run one
//! router and one correlation service per connection.

mod alias;
mod correlation;
mod error;
mod handler;
mod logger;
mod matcher;
mod message;
pub mod middleware;
mod router;
mod sync;

// Re-export the public surface at the crate root.
pub use correlation::{AckContext, PacketIds};
pub use error::{Error, Result};
pub use handler::{handler_fn, middleware_fn, HandlerFuture, MessageHandler, Middleware};
pub use logger::{DebugLogger, NoopLogger, TracingLogger};
pub use matcher::matches;
pub use message::{Publish, QoS};
pub use router::Router;
