//! Handler and middleware capability types.
//!
//! Handlers and middleware are stored type-erased so the router can hold
//! arbitrary closures in one registry. Both aliases are `Arc`-backed and
//! cheap to clone into per-invocation middleware chains.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::message::Publish;

/// Future returned by a single handler invocation.
pub type HandlerFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Type-erased message handler.
///
/// Invoked with the per-dispatch cancellation token and the decoded
/// publish. Handlers run inline on the dispatching task and should complete
/// quickly, spawning their own tasks for long-running work; they must not
/// call back into the router instance that invoked them while it is mid
/// dispatch.
pub type MessageHandler = Arc<dyn Fn(CancellationToken, Arc<Publish>) -> HandlerFuture + Send + Sync>;

/// A middleware wraps one handler into another, adding cross-cutting
/// behavior (logging, timing, panic containment) without touching handler
/// code.
pub type Middleware = Arc<dyn Fn(MessageHandler) -> MessageHandler + Send + Sync>;

/// Erase an async closure into a [`MessageHandler`].
///
/// This is the registration entry point for ordinary `async` closures:
///
/// ```
/// use mqtt_dispatch::handler_fn;
///
/// let handler = handler_fn(|_ctx, msg| async move {
///     println!("got {} bytes on {}", msg.payload.len(), msg.topic);
/// });
/// # drop(handler);
/// ```
pub fn handler_fn<F, Fut>(handler: F) -> MessageHandler
where
    F: Fn(CancellationToken, Arc<Publish>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    // ---
    Arc::new(move |ctx: CancellationToken, msg: Arc<Publish>| {
        Box::pin(handler(ctx, msg)) as HandlerFuture
    })
}

/// Erase a handler-wrapping closure into a [`Middleware`].
pub fn middleware_fn<F>(middleware: F) -> Middleware
where
    F: Fn(MessageHandler) -> MessageHandler + Send + Sync + 'static,
{
    // ---
    Arc::new(middleware)
}
