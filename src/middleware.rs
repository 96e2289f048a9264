//! Ready-made middleware.
//!
//! A middleware wraps a handler into another handler, so cross-cutting
//! behavior composes without touching handler code. These two cover the
//! common needs of a delivery path: an access-log line per message, and
//! containment of panicking handlers.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::handler::{middleware_fn, HandlerFuture, MessageHandler, Middleware};
use crate::message::Publish;

/// Middleware that logs one line per handled message.
///
/// Emits topic, packet identifier, QoS, and handler latency through
/// [`tracing`] after the inner handler returns.
pub fn logging() -> Middleware {
    // ---
    middleware_fn(|next: MessageHandler| -> MessageHandler {
        Arc::new(move |ctx: CancellationToken, msg: Arc<Publish>| {
            let next = Arc::clone(&next);
            Box::pin(async move {
                let start = Instant::now();
                next(ctx, Arc::clone(&msg)).await;

                tracing::info!(
                    topic = %msg.topic,
                    packet_id = ?msg.packet_id,
                    qos = ?msg.qos,
                    elapsed = ?start.elapsed(),
                    "message processed"
                );
            }) as HandlerFuture
        })
    })
}

/// Middleware that contains a panicking handler.
///
/// The panic is caught and logged instead of unwinding into the dispatch
/// caller, so one faulty handler cannot tear down the message-delivery
/// path. Without this (or an equivalent) middleware, a handler panic
/// propagates out of `dispatch`.
pub fn recoverer() -> Middleware {
    // ---
    middleware_fn(|next: MessageHandler| -> MessageHandler {
        Arc::new(move |ctx: CancellationToken, msg: Arc<Publish>| {
            let next = Arc::clone(&next);
            Box::pin(async move {
                let topic = msg.topic.clone();
                if let Err(panic) = AssertUnwindSafe(next(ctx, msg)).catch_unwind().await {
                    let reason = if let Some(s) = panic.downcast_ref::<&str>() {
                        (*s).to_owned()
                    } else if let Some(s) = panic.downcast_ref::<String>() {
                        s.clone()
                    } else {
                        "non-string panic payload".to_owned()
                    };
                    tracing::error!(topic = %topic, "handler panicked: {reason}");
                }
            }) as HandlerFuture
        })
    })
}
