//! Topic-based dispatch of inbound publishes.
//!
//! A [`Router`] owns the subscription registry, the middleware chain, the
//! topic alias cache, and a pluggable diagnostic sink. The connection's
//! receive loop hands every decoded publish to [`Router::dispatch`]; the
//! router resolves the effective topic, finds the matching filters, and
//! invokes each registered handler wrapped in the middleware chain.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock as StdRwLock};

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::alias::AliasTable;
use crate::handler::{MessageHandler, Middleware};
use crate::logger::{DebugLogger, NoopLogger};
use crate::matcher::matches;
use crate::message::Publish;
use crate::sync::{read_ignore_poison, write_ignore_poison};

/// Routes decoded publishes to registered handlers by topic filter.
///
/// Allows multiple handlers per filter and supports `+`/`#` wildcards and
/// shared-subscription filters. Registration changes take the registry's
/// exclusive lock; dispatch holds the shared lock for the duration of
/// matching and handler invocation, so concurrent dispatches proceed in
/// parallel while serializing against registration.
///
/// Each instance is self-contained: routers share no state, so one process
/// can run one router per client connection.
pub struct Router {
    // ---
    routes: RwLock<Routes>,
    aliases: AliasTable,
    debug: StdRwLock<Arc<dyn DebugLogger>>,
}

#[derive(Default)]
struct Routes {
    // ---
    subscriptions: HashMap<String, Vec<MessageHandler>>,
    middlewares: Vec<Middleware>,
    default_handler: Option<MessageHandler>,
}

impl Router {
    /// Create a router with no registrations and a no-op debug sink.
    pub fn new() -> Self {
        // ---
        Self {
            routes: RwLock::new(Routes::default()),
            aliases: AliasTable::new(),
            debug: StdRwLock::new(Arc::new(NoopLogger)),
        }
    }

    /// Create a router with the default handler already set, for handlers
    /// created inline.
    pub fn with_default_handler(handler: MessageHandler) -> Self {
        // ---
        Self {
            routes: RwLock::new(Routes {
                default_handler: Some(handler),
                ..Routes::default()
            }),
            aliases: AliasTable::new(),
            debug: StdRwLock::new(Arc::new(NoopLogger)),
        }
    }

    /// Append `handler` under `filter`.
    ///
    /// Repeated registration under the same filter accumulates; during
    /// dispatch the handlers run in registration order. The filter is not
    /// validated: a malformed pattern simply never matches.
    pub async fn register_handler(&self, filter: impl Into<String>, handler: MessageHandler) {
        // ---
        let filter = filter.into();
        self.debug_log(format_args!("registering handler for: {filter}"));

        let mut routes = self.routes.write().await;
        routes.subscriptions.entry(filter).or_default().push(handler);
    }

    /// Remove every handler registered under the exact string `filter`.
    ///
    /// This is not a pattern-matching removal: unregistering `a/#` leaves a
    /// registration for `a/b` in place. No-op when the filter is unknown.
    pub async fn unregister_handler(&self, filter: &str) {
        // ---
        self.debug_log(format_args!("unregistering handler for: {filter}"));

        let mut routes = self.routes.write().await;
        routes.subscriptions.remove(filter);
    }

    /// Append a middleware to the chain.
    ///
    /// May be called repeatedly; middleware accumulate and the chain wraps
    /// every handler invocation with the first-registered middleware
    /// outermost.
    pub async fn use_middleware(&self, middleware: Middleware) {
        // ---
        self.debug_log(format_args!("registering middleware"));

        let mut routes = self.routes.write().await;
        routes.middlewares.push(middleware);
    }

    /// Set, replace, or clear (with `None`) the default handler.
    ///
    /// The default handler runs if and only if a dispatch produced zero
    /// handler invocations, and it is wrapped by the middleware chain like
    /// any other handler.
    pub async fn set_default_handler(&self, handler: Option<MessageHandler>) {
        // ---
        self.debug_log(format_args!("registering default handler"));

        let mut routes = self.routes.write().await;
        routes.default_handler = handler;
    }

    /// Install a diagnostic sink. Replaces the current sink; the default is
    /// [`NoopLogger`].
    pub fn set_debug_logger(&self, logger: Arc<dyn DebugLogger>) {
        // ---
        *write_ignore_poison(&self.debug) = logger;
    }

    /// Route `publish` to every handler whose filter matches its effective
    /// topic.
    ///
    /// Handlers are awaited inline, so this returns once all matched
    /// handlers (or the default handler) have returned. The per-dispatch
    /// cancellation token is freshly created and cancelled on completion.
    pub async fn dispatch(&self, publish: Publish) {
        // ---
        self.dispatch_inner(CancellationToken::new(), publish).await;
    }

    /// Like [`dispatch`](Self::dispatch), but the per-dispatch token is
    /// derived from `parent`, so handlers observe the caller's
    /// cancellation.
    pub async fn dispatch_scoped(&self, parent: &CancellationToken, publish: Publish) {
        // ---
        self.dispatch_inner(parent.child_token(), publish).await;
    }

    async fn dispatch_inner(&self, cancel: CancellationToken, publish: Publish) {
        // ---
        let debug = read_ignore_poison(&self.debug).clone();
        debug.log(format_args!("routing message for: {}", publish.topic));

        // Alias resolution mutates the cache, so it runs under the cache's
        // own lock before the registry's shared lock is taken.
        let topic = self.effective_topic(&publish, debug.as_ref());
        let msg = Arc::new(publish);

        let routes = self.routes.read().await;

        let mut handler_called = false;
        for (filter, handlers) in routes.subscriptions.iter() {
            if !matches(filter, &topic) {
                continue;
            }
            debug.log(format_args!("found handler for: {filter}"));
            for handler in handlers {
                let wrapped = wrap_handler(&routes.middlewares, Arc::clone(handler));
                wrapped(cancel.clone(), Arc::clone(&msg)).await;
                handler_called = true;
            }
        }

        if !handler_called {
            if let Some(default) = &routes.default_handler {
                let wrapped = wrap_handler(&routes.middlewares, Arc::clone(default));
                wrapped(cancel.clone(), Arc::clone(&msg)).await;
            }
        }
        drop(routes);

        // The dispatcher created this token (or child), so it cancels it
        // once every handler for the dispatch has returned.
        cancel.cancel();
    }

    /// Resolve the topic used for matching.
    ///
    /// A publish without an alias routes on its topic name. One with an
    /// alias first teaches the cache its topic name (when non-empty), then
    /// routes on the cached topic; an unknown alias yields the empty topic,
    /// which no literal filter matches.
    fn effective_topic(&self, publish: &Publish, debug: &dyn DebugLogger) -> String {
        // ---
        let Some(alias) = publish.topic_alias else {
            return publish.topic.clone();
        };

        debug.log(format_args!("message is using topic aliasing"));
        match self.aliases.resolve(alias, &publish.topic) {
            Some(topic) => {
                debug.log(format_args!("alias {alias} translates to '{topic}'"));
                topic
            }
            None => String::new(),
        }
    }

    fn debug_log(&self, args: fmt::Arguments<'_>) {
        // ---
        read_ignore_poison(&self.debug).log(args);
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // ---
        let mut s = f.debug_struct("Router");
        match self.routes.try_read() {
            Ok(routes) => s
                .field("filters", &routes.subscriptions.len())
                .field("middlewares", &routes.middlewares.len())
                .field("has_default", &routes.default_handler.is_some())
                .finish(),
            Err(_) => s.finish_non_exhaustive(),
        }
    }
}

/// Compose the middleware chain around `handler`, folding from the last
/// registered inward so the first registered observes the call first and
/// completes last. With no middleware the handler is returned unwrapped.
fn wrap_handler(middlewares: &[Middleware], handler: MessageHandler) -> MessageHandler {
    // ---
    let mut wrapped = handler;
    for middleware in middlewares.iter().rev() {
        wrapped = middleware(wrapped);
    }
    wrapped
}
