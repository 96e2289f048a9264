//! Packet-identifier correlation for acknowledged exchanges.
//!
//! Subscribes, unsubscribes, and QoS > 0 publishes each occupy one 16-bit
//! packet identifier until the matching acknowledgement arrives. This
//! module allocates identifiers, associates each with a waiting caller,
//! and resolves inbound acknowledgements back to that caller.
//!
//! The service is independent of the router: it has its own lock and is
//! shared between the code issuing outbound requests and the receive loop
//! that decodes acknowledgements.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::sync::lock_ignore_poison;

/// Waiter attached to one in-flight acknowledged exchange.
///
/// Carries the cancellation token governing the wait and the sending half
/// of a single-shot reply channel. The receive loop looks the waiter up by
/// packet identifier and calls [`complete`](Self::complete); the caller
/// awaits the paired receiver, racing it against its own token if it wants
/// a way to give up.
///
/// `R` is the decoded acknowledgement type produced by the wire codec,
/// which lives outside this crate.
pub struct AckContext<R> {
    // ---
    cancellation: CancellationToken,
    reply: Mutex<Option<oneshot::Sender<R>>>,
}

impl<R> AckContext<R> {
    /// Create a waiter and the receiving half of its reply channel.
    pub fn new(cancellation: CancellationToken) -> (Arc<Self>, oneshot::Receiver<R>) {
        // ---
        let (tx, rx) = oneshot::channel();
        let ctx = Arc::new(Self {
            cancellation,
            reply: Mutex::new(Some(tx)),
        });
        (ctx, rx)
    }

    /// Token the waiting caller uses to abandon the exchange.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Deliver the acknowledgement to the waiting caller.
    ///
    /// Returns `false` when the reply was already delivered or the caller
    /// gave up and dropped its receiver. A duplicate acknowledgement is a
    /// normal protocol occurrence, not an error.
    pub fn complete(&self, reply: R) -> bool {
        // ---
        match lock_ignore_poison(&self.reply).take() {
            Some(tx) => tx.send(reply).is_ok(),
            None => false,
        }
    }
}

impl<R> fmt::Debug for AckContext<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // ---
        let delivered = lock_ignore_poison(&self.reply).is_none();
        f.debug_struct("AckContext")
            .field("delivered", &delivered)
            .field("cancelled", &self.cancellation.is_cancelled())
            .finish()
    }
}

/// Allocates packet identifiers and maps each to its waiter.
///
/// One instance per client connection; instances share nothing. All
/// operations are safe under concurrent use, and [`request`](Self::request)
/// is atomic with respect to other `request` calls, so an identifier is
/// never issued twice while in flight.
pub struct PacketIds<R> {
    // ---
    inner: Mutex<PacketIdsInner<R>>,
}

struct PacketIdsInner<R> {
    // ---
    index: HashMap<u16, Arc<AckContext<R>>>,
    last_issued: u16,
}

impl<R> PacketIds<R> {
    /// Create an empty service. The first identifier issued is 1.
    pub fn new() -> Self {
        // ---
        Self {
            inner: Mutex::new(PacketIdsInner {
                index: HashMap::new(),
                last_issued: 0,
            }),
        }
    }

    /// Allocate the next free identifier and associate it with `waiter`.
    ///
    /// Allocation resumes after the previously issued identifier, wrapping
    /// from 65535 back to 1; identifier 0 is reserved by the protocol and
    /// never issued. Spreading reuse across the space lowers the chance of
    /// handing out an identifier whose prior exchange has not settled on a
    /// slow peer.
    ///
    /// # Errors
    ///
    /// [`Error::PacketIdsExhausted`] when every identifier is attached to
    /// an in-flight exchange; nothing is allocated in that case.
    pub fn request(&self, waiter: Arc<AckContext<R>>) -> Result<u16> {
        // ---
        let mut inner = lock_ignore_poison(&self.inner);

        let start = next_id(inner.last_issued);
        let mut candidate = start;
        loop {
            if !inner.index.contains_key(&candidate) {
                inner.index.insert(candidate, waiter);
                inner.last_issued = candidate;
                return Ok(candidate);
            }
            candidate = next_id(candidate);
            if candidate == start {
                // Wrapped all the way around: the full space is in use.
                return Err(Error::PacketIdsExhausted);
            }
        }
    }

    /// Look up the waiter for `id` without releasing the identifier.
    ///
    /// `None` is a normal outcome: the acknowledgement may be late or a
    /// duplicate for an identifier already freed.
    pub fn get(&self, id: u16) -> Option<Arc<AckContext<R>>> {
        // ---
        lock_ignore_poison(&self.inner).index.get(&id).cloned()
    }

    /// Release `id` for reuse. No-op when the identifier is not in use.
    ///
    /// A caller that abandons its wait must free its own identifier, or the
    /// slot leaks until [`clear`](Self::clear).
    pub fn free(&self, id: u16) {
        // ---
        lock_ignore_poison(&self.inner).index.remove(&id);
    }

    /// Discard every association.
    ///
    /// Used on fresh-session transitions, where all in-flight exchanges are
    /// invalidated; every previously issued identifier resolves to absent
    /// afterwards.
    pub fn clear(&self) {
        // ---
        lock_ignore_poison(&self.inner).index.clear();
    }

    /// Number of identifiers currently attached to in-flight exchanges.
    pub fn in_flight(&self) -> usize {
        // ---
        lock_ignore_poison(&self.inner).index.len()
    }
}

impl<R> Default for PacketIds<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> fmt::Debug for PacketIds<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // ---
        let inner = lock_ignore_poison(&self.inner);
        f.debug_struct("PacketIds")
            .field("in_flight", &inner.index.len())
            .field("last_issued", &inner.last_issued)
            .finish()
    }
}

/// Successor in the identifier space, skipping 0.
fn next_id(id: u16) -> u16 {
    // ---
    if id == u16::MAX {
        1
    } else {
        id + 1
    }
}
