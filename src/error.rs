use thiserror::Error;

/// Errors that can occur in the dispatch core.
///
/// Routing itself never fails: an unmatched topic simply produces zero
/// handler invocations. The only fallible operation is packet-identifier
/// allocation.
#[derive(Error, Debug)]
pub enum Error {
    /// Every identifier in `1..=65535` is attached to an in-flight exchange.
    ///
    /// Recoverable: callers should back off or queue until an identifier is
    /// freed by an acknowledgement.
    #[error("no unused packet identifiers available")]
    PacketIdsExhausted,
}

/// Result type alias for dispatch-core operations.
pub type Result<T> = std::result::Result<T, Error>;
