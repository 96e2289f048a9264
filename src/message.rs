//! Decoded message types at the wire-codec boundary.
//!
//! The binary codec that produces these values lives outside this crate;
//! routing and correlation only ever see already-decoded messages.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Quality of service level carried by a publish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QoS {
    /// At most once delivery.
    #[default]
    AtMostOnce,
    /// At least once delivery.
    AtLeastOnce,
    /// Exactly once delivery.
    ExactlyOnce,
}

/// A decoded inbound PUBLISH.
///
/// Fields mirror what the codec exposes for a v5 publish. `topic` may be
/// empty when the sender relies on a previously established topic alias;
/// the router resolves the effective topic before matching.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Publish {
    /// Topic name the message was published on (possibly empty, see above).
    pub topic: String,

    /// Opaque application payload.
    pub payload: Bytes,

    /// Delivery guarantee the sender requested.
    pub qos: QoS,

    /// Retain flag from the fixed header.
    pub retain: bool,

    /// Duplicate-delivery flag from the fixed header.
    pub duplicate: bool,

    /// Packet identifier; present only for QoS > 0 publishes.
    pub packet_id: Option<u16>,

    /// Topic alias property, when the sender is aliasing.
    pub topic_alias: Option<u16>,
}

impl Publish {
    /// Create a publish with the given topic and payload.
    ///
    /// Flags, identifier, and alias default to absent; set the public
    /// fields directly when the codec decoded them.
    pub fn new(topic: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        // ---
        Self {
            topic: topic.into(),
            payload: payload.into(),
            ..Self::default()
        }
    }
}
