//! Topic alias cache.
//!
//! MQTT v5 senders may replace the topic name with a small integer alias
//! once a mapping has been established. The router learns mappings
//! opportunistically from inbound publishes and consults them to resolve
//! alias-only messages.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::sync::lock_ignore_poison;

/// Cache of `alias -> topic` mappings learned from inbound publishes.
///
/// The store step runs on the routing path, which otherwise holds only the
/// registry's shared lock, so the cache carries its own exclusive lock.
/// Store and readback happen in one critical section: two dispatches
/// racing on the same alias each observe a consistent mapping.
#[derive(Debug, Default)]
pub(crate) struct AliasTable {
    // ---
    aliases: Mutex<HashMap<u16, String>>,
}

impl AliasTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Resolve the effective topic for a publish carrying `alias`.
    ///
    /// A non-empty `topic` establishes (or replaces) the mapping before the
    /// lookup. Returns the cached topic, or `None` when the alias has never
    /// been seen together with a topic name.
    pub(crate) fn resolve(&self, alias: u16, topic: &str) -> Option<String> {
        // ---
        let mut aliases = lock_ignore_poison(&self.aliases);
        if !topic.is_empty() {
            aliases.insert(alias, topic.to_owned());
        }
        aliases.get(&alias).cloned()
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_store_and_resolve() {
        // ---
        let table = AliasTable::new();

        // Unknown alias, no topic name to learn from.
        assert_eq!(table.resolve(3, ""), None);

        // A publish carrying both registers the mapping.
        assert_eq!(table.resolve(3, "x/y"), Some("x/y".to_owned()));

        // Alias-only publishes resolve to the last stored topic.
        assert_eq!(table.resolve(3, ""), Some("x/y".to_owned()));
    }

    #[test]
    fn test_overwrite() {
        // ---
        let table = AliasTable::new();
        assert_eq!(table.resolve(1, "first"), Some("first".to_owned()));
        assert_eq!(table.resolve(1, "second"), Some("second".to_owned()));
        assert_eq!(table.resolve(1, ""), Some("second".to_owned()));
    }
}
