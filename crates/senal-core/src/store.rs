//! Tag store: the range-queried annotation collaborator.
//!
//! Blocks do not own the tags on their streams; an external store does. The
//! scheduler hands each block a store reference for the duration of one
//! processing call, and the block queries, adds, or removes tags against
//! absolute stream offsets.
//!
//! [`TagStore`] is the injected interface; [`MemoryTagStore`] is the
//! in-memory implementation used by tests and by anything driving blocks
//! without a full runtime.

use alloc::vec::Vec;

use crate::tag::{Tag, TagKey};

/// Range-queried, offset-keyed annotation store.
///
/// Query results are ordered by ascending offset, with ties broken by
/// insertion order. Ranges are half-open: `[start, end)`.
///
/// Removal matches tags by content (offset, key, value): the caller passes
/// back a tag it previously received from a query.
pub trait TagStore {
    /// Collect all tags on `port` with `start <= offset < end` into `out`.
    ///
    /// `out` is cleared first, then filled in ascending offset order
    /// (insertion order on ties). Passing a `key` restricts the result to
    /// tags with that exact key. The caller owns and reuses `out`, so a
    /// steady-state query performs no allocation once the buffer has grown
    /// to its working size.
    fn tags_in_range(
        &self,
        out: &mut Vec<Tag>,
        port: usize,
        start: u64,
        end: u64,
        key: Option<&TagKey>,
    );

    /// Add a tag to `port`.
    fn add_tag(&mut self, port: usize, tag: Tag);

    /// Remove the first stored tag on `port` matching `tag` by content.
    ///
    /// Returns `true` if a tag was removed.
    fn remove_tag(&mut self, port: usize, tag: &Tag) -> bool;
}

/// In-memory [`TagStore`].
///
/// Holds one tag list per port. Suitable as the reference collaborator for
/// tests and for driving blocks standalone; a flow-graph runtime would
/// provide its own store backed by its buffer bookkeeping.
///
/// # Example
///
/// ```rust
/// use senal_core::{MemoryTagStore, Tag, TagStore, TagValue};
///
/// let mut store = MemoryTagStore::new();
/// store.add_tag(0, Tag::new(10, "trig", TagValue::Real(1.0)));
/// store.add_tag(0, Tag::new(4, "trig", TagValue::Real(2.0)));
///
/// let mut out = Vec::new();
/// store.tags_in_range(&mut out, 0, 0, 64, None);
/// // Ascending offset order regardless of insertion order
/// assert_eq!(out[0].offset, 4);
/// assert_eq!(out[1].offset, 10);
/// ```
#[derive(Debug, Default)]
pub struct MemoryTagStore {
    // One insertion-ordered list per port; queries sort stably by offset,
    // which preserves insertion order for equal offsets.
    ports: Vec<Vec<Tag>>,
}

impl MemoryTagStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of tags stored on `port`.
    pub fn len(&self, port: usize) -> usize {
        self.ports.get(port).map_or(0, Vec::len)
    }

    /// Whether `port` holds no tags.
    pub fn is_empty(&self, port: usize) -> bool {
        self.len(port) == 0
    }

    /// Drop all tags on all ports.
    pub fn clear(&mut self) {
        for port in &mut self.ports {
            port.clear();
        }
    }

    fn port_mut(&mut self, port: usize) -> &mut Vec<Tag> {
        if port >= self.ports.len() {
            self.ports.resize_with(port + 1, Vec::new);
        }
        &mut self.ports[port]
    }
}

impl TagStore for MemoryTagStore {
    fn tags_in_range(
        &self,
        out: &mut Vec<Tag>,
        port: usize,
        start: u64,
        end: u64,
        key: Option<&TagKey>,
    ) {
        out.clear();
        let Some(tags) = self.ports.get(port) else {
            return;
        };
        out.extend(
            tags.iter()
                .filter(|t| t.offset >= start && t.offset < end)
                .filter(|t| key.is_none_or(|k| t.key == *k))
                .cloned(),
        );
        // Stable: equal offsets keep insertion order
        out.sort_by_key(|t| t.offset);
    }

    fn add_tag(&mut self, port: usize, tag: Tag) {
        #[cfg(feature = "tracing")]
        tracing::trace!(port, offset = tag.offset, key = %tag.key, "tag added");
        self.port_mut(port).push(tag);
    }

    fn remove_tag(&mut self, port: usize, tag: &Tag) -> bool {
        let tags = self.port_mut(port);
        match tags.iter().position(|t| t == tag) {
            Some(idx) => {
                tags.remove(idx);
                #[cfg(feature = "tracing")]
                tracing::trace!(port, offset = tag.offset, key = %tag.key, "tag removed");
                true
            }
            None => false,
        }
    }
}
