//! Tag fan-out: turn one trigger tag into a configured pattern of tags.
//!
//! On seeing a tag with the trigger key in the current call's offset range,
//! the block emits one new tag per configured `(delay, value)` pair, each
//! at `trigger.offset + delay`, carrying the block's own identity as
//! producer. The trigger tag itself is left in place, and the sample
//! payload passes through unchanged.
//!
//! The value and delay vectors are parallel arrays — one delay per value —
//! validated once at construction: mismatched lengths or a negative delay
//! refuse to construct the block. There are no per-call failures.

use core::marker::PhantomData;
use std::sync::{Mutex, MutexGuard, PoisonError};

use senal_core::{StreamIo, SyncBlock, Tag, TagKey, TagValue};
use thiserror::Error;

/// Construction failures for [`TagInserter`].
///
/// Both are unrecoverable configuration errors: no partially constructed
/// block is observable.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TagInserterError {
    /// The value and delay vectors are not the same length.
    #[error("value vector length {values} does not match delay vector length {delays}")]
    LengthMismatch {
        /// Length of the value vector.
        values: usize,
        /// Length of the delay vector.
        delays: usize,
    },
    /// A delay is negative; emitted tags may only land at or after their
    /// trigger.
    #[error("tag delay at index {index} is negative ({delay})")]
    NegativeDelay {
        /// Index of the offending delay.
        index: usize,
        /// The delay value.
        delay: i64,
    },
}

/// Construction parameters for [`TagInserter`].
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TagInserterConfig {
    /// Key whose tags trigger the fan-out.
    pub trigger_key: String,
    /// Key carried by the emitted tags.
    pub tag_key: String,
    /// Values of the emitted tags, parallel to `delays`.
    pub values: Vec<f32>,
    /// Sample-offset deltas of the emitted tags relative to the trigger.
    /// Validated non-negative.
    pub delays: Vec<i64>,
    /// Elements per stream item (vector streams); 1 for scalar streams.
    pub vlen: usize,
    /// Block identity, recorded as the tag producer.
    pub name: String,
}

impl Default for TagInserterConfig {
    fn default() -> Self {
        Self {
            trigger_key: "trig".into(),
            tag_key: "tag".into(),
            values: Vec::new(),
            delays: Vec::new(),
            vlen: 1,
            name: "tag_inserter".into(),
        }
    }
}

/// Trigger-driven tag fan-out block.
///
/// Stateless across calls apart from its fixed configuration; generic over
/// the stream element type, which it only copies through. For vector
/// streams (`vlen > 1`) the input and output slices hold
/// `items * vlen` elements while tag offsets keep counting items.
///
/// # Example
///
/// ```rust
/// use senal_blocks::{TagInserter, TagInserterConfig};
/// use senal_core::{MemoryTagStore, StreamIo, SyncBlock, Tag, TagStore, TagValue};
///
/// let inserter: TagInserter<f32> = TagInserter::new(TagInserterConfig {
///     trigger_key: "burst".into(),
///     tag_key: "gain".into(),
///     values: vec![0.0, 1.0],
///     delays: vec![2, 7],
///     ..TagInserterConfig::default()
/// })
/// .unwrap();
///
/// let mut store = MemoryTagStore::new();
/// store.add_tag(0, Tag::new(4, "burst", TagValue::Real(1.0)));
///
/// let input = [0.5f32; 16];
/// let mut output = [0.0f32; 16];
/// let mut io = StreamIo::new(0, &mut store);
/// inserter.process(&mut io, &input, &mut output);
///
/// // Trigger kept, two tags fanned out at 4+2 and 4+7
/// assert_eq!(store.len(0), 3);
/// ```
#[derive(Debug)]
pub struct TagInserter<T> {
    trigger_key: TagKey,
    tag_key: TagKey,
    name: TagKey,
    values: Vec<f32>,
    /// Validated non-negative at construction, stored widened.
    delays: Vec<u64>,
    vlen: usize,
    /// Reused tag query buffer; the block's only runtime mutability.
    scratch: Mutex<Vec<Tag>>,
    _element: PhantomData<fn() -> T>,
}

impl<T: Copy> TagInserter<T> {
    /// Create a tag inserter, validating the parallel value/delay arrays.
    pub fn new(config: TagInserterConfig) -> Result<Self, TagInserterError> {
        if config.values.len() != config.delays.len() {
            return Err(TagInserterError::LengthMismatch {
                values: config.values.len(),
                delays: config.delays.len(),
            });
        }
        let mut delays = Vec::with_capacity(config.delays.len());
        for (index, &delay) in config.delays.iter().enumerate() {
            match u64::try_from(delay) {
                Ok(delay) => delays.push(delay),
                Err(_) => return Err(TagInserterError::NegativeDelay { index, delay }),
            }
        }
        Ok(Self {
            trigger_key: TagKey::new(&config.trigger_key),
            tag_key: TagKey::new(&config.tag_key),
            name: TagKey::new(&config.name),
            values: config.values,
            delays,
            vlen: config.vlen.max(1),
            scratch: Mutex::new(Vec::new()),
            _element: PhantomData,
        })
    }

    /// Number of tags emitted per trigger.
    pub fn pattern_len(&self) -> usize {
        self.values.len()
    }

    /// Elements per stream item.
    pub fn vlen(&self) -> usize {
        self.vlen
    }

    /// Block identity.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Tag>> {
        self.scratch.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Copy> SyncBlock for TagInserter<T> {
    type Item = T;

    fn process(&self, io: &mut StreamIo<'_>, input: &[T], output: &mut [T]) -> usize {
        let items = output.len() / self.vlen;
        debug_assert_eq!(output.len() % self.vlen, 0);
        debug_assert!(input.len() >= output.len());

        let mut triggers = self.lock();
        io.tags.tags_in_range(
            &mut triggers,
            0,
            io.offset,
            io.offset + items as u64,
            Some(&self.trigger_key),
        );
        for trigger in triggers.iter() {
            for (&value, &delay) in self.values.iter().zip(&self.delays) {
                io.tags.add_tag(
                    0,
                    Tag::with_producer(
                        trigger.offset + delay,
                        self.tag_key.clone(),
                        TagValue::Real(f64::from(value)),
                        self.name.clone(),
                    ),
                );
            }
            tracing::debug!(
                block = self.name.as_str(),
                trigger = trigger.offset,
                fanned = self.values.len(),
                "inserted tag pattern"
            );
        }

        output.copy_from_slice(&input[..output.len()]);
        items
    }
}
