//! Core block contract and per-call processing context.
//!
//! A [`SyncBlock`] consumes one sample stream and produces another at 1:1
//! rate. An external scheduler repeatedly calls [`SyncBlock::process`] with
//! a fixed-size slice of input and a same-capacity output slice; the block
//! queries the tag store for annotations falling inside the call's absolute
//! offset range, mutates its parameters accordingly, and may write new tags
//! back.
//!
//! ## Design Decisions
//!
//! - **`&self` processing**: blocks take `&self` and serialize internal
//!   mutability behind their own lock. The scheduler thread calls `process`
//!   while control threads call parameter setters on the same shared block;
//!   both sides acquire the block's single exclusive lock for their full
//!   duration, so multi-field state is never torn.
//!
//! - **No runtime error surface**: `process` always reports the number of
//!   items produced. Malformed external input (e.g. a tag of the wrong
//!   value kind) is silently ignored, never raised — stream tags are
//!   best-effort metadata.
//!
//! - **No allocations**: all methods are designed to be called on a
//!   real-time scheduler thread with zero steady-state heap allocations.

use crate::store::TagStore;
use crate::tag::{TagKey, TagValue};

/// Per-call processing context handed to a block by the scheduler.
///
/// Borrows the tag store for the duration of one call and records where the
/// call sits in the absolute sample stream.
pub struct StreamIo<'a> {
    /// Absolute stream offset of `input[0]` (equal to the offset of
    /// `output[0]` for rate-preserving blocks).
    pub offset: u64,
    /// Tag store for the block's stream ports.
    pub tags: &'a mut dyn TagStore,
}

impl<'a> StreamIo<'a> {
    /// Create a context for a call starting at `offset`.
    pub fn new(offset: u64, tags: &'a mut dyn TagStore) -> Self {
        Self { offset, tags }
    }
}

/// A synchronous, rate-preserving (1-in/1-out) stream block.
///
/// # Contract
///
/// For each call, the block produces exactly `output.len()` items (these
/// blocks never starve) and the caller guarantees
/// `input.len() >= required_input(output.len())`. Sample buffers are valid
/// only for the duration of the call; blocks never retain pointers into
/// them.
///
/// # Example
///
/// ```rust
/// use senal_core::{MemoryTagStore, StreamIo, SyncBlock};
///
/// struct Gain(f32);
///
/// impl SyncBlock for Gain {
///     type Item = f32;
///
///     fn process(&self, _io: &mut StreamIo<'_>, input: &[f32], output: &mut [f32]) -> usize {
///         for (o, &i) in output.iter_mut().zip(input) {
///             *o = i * self.0;
///         }
///         output.len()
///     }
/// }
///
/// let block = Gain(2.0);
/// let mut store = MemoryTagStore::new();
/// let mut io = StreamIo::new(0, &mut store);
/// let mut out = [0.0f32; 3];
/// let produced = block.process(&mut io, &[1.0, 2.0, 3.0], &mut out);
/// assert_eq!(produced, 3);
/// assert_eq!(out, [2.0, 4.0, 6.0]);
/// ```
pub trait SyncBlock {
    /// Stream element type.
    type Item;

    /// Process one call: consume `input`, fill `output`, return the number
    /// of items produced (always `output.len()` for these blocks).
    fn process(
        &self,
        io: &mut StreamIo<'_>,
        input: &[Self::Item],
        output: &mut [Self::Item],
    ) -> usize;

    /// Minimum input length needed to produce `noutput` items.
    ///
    /// The scheduler calls this before each `process` to size buffers.
    /// Rate-preserving blocks with no lookahead or history return
    /// `noutput`, which is the default.
    fn required_input(&self, noutput: usize) -> usize {
        noutput
    }
}

/// An asynchronous inbound control message: a key/value pair.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    /// Selects which parameter the message addresses.
    pub key: TagKey,
    /// New parameter value.
    pub value: TagValue,
}

impl Message {
    /// Create a message.
    pub fn new(key: impl Into<TagKey>, value: TagValue) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Receiver side of the message bus.
///
/// The transport delivers messages between processing calls, never during
/// one; handlers serialize against the hot path with the block's own lock,
/// so an update takes effect starting with the next call.
pub trait MessageHandler {
    /// Handle one inbound message. Messages the block does not understand
    /// are ignored.
    fn handle_message(&self, msg: &Message);
}
