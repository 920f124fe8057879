//! Senal Core - stream, tag, and block primitives
//!
//! This crate provides the foundational contracts for synchronous streaming
//! sample processing with an embedded metadata side-channel, designed for
//! schedulers that call block processing entry points thousands of times per
//! second with no tolerance for unbounded latency.
//!
//! # Core Abstractions
//!
//! ## Tag System
//!
//! Tags are key/value annotations pinned to absolute sample offsets. They ride
//! alongside the sample stream and let blocks change per-sample behavior
//! mid-buffer without breaking the illusion of continuous processing:
//!
//! - [`Tag`] - An offset-addressed, keyed annotation
//! - [`TagKey`] - Cheap-to-clone interned symbol used for tag keys
//! - [`TagValue`] - Tagged union of annotation payloads
//! - [`TagStore`] - Range-queried store collaborator, injected into blocks
//! - [`MemoryTagStore`] - In-memory store for tests and standalone use
//!
//! ## Block Contract
//!
//! - [`SyncBlock`] - Rate-preserving (1:1) processing entry point
//! - [`StreamIo`] - Per-call context: absolute offset plus tag store access
//! - [`Message`] / [`MessageHandler`] - Asynchronous inbound control,
//!   delivered between (never during) processing calls
//!
//! ## Oscillator
//!
//! - [`Nco`] - Numerically controlled oscillator with bounded phase, used to
//!   frequency-shift complex streams
//!
//! # Example
//!
//! ```rust
//! use senal_core::{MemoryTagStore, StreamIo, Tag, TagStore, TagValue};
//!
//! let mut store = MemoryTagStore::new();
//! store.add_tag(0, Tag::new(5, "freq", TagValue::Real(1000.0)));
//!
//! let mut found = Vec::new();
//! store.tags_in_range(&mut found, 0, 0, 16, None);
//! assert_eq!(found.len(), 1);
//! assert_eq!(found[0].offset, 5);
//! ```
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible for embedded targets. Disable the
//! default `std` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! senal-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Design Principles
//!
//! - **Real-time safe**: no allocation on steady-state processing paths;
//!   tag queries fill caller-owned buffers
//! - **Injected collaborators**: the tag store is a trait object, so blocks
//!   are testable against an in-memory fake
//! - **Deterministic**: tag ordering is total (offset, then insertion order)

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod block;
pub mod nco;
pub mod store;
pub mod tag;

// Re-export main types at crate root
pub use block::{Message, MessageHandler, StreamIo, SyncBlock};
pub use nco::Nco;
pub use store::{MemoryTagStore, TagStore};
pub use tag::{Tag, TagKey, TagValue};

/// Complex sample type used throughout senal: a pair of `f32` (I/Q).
pub use num_complex::Complex32;
