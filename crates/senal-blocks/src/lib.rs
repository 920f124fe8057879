//! Senal Blocks - tag-aware synchronous stream blocks
//!
//! This crate provides the scheduler-facing blocks built on senal-core:
//!
//! - [`Mixer`] - Multiplies a complex stream by a local oscillator, retuned
//!   synchronously, by stream tags, or by inbound messages
//! - [`PeakTagger`] - Scans a real stream for threshold crossings and tags
//!   the true local maximum, with post-detection blanking
//! - [`TagInserter`] - Fans a trigger tag out into a configured pattern of
//!   new tags at fixed offsets
//!
//! All blocks are 1-in/1-out and rate-preserving: every processing call
//! produces exactly as many items as the output buffer holds. Parameter
//! setters may be called from other threads while the scheduler thread is
//! inside `process`; each block serializes both through one exclusive lock,
//! so multi-field updates (e.g. a tag placement offset and its derived
//! start padding) are always observed as a unit.
//!
//! ## Example
//!
//! ```rust
//! use senal_blocks::{Mixer, MixerConfig, TuneMode};
//! use senal_core::{Complex32, MemoryTagStore, StreamIo, SyncBlock};
//!
//! let mixer = Mixer::new(MixerConfig {
//!     sample_rate: 48000.0,
//!     frequency: 1000.0,
//!     ..MixerConfig::default()
//! });
//!
//! let mut store = MemoryTagStore::new();
//! let mut io = StreamIo::new(0, &mut store);
//! let input = [Complex32::new(1.0, 0.0); 64];
//! let mut output = [Complex32::default(); 64];
//! assert_eq!(mixer.process(&mut io, &input, &mut output), 64);
//! ```

pub mod mixer;
pub mod peak_tagger;
pub mod tag_inserter;

// Re-export main types at crate root
pub use mixer::{Mixer, MixerConfig, TuneMode};
pub use peak_tagger::{PeakTagger, PeakTaggerConfig};
pub use tag_inserter::{TagInserter, TagInserterConfig, TagInserterError};
