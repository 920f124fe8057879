//! Frequency mixer: complex stream × local oscillator.
//!
//! Multiplies the input stream by a locally generated complex exponential,
//! shifting its spectrum by the oscillator frequency. The frequency and
//! phase can be changed three ways, fixed at construction by [`TuneMode`]:
//! direct setter calls, stream tags, or inbound control messages. Only one
//! mode is active per instance; they never combine.
//!
//! ## Signal Flow
//!
//! ```text
//! Input × e^(j·θ[n]) → Output        θ advances by 2π·f/fs each sample
//! ```
//!
//! In tag mode the call is segmented at every matching tag: samples
//! strictly before a tag's offset are mixed with the pre-tag parameters,
//! the tag is applied and consumed, and mixing resumes — so the sample *at*
//! the tag's offset is the first one mixed with the new value. Oscillator
//! phase is continuous across the update except for the instantaneous
//! frequency change itself.
//!
//! The conjugate flag selects down-conversion: it negates the effective
//! frequency when an update is stored, not per mixed sample.

use core::f32::consts::TAU;
use std::mem;
use std::sync::{Mutex, MutexGuard, PoisonError};

use num_complex::Complex32;
use senal_core::{Message, MessageHandler, Nco, StreamIo, SyncBlock, Tag, TagKey};

/// How a [`Mixer`] accepts frequency and phase updates at runtime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TuneMode {
    /// Parameters change only through explicit setter calls.
    #[default]
    Never,
    /// Parameters change only through stream tags on the input.
    Tags,
    /// Parameters change only through inbound control messages.
    Messages,
}

/// Construction parameters for [`Mixer`].
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MixerConfig {
    /// Sample rate in Hz.
    pub sample_rate: f32,
    /// Mix with the conjugate oscillator (negated frequency).
    pub conjugate: bool,
    /// Initial oscillator frequency in Hz.
    pub frequency: f32,
    /// Initial oscillator phase in radians.
    pub phase: f32,
    /// Runtime retune mode.
    pub mode: TuneMode,
    /// Tag/message key selecting frequency updates.
    pub freq_key: String,
    /// Tag/message key selecting phase updates.
    pub phase_key: String,
    /// Block identity, recorded for diagnostics.
    pub name: String,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000.0,
            conjugate: false,
            frequency: 0.0,
            phase: 0.0,
            mode: TuneMode::Never,
            freq_key: "freq".into(),
            phase_key: "phase".into(),
            name: "mixer".into(),
        }
    }
}

/// Mutable runtime state, guarded as a unit by the block's lock.
#[derive(Debug)]
struct MixerState {
    /// Last frequency set, in Hz, before conjugate sign folding.
    frequency: f32,
    /// Last phase set, in radians.
    phase: f32,
    nco: Nco,
    /// Reused tag query buffer.
    scratch: Vec<Tag>,
}

/// Frequency mixer block.
///
/// Produces `output[n] = input[n] * e^(j·θ[n])`, advancing the oscillator
/// by exactly one step per sample regardless of mode. Setters and
/// `process` acquire the same exclusive lock for their full duration, so a
/// retune from another thread lands between calls, never inside one.
///
/// ## Modes
///
/// | Mode | Update path | Notes |
/// |------|-------------|-------|
/// | `Never` | `set_frequency` / `set_phase` | default |
/// | `Tags` | stream tags under `freq_key` / `phase_key` | sample-exact, tag consumed |
/// | `Messages` | [`MessageHandler`] key/value pairs | applies from the next call |
///
/// # Example
///
/// ```rust
/// use senal_blocks::{Mixer, MixerConfig};
/// use senal_core::{Complex32, MemoryTagStore, StreamIo, SyncBlock};
///
/// let mixer = Mixer::new(MixerConfig {
///     sample_rate: 48000.0,
///     frequency: -12000.0,
///     ..MixerConfig::default()
/// });
///
/// let input = [Complex32::new(0.5, 0.0); 16];
/// let mut output = [Complex32::default(); 16];
/// let mut store = MemoryTagStore::new();
/// let mut io = StreamIo::new(0, &mut store);
/// mixer.process(&mut io, &input, &mut output);
/// ```
#[derive(Debug)]
pub struct Mixer {
    sample_rate: f32,
    conjugate: bool,
    mode: TuneMode,
    freq_key: TagKey,
    phase_key: TagKey,
    name: TagKey,
    state: Mutex<MixerState>,
}

impl Mixer {
    /// Create a mixer. Construction cannot fail; key strings are interned
    /// once here.
    pub fn new(config: MixerConfig) -> Self {
        let mixer = Self {
            sample_rate: config.sample_rate,
            conjugate: config.conjugate,
            mode: config.mode,
            freq_key: TagKey::new(&config.freq_key),
            phase_key: TagKey::new(&config.phase_key),
            name: TagKey::new(&config.name),
            state: Mutex::new(MixerState {
                frequency: 0.0,
                phase: 0.0,
                nco: Nco::new(),
                scratch: Vec::new(),
            }),
        };
        mixer.set_frequency(config.frequency);
        mixer.set_phase(config.phase);
        mixer
    }

    // Processing can never fail, so a poisoned lock (a panicked setter on
    // another thread) degrades to using the last-written state.
    fn lock(&self) -> MutexGuard<'_, MixerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the oscillator frequency in Hz.
    pub fn set_frequency(&self, frequency: f32) {
        let mut st = self.lock();
        Self::update_frequency(self.conjugate, self.sample_rate, &mut st, frequency);
    }

    /// Last frequency set, in Hz (sign as given, before conjugate folding).
    pub fn frequency(&self) -> f32 {
        self.lock().frequency
    }

    /// Set the oscillator phase in radians.
    pub fn set_phase(&self, phase: f32) {
        let mut st = self.lock();
        Self::update_phase(&mut st, phase);
    }

    /// Last phase set, in radians.
    pub fn phase(&self) -> f32 {
        self.lock().phase
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Whether this mixer mixes with the conjugate oscillator.
    pub fn conjugate(&self) -> bool {
        self.conjugate
    }

    /// Runtime retune mode, fixed at construction.
    pub fn mode(&self) -> TuneMode {
        self.mode
    }

    /// Block identity.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    // The conjugate flag folds into the stored oscillator increment here,
    // once per update, rather than per mixed sample.
    fn update_frequency(conjugate: bool, sample_rate: f32, st: &mut MixerState, frequency: f32) {
        st.frequency = frequency;
        let effective = if conjugate { -frequency } else { frequency };
        st.nco.set_freq(TAU * effective / sample_rate);
    }

    fn update_phase(st: &mut MixerState, phase: f32) {
        st.phase = phase;
        st.nco.set_phase(phase);
    }

    fn mix(st: &mut MixerState, input: &[Complex32], output: &mut [Complex32]) {
        for (out, &sample) in output.iter_mut().zip(input) {
            *out = sample * st.nco.step();
        }
    }

    /// Apply one matching tag: numeric values retune and consume the tag;
    /// anything else is left in the stream untouched.
    fn apply_tag(&self, st: &mut MixerState, io: &mut StreamIo<'_>, tag: &Tag) {
        if tag.key == self.freq_key {
            match tag.value.as_real() {
                Some(freq) => {
                    Self::update_frequency(self.conjugate, self.sample_rate, st, freq as f32);
                    io.tags.remove_tag(0, tag);
                    tracing::debug!(
                        block = self.name.as_str(),
                        offset = tag.offset,
                        freq,
                        "retuned from stream tag"
                    );
                }
                None => tracing::trace!(
                    block = self.name.as_str(),
                    offset = tag.offset,
                    "ignoring non-numeric frequency tag"
                ),
            }
        } else if tag.key == self.phase_key {
            match tag.value.as_real() {
                Some(phase) => {
                    Self::update_phase(st, phase as f32);
                    io.tags.remove_tag(0, tag);
                    tracing::debug!(
                        block = self.name.as_str(),
                        offset = tag.offset,
                        phase,
                        "rephased from stream tag"
                    );
                }
                None => tracing::trace!(
                    block = self.name.as_str(),
                    offset = tag.offset,
                    "ignoring non-numeric phase tag"
                ),
            }
        }
    }
}

impl SyncBlock for Mixer {
    type Item = Complex32;

    fn process(
        &self,
        io: &mut StreamIo<'_>,
        input: &[Complex32],
        output: &mut [Complex32],
    ) -> usize {
        let n = output.len();
        debug_assert!(input.len() >= n);
        let mut st = self.lock();

        if self.mode == TuneMode::Tags {
            let mut pending = mem::take(&mut st.scratch);
            io.tags
                .tags_in_range(&mut pending, 0, io.offset, io.offset + n as u64, None);
            pending.retain(|t| t.key == self.freq_key || t.key == self.phase_key);

            // Mix up to each tag with the pre-tag parameters, then apply
            // the update so the sample at the tag offset gets the new value.
            let mut start = 0usize;
            for tag in &pending {
                let stop = (tag.offset - io.offset) as usize;
                Self::mix(&mut st, &input[start..stop], &mut output[start..stop]);
                self.apply_tag(&mut st, io, tag);
                start = stop;
            }
            Self::mix(&mut st, &input[start..n], &mut output[start..n]);

            pending.clear();
            st.scratch = pending;
        } else {
            Self::mix(&mut st, &input[..n], &mut output[..n]);
        }

        n
    }
}

impl MessageHandler for Mixer {
    fn handle_message(&self, msg: &Message) {
        if self.mode != TuneMode::Messages {
            return;
        }
        if msg.key == self.freq_key {
            if let Some(freq) = msg.value.as_real() {
                self.set_frequency(freq as f32);
                tracing::debug!(block = self.name.as_str(), freq, "retuned from message");
            }
        } else if msg.key == self.phase_key {
            if let Some(phase) = msg.value.as_real() {
                self.set_phase(phase as f32);
                tracing::debug!(block = self.name.as_str(), phase, "rephased from message");
            }
        }
    }
}
