//! Threshold-triggered peak tagger with lookahead and blanking.
//!
//! Scans a real stream for samples crossing a threshold. On a crossing, it
//! searches a lookahead window for the true local maximum, emits exactly
//! one tag at the maximum's offset (plus a configurable signed placement
//! offset), then blanks further detections until a post-tag interval has
//! passed. The sample payload passes through unmodified; only tags are
//! added.
//!
//! ## Retroactive tagging
//!
//! A negative placement offset attaches the tag *before* the detected
//! peak. A sample cannot be tagged after it has been released downstream,
//! so the block asks the scheduler for extra buffered input and starts its
//! scan past that padding: every tag it emits still lands inside or after
//! the current output window. The forecast is
//! `start_pad + n + look_ahead` input samples for `n` outputs, with
//! `start_pad = max(0, -tag_offset)`.
//!
//! Samples in the lookahead tail are read but not consumed this call; they
//! come around again, shifted, in the next call.

use std::sync::{Mutex, MutexGuard, PoisonError};

use senal_core::{StreamIo, SyncBlock, Tag, TagKey, TagValue};

/// Construction parameters for [`PeakTagger`].
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PeakTaggerConfig {
    /// Detection threshold; a sample strictly above this arms a search.
    pub threshold: f32,
    /// Samples past a crossing to search for the true maximum.
    pub look_ahead: usize,
    /// Signed placement offset of the emitted tag relative to the maximum.
    pub tag_offset: i64,
    /// Samples after an emitted tag during which detection is suppressed.
    pub post_tag_blank: u64,
    /// Key of the emitted tags.
    pub tag_key: String,
    /// Block identity, recorded as the tag producer.
    pub name: String,
}

impl Default for PeakTaggerConfig {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            look_ahead: 0,
            tag_offset: 0,
            post_tag_blank: 0,
            tag_key: "peak".into(),
            name: "peak_tagger".into(),
        }
    }
}

/// Mutable runtime state, guarded as a unit by the block's lock.
///
/// `start_pad` is derived from `tag_offset` and must change with it
/// atomically — the forecast and the scan both read the pair.
#[derive(Debug)]
struct PeakState {
    threshold: f32,
    look_ahead: usize,
    tag_offset: i64,
    post_tag_blank: u64,
    /// Scan start index into the input buffer: `max(0, -tag_offset)`.
    start_pad: usize,
    /// Earliest absolute offset eligible for a new detection.
    blank_until: u64,
}

/// Threshold-crossing peak tagger block.
///
/// ## Parameters
///
/// | Parameter | Meaning | Default |
/// |-----------|---------|---------|
/// | Threshold | detection level (strictly above) | 0.0 |
/// | Look-ahead | max-search window after a crossing | 0 |
/// | Tag offset | signed tag placement relative to the max | 0 |
/// | Post-tag blank | detection holdoff after each tag | 0 |
///
/// All four are mutable between calls from any thread; each setter and
/// each processing call holds the block's single lock for its duration.
///
/// # Example
///
/// ```rust
/// use senal_blocks::{PeakTagger, PeakTaggerConfig};
/// use senal_core::{MemoryTagStore, StreamIo, SyncBlock};
///
/// let tagger = PeakTagger::new(PeakTaggerConfig {
///     threshold: 0.5,
///     look_ahead: 2,
///     ..PeakTaggerConfig::default()
/// });
///
/// let input = [0.0, 0.0, 0.9, 1.0, 0.1, 0.0, 0.0, 0.0];
/// let mut output = [0.0f32; 6];
/// let mut store = MemoryTagStore::new();
/// let mut io = StreamIo::new(0, &mut store);
/// tagger.process(&mut io, &input, &mut output);
/// assert_eq!(store.len(0), 1);
/// ```
#[derive(Debug)]
pub struct PeakTagger {
    tag_key: TagKey,
    name: TagKey,
    state: Mutex<PeakState>,
}

impl PeakTagger {
    /// Create a peak tagger. Construction cannot fail.
    pub fn new(config: PeakTaggerConfig) -> Self {
        Self {
            tag_key: TagKey::new(&config.tag_key),
            name: TagKey::new(&config.name),
            state: Mutex::new(PeakState {
                threshold: config.threshold,
                look_ahead: config.look_ahead,
                tag_offset: config.tag_offset,
                post_tag_blank: config.post_tag_blank,
                start_pad: Self::start_pad_for(config.tag_offset),
                blank_until: 0,
            }),
        }
    }

    fn start_pad_for(tag_offset: i64) -> usize {
        tag_offset
            .checked_neg()
            .and_then(|pad| usize::try_from(pad).ok())
            .unwrap_or(0)
    }

    // Processing can never fail, so a poisoned lock degrades to using the
    // last-written state.
    fn lock(&self) -> MutexGuard<'_, PeakState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the detection threshold.
    pub fn set_threshold(&self, threshold: f32) {
        self.lock().threshold = threshold;
    }

    /// Current detection threshold.
    pub fn threshold(&self) -> f32 {
        self.lock().threshold
    }

    /// Set the lookahead window length in samples.
    pub fn set_look_ahead(&self, look_ahead: usize) {
        self.lock().look_ahead = look_ahead;
    }

    /// Current lookahead window length.
    pub fn look_ahead(&self) -> usize {
        self.lock().look_ahead
    }

    /// Set the signed tag placement offset.
    ///
    /// The derived scan padding changes in the same critical section, so
    /// the next call's forecast sees both together.
    pub fn set_tag_offset(&self, tag_offset: i64) {
        let mut st = self.lock();
        st.tag_offset = tag_offset;
        st.start_pad = Self::start_pad_for(tag_offset);
    }

    /// Current signed tag placement offset.
    pub fn tag_offset(&self) -> i64 {
        self.lock().tag_offset
    }

    /// Set the post-tag blanking length in samples.
    pub fn set_post_tag_blank(&self, post_tag_blank: u64) {
        self.lock().post_tag_blank = post_tag_blank;
    }

    /// Current post-tag blanking length.
    pub fn post_tag_blank(&self) -> u64 {
        self.lock().post_tag_blank
    }

    /// Block identity.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }
}

impl SyncBlock for PeakTagger {
    type Item = f32;

    fn process(&self, io: &mut StreamIo<'_>, input: &[f32], output: &mut [f32]) -> usize {
        let n = output.len();
        let mut st = self.lock();
        debug_assert!(input.len() >= st.start_pad + n + st.look_ahead);

        for i in st.start_pad..st.start_pad + n {
            let candidate_offset = io.offset + i as u64;
            if candidate_offset >= st.blank_until && input[i] > st.threshold {
                // Crossing found: take the max over the closed lookahead
                // window [i, i + look_ahead], earliest index on ties.
                let mut max_idx = 0usize;
                let mut max = input[i];
                for (k, &v) in input[i..=i + st.look_ahead].iter().enumerate() {
                    if v > max {
                        max = v;
                        max_idx = k;
                    }
                }
                let max_offset = candidate_offset + max_idx as u64;
                let tag_pos = max_offset.saturating_add_signed(st.tag_offset);

                io.tags.add_tag(
                    0,
                    Tag::with_producer(
                        tag_pos,
                        self.tag_key.clone(),
                        TagValue::Real(f64::from(max)),
                        self.name.clone(),
                    ),
                );
                st.blank_until = tag_pos + st.post_tag_blank + 1;
                tracing::debug!(
                    block = self.name.as_str(),
                    offset = tag_pos,
                    max,
                    blank_until = st.blank_until,
                    "tagged peak"
                );
            }
        }

        output.copy_from_slice(&input[..n]);
        n
    }

    fn required_input(&self, noutput: usize) -> usize {
        let st = self.lock();
        st.start_pad + noutput + st.look_ahead
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use senal_core::{MemoryTagStore, TagStore};

    fn run(tagger: &PeakTagger, store: &mut MemoryTagStore, offset: u64, input: &[f32]) -> Vec<f32> {
        let n = input.len() - tagger.required_input(0);
        let mut output = vec![0.0f32; n];
        let mut io = StreamIo::new(offset, store);
        assert_eq!(tagger.process(&mut io, input, &mut output), n);
        output
    }

    fn collect(store: &MemoryTagStore) -> Vec<Tag> {
        let mut out = Vec::new();
        store.tags_in_range(&mut out, 0, 0, u64::MAX, None);
        out
    }

    #[test]
    fn forecast_counts_padding_and_lookahead() {
        let tagger = PeakTagger::new(PeakTaggerConfig {
            look_ahead: 8,
            tag_offset: -3,
            ..PeakTaggerConfig::default()
        });
        assert_eq!(tagger.required_input(100), 3 + 100 + 8);

        tagger.set_tag_offset(5);
        assert_eq!(tagger.required_input(100), 108);
    }

    #[test]
    fn step_input_yields_exactly_one_tag() {
        let tagger = PeakTagger::new(PeakTaggerConfig {
            threshold: 0.5,
            post_tag_blank: 100,
            ..PeakTaggerConfig::default()
        });
        let mut store = MemoryTagStore::new();
        let mut input = vec![0.0f32; 32];
        for s in input.iter_mut().skip(10) {
            *s = 1.0;
        }
        let output = run(&tagger, &mut store, 0, &input);
        assert_eq!(output, input);

        let tags = collect(&store);
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].offset, 10);
        assert_eq!(tags[0].value.as_real(), Some(1.0));
        assert_eq!(tags[0].producer.as_ref().unwrap().as_str(), "peak_tagger");
    }

    #[test]
    fn lookahead_selects_the_larger_value() {
        let tagger = PeakTagger::new(PeakTaggerConfig {
            threshold: 0.5,
            look_ahead: 4,
            post_tag_blank: 50,
            ..PeakTaggerConfig::default()
        });
        let mut store = MemoryTagStore::new();
        // Crossing at 3, true peak at 5
        let mut input = vec![0.0f32; 24];
        input[3] = 0.6;
        input[4] = 0.8;
        input[5] = 0.9;
        input[6] = 0.7;
        let n = 20;
        let mut output = vec![0.0f32; n];
        tagger.process(&mut StreamIo::new(0, &mut store), &input, &mut output);

        let tags = collect(&store);
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].offset, 5);
        assert!((tags[0].value.as_real().unwrap() - f64::from(0.9f32)).abs() < 1e-12);
    }

    #[test]
    fn blanking_suppresses_recrossings() {
        let tagger = PeakTagger::new(PeakTaggerConfig {
            threshold: 0.5,
            post_tag_blank: 6,
            ..PeakTaggerConfig::default()
        });
        let mut store = MemoryTagStore::new();
        // Pulses at 2 and 6 (inside blank), then 12 (past it)
        let mut input = vec![0.0f32; 20];
        input[2] = 1.0;
        input[6] = 1.0;
        input[12] = 1.0;
        let n = 20;
        let mut output = vec![0.0f32; n];
        tagger.process(&mut StreamIo::new(0, &mut store), &input, &mut output);

        // blank_until after the first tag is 2 + 6 + 1 = 9
        let tags = collect(&store);
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].offset, 2);
        assert_eq!(tags[1].offset, 12);
    }

    #[test]
    fn negative_offset_tags_before_the_peak() {
        let tagger = PeakTagger::new(PeakTaggerConfig {
            threshold: 0.5,
            tag_offset: -2,
            post_tag_blank: 50,
            ..PeakTaggerConfig::default()
        });
        let mut store = MemoryTagStore::new();
        // start_pad = 2: scan begins at input[2]
        let mut input = vec![0.0f32; 18];
        input[5] = 1.0;
        let n = 16;
        let mut output = vec![0.0f32; n];
        tagger.process(&mut StreamIo::new(0, &mut store), &input, &mut output);

        let tags = collect(&store);
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].offset, 3);
    }

    #[test]
    fn watermark_carries_across_calls() {
        let tagger = PeakTagger::new(PeakTaggerConfig {
            threshold: 0.5,
            post_tag_blank: 10,
            ..PeakTaggerConfig::default()
        });
        let mut store = MemoryTagStore::new();

        let mut first = vec![0.0f32; 8];
        first[7] = 1.0;
        let mut output = vec![0.0f32; 8];
        tagger.process(&mut StreamIo::new(0, &mut store), &first, &mut output);

        // blank_until = 7 + 10 + 1 = 18; a crossing at absolute 12 is
        // suppressed, one at 20 is not.
        let mut second = vec![0.0f32; 16];
        second[4] = 1.0; // absolute 12
        second[12] = 1.0; // absolute 20
        let mut output = vec![0.0f32; 16];
        tagger.process(&mut StreamIo::new(8, &mut store), &second, &mut output);

        let tags = collect(&store);
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].offset, 7);
        assert_eq!(tags[1].offset, 20);
    }

    #[test]
    fn equal_to_threshold_does_not_trigger() {
        let tagger = PeakTagger::new(PeakTaggerConfig {
            threshold: 1.0,
            ..PeakTaggerConfig::default()
        });
        let mut store = MemoryTagStore::new();
        let input = vec![1.0f32; 8];
        let mut output = vec![0.0f32; 8];
        tagger.process(&mut StreamIo::new(0, &mut store), &input, &mut output);
        assert!(store.is_empty(0));
    }
}
