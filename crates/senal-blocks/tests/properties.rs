//! Property-based tests for senal-blocks.
//!
//! Uses proptest to verify the block invariants that must hold for any
//! parameter choice: magnitude preservation and sample-exact retuning for
//! the mixer, watermark spacing for the peak tagger, and payload identity
//! plus exact fan-out for the tag inserter.

use num_complex::Complex32;
use proptest::prelude::*;
use senal_blocks::{
    Mixer, MixerConfig, PeakTagger, PeakTaggerConfig, TagInserter, TagInserterConfig, TuneMode,
};
use senal_core::{MemoryTagStore, Nco, StreamIo, SyncBlock, Tag, TagKey, TagStore, TagValue};

const TAU: f32 = core::f32::consts::TAU;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// The oscillator has unit magnitude, so mixing preserves each
    /// sample's magnitude regardless of frequency, phase, or conjugation.
    #[test]
    fn mixer_preserves_magnitude(
        freq in -20000.0f32..20000.0,
        phase in -3.0f32..3.0,
        conjugate in any::<bool>(),
        re in prop::array::uniform32(-1.0f32..=1.0f32),
        im in prop::array::uniform32(-1.0f32..=1.0f32),
    ) {
        let mixer = Mixer::new(MixerConfig {
            frequency: freq,
            phase,
            conjugate,
            ..MixerConfig::default()
        });
        let input: Vec<Complex32> =
            re.iter().zip(&im).map(|(&r, &i)| Complex32::new(r, i)).collect();
        let mut output = vec![Complex32::default(); input.len()];
        let mut store = MemoryTagStore::new();
        mixer.process(&mut StreamIo::new(0, &mut store), &input, &mut output);

        for (x, y) in input.iter().zip(&output) {
            prop_assert!((x.norm() - y.norm()).abs() < 1e-4);
        }
    }

    /// A frequency tag at offset p splits the call exactly there: the
    /// last pre-tag sample follows the old frequency, the sample at p the
    /// new one, with oscillator phase continuous across the boundary.
    #[test]
    fn mixer_tag_split_is_exact(
        f0 in -200.0f32..200.0,
        f1 in -200.0f32..200.0,
        p in 1u64..63,
    ) {
        let sample_rate = 1000.0;
        let mixer = Mixer::new(MixerConfig {
            sample_rate,
            frequency: f0,
            mode: TuneMode::Tags,
            ..MixerConfig::default()
        });
        let mut store = MemoryTagStore::new();
        store.add_tag(0, Tag::new(p, "freq", TagValue::Real(f64::from(f1))));

        let input = vec![Complex32::new(1.0, 0.0); 64];
        let mut output = vec![Complex32::default(); 64];
        mixer.process(&mut StreamIo::new(0, &mut store), &input, &mut output);
        prop_assert!(store.is_empty(0));

        let mut reference = Nco::new();
        reference.set_freq(TAU * f0 / sample_rate);
        for &got in &output[..p as usize] {
            prop_assert!((got - reference.step()).norm() < 1e-3);
        }
        reference.set_freq(TAU * f1 / sample_rate);
        for &got in &output[p as usize..] {
            prop_assert!((got - reference.step()).norm() < 1e-3);
        }
    }

    /// Emitted tag offsets always honor the blanking watermark: two
    /// consecutive tags are spaced more than post_tag_blank apart.
    #[test]
    fn tagger_watermark_spacing(
        threshold in 0.1f32..0.9,
        look_ahead in 0usize..8,
        post_tag_blank in 0u64..32,
        signal in prop::collection::vec(0.0f32..=1.0f32, 128..256),
    ) {
        let tagger = PeakTagger::new(PeakTaggerConfig {
            threshold,
            look_ahead,
            post_tag_blank,
            ..PeakTaggerConfig::default()
        });
        let mut store = MemoryTagStore::new();
        let n = signal.len() - look_ahead;
        let mut output = vec![0.0f32; n];
        tagger.process(&mut StreamIo::new(0, &mut store), &signal, &mut output);

        prop_assert_eq!(&output, &signal[..n]);

        let mut tags = Vec::new();
        store.tags_in_range(&mut tags, 0, 0, u64::MAX, None);
        for pair in tags.windows(2) {
            prop_assert!(pair[1].offset >= pair[0].offset + post_tag_blank + 1);
        }
        // Every tag's value is the max over its lookahead window, so it
        // must exceed the threshold.
        for tag in &tags {
            prop_assert!(tag.value.as_real().unwrap() > f64::from(threshold));
        }
    }

    /// One trigger produces exactly values.len() tags at the configured
    /// offsets, and the payload is untouched.
    #[test]
    fn inserter_fan_out_is_exact(
        trigger_offset in 0u64..32,
        pattern in prop::collection::vec((-10.0f32..10.0, 0i64..16), 1..6),
        payload in prop::collection::vec(-1.0f32..=1.0f32, 32..64),
    ) {
        let (values, delays): (Vec<f32>, Vec<i64>) = pattern.iter().copied().unzip();
        let inserter: TagInserter<f32> = TagInserter::new(TagInserterConfig {
            values: values.clone(),
            delays: delays.clone(),
            ..TagInserterConfig::default()
        }).unwrap();

        let mut store = MemoryTagStore::new();
        store.add_tag(0, Tag::new(trigger_offset, "trig", TagValue::Real(1.0)));

        let mut output = vec![0.0f32; payload.len()];
        let produced =
            inserter.process(&mut StreamIo::new(0, &mut store), &payload, &mut output);
        prop_assert_eq!(produced, payload.len());
        prop_assert_eq!(&output, &payload);

        let mut tags = Vec::new();
        store.tags_in_range(&mut tags, 0, 0, u64::MAX, Some(&TagKey::new("tag")));

        // Fan-out emits in pattern order and the store sorts stably by
        // offset, so the full (offset, value) sequence is predictable.
        let mut expected: Vec<(u64, f64)> = values
            .iter()
            .zip(&delays)
            .map(|(&v, &d)| (trigger_offset + d as u64, f64::from(v)))
            .collect();
        expected.sort_by_key(|&(offset, _)| offset);
        let got: Vec<(u64, f64)> = tags
            .iter()
            .map(|t| (t.offset, t.value.as_real().unwrap()))
            .collect();
        prop_assert_eq!(got, expected);
    }

    /// Mismatched parallel arrays or a negative delay never construct.
    #[test]
    fn inserter_validation(
        values_len in 0usize..6,
        delays_len in 0usize..6,
        bad_delay in -16i64..0,
    ) {
        let config = TagInserterConfig {
            values: vec![1.0; values_len],
            delays: vec![0; delays_len],
            ..TagInserterConfig::default()
        };
        let result = TagInserter::<f32>::new(config);
        prop_assert_eq!(result.is_ok(), values_len == delays_len);

        if values_len > 0 {
            let mut delays = vec![0i64; values_len];
            delays[values_len - 1] = bad_delay;
            let config = TagInserterConfig {
                values: vec![1.0; values_len],
                delays,
                ..TagInserterConfig::default()
            };
            prop_assert!(TagInserter::<f32>::new(config).is_err());
        }
    }
}
