//! Numerically controlled oscillator for frequency shifting.
//!
//! Generates a complex exponential `e^(j·θ[n])` by phase accumulation:
//! each generated sample advances the phase by a fixed increment derived
//! from the target frequency. The phase is wrapped into `[-π, π)` on every
//! step, so the oscillator stays numerically stable across unbounded call
//! counts — the accumulator never grows large enough to lose precision.

use core::f32::consts::{PI, TAU};

use libm::{cosf, floorf, sinf};
use num_complex::Complex32;

/// Wrap a phase value into `[-π, π)`.
#[inline]
fn wrap_phase(phase: f32) -> f32 {
    let mut wrapped = phase - TAU * floorf((phase + PI) / TAU);
    // floorf rounding can land a few ulp outside the range
    if wrapped >= PI {
        wrapped -= TAU;
    } else if wrapped < -PI {
        wrapped += TAU;
    }
    wrapped
}

/// Complex phase-accumulator oscillator.
///
/// Frequency is expressed in radians per sample (`2π·f/fs`); the caller
/// owns the conversion from Hz. Each generated sample is
/// `cos(θ) + j·sin(θ)` at the *current* phase, after which the phase
/// advances by the increment.
///
/// # Example
///
/// ```rust
/// use senal_core::Nco;
///
/// let mut nco = Nco::new();
/// nco.set_freq(core::f32::consts::TAU * 1000.0 / 48000.0);
///
/// let first = nco.step();
/// // Phase starts at zero: first sample is 1 + 0j
/// assert!((first.re - 1.0).abs() < 1e-6);
/// assert!(first.im.abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Nco {
    /// Current phase in radians, wrapped to `[-π, π)`.
    phase: f32,
    /// Phase increment per sample in radians.
    phase_inc: f32,
}

impl Nco {
    /// Create an oscillator at zero frequency and zero phase.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the frequency in radians per sample.
    pub fn set_freq(&mut self, rad_per_sample: f32) {
        self.phase_inc = rad_per_sample;
    }

    /// Current frequency in radians per sample.
    pub fn freq(&self) -> f32 {
        self.phase_inc
    }

    /// Set the phase in radians (wrapped into `[-π, π)`).
    pub fn set_phase(&mut self, rad: f32) {
        self.phase = wrap_phase(rad);
    }

    /// Current phase in radians.
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Generate one oscillator sample and advance the phase.
    #[inline]
    pub fn step(&mut self) -> Complex32 {
        let sample = Complex32::new(cosf(self.phase), sinf(self.phase));
        self.phase = wrap_phase(self.phase + self.phase_inc);
        sample
    }

    /// Fill `out` with consecutive oscillator samples, advancing the phase
    /// by exactly `out.len()` steps.
    pub fn sincos(&mut self, out: &mut [Complex32]) {
        for sample in out.iter_mut() {
            *sample = self.step();
        }
    }
}
