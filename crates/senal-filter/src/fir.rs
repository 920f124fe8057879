//! Dot-product FIR kernel with reversed tap storage.
//!
//! Taps are stored reversed relative to the user-supplied order, so the
//! convolution sum at output `k` is a plain forward dot product:
//!
//! ```text
//! y[k] = Σ_{i=0}^{ntaps-1} x[k + i] · h[ntaps - 1 - i]
//! ```
//!
//! The caller positions the input window so index 0 aligns with the oldest
//! sample needed for the requested output, i.e. supplies `ntaps() - 1`
//! extra leading samples before the first output position. Out-of-range
//! reads are the caller's responsibility; the kernel itself has no error
//! states beyond construction.

use alloc::vec::Vec;
use core::marker::PhantomData;
use core::ops::{Add, Mul};

use num_complex::Complex32;
use num_traits::Zero;

/// Generic FIR convolution kernel.
///
/// `S` is the sample element type, `T` the tap element type; the three
/// supported pairings are named by the [`RealFir`], [`ComplexRealFir`],
/// and [`ComplexFir`] aliases. All variants share the exact same contract
/// with the element types substituted.
#[derive(Debug, Clone)]
pub struct FirKernel<S, T = S> {
    /// Taps in reversed order relative to the user-supplied coefficients.
    taps: Vec<T>,
    _sample: PhantomData<fn() -> S>,
}

/// Real samples, real taps.
pub type RealFir = FirKernel<f32, f32>;

/// Complex samples, real taps.
pub type ComplexRealFir = FirKernel<Complex32, f32>;

/// Complex samples, complex taps.
pub type ComplexFir = FirKernel<Complex32, Complex32>;

impl<S, T> FirKernel<S, T>
where
    S: Copy + Zero + Mul<T, Output = S> + Add<S, Output = S>,
    T: Copy,
{
    /// Create a kernel from taps in user order.
    pub fn new(taps: &[T]) -> Self {
        let mut kernel = Self {
            taps: Vec::new(),
            _sample: PhantomData,
        };
        kernel.set_taps(taps);
        kernel
    }

    /// Replace the active tap set, recomputing the reversed storage.
    pub fn set_taps(&mut self, taps: &[T]) {
        self.taps.clear();
        self.taps.extend(taps.iter().rev().copied());
    }

    /// The taps in the order they were supplied.
    pub fn taps(&self) -> Vec<T> {
        self.taps.iter().rev().copied().collect()
    }

    /// Number of taps.
    #[inline]
    pub fn ntaps(&self) -> usize {
        self.taps.len()
    }

    /// Compute one output sample from an input window.
    ///
    /// `input[0]` must be the oldest sample contributing to this output;
    /// the window must hold at least [`ntaps`](Self::ntaps) samples.
    #[inline]
    pub fn filter(&self, input: &[S]) -> S {
        debug_assert!(input.len() >= self.taps.len());
        let mut acc = S::zero();
        for (&x, &tap) in input.iter().zip(self.taps.iter()) {
            acc = acc + x * tap;
        }
        acc
    }

    /// Compute `n` consecutive outputs, sliding the window one sample at
    /// a time.
    ///
    /// `input` must hold at least `n + ntaps() - 1` samples.
    pub fn filter_block(&self, output: &mut [S], input: &[S], n: usize) {
        debug_assert!(output.len() >= n);
        debug_assert!(input.len() + 1 >= n + self.taps.len());
        for (k, out) in output.iter_mut().take(n).enumerate() {
            *out = self.filter(&input[k..]);
        }
    }

    /// Compute `n` outputs spaced `decimation` input samples apart.
    ///
    /// `input` must hold at least `(n - 1) * decimation + ntaps()` samples.
    pub fn filter_decimated(
        &self,
        output: &mut [S],
        input: &[S],
        n: usize,
        decimation: usize,
    ) {
        debug_assert!(output.len() >= n);
        let mut j = 0;
        for out in output.iter_mut().take(n) {
            *out = self.filter(&input[j..]);
            j += decimation;
        }
    }
}
