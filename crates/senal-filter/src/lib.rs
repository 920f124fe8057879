//! Senal Filter - FIR convolution kernels
//!
//! This crate provides the dot-product convolution engine used by
//! decimating and interpolating filters: a tap set stored in reversed
//! order so that convolution reduces to a straight dot product against a
//! sliding, naturally-ordered input window.
//!
//! # Kernels
//!
//! - [`FirKernel`] - Generic kernel over sample and tap element types
//! - [`RealFir`] - `f32` samples, `f32` taps
//! - [`ComplexRealFir`] - complex samples, `f32` taps
//! - [`ComplexFir`] - complex samples, complex taps
//!
//! # Example
//!
//! ```rust
//! use senal_filter::RealFir;
//!
//! // Moving-average taps
//! let fir = RealFir::new(&[0.25, 0.25, 0.25, 0.25]);
//! let input = [1.0, 1.0, 1.0, 1.0, 5.0];
//! let mut output = [0.0f32; 2];
//! fir.filter_block(&mut output, &input, 2);
//! assert_eq!(output[0], 1.0);
//! assert_eq!(output[1], 2.0);
//! ```
//!
//! # Design Principles
//!
//! - **Pure numeric**: no tags, no blocking, no internal state beyond the
//!   tap set — windowing and history management belong to the caller
//! - **Scalar contract**: SIMD acceleration is an implementation detail of
//!   the dot product, never part of the interface; the scalar loop here is
//!   a conforming implementation

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod fir;

pub use fir::{ComplexFir, ComplexRealFir, FirKernel, RealFir};
