//! Utility modules for signal processing
//!
//! Low-level helpers used by the spectral measurements.

pub mod fft;

pub use fft::Fft;
