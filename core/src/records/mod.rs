//! Measurement records: detector calibration and per-spectrum data.

pub mod detector;
pub mod fields;
pub mod spectrum;

pub use detector::{Detector, DetectorExtension, DetectorSchema};
pub use spectrum::{Spectrum, SpectrumRecord};
