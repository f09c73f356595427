//! Dose-rate engines a session can bind.

pub mod builtin;
pub mod script;

pub use builtin::BuiltinDoserate;
pub use script::ScriptDoserate;

use crate::prelude::GammaResult;
use crate::records::{Detector, Spectrum};

/// Computes an absolute dose rate for one spectrum.
pub trait DoserateComputer {
    fn name(&self) -> &str;
    fn compute(&self, detector: &Detector, spectrum: &Spectrum) -> GammaResult<f64>;
}
