//! Session data pipeline for 3D visualization of gamma survey sessions.
//!
//! A session is a detector calibration plus an ordered set of geolocated
//! spectra. The modules load sessions from a session directory or a session
//! database, compute dose rates, aggregate session statistics and map every
//! spectrum to a projected position and a rainbow colour for the renderer.

pub mod dose;
pub mod math;
pub mod prelude;
pub mod records;
pub mod session;
pub mod telemetry;

pub use prelude::{GammaError, GammaResult, SessionConfig};
pub use session::{Session, SessionRegistry};
