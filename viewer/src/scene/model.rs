use gammacore::math::{Coordinate, Position, Rgb};
use gammacore::session::{SessionStats, SpectrumHandle};
use gammacore::telemetry::MetricsSnapshot;
use gammacore::Session;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// One coloured point of the scene.
#[derive(Debug, Clone, Serialize)]
pub struct ScenePoint {
    pub handle: SpectrumHandle,
    pub timestamp: String,
    pub coordinate: Coordinate,
    pub position: Position,
    pub doserate: f64,
    pub color: Rgb,
}

/// Render-ready view of one loaded session.
#[derive(Debug, Clone, Serialize)]
pub struct SceneModel {
    pub source: PathBuf,
    pub session: String,
    pub comment: String,
    pub doserate_engine: Option<String>,
    pub stats: SessionStats,
    pub metrics: MetricsSnapshot,
    pub points: Vec<ScenePoint>,
}

impl SceneModel {
    pub fn from_session(source: &Path, session: &Session) -> Self {
        let mapper = session.color_mapper();
        let points = session
            .spectra()
            .iter()
            .map(|spectrum| ScenePoint {
                handle: SpectrumHandle {
                    source: session.source().to_path_buf(),
                    index: spectrum.index(),
                },
                timestamp: spectrum.gps_time_start().to_rfc3339(),
                coordinate: *spectrum.coordinate(),
                position: *spectrum.position(),
                doserate: spectrum.doserate(),
                color: mapper.color_for(spectrum.doserate()),
            })
            .collect();

        Self {
            source: source.to_path_buf(),
            session: session.name().to_string(),
            comment: session.comment().to_string(),
            doserate_engine: session.doserate_engine().map(str::to_string),
            stats: *session.stats(),
            metrics: session.metrics().snapshot(),
            points,
        }
    }
}
