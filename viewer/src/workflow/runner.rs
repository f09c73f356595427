use crate::scene::model::SceneModel;
use crate::workflow::config::ViewerConfig;
use anyhow::Context;
use gammacore::SessionRegistry;
use log::info;
use std::path::Path;

/// Distance and bearing between two spectra of one session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub distance: f64,
    pub azimuth: f64,
}

pub struct Runner {
    config: ViewerConfig,
    registry: SessionRegistry,
}

impl Runner {
    pub fn new(config: ViewerConfig) -> Self {
        let registry = SessionRegistry::new(config.to_session_config());
        Self { config, registry }
    }

    /// Loads every configured session and builds one scene per session.
    pub fn execute(&mut self) -> anyhow::Result<Vec<SceneModel>> {
        let mut scenes = Vec::with_capacity(self.config.sessions.len());
        for path in &self.config.sessions {
            let session = self
                .registry
                .open(path)
                .with_context(|| format!("loading session {}", path.display()))?;
            info!(
                "session {} ready with {} spectra",
                session.name(),
                session.spectrum_count()
            );
            scenes.push(SceneModel::from_session(path, session));
        }
        Ok(scenes)
    }

    /// Measures from the selected spectrum to the marked one.
    pub fn measure(&self, session: &Path, selected: usize, marked: usize) -> anyhow::Result<Measurement> {
        let loaded = self
            .registry
            .get(session)
            .with_context(|| format!("session {} is not loaded", session.display()))?;
        let (distance, azimuth) = loaded
            .distance_between(selected, marked)
            .with_context(|| format!("measuring {} -> {}", selected, marked))?;
        Ok(Measurement { distance, azimuth })
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::config::{Overrides, ProjectionArg};
    use rusqlite::{params, Connection};
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn session_database(dir: &Path) -> PathBuf {
        let path = dir.join("survey.db");
        let connection = Connection::open(&path).unwrap();
        connection
            .execute_batch(
                "CREATE TABLE session (name TEXT, comment TEXT, livetime INTEGER, detector_data TEXT);
                 CREATE TABLE spectrum (
                     session_name TEXT, session_index INTEGER, start_time TEXT,
                     latitude REAL, longitude REAL, altitude REAL,
                     livetime INTEGER, realtime INTEGER, num_channels INTEGER, channels TEXT
                 );",
            )
            .unwrap();
        let detector = r#"{"TypeName":"Osprey","CurrentHV":775,"CurrentNumChannels":2,
            "Serialnumber":"1","CurrentCoarseGain":1.0,"CurrentFineGain":1.0,
            "CurrentLivetime":1000000,"CurrentLLD":0,"CurrentULD":1,
            "EnergyCurveCoefficients":[1.0,1.0]}"#;
        connection
            .execute(
                "INSERT INTO session VALUES ('survey', '', 0, ?1)",
                params![detector],
            )
            .unwrap();
        for (index, counts) in ["1 1", "4 4"].iter().enumerate() {
            connection
                .execute(
                    "INSERT INTO spectrum VALUES ('survey', ?1, '2017-05-03T12:41:03Z', \
                     ?2, 10.7, 80.0, 1000000, 1000000, 2, ?3)",
                    params![index as i64, 59.9 + index as f64 * 0.001, counts],
                )
                .unwrap();
        }
        path
    }

    #[test]
    fn runner_builds_coloured_scenes() {
        let dir = TempDir::new().unwrap();
        let path = session_database(dir.path());
        let cfg = ViewerConfig::from_args(
            vec![path.clone()],
            Overrides {
                projection: Some(ProjectionArg::Scene),
                linear: true,
                doserate_factor: Some(1.0),
                ..Overrides::default()
            },
        );
        let mut runner = Runner::new(cfg);
        let scenes = runner.execute().unwrap();

        assert_eq!(scenes.len(), 1);
        let scene = &scenes[0];
        assert_eq!(scene.session, "survey");
        assert_eq!(scene.doserate_engine.as_deref(), Some("builtin"));
        // counts * (1 + channel) summed over both channels
        assert_eq!(scene.points[0].doserate, 3.0);
        assert_eq!(scene.points[1].doserate, 12.0);
        assert_eq!(scene.points[0].color, gammacore::math::Rgb::BLUE);
        assert_eq!(scene.points[1].color, gammacore::math::Rgb::RED);
        assert_eq!(runner.registry().len(), 1);

        let measurement = runner.measure(&path, 0, 1).unwrap();
        assert!((measurement.distance - 111.2).abs() < 0.5);
        assert!(measurement.azimuth < 1e-6 || measurement.azimuth > 360.0 - 1e-6);
        assert!(runner.measure(&path, 0, 5).is_err());
    }

    #[test]
    fn missing_session_reports_its_path() {
        let dir = TempDir::new().unwrap();
        let cfg = ViewerConfig::from_args(vec![dir.path().to_path_buf()], Overrides::default());
        let err = Runner::new(cfg).execute().unwrap_err();
        assert!(format!("{:#}", err).contains("loading session"));
    }
}
