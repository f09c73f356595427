use anyhow::Context;
use clap::ValueEnum;
use gammacore::math::geo::{Projection, SCENE_RADIUS, WGS84_RADIUS};
use gammacore::SessionConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Projection choices offered on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ProjectionArg {
    /// Sphere scaled to the scene radius
    Scene,
    /// Sphere with the earth's equatorial radius
    Sphere,
    /// WGS84-like ellipsoid
    Ellipsoid,
}

impl ProjectionArg {
    pub fn to_projection(self) -> Projection {
        match self {
            ProjectionArg::Scene => Projection::Simplified {
                radius: SCENE_RADIUS,
            },
            ProjectionArg::Sphere => Projection::Simplified {
                radius: WGS84_RADIUS,
            },
            ProjectionArg::Ellipsoid => Projection::Ellipsoidal,
        }
    }
}

/// Session settings given explicitly on the command line.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub projection: Option<ProjectionArg>,
    pub linear: bool,
    pub doserate_factor: Option<f64>,
    pub script: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Session directories or session database files.
    pub sessions: Vec<PathBuf>,
    #[serde(default)]
    pub session: SessionConfig,
    /// Scene export destination; stdout when absent.
    #[serde(default)]
    pub output: Option<PathBuf>,
}

impl ViewerConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading viewer config {}", path_ref.display()))?;
        let config: ViewerConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing viewer config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(sessions: Vec<PathBuf>, overrides: Overrides) -> Self {
        Self::default()
            .with_sessions(sessions)
            .with_overrides(overrides)
    }

    /// Applies the flags given on the command line over the loaded values.
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(projection) = overrides.projection {
            self.session.projection = projection.to_projection();
        }
        if overrides.linear {
            self.session.logarithmic_color = false;
        }
        if overrides.doserate_factor.is_some() {
            self.session.builtin_doserate_factor = overrides.doserate_factor;
        }
        if overrides.script.is_some() {
            self.session.doserate_script = overrides.script;
        }
        if overrides.output.is_some() {
            self.output = overrides.output;
        }
        self
    }

    /// Sessions named on the command line are appended to the configured ones.
    pub fn with_sessions(mut self, sessions: Vec<PathBuf>) -> Self {
        for session in sessions {
            if !self.sessions.contains(&session) {
                self.sessions.push(session);
            }
        }
        self
    }

    pub fn to_session_config(&self) -> SessionConfig {
        self.session.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_from_args_produces_session_config() {
        let cfg = ViewerConfig::from_args(
            vec![PathBuf::from("survey.db")],
            Overrides {
                projection: Some(ProjectionArg::Ellipsoid),
                linear: true,
                doserate_factor: Some(2.5),
                ..Overrides::default()
            },
        );
        let session = cfg.to_session_config();
        assert_eq!(session.projection, Projection::Ellipsoidal);
        assert!(!session.logarithmic_color);
        assert_eq!(session.builtin_doserate_factor, Some(2.5));
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"sessions:\n  - data/20170503_124017\nsession:\n  projection:\n    kind: simplified\n    radius: 6378137.0\n  doserate_script: nai.lua\noutput: scene.json\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = ViewerConfig::load(&path).unwrap();
        assert_eq!(cfg.sessions, vec![PathBuf::from("data/20170503_124017")]);
        assert_eq!(
            cfg.session.projection,
            Projection::Simplified {
                radius: WGS84_RADIUS
            }
        );
        assert!(cfg.session.logarithmic_color);
        assert_eq!(cfg.session.doserate_script, Some(PathBuf::from("nai.lua")));
        assert_eq!(cfg.output, Some(PathBuf::from("scene.json")));
    }

    #[test]
    fn command_line_flags_override_loaded_config() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"sessions:\n  - a\nsession:\n  projection:\n    kind: ellipsoidal\n  builtin_doserate_factor: 1.5\noutput: scene.json\n",
        )
        .unwrap();
        let path = temp.into_temp_path();

        let untouched = ViewerConfig::load(&path)
            .unwrap()
            .with_overrides(Overrides::default());
        assert_eq!(untouched.session.projection, Projection::Ellipsoidal);
        assert_eq!(untouched.session.builtin_doserate_factor, Some(1.5));

        let cfg = ViewerConfig::load(&path).unwrap().with_overrides(Overrides {
            projection: Some(ProjectionArg::Scene),
            linear: true,
            doserate_factor: Some(3.0),
            script: Some(PathBuf::from("nai.lua")),
            output: Some(PathBuf::from("other.json")),
        });
        assert_eq!(cfg.session.projection, Projection::default());
        assert!(!cfg.session.logarithmic_color);
        assert_eq!(cfg.session.builtin_doserate_factor, Some(3.0));
        assert_eq!(cfg.session.doserate_script, Some(PathBuf::from("nai.lua")));
        assert_eq!(cfg.output, Some(PathBuf::from("other.json")));
        assert_eq!(cfg.sessions, vec![PathBuf::from("a")]);
    }

    #[test]
    fn command_line_sessions_are_appended_once() {
        let cfg = ViewerConfig {
            sessions: vec![PathBuf::from("a")],
            ..ViewerConfig::default()
        }
        .with_sessions(vec![PathBuf::from("a"), PathBuf::from("b")]);
        assert_eq!(cfg.sessions, vec![PathBuf::from("a"), PathBuf::from("b")]);
    }
}
