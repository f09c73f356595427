use crate::math::geo::Projection;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Shared configuration applied to every session that gets loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub projection: Projection,
    pub logarithmic_color: bool,
    /// Binds the built-in dose-rate formula with this calibration factor.
    pub builtin_doserate_factor: Option<f64>,
    /// Binds a Lua dose-rate script. Takes precedence over the built-in formula.
    pub doserate_script: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            projection: Projection::default(),
            logarithmic_color: true,
            builtin_doserate_factor: None,
            doserate_script: None,
        }
    }
}

/// Common error type for loading and querying sessions.
#[derive(thiserror::Error, Debug)]
pub enum GammaError {
    #[error("missing field: {0}")]
    MissingField(String),
    #[error("invalid field {field}: {reason}")]
    InvalidField { field: String, reason: String },
    #[error("invalid spectrum file {}: {reason}", .path.display())]
    InvalidSpectrumFile { path: PathBuf, reason: String },
    #[error("invalid spectrum row {row}: {reason}")]
    InvalidSpectrumRow { row: usize, reason: String },
    #[error("invalid session file {}: {reason}", .path.display())]
    InvalidSessionFile { path: PathBuf, reason: String },
    #[error("directory does not exist: {}", .0.display())]
    DirectoryNotFound(PathBuf),
    #[error("unable to open database {}: {reason}", .path.display())]
    DatabaseOpen { path: PathBuf, reason: String },
    #[error("database query failed: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("loading doserate script failed {}: {reason}", .path.display())]
    ScriptLoad { path: PathBuf, reason: String },
    #[error("doserate script failed for spectrum {index}: {reason}")]
    ScriptEvaluation { index: usize, reason: String },
    #[error("index out of bounds: {index} (count {count})")]
    IndexOutOfBounds { index: usize, count: usize },
    #[error("no session found for spectrum: {0}")]
    NoMatchFound(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl GammaError {
    pub(crate) fn invalid_field(field: &str, reason: impl Into<String>) -> Self {
        GammaError::InvalidField {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

pub type GammaResult<T> = Result<T, GammaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_name_the_failing_resource() {
        let err = GammaError::MissingField("CurrentLLD".into());
        assert_eq!(err.to_string(), "missing field: CurrentLLD");

        let err = GammaError::DirectoryNotFound(PathBuf::from("/data/session/json"));
        assert!(err.to_string().contains("/data/session/json"));
    }

    #[test]
    fn default_config_uses_log_scale_without_engine() {
        let config = SessionConfig::default();
        assert!(config.logarithmic_color);
        assert!(config.builtin_doserate_factor.is_none());
        assert!(config.doserate_script.is_none());
        assert_eq!(config.projection, Projection::default());
    }
}
