//! Loaded sessions keyed by their source path.

use super::Session;
use crate::prelude::{GammaError, GammaResult, SessionConfig};
use crate::records::Spectrum;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Stable reference to a spectrum: the source path its session was opened
/// from and the spectrum's position in that session's collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SpectrumHandle {
    pub source: PathBuf,
    pub index: usize,
}

/// Owns every open session. Spectra are referred to by [`SpectrumHandle`]
/// and resolved back to their session through [`SessionRegistry::find_owner`].
pub struct SessionRegistry {
    config: SessionConfig,
    sessions: BTreeMap<PathBuf, Session>,
}

impl SessionRegistry {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            sessions: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Returns the session loaded from `path`, loading it first if needed.
    /// A failed load leaves the registry unchanged.
    pub fn open(&mut self, path: impl AsRef<Path>) -> GammaResult<&Session> {
        let path = path.as_ref().to_path_buf();
        if !self.sessions.contains_key(&path) {
            let mut session = Session::with_config(&self.config)?;
            session.load(&path)?;
            self.sessions.insert(path.clone(), session);
        }
        self.sessions
            .get(&path)
            .ok_or_else(|| GammaError::NoMatchFound(path.display().to_string()))
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<&Session> {
        self.sessions.get(path.as_ref())
    }

    pub fn get_mut(&mut self, path: impl AsRef<Path>) -> Option<&mut Session> {
        self.sessions.get_mut(path.as_ref())
    }

    pub fn close(&mut self, path: impl AsRef<Path>) -> Option<Session> {
        self.sessions.remove(path.as_ref())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, &Session)> {
        self.sessions
            .iter()
            .map(|(path, session)| (path.as_path(), session))
    }

    /// Resolves a handle through the session opened from its source path.
    pub fn find_owner(&self, handle: &SpectrumHandle) -> GammaResult<(&Session, &Spectrum)> {
        self.sessions
            .get(&handle.source)
            .and_then(|session| {
                session
                    .spectra()
                    .get(handle.index)
                    .map(|spectrum| (session, spectrum))
            })
            .ok_or_else(|| {
                GammaError::NoMatchFound(format!("{}#{}", handle.source.display(), handle.index))
            })
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
