//! Survey sessions: loading, dose-rate binding, statistics and colouring.

pub mod aggregate;
pub mod registry;
pub mod source;

pub use aggregate::{Aggregate, SessionStats, NORTH_REFERENCE_DISTANCE};
pub use registry::{SessionRegistry, SpectrumHandle};
pub use source::{SessionData, SessionSource};

use crate::dose::{BuiltinDoserate, DoserateComputer, ScriptDoserate};
use crate::math::geo::{Coordinate, Position, Projection};
use crate::math::palette::{ColorMapper, Rgb};
use crate::prelude::{GammaError, GammaResult, SessionConfig};
use crate::records::{Detector, Spectrum};
use crate::telemetry::{LoadMetrics, SessionLog};
use std::path::{Path, PathBuf};

/// One loaded survey dataset.
///
/// A load first clears the session, then reads, projects, computes dose
/// rates and aggregates in one pass. A failed load leaves the session
/// cleared; a missing source is reported before anything is cleared.
pub struct Session {
    source: PathBuf,
    name: String,
    comment: String,
    livetime: i64,
    detector: Option<Detector>,
    spectra: Vec<Spectrum>,
    stats: SessionStats,
    projection: Projection,
    logarithmic_color: bool,
    engine: Option<Box<dyn DoserateComputer>>,
    log: SessionLog,
    metrics: LoadMetrics,
}

impl Session {
    pub fn new() -> Self {
        Self {
            source: PathBuf::new(),
            name: String::new(),
            comment: String::new(),
            livetime: 0,
            detector: None,
            spectra: Vec::new(),
            stats: SessionStats::default(),
            projection: Projection::default(),
            logarithmic_color: true,
            engine: None,
            log: SessionLog::new("session"),
            metrics: LoadMetrics::new(),
        }
    }

    pub fn with_config(config: &SessionConfig) -> GammaResult<Self> {
        let mut session = Self::new();
        session.projection = config.projection;
        session.logarithmic_color = config.logarithmic_color;

        if let Some(script) = &config.doserate_script {
            if config.builtin_doserate_factor.is_some() {
                session
                    .log
                    .warn("both a doserate script and a builtin factor configured, using the script");
            }
            session.load_doserate_script(script)?;
        } else if let Some(factor) = config.builtin_doserate_factor {
            session.use_builtin_doserate(factor);
        }

        Ok(session)
    }

    /// Loads a session directory or a session database, depending on `path`.
    pub fn load(&mut self, path: impl AsRef<Path>) -> GammaResult<()> {
        match SessionSource::detect(path) {
            SessionSource::Directory(path) => self.load_directory(path),
            SessionSource::Database(path) => self.load_database(path),
        }
    }

    pub fn load_directory(&mut self, path: impl AsRef<Path>) -> GammaResult<()> {
        let root = path.as_ref();
        let json_dir = source::json_directory(root)?;

        self.clear();
        self.source = root.to_path_buf();
        self.log.set_scope(root.display().to_string());
        self.log.detail(&format!("scanning {}", json_dir.display()));

        let result = source::read_directory(root, &json_dir).and_then(|data| self.commit(data));
        self.finish_load(result)
    }

    pub fn load_database(&mut self, path: impl AsRef<Path>) -> GammaResult<()> {
        let path = path.as_ref();
        let connection = source::open_database(path)?;

        self.clear();
        self.source = path.to_path_buf();
        self.log.set_scope(path.display().to_string());
        self.log.detail("reading session database");

        let result = source::read_database(&connection).and_then(|data| self.commit(data));
        self.finish_load(result)
    }

    fn finish_load(&mut self, result: GammaResult<()>) -> GammaResult<()> {
        if let Err(err) = &result {
            self.log.warn(&format!("load failed: {}", err));
            self.metrics.record_failure();
            self.clear();
        }
        result
    }

    /// Projects every spectrum, computes its dose rate with the bound engine
    /// and folds it into the aggregate, then swaps the result in.
    fn commit(&mut self, data: SessionData) -> GammaResult<()> {
        let SessionData {
            name,
            comment,
            livetime,
            detector,
            spectra,
        } = data;

        let engine = match (self.engine.as_deref(), detector.as_ref()) {
            (Some(engine), Some(detector)) => Some((engine, detector)),
            (Some(engine), None) => {
                self.log.warn(&format!(
                    "no detector calibration, skipping {} doserates",
                    engine.name()
                ));
                None
            }
            (None, _) => None,
        };

        let projection = self.projection;
        let count = spectra.len();
        let (spectra, aggregate) = spectra.into_iter().try_fold(
            (Vec::with_capacity(count), Aggregate::default()),
            |(mut loaded, aggregate), mut spectrum| {
                spectrum.set_position(projection.project_coordinate(spectrum.coordinate()));
                if let Some((engine, detector)) = engine {
                    let doserate = engine.compute(detector, &spectrum)?;
                    spectrum.set_doserate(doserate);
                }
                let aggregate = aggregate.absorb(&spectrum);
                loaded.push(spectrum);
                Ok::<_, GammaError>((loaded, aggregate))
            },
        )?;
        let computed = if engine.is_some() { count } else { 0 };

        self.stats = aggregate.finish(&self.projection);
        self.name = name;
        self.comment = comment;
        self.livetime = livetime;
        self.detector = detector;
        self.spectra = spectra;

        self.metrics.record_load(count);
        self.metrics.record_doserates(computed);
        self.log.record(&format!(
            "loaded {} spectra from session {}, doserate {:.4e}..{:.4e}",
            count, self.name, self.stats.doserate.min, self.stats.doserate.max
        ));
        Ok(())
    }

    /// Drops all spectra and zeroes every aggregate. The bound dose-rate
    /// engine and the display settings are kept.
    pub fn clear(&mut self) {
        self.source = PathBuf::new();
        self.spectra.clear();
        self.name.clear();
        self.comment.clear();
        self.livetime = 0;
        self.detector = None;
        self.stats = SessionStats::default();
    }

    pub fn load_doserate_script(&mut self, path: impl AsRef<Path>) -> GammaResult<()> {
        let engine = ScriptDoserate::load(path)?;
        self.log
            .record(&format!("loaded doserate script {}", engine.path().display()));
        self.engine = Some(Box::new(engine));
        Ok(())
    }

    pub fn use_builtin_doserate(&mut self, factor: f64) {
        self.engine = Some(Box::new(BuiltinDoserate::new(factor)));
    }

    pub fn bind_doserate_engine(&mut self, engine: Box<dyn DoserateComputer>) {
        self.engine = Some(engine);
    }

    pub fn unbind_doserate_engine(&mut self) {
        self.engine = None;
    }

    pub fn doserate_engine(&self) -> Option<&str> {
        self.engine.as_deref().map(|engine| engine.name())
    }

    /// Path the current spectra were loaded from, empty when cleared.
    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn livetime(&self) -> i64 {
        self.livetime
    }

    pub fn detector(&self) -> Option<&Detector> {
        self.detector.as_ref()
    }

    pub fn projection(&self) -> Projection {
        self.projection
    }

    pub fn spectra(&self) -> &[Spectrum] {
        &self.spectra
    }

    pub fn spectrum_count(&self) -> usize {
        self.spectra.len()
    }

    pub fn spectrum(&self, index: usize) -> GammaResult<&Spectrum> {
        self.spectra.get(index).ok_or(GammaError::IndexOutOfBounds {
            index,
            count: self.spectra.len(),
        })
    }

    /// Handle of the spectrum at `index`, resolvable through a registry
    /// that opened this session from the same path.
    pub fn handle(&self, index: usize) -> GammaResult<SpectrumHandle> {
        self.spectrum(index)?;
        Ok(SpectrumHandle {
            source: self.source.clone(),
            index,
        })
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn min_doserate(&self) -> f64 {
        self.stats.doserate.min
    }

    pub fn max_doserate(&self) -> f64 {
        self.stats.doserate.max
    }

    pub fn center_position(&self) -> Position {
        self.stats.center_position
    }

    pub fn center_coordinate(&self) -> Coordinate {
        self.stats.center_coordinate
    }

    pub fn north_position(&self) -> Position {
        self.stats.north_position
    }

    pub fn north_coordinate(&self) -> Coordinate {
        self.stats.north_coordinate
    }

    pub fn use_logarithmic_color(&mut self, enabled: bool) {
        self.logarithmic_color = enabled;
    }

    /// Colour scale over the session's dose-rate range. In logarithmic mode
    /// the lower bound is the smallest positive dose rate, so spectra without
    /// dose (drawn green) do not collapse the scale.
    pub fn color_mapper(&self) -> ColorMapper {
        let mut min = self.min_doserate();
        if self.logarithmic_color && min <= 0.0 {
            min = self
                .spectra
                .iter()
                .map(Spectrum::doserate)
                .filter(|doserate| *doserate > 0.0)
                .fold(None, |floor: Option<f64>, doserate| {
                    Some(floor.map_or(doserate, |floor| floor.min(doserate)))
                })
                .unwrap_or(min);
        }
        ColorMapper::new(min, self.max_doserate(), self.logarithmic_color)
    }

    pub fn color_for(&self, doserate: f64) -> Rgb {
        self.color_mapper().color_for(doserate)
    }

    pub fn color_for_spectrum(&self, spectrum: &Spectrum) -> Rgb {
        self.color_for(spectrum.doserate())
    }

    /// Great-circle distance in meters and initial bearing in degrees from
    /// spectrum `from` to spectrum `to`.
    pub fn distance_between(&self, from: usize, to: usize) -> GammaResult<(f64, f64)> {
        let from = self.spectrum(from)?.coordinate();
        let to = self.spectrum(to)?.coordinate();
        Ok((from.distance_to(to), from.azimuth_to(to)))
    }

    pub fn metrics(&self) -> &LoadMetrics {
        &self.metrics
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
