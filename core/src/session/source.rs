//! Readers for the two session layouts: a directory of JSON spectrum files
//! and a SQLite session database.

use crate::math::geo::Coordinate;
use crate::prelude::{GammaError, GammaResult};
use crate::records::spectrum::{parse_channel_list, parse_timestamp};
use crate::records::{Detector, Spectrum, SpectrumRecord};
use rusqlite::{Connection, OpenFlags};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

pub const JSON_SUBDIRECTORY: &str = "json";
pub const SESSION_FILE: &str = "session.json";

/// Where a session is loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionSource {
    Directory(PathBuf),
    Database(PathBuf),
}

impl SessionSource {
    /// Directories are session directories, anything else a session database.
    pub fn detect(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if path.is_dir() {
            SessionSource::Directory(path.to_path_buf())
        } else {
            SessionSource::Database(path.to_path_buf())
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            SessionSource::Directory(path) | SessionSource::Database(path) => path,
        }
    }
}

/// Everything read from a source, before projection and dose computation.
#[derive(Debug, Clone, Default)]
pub struct SessionData {
    pub name: String,
    pub comment: String,
    pub livetime: i64,
    pub detector: Option<Detector>,
    pub spectra: Vec<Spectrum>,
}

/// Path of the spectrum directory, failing if it does not exist.
pub fn json_directory(root: &Path) -> GammaResult<PathBuf> {
    let directory = root.join(JSON_SUBDIRECTORY);
    if directory.is_dir() {
        Ok(directory)
    } else {
        Err(GammaError::DirectoryNotFound(directory))
    }
}

fn is_json_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| extension.eq_ignore_ascii_case("json"))
}

/// A session detector fixes the histogram length of every spectrum.
fn check_channel_count(detector: Option<&Detector>, spectrum: &Spectrum) -> GammaResult<()> {
    match detector {
        Some(detector) if detector.num_channels != spectrum.num_channels() as i64 => {
            Err(GammaError::invalid_field(
                "channels",
                format!(
                    "histogram has {} channels but the detector is configured for {}",
                    spectrum.num_channels(),
                    detector.num_channels
                ),
            ))
        }
        _ => Ok(()),
    }
}

/// Reads every `.json` file of `json_dir` in enumeration order. The first
/// file that fails to parse aborts the read.
pub fn read_directory(root: &Path, json_dir: &Path) -> GammaResult<SessionData> {
    let mut data = read_session_file(root)?;

    for entry in fs::read_dir(json_dir)? {
        let path = entry?.path();
        if !is_json_file(&path) {
            continue;
        }
        let spectrum = Spectrum::from_json_file(data.spectra.len(), &path)?;
        check_channel_count(data.detector.as_ref(), &spectrum).map_err(|err| {
            GammaError::InvalidSpectrumFile {
                path: path.clone(),
                reason: err.to_string(),
            }
        })?;
        data.spectra.push(spectrum);
    }

    Ok(data)
}

/// Layout of `session.json`. The detector stays raw so that a missing key
/// is reported by name.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SessionFile {
    name: String,
    #[serde(default)]
    comment: String,
    #[serde(default)]
    livetime: i64,
    #[serde(default)]
    detector: Option<Value>,
}

/// Session metadata from `session.json`, or defaults named after the
/// directory when the file is absent.
fn read_session_file(root: &Path) -> GammaResult<SessionData> {
    let path = root.join(SESSION_FILE);
    if !path.is_file() {
        let name = root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        return Ok(SessionData {
            name,
            ..Default::default()
        });
    }

    let invalid = |reason: String| GammaError::InvalidSessionFile {
        path: path.clone(),
        reason,
    };
    let contents = fs::read_to_string(&path).map_err(|err| invalid(err.to_string()))?;
    let file: SessionFile =
        serde_json::from_str(&contents).map_err(|err| invalid(err.to_string()))?;

    let detector = file.detector.as_ref().map(Detector::parse).transpose()?;
    Ok(SessionData {
        name: file.name,
        comment: file.comment,
        livetime: file.livetime,
        detector,
        spectra: Vec::new(),
    })
}

/// Opens an existing session database read-only.
pub fn open_database(path: &Path) -> GammaResult<Connection> {
    Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|err| GammaError::DatabaseOpen {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })
}

/// Raw `spectrum` table row.
struct SpectrumRow {
    session_name: String,
    session_index: i64,
    start_time: String,
    latitude: f64,
    longitude: f64,
    altitude: f64,
    livetime: i64,
    realtime: i64,
    num_channels: Option<i64>,
    channels: String,
}

impl SpectrumRow {
    fn into_spectrum(self, index: usize) -> GammaResult<Spectrum> {
        let record = SpectrumRecord {
            gps_time_start: parse_timestamp("start_time", &self.start_time)?,
            channels: parse_channel_list("channels", &self.channels)?,
            session_name: self.session_name,
            session_index: self.session_index,
            realtime: self.realtime,
            livetime: self.livetime,
            coordinate: Coordinate::new(self.latitude, self.longitude, self.altitude),
            num_channels: self.num_channels,
        };
        Spectrum::from_record(index, record)
    }
}

/// Reads the session row and every spectrum row in row order.
pub fn read_database(connection: &Connection) -> GammaResult<SessionData> {
    let (name, comment, livetime, detector_data) = connection.query_row(
        "SELECT name, comment, livetime, detector_data FROM session LIMIT 1",
        [],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<f64>>(2)?,
                row.get::<_, String>(3)?,
            ))
        },
    )?;

    let detector_value: Value = serde_json::from_str(&detector_data)
        .map_err(|err| GammaError::invalid_field("detector_data", err.to_string()))?;
    let detector = Detector::parse(&detector_value)?;

    let mut statement = connection.prepare(
        "SELECT session_name, session_index, start_time, latitude, longitude, altitude, \
         livetime, realtime, num_channels, channels FROM spectrum",
    )?;
    let rows = statement.query_map([], |row| {
        Ok(SpectrumRow {
            session_name: row.get(0)?,
            session_index: row.get(1)?,
            start_time: row.get(2)?,
            latitude: row.get(3)?,
            longitude: row.get(4)?,
            altitude: row.get(5)?,
            livetime: row.get(6)?,
            realtime: row.get(7)?,
            num_channels: row.get(8)?,
            channels: row.get(9)?,
        })
    })?;

    let mut spectra = Vec::new();
    for (index, row) in rows.enumerate() {
        let spectrum = row
            .map_err(GammaError::from)
            .and_then(|row| row.into_spectrum(index))
            .and_then(|spectrum| {
                check_channel_count(Some(&detector), &spectrum)?;
                Ok(spectrum)
            });
        match spectrum {
            Ok(spectrum) => spectra.push(spectrum),
            Err(err) => {
                return Err(GammaError::InvalidSpectrumRow {
                    row: index,
                    reason: err.to_string(),
                })
            }
        }
    }

    Ok(SessionData {
        name,
        comment: comment.unwrap_or_default(),
        livetime: livetime.unwrap_or_default() as i64,
        detector: Some(detector),
        spectra,
    })
}
