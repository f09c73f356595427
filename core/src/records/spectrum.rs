use crate::math::geo::{Coordinate, Position};
use crate::prelude::{GammaError, GammaResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

const MICROS_PER_SECOND: f64 = 1_000_000.0;

/// Parsed fields of one spectrum record before it joins a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumRecord {
    pub session_name: String,
    pub session_index: i64,
    pub gps_time_start: DateTime<Utc>,
    pub realtime: i64,
    pub livetime: i64,
    pub coordinate: Coordinate,
    /// Channel count stated by the source, checked against `channels`.
    pub num_channels: Option<i64>,
    pub channels: Vec<u32>,
}

/// On-disk layout of a spectrum file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SpectrumFile {
    session_name: String,
    session_index: i64,
    gps_time_start: DateTime<Utc>,
    realtime: i64,
    livetime: i64,
    latitude_start: f64,
    longitude_start: f64,
    altitude_start: f64,
    #[serde(default)]
    num_channels: Option<i64>,
    channels: Vec<u32>,
}

impl From<SpectrumFile> for SpectrumRecord {
    fn from(file: SpectrumFile) -> Self {
        Self {
            session_name: file.session_name,
            session_index: file.session_index,
            gps_time_start: file.gps_time_start,
            realtime: file.realtime,
            livetime: file.livetime,
            coordinate: Coordinate::new(
                file.latitude_start,
                file.longitude_start,
                file.altitude_start,
            ),
            num_channels: file.num_channels,
            channels: file.channels,
        }
    }
}

impl SpectrumRecord {
    pub fn from_json(value: &Value) -> GammaResult<Self> {
        SpectrumFile::deserialize(value)
            .map(Self::from)
            .map_err(|err| GammaError::invalid_field("spectrum", err.to_string()))
    }
}

/// Parses an RFC 3339 timestamp into UTC.
pub fn parse_timestamp(field: &str, text: &str) -> GammaResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text.trim())
        .map(|time| time.with_timezone(&Utc))
        .map_err(|err| GammaError::invalid_field(field, err.to_string()))
}

/// Parses a channel list stored as text, separated by spaces or commas.
pub fn parse_channel_list(field: &str, text: &str) -> GammaResult<Vec<u32>> {
    text.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(|token| {
            token
                .parse::<u32>()
                .map_err(|err| GammaError::invalid_field(field, format!("{}: {}", token, err)))
        })
        .collect()
}

/// One geolocated measurement owned by a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spectrum {
    session_name: String,
    session_index: i64,
    index: usize,
    gps_time_start: DateTime<Utc>,
    realtime: i64,
    livetime: i64,
    coordinate: Coordinate,
    position: Position,
    channels: Vec<u32>,
    doserate: f64,
}

impl Spectrum {
    /// Builds the spectrum stored at `index` of its session's collection.
    pub fn from_record(index: usize, record: SpectrumRecord) -> GammaResult<Self> {
        if let Some(stated) = record.num_channels {
            if stated != record.channels.len() as i64 {
                return Err(GammaError::invalid_field(
                    "NumChannels",
                    format!(
                        "states {} channels but the histogram has {}",
                        stated,
                        record.channels.len()
                    ),
                ));
            }
        }

        Ok(Self {
            session_name: record.session_name,
            session_index: record.session_index,
            index,
            gps_time_start: record.gps_time_start,
            realtime: record.realtime,
            livetime: record.livetime,
            coordinate: record.coordinate,
            position: Position::default(),
            channels: record.channels,
            doserate: 0.0,
        })
    }

    /// Reads one spectrum file. Any read or parse failure names the file.
    pub fn from_json_file(index: usize, path: &Path) -> GammaResult<Self> {
        let invalid = |reason: String| GammaError::InvalidSpectrumFile {
            path: path.to_path_buf(),
            reason,
        };

        let contents = fs::read_to_string(path).map_err(|err| invalid(err.to_string()))?;
        let file: SpectrumFile =
            serde_json::from_str(&contents).map_err(|err| invalid(err.to_string()))?;
        Self::from_record(index, file.into()).map_err(|err| invalid(err.to_string()))
    }

    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    /// Index recorded by the acquisition software.
    pub fn session_index(&self) -> i64 {
        self.session_index
    }

    /// Position within the owning session's collection.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn gps_time_start(&self) -> DateTime<Utc> {
        self.gps_time_start
    }

    pub fn realtime(&self) -> i64 {
        self.realtime
    }

    pub fn livetime(&self) -> i64 {
        self.livetime
    }

    pub fn realtime_seconds(&self) -> f64 {
        self.realtime as f64 / MICROS_PER_SECOND
    }

    pub fn livetime_seconds(&self) -> f64 {
        self.livetime as f64 / MICROS_PER_SECOND
    }

    pub fn coordinate(&self) -> &Coordinate {
        &self.coordinate
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn channels(&self) -> &[u32] {
        &self.channels
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn channel(&self, index: usize) -> GammaResult<u32> {
        self.channels
            .get(index)
            .copied()
            .ok_or(GammaError::IndexOutOfBounds {
                index,
                count: self.channels.len(),
            })
    }

    pub fn doserate(&self) -> f64 {
        self.doserate
    }

    pub(crate) fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    pub(crate) fn set_doserate(&mut self, doserate: f64) {
        self.doserate = doserate;
    }
}
