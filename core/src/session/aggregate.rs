//! Session-wide statistics folded over the loaded spectra.

use crate::math::geo::{Coordinate, Position, Projection};
use crate::math::stats::Extent;
use crate::records::Spectrum;
use serde::Serialize;

/// Distance in meters from the session center to its north reference.
pub const NORTH_REFERENCE_DISTANCE: f64 = 50.0;

/// Statistics of a loaded session. All zero for an empty session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SessionStats {
    pub doserate: Extent,
    pub x: Extent,
    pub y: Extent,
    pub z: Extent,
    pub half_x: f64,
    pub half_y: f64,
    pub half_z: f64,
    pub latitude: Extent,
    pub longitude: Extent,
    pub altitude: Extent,
    pub center_position: Position,
    pub center_coordinate: Coordinate,
    pub north_position: Position,
    pub north_coordinate: Coordinate,
}

#[derive(Debug, Clone, Copy)]
struct Extents {
    doserate: Extent,
    x: Extent,
    y: Extent,
    z: Extent,
    latitude: Extent,
    longitude: Extent,
    altitude: Extent,
}

impl Extents {
    fn seed(spectrum: &Spectrum) -> Self {
        let position = spectrum.position();
        let coordinate = spectrum.coordinate();
        Self {
            doserate: Extent::seed(spectrum.doserate()),
            x: Extent::seed(position.x),
            y: Extent::seed(position.y),
            z: Extent::seed(position.z),
            latitude: Extent::seed(coordinate.latitude),
            longitude: Extent::seed(coordinate.longitude),
            altitude: Extent::seed(coordinate.altitude),
        }
    }

    fn include(&mut self, spectrum: &Spectrum) {
        let position = spectrum.position();
        let coordinate = spectrum.coordinate();
        self.doserate.include(spectrum.doserate());
        self.x.include(position.x);
        self.y.include(position.y);
        self.z.include(position.z);
        self.latitude.include(coordinate.latitude);
        self.longitude.include(coordinate.longitude);
        self.altitude.include(coordinate.altitude);
    }
}

/// Accumulator threaded through a load. The first spectrum seeds every
/// extent, later ones widen them.
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregate {
    extents: Option<Extents>,
    count: usize,
}

impl Aggregate {
    pub fn absorb(self, spectrum: &Spectrum) -> Self {
        let extents = match self.extents {
            None => Extents::seed(spectrum),
            Some(mut extents) => {
                extents.include(spectrum);
                extents
            }
        };
        Self {
            extents: Some(extents),
            count: self.count + 1,
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Derives half-extents, the center and the north reference.
    pub fn finish(self, projection: &Projection) -> SessionStats {
        let Some(extents) = self.extents else {
            return SessionStats::default();
        };

        let center_position = Position::new(extents.x.middle(), extents.y.middle(), extents.z.middle());
        let (latitude, longitude) = projection.unproject(&center_position);
        let center_coordinate = Coordinate::new(latitude, longitude, extents.altitude.middle());
        let north_coordinate =
            center_coordinate.at_distance_and_azimuth(NORTH_REFERENCE_DISTANCE, 0.0);
        let north_position = projection.project_coordinate(&north_coordinate);

        SessionStats {
            doserate: extents.doserate,
            x: extents.x,
            y: extents.y,
            z: extents.z,
            half_x: extents.x.half(),
            half_y: extents.y.half(),
            half_z: extents.z.half(),
            latitude: extents.latitude,
            longitude: extents.longitude,
            altitude: extents.altitude,
            center_position,
            center_coordinate,
            north_position,
            north_coordinate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::geo::Coordinate;
    use crate::records::SpectrumRecord;
    use chrono::Utc;

    fn located(index: usize, latitude: f64, longitude: f64, altitude: f64, doserate: f64) -> Spectrum {
        let record = SpectrumRecord {
            session_name: "fold".into(),
            session_index: index as i64,
            gps_time_start: Utc::now(),
            realtime: 0,
            livetime: 0,
            coordinate: Coordinate::new(latitude, longitude, altitude),
            num_channels: None,
            channels: Vec::new(),
        };
        let mut spectrum = Spectrum::from_record(index, record).unwrap();
        spectrum.set_position(Projection::default().project(latitude, longitude));
        spectrum.set_doserate(doserate);
        spectrum
    }

    #[test]
    fn empty_aggregate_finishes_to_zero() {
        let stats = Aggregate::default().finish(&Projection::default());
        assert_eq!(stats, SessionStats::default());
    }

    #[test]
    fn single_spectrum_seeds_every_extent() {
        let spectrum = located(0, 59.9, 10.7, 80.0, 0.12);
        let aggregate = Aggregate::default().absorb(&spectrum);
        let stats = aggregate.finish(&Projection::default());

        assert_eq!(aggregate.count(), 1);
        assert_eq!(stats.doserate, Extent::seed(0.12));
        assert_eq!(stats.x, Extent::seed(spectrum.position().x));
        assert_eq!(stats.half_x, 0.0);
        assert_eq!(stats.altitude, Extent::seed(80.0));
        assert!((stats.center_coordinate.latitude - 59.9).abs() < 1e-9);
        assert!(stats.north_coordinate.latitude > stats.center_coordinate.latitude);
    }

    #[test]
    fn fold_tracks_exact_extremes() {
        let spectra = [
            located(0, 59.90, 10.70, 80.0, 0.30),
            located(1, 59.95, 10.60, 120.0, 0.05),
            located(2, 59.85, 10.80, 95.0, 0.90),
        ];
        let aggregate = spectra.iter().fold(Aggregate::default(), Aggregate::absorb);
        let stats = aggregate.finish(&Projection::default());

        let xs: Vec<f64> = spectra.iter().map(|s| s.position().x).collect();
        let min_x = xs.iter().cloned().fold(f64::INFINITY, f64::min);
        let max_x = xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

        assert_eq!(stats.x.min, min_x);
        assert_eq!(stats.x.max, max_x);
        assert_eq!(stats.half_x, (max_x - min_x) / 2.0);
        assert_eq!(stats.doserate, Extent { min: 0.05, max: 0.90 });
        assert_eq!(stats.latitude, Extent { min: 59.85, max: 59.95 });
        assert_eq!(stats.longitude, Extent { min: 10.60, max: 10.80 });
        assert_eq!(stats.altitude.middle(), 100.0);
        assert_eq!(stats.center_position.x, min_x + stats.half_x);
    }
}
