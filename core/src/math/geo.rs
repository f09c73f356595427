//! Geodetic coordinates and their projection into the scene's Cartesian frame.

use serde::{Deserialize, Serialize};

/// Sphere radius of the scaled scene used by the simplified projection.
pub const SCENE_RADIUS: f64 = 500.0;
/// WGS84 equatorial radius in meters.
pub const WGS84_RADIUS: f64 = 6_378_137.0;
pub const WGS84_FLATTENING: f64 = 1.0 / 298.257224;
/// Mean earth radius in meters for great-circle distances.
pub const MEAN_EARTH_RADIUS: f64 = 6_371_007.2;

/// Point in the projected Cartesian frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Latitude and longitude in degrees, altitude in meters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64, altitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
        }
    }

    /// Destination point reached by travelling `distance` meters along a great
    /// circle starting at `azimuth_deg` (0 is north). Altitude is carried over.
    pub fn at_distance_and_azimuth(&self, distance: f64, azimuth_deg: f64) -> Coordinate {
        let delta = distance / MEAN_EARTH_RADIUS;
        let theta = azimuth_deg.to_radians();
        let phi1 = self.latitude.to_radians();
        let lambda1 = self.longitude.to_radians();

        let phi2 = (phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * theta.cos()).asin();
        let lambda2 = lambda1
            + (theta.sin() * delta.sin() * phi1.cos()).atan2(delta.cos() - phi1.sin() * phi2.sin());

        Coordinate {
            latitude: phi2.to_degrees(),
            longitude: normalize_longitude(lambda2.to_degrees()),
            altitude: self.altitude,
        }
    }

    /// Haversine distance in meters, ignoring altitude.
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        let dlat = (other.latitude - self.latitude).to_radians();
        let dlon = (other.longitude - self.longitude).to_radians();
        let a = (dlat / 2.0).sin().powi(2)
            + self.latitude.to_radians().cos()
                * other.latitude.to_radians().cos()
                * (dlon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        MEAN_EARTH_RADIUS * c
    }

    /// Initial bearing towards `other` in degrees within [0, 360).
    pub fn azimuth_to(&self, other: &Coordinate) -> f64 {
        let phi1 = self.latitude.to_radians();
        let phi2 = other.latitude.to_radians();
        let dlon = (other.longitude - self.longitude).to_radians();
        let y = dlon.sin() * phi2.cos();
        let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * dlon.cos();
        (y.atan2(x).to_degrees() + 360.0) % 360.0
    }
}

fn normalize_longitude(degrees: f64) -> f64 {
    (degrees + 540.0).rem_euclid(360.0) - 180.0
}

/// Geodetic to Cartesian projection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Projection {
    /// Spherical earth of a fixed radius.
    Simplified { radius: f64 },
    /// WGS84-like ellipsoid with the height term fixed at zero.
    Ellipsoidal,
}

impl Default for Projection {
    fn default() -> Self {
        Projection::Simplified {
            radius: SCENE_RADIUS,
        }
    }
}

impl Projection {
    pub fn project(&self, latitude_deg: f64, longitude_deg: f64) -> Position {
        let (sin_lat, cos_lat) = latitude_deg.to_radians().sin_cos();
        let (sin_lon, cos_lon) = longitude_deg.to_radians().sin_cos();

        match *self {
            Projection::Simplified { radius } => Position {
                x: radius * cos_lat * cos_lon,
                y: radius * cos_lat * sin_lon,
                z: radius * sin_lat,
            },
            Projection::Ellipsoidal => {
                let squashed = (1.0 - WGS84_FLATTENING) * (1.0 - WGS84_FLATTENING);
                let c = 1.0 / (cos_lat * cos_lat + squashed * sin_lat * sin_lat).sqrt();
                let s = squashed * c;
                Position {
                    x: WGS84_RADIUS * c * cos_lat * cos_lon,
                    y: WGS84_RADIUS * c * cos_lat * sin_lon,
                    z: WGS84_RADIUS * s * sin_lat,
                }
            }
        }
    }

    pub fn project_coordinate(&self, coordinate: &Coordinate) -> Position {
        self.project(coordinate.latitude, coordinate.longitude)
    }

    /// Latitude and longitude in degrees of the surface point along `position`.
    pub fn unproject(&self, position: &Position) -> (f64, f64) {
        let planar = position.x.hypot(position.y);
        let longitude = position.y.atan2(position.x).to_degrees();
        let latitude = match self {
            Projection::Simplified { .. } => position.z.atan2(planar),
            Projection::Ellipsoidal => {
                let squashed = (1.0 - WGS84_FLATTENING) * (1.0 - WGS84_FLATTENING);
                position.z.atan2(squashed * planar)
            }
        };
        (latitude.to_degrees(), longitude)
    }
}
