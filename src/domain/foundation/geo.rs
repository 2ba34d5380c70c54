//! Geographic value objects shared by location payloads.

use serde::{Deserialize, Serialize};

use super::Timestamp;

/// Mean Earth radius in kilometres.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance to `other` in kilometres (haversine).
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        let d_lat = (other.latitude - self.latitude).to_radians();
        let d_lon = (other.longitude - self.longitude).to_radians();
        let a = (d_lat / 2.0).sin().powi(2)
            + self.latitude.to_radians().cos()
                * other.latitude.to_radians().cos()
                * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_KM * c
    }
}

/// A single reading from the location sampler.
///
/// The client never interprets it; it travels as the body of
/// `location_update` frames.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    pub latitude: f64,
    pub longitude: f64,
    /// Accuracy radius in metres, when the sampler reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    pub timestamp: Timestamp,
}

impl LocationSample {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_to_self_is_zero() {
        let p = GeoPoint::new(6.5244, 3.3792);
        assert!(p.distance_km(&p).abs() < 1e-9);
    }

    #[test]
    fn distance_matches_known_city_pair() {
        // London -> Paris is roughly 344 km.
        let london = GeoPoint::new(51.5074, -0.1278);
        let paris = GeoPoint::new(48.8566, 2.3522);
        let d = london.distance_km(&paris);
        assert!((d - 343.5).abs() < 2.0, "got {d}");
    }

    #[test]
    fn distance_is_symmetric() {
        let a = GeoPoint::new(-33.8688, 151.2093);
        let b = GeoPoint::new(35.6762, 139.6503);
        assert!((a.distance_km(&b) - b.distance_km(&a)).abs() < 1e-6);
    }

    #[test]
    fn sample_omits_missing_accuracy() {
        let sample = LocationSample {
            latitude: 1.0,
            longitude: 2.0,
            accuracy: None,
            timestamp: Timestamp::from_unix_millis(0),
        };
        let json = serde_json::to_value(sample).unwrap();
        assert!(json.get("accuracy").is_none());
        assert_eq!(sample.point(), GeoPoint::new(1.0, 2.0));
    }
}
