use geo::{GeodesicDistance, Point};
use serde::{Deserialize, Serialize};

/// A WGS-84 position. Serializes as `{"lat": .., "lng": ..}`, the shape the
/// Maps JavaScript API accepts as a `LatLngLiteral`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Ellipsoidal (Karney) geodesic distance in kilometers.
    #[must_use]
    pub fn geodesic_km(&self, other: &Coordinate) -> f64 {
        let a = Point::new(self.lng, self.lat);
        let b = Point::new(other.lng, other.lat);
        a.geodesic_distance(&b) / 1000.0
    }

    /// `"lat,lng"` as the Maps web services expect for origins and waypoints.
    #[must_use]
    pub fn to_query(&self) -> String {
        format!("{},{}", self.lat, self.lng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_to_self_is_zero() {
        let quito = Coordinate::new(-0.180_653, -78.467_838);
        assert!(quito.geodesic_km(&quito).abs() < 1e-9);
    }

    #[test]
    fn tenth_of_a_degree_of_latitude_at_equator() {
        // Meridian arc on WGS-84 near the equator is ~110.574 km per degree.
        let d = Coordinate::new(0.0, 0.0).geodesic_km(&Coordinate::new(0.1, 0.0));
        assert!((d - 11.057).abs() < 0.01, "got {d}");
    }

    #[test]
    fn quito_to_guayaquil_is_about_270_km() {
        let quito = Coordinate::new(-0.180_653, -78.467_838);
        let guayaquil = Coordinate::new(-2.189_412, -79.889_069);
        let d = quito.geodesic_km(&guayaquil);
        assert!((260.0..285.0).contains(&d), "got {d}");
    }

    #[test]
    fn query_format_is_lat_comma_lng() {
        assert_eq!(Coordinate::new(-2.5, -79.25).to_query(), "-2.5,-79.25");
    }

    #[test]
    fn serializes_as_lat_lng_literal() {
        let json = serde_json::to_value(Coordinate::new(1.5, -2.0)).unwrap();
        assert_eq!(json, serde_json::json!({"lat": 1.5, "lng": -2.0}));
    }
}
