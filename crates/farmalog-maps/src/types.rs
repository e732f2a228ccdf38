//! Maps web-service response types.
//!
//! Every response carries a `status` string next to the payload and, on
//! failure, an `error_message`; [`ApiResponse`] captures that envelope.

use farmalog_core::Coordinate;
use serde::{Deserialize, Serialize};

/// Top-level envelope shared by the Maps web services.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(flatten)]
    pub data: T,
}

// ---------------------------------------------------------------------------
// place/autocomplete
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct AutocompleteResponse {
    #[serde(default)]
    pub predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
pub struct Prediction {
    pub description: String,
    pub place_id: String,
}

// ---------------------------------------------------------------------------
// place/details
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct PlaceDetailsResponse {
    #[serde(default)]
    pub result: Option<PlaceResult>,
}

#[derive(Debug, Deserialize)]
pub struct PlaceResult {
    pub geometry: Geometry,
    #[serde(default)]
    pub formatted_address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Geometry {
    pub location: LatLng,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl From<LatLng> for Coordinate {
    fn from(value: LatLng) -> Self {
        Coordinate::new(value.lat, value.lng)
    }
}

/// Resolved position of a place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaceLocation {
    pub coordinate: Coordinate,
    pub formatted_address: Option<String>,
}

// ---------------------------------------------------------------------------
// directions
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct DirectionsResponse {
    #[serde(default)]
    pub routes: Vec<Route>,
}

#[derive(Debug, Deserialize)]
pub struct Route {
    #[serde(default)]
    pub legs: Vec<Leg>,
    pub overview_polyline: OverviewPolyline,
}

#[derive(Debug, Deserialize)]
pub struct Leg {
    pub distance: Distance,
}

/// `value` is meters; `text` is the localized rendering.
#[derive(Debug, Deserialize)]
pub struct Distance {
    pub value: u64,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OverviewPolyline {
    pub points: String,
}

/// Leg distances and encoded overview polyline of the first route returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteLegs {
    pub leg_meters: Vec<u64>,
    /// Encoded polyline; decoded client-side by the Maps geometry library.
    pub polyline: String,
}

impl From<Route> for RouteLegs {
    fn from(route: Route) -> Self {
        Self {
            leg_meters: route.legs.iter().map(|l| l.distance.value).collect(),
            polyline: route.overview_polyline.points,
        }
    }
}
