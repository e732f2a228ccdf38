//! Radius filter over the registry.
//!
//! Linear scan with ellipsoidal geodesic distance; the registry of one
//! country is small enough that no spatial index is warranted.

use serde::Serialize;

use crate::catalog::Area;
use crate::coordinate::Coordinate;
use crate::registry::{PointOfSale, Registry};

/// A record within the radius, annotated with its distance from the origin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyPointOfSale<'a> {
    #[serde(flatten)]
    pub point_of_sale: &'a PointOfSale,
    pub distance_km: f64,
}

/// Outcome of the proximity step for a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "results", rename_all = "snake_case")]
pub enum Nearby<'a> {
    /// Origin or destination is not chosen yet.
    NotComputed,
    /// The filter ran and nothing lies within the radius.
    Empty,
    Found(Vec<NearbyPointOfSale<'a>>),
}

/// Records whose geodesic distance to `origin` is at most `radius_km`,
/// nearest first. Equal distances keep their input order.
pub fn filter_within_radius<'a, I>(
    origin: Coordinate,
    candidates: I,
    radius_km: f64,
) -> Vec<NearbyPointOfSale<'a>>
where
    I: IntoIterator<Item = &'a PointOfSale>,
{
    let mut within: Vec<NearbyPointOfSale<'a>> = candidates
        .into_iter()
        .map(|p| NearbyPointOfSale {
            point_of_sale: p,
            distance_km: origin.geodesic_km(&p.coordinate),
        })
        .filter(|n| n.distance_km <= radius_km)
        .collect();
    // `sort_by` is stable.
    within.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    within
}

/// Proximity step of a planning pass. Runs only once both the origin and the
/// customer destination are known; distance is measured from the origin over
/// the records of `area`.
pub fn nearby<'a>(
    registry: &'a Registry,
    area: &Area,
    origin: Option<Coordinate>,
    destination: Option<Coordinate>,
    radius_km: f64,
) -> Nearby<'a> {
    let (Some(origin), Some(_)) = (origin, destination) else {
        return Nearby::NotComputed;
    };
    let found = filter_within_radius(origin, registry.in_area(*area), radius_km);
    tracing::debug!(
        area = %area.label(),
        radius_km,
        matches = found.len(),
        "proximity filter ran"
    );
    if found.is_empty() {
        Nearby::Empty
    } else {
        Nearby::Found(found)
    }
}
