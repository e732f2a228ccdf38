use crate::catalog::Area;
use crate::coordinate::Coordinate;

/// Map zoom level for a search radius: tighter radius, closer zoom.
#[must_use]
pub fn zoom_for_radius(radius_km: f64) -> u8 {
    if radius_km <= 1.0 {
        15
    } else if radius_km <= 2.5 {
        14
    } else if radius_km <= 5.0 {
        13
    } else {
        12
    }
}

/// Centers on the customer when known, else the origin, else the area.
#[must_use]
pub fn map_center(
    destination: Option<Coordinate>,
    origin: Option<Coordinate>,
    area: &Area,
) -> Coordinate {
    destination.or(origin).unwrap_or(area.center)
}
