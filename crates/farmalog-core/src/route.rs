use serde::Serialize;

/// Distances of a route through origin → transfers → customer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RouteSummary {
    /// Whole trip, origin to customer.
    pub total_km: f64,
    /// Origin to the last transfer stop; equals `total_km` without transfers.
    pub partial_km: f64,
}

impl RouteSummary {
    #[must_use]
    pub fn total_text(&self) -> String {
        format_km(self.total_km)
    }

    #[must_use]
    pub fn partial_text(&self) -> String {
        format_km(self.partial_km)
    }
}

/// Summarize per-leg distances (meters) of a route with `transfer_count`
/// intermediate stops. With `k` transfers the first `k` legs end at the last
/// transfer stop.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn summarize(leg_meters: &[u64], transfer_count: usize) -> RouteSummary {
    let to_km = |legs: &[u64]| legs.iter().sum::<u64>() as f64 / 1000.0;
    let total_km = to_km(leg_meters);
    let partial_km = if transfer_count == 0 {
        total_km
    } else {
        to_km(&leg_meters[..transfer_count.min(leg_meters.len())])
    };
    RouteSummary {
        total_km,
        partial_km,
    }
}

/// Two-decimal kilometers, e.g. `"12.35 km"`.
#[must_use]
pub fn format_km(km: f64) -> String {
    format!("{km:.2} km")
}
