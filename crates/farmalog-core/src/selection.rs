//! Per-session selection state and its transitions.

use serde::{Deserialize, Serialize};

use crate::catalog::Area;
use crate::coordinate::Coordinate;

pub const MIN_RADIUS_KM: f64 = 0.5;
pub const MAX_RADIUS_KM: f64 = 10.0;
pub const RADIUS_STEP_KM: f64 = 0.5;
pub const DEFAULT_RADIUS_KM: f64 = 5.0;

/// One address autocomplete candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub description: String,
    pub place_id: String,
}

/// Which KML overlays are drawn. All on by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayToggles {
    pub pdv_nacional: bool,
    pub logistica_quito: bool,
    pub logistica_guayaquil: bool,
}

impl Default for OverlayToggles {
    fn default() -> Self {
        Self {
            pdv_nacional: true,
            logistica_quito: true,
            logistica_guayaquil: true,
        }
    }
}

impl OverlayToggles {
    /// Catalog keys of the enabled overlays.
    #[must_use]
    pub fn enabled_keys(&self) -> Vec<&'static str> {
        [
            ("pdv_nacional", self.pdv_nacional),
            ("logistica_quito", self.logistica_quito),
            ("logistica_guayaquil", self.logistica_guayaquil),
        ]
        .into_iter()
        .filter_map(|(key, on)| on.then_some(key))
        .collect()
    }
}

/// Where a session stands in the planning flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    NoOrigin,
    OriginOnly,
    OriginDestination,
    OriginDestinationTransfers,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionState {
    pub origin: Option<String>,
    pub transfer_enabled: bool,
    pub transfer: Option<String>,
    pub second_transfer_enabled: bool,
    pub second_transfer: Option<String>,
    pub address_query: String,
    /// Last autocomplete result for `address_query`.
    pub suggestions: Vec<Suggestion>,
    /// `place_id` of the suggestion the user picked.
    pub chosen_suggestion: Option<String>,
    /// Resolved customer position.
    pub destination: Option<Coordinate>,
    pub area: Area,
    pub radius_km: f64,
    pub overlays: OverlayToggles,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self {
            origin: None,
            transfer_enabled: false,
            transfer: None,
            second_transfer_enabled: false,
            second_transfer: None,
            address_query: String::new(),
            suggestions: Vec::new(),
            chosen_suggestion: None,
            destination: None,
            area: Area::default(),
            radius_km: DEFAULT_RADIUS_KM,
            overlays: OverlayToggles::default(),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl SelectionState {
    /// Back to the initial state, every field unset or default.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        match (&self.origin, self.destination) {
            (None, _) => Phase::NoOrigin,
            (Some(_), None) => Phase::OriginOnly,
            (Some(_), Some(_)) if self.active_transfers().is_empty() => Phase::OriginDestination,
            (Some(_), Some(_)) => Phase::OriginDestinationTransfers,
        }
    }

    pub fn select_origin(&mut self, origin: Option<String>) {
        self.origin = non_blank(origin);
    }

    pub fn set_transfers(
        &mut self,
        enabled: bool,
        first: Option<String>,
        second_enabled: bool,
        second: Option<String>,
    ) {
        self.transfer_enabled = enabled;
        self.transfer = non_blank(first);
        self.second_transfer_enabled = second_enabled;
        self.second_transfer = non_blank(second);
    }

    /// Transfer stops that become route waypoints, in visiting order. The
    /// second stop only counts while the first toggle is on.
    #[must_use]
    pub fn active_transfers(&self) -> Vec<&str> {
        let mut stops = Vec::with_capacity(2);
        if !self.transfer_enabled {
            return stops;
        }
        if let Some(first) = &self.transfer {
            stops.push(first.as_str());
        }
        if self.second_transfer_enabled {
            if let Some(second) = &self.second_transfer {
                stops.push(second.as_str());
            }
        }
        stops
    }

    /// Update the free-text address. A different text invalidates the
    /// suggestions, the pick and the resolved destination. Returns whether the
    /// text changed.
    pub fn set_address_query(&mut self, query: &str) -> bool {
        let query = query.trim();
        if query == self.address_query {
            return false;
        }
        self.address_query = query.to_string();
        self.suggestions.clear();
        self.chosen_suggestion = None;
        self.destination = None;
        true
    }

    /// Whether a planning pass has to look the address up.
    #[must_use]
    pub fn needs_destination_lookup(&self) -> bool {
        !self.address_query.is_empty() && self.destination.is_none()
    }

    /// Store a fresh autocomplete result. A pick that is no longer offered is
    /// dropped.
    pub fn offer_suggestions(&mut self, suggestions: Vec<Suggestion>) {
        if let Some(chosen) = &self.chosen_suggestion {
            if !suggestions.iter().any(|s| &s.place_id == chosen) {
                self.chosen_suggestion = None;
            }
        }
        self.suggestions = suggestions;
    }

    /// Pick a suggestion by `place_id`. Picking a different one clears the
    /// resolved destination so the next pass resolves it. Returns whether the
    /// pick changed; ids not currently offered are ignored.
    pub fn choose_suggestion(&mut self, place_id: &str) -> bool {
        if self.chosen_suggestion.as_deref() == Some(place_id)
            || !self.suggestions.iter().any(|s| s.place_id == place_id)
        {
            return false;
        }
        self.chosen_suggestion = Some(place_id.to_string());
        self.destination = None;
        true
    }

    /// The suggestion to resolve: the pick, else the first one offered.
    #[must_use]
    pub fn pending_suggestion(&self) -> Option<&Suggestion> {
        self.chosen_suggestion
            .as_ref()
            .and_then(|id| self.suggestions.iter().find(|s| &s.place_id == id))
            .or_else(|| self.suggestions.first())
    }

    pub fn resolve_destination(&mut self, coordinate: Coordinate) {
        self.destination = Some(coordinate);
    }

    /// Carry over the address lookup a planning pass started from `before`
    /// and left in `after`. Nothing is applied once the lookup inputs have
    /// moved on from `before` (a reset, a new address, a dragged marker).
    /// Returns whether the results were applied.
    pub fn apply_lookup(&mut self, before: &Self, after: &Self) -> bool {
        let untouched = self.address_query == before.address_query
            && self.suggestions == before.suggestions
            && self.chosen_suggestion == before.chosen_suggestion
            && self.destination == before.destination;
        if !untouched {
            return false;
        }
        self.suggestions.clone_from(&after.suggestions);
        self.chosen_suggestion.clone_from(&after.chosen_suggestion);
        self.destination = after.destination;
        true
    }

    /// The customer marker was dragged. The new position replaces the
    /// destination; a reverse-geocoded address replaces the query text
    /// without invalidating the position.
    pub fn drop_destination(&mut self, coordinate: Coordinate, address: Option<String>) {
        if let Some(address) = non_blank(address) {
            self.address_query = address;
            self.suggestions.clear();
            self.chosen_suggestion = None;
        }
        self.destination = Some(coordinate);
    }

    pub fn set_area(&mut self, area: Area) {
        self.area = area;
    }

    /// Clamp to the supported range and snap to the slider step. Non-finite
    /// input falls back to the default radius.
    pub fn set_radius(&mut self, radius_km: f64) {
        self.radius_km = if radius_km.is_finite() {
            ((radius_km / RADIUS_STEP_KM).round() * RADIUS_STEP_KM)
                .clamp(MIN_RADIUS_KM, MAX_RADIUS_KM)
        } else {
            DEFAULT_RADIUS_KM
        };
    }

    pub fn set_overlays(&mut self, overlays: OverlayToggles) {
        self.overlays = overlays;
    }
}
