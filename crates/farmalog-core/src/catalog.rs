//! Static catalog of service areas and KML logistics overlays.

use serde::Serialize;

use crate::coordinate::Coordinate;

/// A province–canton pair the planner can filter on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Area {
    pub province: &'static str,
    pub canton: &'static str,
    /// Map center used when neither origin nor destination is known.
    pub center: Coordinate,
}

impl Area {
    /// Display label, `"<province> - <canton>"`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} - {}", self.province, self.canton)
    }

    /// Looks an area up by its label. Surrounding whitespace is ignored.
    #[must_use]
    pub fn from_label(label: &str) -> Option<&'static Area> {
        let (province, canton) = label.split_once(" - ")?;
        AREAS
            .iter()
            .find(|a| a.province == province.trim() && a.canton == canton.trim())
    }

    /// Whether a record's (title-cased) province and canton fall in this area.
    #[must_use]
    pub fn contains(&self, province: &str, canton: &str) -> bool {
        self.province == province && self.canton == canton
    }
}

impl Default for Area {
    fn default() -> Self {
        AREAS[0]
    }
}

pub const AREAS: [Area; 3] = [
    Area {
        province: "Pichincha",
        canton: "Quito",
        center: Coordinate {
            lat: -0.180_653,
            lng: -78.467_838,
        },
    },
    Area {
        province: "Guayas",
        canton: "Guayaquil",
        center: Coordinate {
            lat: -2.189_412,
            lng: -79.889_069,
        },
    },
    Area {
        province: "Azuay",
        canton: "Cuenca",
        center: Coordinate {
            lat: -2.900_55,
            lng: -79.004_08,
        },
    },
];

/// Which overlay group a KML layer belongs to; logistics layers are drawn
/// before the national point-of-sale layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayKind {
    Logistics,
    National,
}

/// A static KML layer referenced by URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Overlay {
    /// Stable form/JSON key.
    pub key: &'static str,
    pub label: &'static str,
    pub url: &'static str,
    pub kind: OverlayKind,
}

pub const OVERLAYS: [Overlay; 3] = [
    Overlay {
        key: "pdv_nacional",
        label: "Ubicacion PDV Nacional",
        url: "https://www.google.com/maps/d/kml?mid=1E274ysxqq1OJFObOlgGSyZ9yeD8r67k",
        kind: OverlayKind::National,
    },
    Overlay {
        key: "logistica_quito",
        label: "Logistica Quito",
        url: "https://www.google.com/maps/d/kml?mid=1VM9PYAfefV4hQRk-Ew6vBmBWKc6ol9U",
        kind: OverlayKind::Logistics,
    },
    Overlay {
        key: "logistica_guayaquil",
        label: "Logistica Guayaquil",
        url: "https://www.google.com/maps/d/kml?mid=1tID-UCrZAom8k-CiPolZa1fqwz_02as",
        kind: OverlayKind::Logistics,
    },
];

/// Overlays to draw for the enabled keys: logistics layers first, then the
/// national layer, each group in catalog order.
pub fn layers_for<'a, I>(enabled: I) -> Vec<&'static Overlay>
where
    I: IntoIterator<Item = &'a str> + Clone,
{
    let is_enabled = |o: &Overlay| enabled.clone().into_iter().any(|k| k == o.key);
    let logistics = OVERLAYS
        .iter()
        .filter(|o| o.kind == OverlayKind::Logistics && is_enabled(o));
    let national = OVERLAYS
        .iter()
        .filter(|o| o.kind == OverlayKind::National && is_enabled(o));
    logistics.chain(national).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_area_is_quito() {
        assert_eq!(Area::default().label(), "Pichincha - Quito");
    }

    #[test]
    fn from_label_round_trips_every_area() {
        for area in &AREAS {
            assert_eq!(Area::from_label(&area.label()), Some(area));
        }
    }

    #[test]
    fn from_label_rejects_unknown_area() {
        assert!(Area::from_label("Manabi - Manta").is_none());
        assert!(Area::from_label("Pichincha").is_none());
    }

    #[test]
    fn layers_draw_logistics_before_national() {
        let layers = layers_for(["pdv_nacional", "logistica_guayaquil", "logistica_quito"]);
        let labels: Vec<_> = layers.iter().map(|o| o.label).collect();
        assert_eq!(
            labels,
            [
                "Logistica Quito",
                "Logistica Guayaquil",
                "Ubicacion PDV Nacional"
            ]
        );
    }

    #[test]
    fn layers_skip_disabled_overlays() {
        let layers = layers_for(["logistica_guayaquil"]);
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].key, "logistica_guayaquil");
    }
}
