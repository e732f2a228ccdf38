//! One recomputation pass over a session's selection.
//!
//! Each interaction runs the pass inline: resolve the customer address,
//! filter the area around the origin, request the route, then assemble the
//! map widget configuration the page script renders.

use farmalog_core::{
    layers_for, map_center, nearby, summarize, zoom_for_radius, Coordinate, Nearby, Phase,
    Registry, RouteSummary, SelectionState,
};
use farmalog_maps::{MapsClient, MapsError};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub name: String,
    pub position: Coordinate,
}

/// Client-side map configuration, embedded in the page as JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapWidget {
    pub center: Coordinate,
    pub zoom: u8,
    pub hubs: Vec<Marker>,
    pub origin: Option<Marker>,
    /// Draggable customer marker.
    pub customer: Option<Coordinate>,
    /// Encoded overview polyline of the route.
    pub polyline: Option<String>,
    /// Origin and customer, fitted into view once a route exists.
    pub bounds: Option<[Coordinate; 2]>,
    pub kml_layers: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plan<'a> {
    pub phase: Phase,
    pub nearby: Nearby<'a>,
    pub route: Option<RouteSummary>,
    pub map: MapWidget,
}

/// Runs the pass, updating `state` with any address suggestions and
/// resolved destination it obtains along the way.
///
/// # Errors
///
/// Returns the first [`MapsError`] of the autocomplete, place details or
/// directions call. Calls are not retried.
pub async fn recompute<'a>(
    registry: &'a Registry,
    maps: &MapsClient,
    state: &mut SelectionState,
) -> Result<Plan<'a>, MapsError> {
    resolve_destination(maps, state).await?;

    let origin = state
        .origin
        .as_deref()
        .and_then(|name| registry.find(name));
    let origin_coord = origin.map(|p| p.coordinate);
    let waypoints: Vec<Coordinate> = state
        .active_transfers()
        .into_iter()
        .filter_map(|name| registry.find(name))
        .map(|p| p.coordinate)
        .collect();

    let nearby = nearby(
        registry,
        &state.area,
        origin_coord,
        state.destination,
        state.radius_km,
    );

    let mut route = None;
    let mut polyline = None;
    let mut bounds = None;
    if let (Some(from), Some(to)) = (origin_coord, state.destination) {
        if let Some(legs) = maps.directions(from, to, &waypoints).await? {
            let summary = summarize(&legs.leg_meters, waypoints.len());
            tracing::info!(
                total_km = summary.total_km,
                partial_km = summary.partial_km,
                transfers = waypoints.len(),
                "route computed"
            );
            route = Some(summary);
            polyline = Some(legs.polyline);
            bounds = Some([from, to]);
        } else {
            tracing::info!("no driving route between origin and customer");
        }
    }

    let map = MapWidget {
        center: map_center(state.destination, origin_coord, &state.area),
        zoom: zoom_for_radius(state.radius_km),
        hubs: registry
            .hubs()
            .map(|p| Marker {
                name: p.name.clone(),
                position: p.coordinate,
            })
            .collect(),
        origin: origin.map(|p| Marker {
            name: p.name.clone(),
            position: p.coordinate,
        }),
        customer: state.destination,
        polyline,
        bounds,
        kml_layers: layers_for(state.overlays.enabled_keys())
            .into_iter()
            .map(|o| o.url)
            .collect(),
    };

    Ok(Plan {
        phase: state.phase(),
        nearby,
        route,
        map,
    })
}

/// Address lookup: autocomplete when no suggestions are held, then place
/// details for the picked (or first) suggestion.
async fn resolve_destination(
    maps: &MapsClient,
    state: &mut SelectionState,
) -> Result<(), MapsError> {
    if !state.needs_destination_lookup() {
        return Ok(());
    }
    if state.suggestions.is_empty() {
        let suggestions = maps.autocomplete(&state.address_query).await?;
        if suggestions.is_empty() {
            tracing::info!("address autocomplete returned no suggestions");
        }
        state.offer_suggestions(suggestions);
    }
    let Some(place_id) = state.pending_suggestion().map(|s| s.place_id.clone()) else {
        return Ok(());
    };
    if let Some(location) = maps.place_location(&place_id).await? {
        state.resolve_destination(location.coordinate);
    }
    Ok(())
}
