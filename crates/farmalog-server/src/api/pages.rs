use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Extension, Form, Json,
};
use farmalog_core::{Area, Coordinate, OverlayToggles, Phase, SelectionState};
use serde::{Deserialize, Serialize};

use crate::middleware::{RequestId, SessionId};
use crate::{planner, templates};

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

/// Sidebar form. Unchecked checkboxes are absent from the submission; empty
/// selects arrive as empty strings.
#[derive(Debug, Default, Deserialize)]
pub(super) struct SelectionForm {
    #[serde(default)]
    area: String,
    #[serde(default)]
    origin: String,
    #[serde(default)]
    transfer_enabled: Option<String>,
    #[serde(default)]
    transfer: String,
    #[serde(default)]
    second_transfer_enabled: Option<String>,
    #[serde(default)]
    second_transfer: String,
    #[serde(default)]
    address: String,
    /// `place_id` picked from the offered suggestions.
    #[serde(default)]
    suggestion: String,
    #[serde(default)]
    radius_km: String,
    #[serde(default)]
    pdv_nacional: Option<String>,
    #[serde(default)]
    logistica_quito: Option<String>,
    #[serde(default)]
    logistica_guayaquil: Option<String>,
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Html(templates::error_page("Selección inválida", message)),
    )
        .into_response()
}

pub(super) async fn index(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
) -> Response {
    let before = state.sessions.snapshot(session.0).await;
    let mut selection = before.clone();
    let result = planner::recompute(&state.registry, &state.maps, &mut selection).await;
    state
        .sessions
        .apply_lookup(session.0, &before, &selection)
        .await;

    match result {
        Ok(plan) => Html(templates::index_page(
            &state.registry,
            &selection,
            &plan,
            &state.browser_key,
        ))
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "planning pass failed");
            (
                StatusCode::BAD_GATEWAY,
                Html(templates::error_page(
                    "Error de Google Maps",
                    &format!("La consulta a Google Maps falló: {e}"),
                )),
            )
                .into_response()
        }
    }
}

pub(super) async fn update_selection(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Form(form): Form<SelectionForm>,
) -> Response {
    let origin = optional(&form.origin);
    if let Some(name) = &origin {
        if !state.registry.find(name).is_some_and(|p| p.is_hub()) {
            return bad_request(&format!("El origen «{name}» no es una base o hub registrada."));
        }
    }
    let transfer = optional(&form.transfer);
    let second_transfer = optional(&form.second_transfer);
    for name in [&transfer, &second_transfer].into_iter().flatten() {
        if state.registry.find(name).is_none() {
            return bad_request(&format!("El punto de venta «{name}» no existe."));
        }
    }
    let area = match optional(&form.area) {
        None => None,
        Some(label) => match Area::from_label(&label) {
            Some(area) => Some(*area),
            None => return bad_request(&format!("La zona «{label}» no está en el catálogo.")),
        },
    };
    let radius_km = match optional(&form.radius_km) {
        None => None,
        Some(raw) => match raw.parse::<f64>() {
            Ok(r) => Some(r),
            Err(_) => return bad_request(&format!("Radio inválido: «{raw}».")),
        },
    };

    state
        .sessions
        .update(session.0, |s| {
            if let Some(area) = area {
                s.set_area(area);
            }
            s.select_origin(origin);
            s.set_transfers(
                form.transfer_enabled.is_some(),
                transfer,
                form.second_transfer_enabled.is_some(),
                second_transfer,
            );
            if let Some(r) = radius_km {
                s.set_radius(r);
            }
            s.set_overlays(OverlayToggles {
                pdv_nacional: form.pdv_nacional.is_some(),
                logistica_quito: form.logistica_quito.is_some(),
                logistica_guayaquil: form.logistica_guayaquil.is_some(),
            });
            if s.set_address_query(&form.address) {
                tracing::debug!("customer address changed");
            } else if let Some(place_id) = optional(&form.suggestion) {
                // Re-posting the suggestion already in effect keeps the
                // resolved (possibly dragged) destination.
                let current = s.pending_suggestion().map(|p| p.place_id.as_str());
                if current != Some(place_id.as_str()) {
                    s.choose_suggestion(&place_id);
                }
            }
        })
        .await;

    Redirect::to("/").into_response()
}

pub(super) async fn reset_selection(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
) -> Redirect {
    state.sessions.update(session.0, SelectionState::reset).await;
    tracing::debug!(session = %session.0, "selection reset");
    Redirect::to("/")
}

/// Payload posted by the customer marker's drag-end handler.
#[derive(Debug, Deserialize)]
pub(super) struct DroppedDestination {
    lat: f64,
    lng: f64,
    #[serde(default)]
    address: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct DestinationAccepted {
    phase: Phase,
    destination: Coordinate,
}

pub(super) async fn drop_destination(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Extension(req_id): Extension<RequestId>,
    Json(payload): Json<DroppedDestination>,
) -> Result<Json<ApiResponse<DestinationAccepted>>, ApiError> {
    if !(-90.0..=90.0).contains(&payload.lat) || !(-180.0..=180.0).contains(&payload.lng) {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            format!("coordinate out of range: {}, {}", payload.lat, payload.lng),
        ));
    }
    let destination = Coordinate::new(payload.lat, payload.lng);

    let phase = state
        .sessions
        .update(session.0, |s| {
            s.drop_destination(destination, payload.address);
            s.phase()
        })
        .await;

    Ok(Json(ApiResponse {
        data: DestinationAccepted { phase, destination },
        meta: ResponseMeta::new(req_id.0),
    }))
}
