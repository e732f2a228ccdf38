use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Extension, Json,
};
use farmalog_core::SelectionState;
use serde::Serialize;

use crate::middleware::{RequestId, SessionId};
use crate::planner::{self, Plan};

use super::{map_maps_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct SessionPlan<'a> {
    selection: SelectionState,
    plan: Plan<'a>,
}

/// The caller's selection after a recomputation pass, with the resulting
/// plan.
pub(super) async fn session_plan(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Response, ApiError> {
    let before = state.sessions.snapshot(session.0).await;
    let mut selection = before.clone();
    let result = planner::recompute(&state.registry, &state.maps, &mut selection).await;
    state
        .sessions
        .apply_lookup(session.0, &before, &selection)
        .await;

    let plan = result.map_err(|e| map_maps_error(req_id.0.clone(), &e))?;

    // The plan borrows the registry, so serialize before returning.
    Ok(Json(ApiResponse {
        data: SessionPlan { selection, plan },
        meta: ResponseMeta::new(req_id.0),
    })
    .into_response())
}
