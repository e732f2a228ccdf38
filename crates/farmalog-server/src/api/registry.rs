use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Extension, Json,
};
use farmalog_core::selection::{DEFAULT_RADIUS_KM, MAX_RADIUS_KM, MIN_RADIUS_KM};
use farmalog_core::{filter_within_radius, Area, Coordinate, NearbyPointOfSale, PointOfSale, AREAS};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct AreaItem {
    pub label: String,
    pub province: &'static str,
    pub canton: &'static str,
    pub center: Coordinate,
    pub points_of_sale: usize,
}

pub(super) async fn list_areas(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<Vec<AreaItem>>> {
    let data = AREAS
        .iter()
        .map(|area| AreaItem {
            label: area.label(),
            province: area.province,
            canton: area.canton,
            center: area.center,
            points_of_sale: state.registry.in_area(*area).count(),
        })
        .collect();

    Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    })
}

#[derive(Debug, Deserialize)]
pub(super) struct PointsOfSaleQuery {
    pub province: Option<String>,
    pub canton: Option<String>,
    pub hubs_only: Option<bool>,
}

fn matches(filter: Option<&str>, value: &str) -> bool {
    filter.is_none_or(|f| f.trim().to_lowercase() == value.to_lowercase())
}

pub(super) async fn list_points_of_sale(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<PointsOfSaleQuery>,
) -> Response {
    let hubs_only = params.hubs_only.unwrap_or(false);
    let data: Vec<&PointOfSale> = state
        .registry
        .iter()
        .filter(|p| matches(params.province.as_deref(), &p.province))
        .filter(|p| matches(params.canton.as_deref(), &p.canton))
        .filter(|p| !hubs_only || p.is_hub())
        .collect();

    Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    })
    .into_response()
}

#[derive(Debug, Deserialize)]
pub(super) struct NearbyQuery {
    pub origin: String,
    pub area: Option<String>,
    pub radius_km: Option<f64>,
}

#[derive(Debug, Serialize)]
pub(super) struct NearbyData<'a> {
    pub origin: &'a PointOfSale,
    pub area: String,
    pub radius_km: f64,
    pub results: Vec<NearbyPointOfSale<'a>>,
}

/// Proximity filter around a hub without a session.
pub(super) async fn list_nearby(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<NearbyQuery>,
) -> Result<Response, ApiError> {
    let Some(origin) = state.registry.find(params.origin.trim()) else {
        return Err(ApiError::new(
            req_id.0,
            "not_found",
            format!("point of sale '{}' not found", params.origin),
        ));
    };
    let area = match params.area.as_deref() {
        None => Area::default(),
        Some(label) => *Area::from_label(label).ok_or_else(|| {
            ApiError::new(
                req_id.0.clone(),
                "validation_error",
                format!("unknown area '{label}'"),
            )
        })?,
    };
    let radius_km = params.radius_km.unwrap_or(DEFAULT_RADIUS_KM);
    if !(MIN_RADIUS_KM..=MAX_RADIUS_KM).contains(&radius_km) {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            format!("radius_km must be between {MIN_RADIUS_KM} and {MAX_RADIUS_KM}"),
        ));
    }

    let results = filter_within_radius(
        origin.coordinate,
        state.registry.in_area(area),
        radius_km,
    );

    Ok(Json(ApiResponse {
        data: NearbyData {
            origin,
            area: area.label(),
            radius_km,
            results,
        },
        meta: ResponseMeta::new(req_id.0),
    })
    .into_response())
}
