mod pages;
mod plan;
mod registry;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use farmalog_core::Registry;
use farmalog_maps::{MapsClient, MapsError};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{request_id, session, RequestId};
use crate::session::SessionStore;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub maps: Arc<MapsClient>,
    pub sessions: SessionStore,
    /// Key embedded in the page's Maps JavaScript loader.
    pub browser_key: Arc<str>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    points_of_sale: usize,
    hubs: usize,
    sessions: usize,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "upstream_error" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_maps_error(request_id: String, error: &MapsError) -> ApiError {
    tracing::error!(error = %error, "maps request failed");
    ApiError::new(
        request_id,
        "upstream_error",
        format!("maps request failed: {error}"),
    )
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-request-id"),
        ])
}

fn session_router() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::index))
        .route("/session/selection", post(pages::update_selection))
        .route("/session/reset", post(pages::reset_selection))
        .route("/session/destination", post(pages::drop_destination))
        .route("/api/v1/session", get(plan::session_plan))
        .layer(axum::middleware::from_fn(session))
}

pub fn build_app(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/areas", get(registry::list_areas))
        .route("/api/v1/points-of-sale", get(registry::list_points_of_sale))
        .route("/api/v1/nearby", get(registry::list_nearby));

    Router::new()
        .merge(public_routes)
        .merge(session_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    Json(ApiResponse {
        data: HealthData {
            status: "ok",
            points_of_sale: state.registry.len(),
            hubs: state.registry.hubs().count(),
            sessions: state.sessions.len().await,
        },
        meta: ResponseMeta::new(req_id.0),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header::COOKIE, header::LOCATION, header::SET_COOKIE, Request};
    use axum::response::Response;
    use farmalog_core::columns::parse_column_mapping;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const COLUMNS_YAML: &str = include_str!("../../../../config/columns.yaml");

    const SAMPLE_CSV: &str = "\
nombre farmacia,base o hub,latitud,longitud,provincia,cantón,parroquia,dirección farmacia,estado farmacia
Hub Norte,HUB,-0.12,-78.47,PICHINCHA,QUITO,Kennedy,Av. Eloy Alfaro,ACTIVA
Farmacia Centro,,-0.15,-78.48,PICHINCHA,QUITO,Iñaquito,Av. Amazonas,ACTIVA
Farmacia Lejana,,-0.45,-78.60,PICHINCHA,QUITO,Amaguaña,Vía Amaguaña,ACTIVA
Hub Puerto,HUB,-2.17,-79.92,GUAYAS,GUAYAQUIL,Tarqui,Av. Juan Tanca Marengo,ACTIVA
";

    pub(crate) fn sample_registry() -> Registry {
        let mapping = parse_column_mapping(COLUMNS_YAML).expect("shipped column mapping parses");
        Registry::from_reader(SAMPLE_CSV.as_bytes(), &mapping).expect("sample registry loads")
    }

    pub(crate) fn test_maps(base_url: &str) -> MapsClient {
        MapsClient::with_base_url("test-key", 5, "ec", base_url)
            .expect("client construction should not fail")
    }

    fn test_app(maps_url: &str) -> (Router, AppState) {
        let state = AppState {
            registry: Arc::new(sample_registry()),
            maps: Arc::new(test_maps(maps_url)),
            sessions: SessionStore::default(),
            browser_key: Arc::from("browser-key"),
        };
        (build_app(state.clone()), state)
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&body).expect("json parse")
    }

    async fn body_text(response: Response) -> String {
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        String::from_utf8(body.to_vec()).expect("utf-8 body")
    }

    fn session_cookie_of(response: &Response) -> String {
        response
            .headers()
            .get(SET_COOKIE)
            .expect("set-cookie header")
            .to_str()
            .expect("ascii cookie")
            .split(';')
            .next()
            .expect("cookie pair")
            .to_string()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).expect("request")
    }

    fn post_form(uri: &str, cookie: &str, form: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(COOKIE, cookie)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .expect("request")
    }

    #[test]
    fn api_error_codes_map_to_statuses() {
        let cases = [
            ("validation_error", StatusCode::BAD_REQUEST),
            ("bad_request", StatusCode::BAD_REQUEST),
            ("not_found", StatusCode::NOT_FOUND),
            ("upstream_error", StatusCode::BAD_GATEWAY),
            ("internal_error", StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (code, status) in cases {
            let response = ApiError::new("req-1", code, "msg").into_response();
            assert_eq!(response.status(), status, "code {code}");
        }
    }

    #[tokio::test]
    async fn health_reports_registry_size_and_echoes_request_id() {
        let (app, _) = test_app("http://127.0.0.1:9");
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .header("x-request-id", "req-42")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("x-request-id").unwrap(),
            "req-42"
        );
        let json = body_json(response).await;
        assert_eq!(json["data"]["status"], "ok");
        assert_eq!(json["data"]["points_of_sale"], 4);
        assert_eq!(json["data"]["hubs"], 2);
        assert_eq!(json["meta"]["request_id"], "req-42");
    }

    #[tokio::test]
    async fn first_visit_issues_session_cookie_and_renders_page() {
        let (app, state) = test_app("http://127.0.0.1:9");
        let response = app.oneshot(get("/")).await.expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let cookie = session_cookie_of(&response);
        assert!(cookie.starts_with("farmalog_session="));
        let html = body_text(response).await;
        assert!(html.contains("Hub Norte"));
        assert!(html.contains("libraries=geometry,places"));
        assert!(html.contains("key=browser-key"));
        assert_eq!(state.sessions.len().await, 1);
    }

    #[tokio::test]
    async fn selection_form_redirects_and_updates_session() {
        let (app, state) = test_app("http://127.0.0.1:9");
        let first = app.clone().oneshot(get("/")).await.expect("response");
        let cookie = session_cookie_of(&first);

        let response = app
            .oneshot(post_form(
                "/session/selection",
                &cookie,
                "area=Pichincha+-+Quito&origin=Hub+Norte&transfer_enabled=on&transfer=Farmacia+Centro&radius_km=2.3&pdv_nacional=on",
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(LOCATION).unwrap(), "/");
        assert!(response.headers().get(SET_COOKIE).is_none());

        let id = cookie
            .strip_prefix("farmalog_session=")
            .and_then(|v| uuid::Uuid::parse_str(v).ok())
            .expect("session id");
        let selection = state.sessions.snapshot(id).await;
        assert_eq!(selection.origin.as_deref(), Some("Hub Norte"));
        assert_eq!(selection.active_transfers(), ["Farmacia Centro"]);
        assert!((selection.radius_km - 2.5).abs() < f64::EPSILON);
        assert!(selection.overlays.pdv_nacional);
        assert!(!selection.overlays.logistica_quito);
    }

    #[tokio::test]
    async fn unknown_origin_is_rejected() {
        let (app, _) = test_app("http://127.0.0.1:9");
        let response = app
            .oneshot(post_form(
                "/session/selection",
                "",
                "origin=Nope&area=Pichincha+-+Quito",
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("Nope"));
    }

    #[tokio::test]
    async fn non_hub_origin_is_rejected() {
        let (app, _) = test_app("http://127.0.0.1:9");
        let response = app
            .oneshot(post_form("/session/selection", "", "origin=Farmacia+Centro"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn reset_clears_the_session() {
        let (app, state) = test_app("http://127.0.0.1:9");
        let first = app.clone().oneshot(get("/")).await.expect("response");
        let cookie = session_cookie_of(&first);
        app.clone()
            .oneshot(post_form("/session/selection", &cookie, "origin=Hub+Norte&radius_km=1"))
            .await
            .expect("response");

        let response = app
            .oneshot(post_form("/session/reset", &cookie, ""))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let id = uuid::Uuid::parse_str(cookie.trim_start_matches("farmalog_session="))
            .expect("session id");
        assert_eq!(
            state.sessions.snapshot(id).await,
            farmalog_core::SelectionState::default()
        );
    }

    #[tokio::test]
    async fn reset_during_slow_planning_pass_is_kept() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/place/autocomplete/json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({
                        "status": "OK",
                        "predictions": [
                            { "description": "Av. Amazonas, Quito, Ecuador", "place_id": "place-1" }
                        ]
                    }))
                    .set_delay(std::time::Duration::from_millis(500)),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/place/details/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "OK",
                "result": {
                    "geometry": { "location": { "lat": -0.1765, "lng": -78.4812 } },
                    "formatted_address": "Av. Amazonas, Quito, Ecuador"
                }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/directions/json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "status": "ZERO_RESULTS", "routes": [] })),
            )
            .mount(&server)
            .await;

        let (app, state) = test_app(&server.uri());
        let first = app.clone().oneshot(get("/")).await.expect("response");
        let cookie = session_cookie_of(&first);
        app.clone()
            .oneshot(post_form(
                "/session/selection",
                &cookie,
                "origin=Hub+Norte&address=Amazonas",
            ))
            .await
            .expect("response");

        let planning = tokio::spawn({
            let app = app.clone();
            let cookie = cookie.clone();
            async move {
                app.oneshot(
                    Request::builder()
                        .uri("/api/v1/session")
                        .header(COOKIE, &cookie)
                        .body(Body::empty())
                        .expect("request"),
                )
                .await
                .expect("response")
            }
        });
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        let response = app
            .oneshot(post_form("/session/reset", &cookie, ""))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let planned = planning.await.expect("planning task");
        assert_eq!(planned.status(), StatusCode::OK);

        let id = uuid::Uuid::parse_str(cookie.trim_start_matches("farmalog_session="))
            .expect("session id");
        assert_eq!(
            state.sessions.snapshot(id).await,
            farmalog_core::SelectionState::default()
        );
    }

    #[tokio::test]
    async fn dragged_destination_updates_session_plan() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/directions/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "OK",
                "routes": [{
                    "legs": [{ "distance": { "value": 3456 } }],
                    "overview_polyline": { "points": "poly" }
                }]
            })))
            .mount(&server)
            .await;

        let (app, _) = test_app(&server.uri());
        let first = app.clone().oneshot(get("/")).await.expect("response");
        let cookie = session_cookie_of(&first);
        app.clone()
            .oneshot(post_form("/session/selection", &cookie, "origin=Hub+Norte"))
            .await
            .expect("response");

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/session/destination")
                    .header(COOKIE, &cookie)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"lat":-0.14,"lng":-78.475,"address":"Av. Naciones Unidas, Quito"}"#,
                    ))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["phase"], "origin_destination");

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/session")
                    .header(COOKIE, &cookie)
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let data = &json["data"];
        assert_eq!(data["selection"]["address_query"], "Av. Naciones Unidas, Quito");
        assert_eq!(data["plan"]["route"]["total_km"], 3.456);
        assert_eq!(data["plan"]["map"]["polyline"], "poly");
        assert_eq!(data["plan"]["nearby"]["state"], "found");
        let results = data["plan"]["nearby"]["results"].as_array().expect("results");
        assert_eq!(results[0]["name"], "Hub Norte");
        assert!(results[0]["distance_km"].as_f64().expect("distance") < 1e-6);
    }

    #[tokio::test]
    async fn out_of_range_destination_is_rejected() {
        let (app, _) = test_app("http://127.0.0.1:9");
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/session/destination")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"lat":95.0,"lng":0.0}"#))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "validation_error");
    }

    #[tokio::test]
    async fn maps_failure_renders_bad_gateway() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "REQUEST_DENIED",
                "error_message": "key rejected"
            })))
            .mount(&server)
            .await;

        let (app, _) = test_app(&server.uri());
        let first = app.clone().oneshot(get("/")).await.expect("response");
        let cookie = session_cookie_of(&first);
        app.clone()
            .oneshot(post_form("/session/selection", &cookie, "address=Amazonas"))
            .await
            .expect("response");

        let page = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(COOKIE, &cookie)
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(page.status(), StatusCode::BAD_GATEWAY);
        assert!(body_text(page).await.contains("REQUEST_DENIED"));

        let api = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/session")
                    .header(COOKIE, &cookie)
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(api.status(), StatusCode::BAD_GATEWAY);
        let json = body_json(api).await;
        assert_eq!(json["error"]["code"], "upstream_error");
        assert!(!json["error"]["message"]
            .as_str()
            .unwrap_or_default()
            .contains("test-key"));
    }

    #[tokio::test]
    async fn areas_lists_catalog_with_counts() {
        let (app, _) = test_app("http://127.0.0.1:9");
        let response = app.oneshot(get("/api/v1/areas")).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let areas = json["data"].as_array().expect("data array");
        assert_eq!(areas.len(), 3);
        assert_eq!(areas[0]["label"], "Pichincha - Quito");
        assert_eq!(areas[0]["points_of_sale"], 3);
        assert_eq!(areas[2]["points_of_sale"], 0);
    }

    #[tokio::test]
    async fn points_of_sale_filter_by_area_and_hub_flag() {
        let (app, _) = test_app("http://127.0.0.1:9");
        let response = app
            .clone()
            .oneshot(get("/api/v1/points-of-sale?province=pichincha&canton=Quito"))
            .await
            .expect("response");
        let json = body_json(response).await;
        assert_eq!(json["data"].as_array().map(Vec::len), Some(3));

        let response = app
            .oneshot(get("/api/v1/points-of-sale?hubs_only=true"))
            .await
            .expect("response");
        let json = body_json(response).await;
        let names: Vec<&str> = json["data"]
            .as_array()
            .expect("data array")
            .iter()
            .filter_map(|p| p["name"].as_str())
            .collect();
        assert_eq!(names, ["Hub Norte", "Hub Puerto"]);
    }

    #[tokio::test]
    async fn nearby_endpoint_filters_from_origin() {
        let (app, _) = test_app("http://127.0.0.1:9");
        let response = app
            .oneshot(get(
                "/api/v1/nearby?origin=Hub%20Norte&area=Pichincha%20-%20Quito&radius_km=5",
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let names: Vec<&str> = json["data"]["results"]
            .as_array()
            .expect("results")
            .iter()
            .filter_map(|p| p["name"].as_str())
            .collect();
        assert_eq!(names, ["Hub Norte", "Farmacia Centro"]);
    }

    #[tokio::test]
    async fn nearby_endpoint_validates_input() {
        let (app, _) = test_app("http://127.0.0.1:9");
        let missing = app
            .clone()
            .oneshot(get("/api/v1/nearby?origin=Nadie"))
            .await
            .expect("response");
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let bad_radius = app
            .clone()
            .oneshot(get("/api/v1/nearby?origin=Hub%20Norte&radius_km=50"))
            .await
            .expect("response");
        assert_eq!(bad_radius.status(), StatusCode::BAD_REQUEST);

        let bad_area = app
            .oneshot(get("/api/v1/nearby?origin=Hub%20Norte&area=Loja%20-%20Loja"))
            .await
            .expect("response");
        assert_eq!(bad_area.status(), StatusCode::BAD_REQUEST);
    }
}
