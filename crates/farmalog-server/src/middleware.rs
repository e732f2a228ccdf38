use axum::{
    extract::Request,
    http::{header::SET_COOKIE, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::session::{session_cookie, session_id_from_headers};

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// The caller's planning session, stored as a request extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionId(pub Uuid);

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Axum middleware that attaches the caller's session.
///
/// A valid `farmalog_session` cookie is reused; otherwise a new session id is
/// issued and returned in a `Set-Cookie` header.
pub async fn session(mut req: Request, next: Next) -> Response {
    let existing = session_id_from_headers(req.headers());
    let id = existing.unwrap_or_else(Uuid::new_v4);

    req.extensions_mut().insert(SessionId(id));

    let mut res = next.run(req).await;

    if existing.is_none() {
        tracing::debug!(session = %id, "issued new session");
        if let Ok(val) = HeaderValue::from_str(&session_cookie(id)) {
            res.headers_mut().append(SET_COOKIE, val);
        }
    }

    res
}
