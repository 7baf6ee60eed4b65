use axum::http::StatusCode;

/// `GET /healthz` — liveness probe.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// `GET /readyz` — readiness probe. The API binary only binds its listener
/// after the database connection is established, so OK here implies ready.
pub async fn readyz() -> StatusCode {
    StatusCode::OK
}
