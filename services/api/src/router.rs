use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::HeaderMap;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{delete, get, patch, post, put};
use axum::Router;
use tower_http::trace::TraceLayer;

use quillbox_core::health::{healthz, readyz};
use quillbox_core::middleware::request_id_layer;

use crate::error::ApiError;
use crate::handlers::{auth, note};
use crate::state::AppState;

/// Best-effort client identity for pre-auth rate limiting. Behind a proxy
/// the first `x-forwarded-for` entry is the real client; otherwise the
/// peer address.
fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_owned())
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_owned())
}

async fn auth_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);
    let ip = client_ip(request.headers(), peer);
    state
        .limits
        .auth
        .check(&ip)
        .map_err(|retry_after_seconds| ApiError::RateLimited {
            retry_after_seconds,
        })?;
    Ok(next.run(request).await)
}

pub fn build(state: AppState) -> Router {
    // The IP limiter guards only the unauthenticated endpoints; profile and
    // logout are charged like any other authenticated traffic.
    let auth_public = Router::new()
        .route("/signup", post(auth::signup))
        .route("/verify-otp", post(auth::verify_otp_handler))
        .route("/login", post(auth::login))
        .route("/verify-login-otp", post(auth::verify_login_otp))
        .route("/resend-otp", post(auth::resend_otp))
        .route("/google", get(auth::google_auth_url))
        .route("/google", post(auth::google_sign_in_handler))
        .route("/google/callback", get(auth::google_callback))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_rate_limit,
        ));

    let auth_private = Router::new()
        .route("/me", get(auth::me))
        .route("/logout", post(auth::logout));

    let notes = Router::new()
        .route("/", get(note::list_notes))
        .route("/", post(note::create_note))
        .route("/search", get(note::search_notes))
        .route("/bulk", delete(note::bulk_delete_notes))
        .route("/{id}", get(note::get_note))
        .route("/{id}", put(note::update_note))
        .route("/{id}", delete(note::delete_note))
        .route("/{id}/pin", patch(note::toggle_pin));

    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .nest("/api/auth", auth_public.merge(auth_private))
        .nest("/api/notes", notes)
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
        .with_state(state)
}
