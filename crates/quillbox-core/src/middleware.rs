use axum::http::HeaderName;
use tower_http::request_id::{MakeRequestId, RequestId, SetRequestIdLayer};
use uuid::Uuid;

/// Assigns a fresh UUID to every incoming request.
#[derive(Clone, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        Some(RequestId::new(
            Uuid::new_v4().to_string().parse().expect("uuid is a valid header value"),
        ))
    }
}

/// `x-request-id` layer; apply ahead of the trace layer so the id shows up
/// in request spans.
pub fn request_id_layer() -> SetRequestIdLayer<UuidRequestId> {
    SetRequestIdLayer::new(HeaderName::from_static("x-request-id"), UuidRequestId)
}
