use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};

/// API service error variants. Every failure a handler can produce maps to
/// exactly one of these; infrastructure errors ride in `Internal` and are
/// collapsed to a generic 500 at the edge.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("invalid or expired OTP")]
    InvalidOtp,
    #[error("invalid OTP, {remaining} attempts remaining")]
    WrongOtp { remaining: i32 },
    #[error("maximum OTP attempts exceeded, please request a new OTP")]
    OtpExhausted,
    #[error("please wait {wait_seconds} seconds before requesting another OTP")]
    OtpCooldown { wait_seconds: i64 },
    #[error("too many requests, please try again later")]
    RateLimited { retry_after_seconds: u64 },
    #[error("authorization token required")]
    MissingToken,
    #[error("invalid token")]
    InvalidToken,
    #[error("token expired")]
    ExpiredToken,
    #[error("email not verified, please verify your email first")]
    EmailNotVerified,
    #[error("user not found")]
    UserNotFound,
    #[error("note not found")]
    NoteNotFound,
    #[error("user with this email already exists")]
    UserAlreadyExists,
    #[error("failed to send OTP email")]
    MailDelivery(#[source] anyhow::Error),
    #[error("{0}")]
    GoogleAuth(String),
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION",
            Self::InvalidOtp => "INVALID_OTP",
            Self::WrongOtp { .. } => "WRONG_OTP",
            Self::OtpExhausted => "OTP_EXHAUSTED",
            Self::OtpCooldown { .. } => "OTP_COOLDOWN",
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::MissingToken => "MISSING_TOKEN",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::ExpiredToken => "EXPIRED_TOKEN",
            Self::EmailNotVerified => "EMAIL_NOT_VERIFIED",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::NoteNotFound => "NOTE_NOT_FOUND",
            Self::UserAlreadyExists => "USER_ALREADY_EXISTS",
            Self::MailDelivery(_) => "MAIL_DELIVERY",
            Self::GoogleAuth(_) => "GOOGLE_AUTH",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_)
            | Self::InvalidOtp
            | Self::WrongOtp { .. }
            | Self::OtpExhausted
            | Self::GoogleAuth(_) => StatusCode::BAD_REQUEST,
            Self::MissingToken | Self::InvalidToken | Self::ExpiredToken => {
                StatusCode::UNAUTHORIZED
            }
            Self::EmailNotVerified => StatusCode::FORBIDDEN,
            Self::UserNotFound | Self::NoteNotFound => StatusCode::NOT_FOUND,
            Self::UserAlreadyExists => StatusCode::CONFLICT,
            Self::OtpCooldown { .. } | Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::MailDelivery(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Seconds to wait before retrying, for the throttling variants.
    fn retry_after(&self) -> Option<i64> {
        match self {
            Self::OtpCooldown { wait_seconds } => Some(*wait_seconds),
            Self::RateLimited {
                retry_after_seconds,
            } => Some(*retry_after_seconds as i64),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Log 500s only — the trace layer already records method/uri/status
        // for every request, and 4xx are expected client errors. Internal
        // errors need the anyhow chain logged so the root cause is traceable.
        match &self {
            Self::Internal(e) => {
                tracing::error!(error = %e, kind = self.kind(), "internal error");
            }
            Self::MailDelivery(e) => {
                tracing::error!(error = %e, kind = self.kind(), "mail delivery failed");
            }
            _ => {}
        }

        let mut body = serde_json::json!({
            "success": false,
            "error": self.to_string(),
        });
        if let Some(wait) = self.retry_after() {
            body["retryAfter"] = wait.into();
        }

        let mut response = (status, axum::Json(body)).into_response();
        if let Some(wait) = self.retry_after() {
            if let Ok(value) = wait.to_string().parse() {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}
