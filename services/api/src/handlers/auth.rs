//! Authentication endpoints.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use quillbox_core::envelope::ApiResponse;
use quillbox_core::serde::to_rfc3339_ms;

use crate::domain::types::User;
use crate::error::ApiError;
use crate::extract::AuthUser;
use crate::infra::db::{DbOtpRepository, DbUserRepository};
use crate::infra::google::GoogleClient;
use crate::infra::mail::Mailer;
use crate::state::AppState;
use crate::usecase::auth::{
    AuthOutput, GetProfileUseCase, GoogleSignInUseCase, LoginUseCase, ResendOtpUseCase,
    SignupInput, SignupUseCase, VerifyLoginUseCase, VerifySignupUseCase,
};
use crate::usecase::otp::{RequestOtpUseCase, VerifyOtpUseCase};

// ── Wire types ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub date_of_birth: NaiveDate,
    pub is_email_verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            date_of_birth: user.date_of_birth,
            is_email_verified: user.is_email_verified,
            last_login: user.last_login,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthData {
    pub user: UserResponse,
    pub token: String,
}

impl From<AuthOutput> for AuthData {
    fn from(output: AuthOutput) -> Self {
        Self {
            user: output.user.into(),
            token: output.token,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpSentData {
    pub email: String,
    pub otp_sent: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: String,
    pub name: String,
    pub date_of_birth: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Deserialize)]
pub struct ResendOtpRequest {
    pub email: String,
    pub purpose: String,
}

#[derive(Debug, Deserialize)]
pub struct GoogleSignInRequest {
    pub credential: String,
}

#[derive(Debug, Deserialize)]
pub struct GoogleCallbackQuery {
    pub code: Option<String>,
}

// ── Usecase wiring ───────────────────────────────────────────────────────────

fn request_otp(state: &AppState) -> RequestOtpUseCase<DbOtpRepository, Mailer> {
    RequestOtpUseCase {
        otps: state.otp_repo(),
        mailer: state.mailer.clone(),
        policy: state.otp_policy,
    }
}

fn verify_otp(state: &AppState) -> VerifyOtpUseCase<DbOtpRepository> {
    VerifyOtpUseCase {
        otps: state.otp_repo(),
        policy: state.otp_policy,
    }
}

fn google_sign_in(state: &AppState) -> GoogleSignInUseCase<DbUserRepository, GoogleClient> {
    GoogleSignInUseCase {
        users: state.user_repo(),
        google: state.google.clone(),
        jwt_secret: state.jwt_secret.clone(),
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

pub async fn signup(
    State(state): State<AppState>,
    Json(body): Json<SignupRequest>,
) -> Result<(StatusCode, Json<ApiResponse<OtpSentData>>), ApiError> {
    let usecase = SignupUseCase {
        users: state.user_repo(),
        otps: state.otp_repo(),
        request_otp: request_otp(&state),
    };
    let user = usecase
        .execute(SignupInput {
            email: body.email,
            name: body.name,
            date_of_birth: body.date_of_birth,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "User created successfully. OTP sent to your email.",
            OtpSentData {
                email: user.email,
                otp_sent: true,
            },
        )),
    ))
}

pub async fn verify_otp_handler(
    State(state): State<AppState>,
    Json(body): Json<VerifyOtpRequest>,
) -> Result<Json<ApiResponse<AuthData>>, ApiError> {
    let usecase = VerifySignupUseCase {
        users: state.user_repo(),
        verify_otp: verify_otp(&state),
        jwt_secret: state.jwt_secret.clone(),
    };
    let output = usecase.execute(&body.email, &body.otp).await?;
    Ok(Json(ApiResponse::with_message(
        "Email verified successfully",
        output.into(),
    )))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<EmailRequest>,
) -> Result<Json<ApiResponse<OtpSentData>>, ApiError> {
    let usecase = LoginUseCase {
        users: state.user_repo(),
        request_otp: request_otp(&state),
    };
    let email = usecase.execute(&body.email).await?;
    Ok(Json(ApiResponse::with_message(
        "OTP sent to your email for login verification.",
        OtpSentData {
            email,
            otp_sent: true,
        },
    )))
}

pub async fn verify_login_otp(
    State(state): State<AppState>,
    Json(body): Json<VerifyOtpRequest>,
) -> Result<Json<ApiResponse<AuthData>>, ApiError> {
    let usecase = VerifyLoginUseCase {
        users: state.user_repo(),
        verify_otp: verify_otp(&state),
        jwt_secret: state.jwt_secret.clone(),
    };
    let output = usecase.execute(&body.email, &body.otp).await?;
    Ok(Json(ApiResponse::with_message(
        "Login successful",
        output.into(),
    )))
}

pub async fn resend_otp(
    State(state): State<AppState>,
    Json(body): Json<ResendOtpRequest>,
) -> Result<Json<ApiResponse<OtpSentData>>, ApiError> {
    let usecase = ResendOtpUseCase {
        users: state.user_repo(),
        request_otp: request_otp(&state),
    };
    usecase.execute(&body.email, &body.purpose).await?;
    Ok(Json(ApiResponse::with_message(
        "OTP resent successfully",
        OtpSentData {
            email: body.email,
            otp_sent: true,
        },
    )))
}

#[derive(Debug, Serialize)]
pub struct ProfileData {
    pub user: UserResponse,
}

pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<ProfileData>>, ApiError> {
    let usecase = GetProfileUseCase {
        users: state.user_repo(),
    };
    let user = usecase.execute(auth.user_id).await?;
    Ok(Json(ApiResponse::data(ProfileData { user: user.into() })))
}

/// Sessions are stateless bearer tokens, so logout is client-side discard;
/// the endpoint exists for API symmetry.
pub async fn logout(_auth: AuthUser) -> Json<ApiResponse<()>> {
    Json(ApiResponse::message("Logged out successfully"))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleAuthUrlData {
    pub auth_url: String,
}

pub async fn google_auth_url(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<GoogleAuthUrlData>>, ApiError> {
    let auth_url = state.google.auth_url()?;
    Ok(Json(ApiResponse::data(GoogleAuthUrlData { auth_url })))
}

pub async fn google_sign_in_handler(
    State(state): State<AppState>,
    Json(body): Json<GoogleSignInRequest>,
) -> Result<Json<ApiResponse<AuthData>>, ApiError> {
    if body.credential.trim().is_empty() {
        return Err(ApiError::Validation("Google credential is required".into()));
    }
    let output = google_sign_in(&state)
        .with_credential(&body.credential)
        .await?;
    Ok(Json(ApiResponse::with_message(
        "Login successful",
        output.into(),
    )))
}

pub async fn google_callback(
    State(state): State<AppState>,
    Query(query): Query<GoogleCallbackQuery>,
) -> Result<Json<ApiResponse<AuthData>>, ApiError> {
    let code = query
        .code
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::Validation("authorization code is required".into()))?;
    let output = google_sign_in(&state).with_code(code).await?;
    Ok(Json(ApiResponse::with_message(
        "Login successful",
        output.into(),
    )))
}
