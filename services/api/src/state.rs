use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::ApiConfig;
use crate::domain::types::OtpPolicy;
use crate::error::ApiError;
use crate::infra::db::{DbNoteRepository, DbOtpRepository, DbUserRepository};
use crate::infra::google::GoogleClient;
use crate::infra::mail::Mailer;
use crate::ratelimit::RateLimits;

/// Shared application state, cloned per request by axum.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub jwt_secret: String,
    pub otp_policy: OtpPolicy,
    pub mailer: Mailer,
    pub google: GoogleClient,
    pub limits: Arc<RateLimits>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: &ApiConfig) -> Result<Self, ApiError> {
        Ok(Self {
            db,
            jwt_secret: config.jwt_secret.clone(),
            otp_policy: config.otp_policy,
            mailer: Mailer::from_settings(
                config.mail_api_url.clone(),
                config.mail_api_key.clone(),
                config.mail_from.clone(),
            )?,
            google: GoogleClient::new(
                config.google_client_id.clone(),
                config.google_client_secret.clone(),
                config.google_callback_url.clone(),
            )?,
            limits: Arc::new(RateLimits::default()),
        })
    }

    pub fn user_repo(&self) -> DbUserRepository {
        DbUserRepository {
            db: self.db.clone(),
        }
    }

    pub fn otp_repo(&self) -> DbOtpRepository {
        DbOtpRepository {
            db: self.db.clone(),
        }
    }

    pub fn note_repo(&self) -> DbNoteRepository {
        DbNoteRepository {
            db: self.db.clone(),
        }
    }
}
