use crate::domain::types::OtpPolicy;

/// API service configuration loaded from environment variables.
#[derive(Debug)]
pub struct ApiConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// HMAC secret for signing session tokens. Refusing to start without it
    /// beats signing with an empty default.
    pub jwt_secret: String,
    /// TCP port to listen on (default 5000). Env var: `PORT`.
    pub port: u16,
    /// OTP lifetime / attempt / cooldown policy. Env vars: `OTP_TTL_MINUTES`,
    /// `OTP_MAX_ATTEMPTS`, `OTP_RESEND_COOLDOWN_SECONDS`.
    pub otp_policy: OtpPolicy,
    /// Seconds between stale-OTP sweeps (default 60). Env var: `OTP_SWEEP_SECONDS`.
    pub otp_sweep_seconds: u64,
    /// Mail delivery API. When `MAIL_API_URL` is unset the service logs
    /// codes instead of sending them (development mode).
    pub mail_api_url: Option<String>,
    pub mail_api_key: String,
    pub mail_from: String,
    /// Google OAuth client. Sign-in endpoints fail cleanly when unset.
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    pub google_callback_url: String,
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl ApiConfig {
    pub fn from_env() -> Self {
        let defaults = OtpPolicy::default();
        Self {
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL"),
            jwt_secret: std::env::var("JWT_SECRET").expect("JWT_SECRET"),
            port: env_parsed("PORT", 5000),
            otp_policy: OtpPolicy {
                ttl_minutes: env_parsed("OTP_TTL_MINUTES", defaults.ttl_minutes),
                max_attempts: env_parsed("OTP_MAX_ATTEMPTS", defaults.max_attempts),
                resend_cooldown_seconds: env_parsed(
                    "OTP_RESEND_COOLDOWN_SECONDS",
                    defaults.resend_cooldown_seconds,
                ),
            },
            otp_sweep_seconds: env_parsed("OTP_SWEEP_SECONDS", 60),
            mail_api_url: std::env::var("MAIL_API_URL").ok(),
            mail_api_key: std::env::var("MAIL_API_KEY").unwrap_or_default(),
            mail_from: std::env::var("MAIL_FROM")
                .unwrap_or_else(|_| "no-reply@quillbox.app".to_owned()),
            google_client_id: std::env::var("GOOGLE_CLIENT_ID").ok(),
            google_client_secret: std::env::var("GOOGLE_CLIENT_SECRET").ok(),
            google_callback_url: std::env::var("GOOGLE_CALLBACK_URL")
                .unwrap_or_else(|_| "http://localhost:5000/api/auth/google/callback".to_owned()),
        }
    }
}
