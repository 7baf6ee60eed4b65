//! Outbound mail. Production deployments point `MAIL_API_URL` at an HTTP
//! mail provider; without it the service logs codes instead, which is what
//! local development wants anyway.

use anyhow::anyhow;
use serde::Serialize;

use crate::domain::repository::MailPort;
use crate::domain::types::OtpPurpose;
use crate::error::ApiError;

#[derive(Clone)]
pub enum Mailer {
    Http(HttpMailer),
    /// Development fallback: log the code at info level instead of sending.
    Log,
}

impl Mailer {
    pub fn from_settings(
        api_url: Option<String>,
        api_key: String,
        from: String,
    ) -> Result<Self, ApiError> {
        match api_url {
            Some(api_url) => Ok(Self::Http(HttpMailer::new(api_url, api_key, from)?)),
            None => Ok(Self::Log),
        }
    }
}

impl MailPort for Mailer {
    async fn send_otp(&self, email: &str, code: &str, purpose: OtpPurpose) -> Result<(), ApiError> {
        match self {
            Self::Http(mailer) => mailer.send_otp(email, code, purpose).await,
            Self::Log => {
                tracing::info!(email, code, %purpose, "mail delivery disabled; otp logged");
                Ok(())
            }
        }
    }
}

#[derive(Clone)]
pub struct HttpMailer {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    from: String,
}

#[derive(Serialize)]
struct MailMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: String,
}

fn subject(purpose: OtpPurpose) -> &'static str {
    match purpose {
        OtpPurpose::EmailVerification => "Verify your email",
        OtpPurpose::Login => "Your login code",
    }
}

impl HttpMailer {
    pub fn new(api_url: String, api_key: String, from: String) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| ApiError::Internal(e.into()))?;
        Ok(Self {
            http,
            api_url,
            api_key,
            from,
        })
    }

    async fn send_otp(&self, email: &str, code: &str, purpose: OtpPurpose) -> Result<(), ApiError> {
        let message = MailMessage {
            from: &self.from,
            to: email,
            subject: subject(purpose),
            text: format!("Your verification code is {code}. It expires in 10 minutes."),
        };
        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&message)
            .send()
            .await
            .map_err(|e| ApiError::MailDelivery(e.into()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::MailDelivery(anyhow!(
                "mail provider returned {status}: {body}"
            )));
        }
        Ok(())
    }
}
