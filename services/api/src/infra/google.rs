//! Google OAuth. Two entry paths end in the same verified profile: an ID
//! token (credential) posted by the browser one-tap flow, or an
//! authorization code from the redirect flow.

use serde::Deserialize;

use crate::domain::repository::{ExternalProfile, GoogleIdentityPort};
use crate::error::ApiError;

const TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Display name used when the provider does not supply one.
const FALLBACK_NAME: &str = "Google User";

#[derive(Clone)]
pub struct GoogleClient {
    http: reqwest::Client,
    client_id: Option<String>,
    client_secret: Option<String>,
    callback_url: String,
}

#[derive(Deserialize)]
struct TokenInfo {
    aud: String,
    email: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct UserInfo {
    email: String,
    #[serde(default)]
    name: Option<String>,
}

impl GoogleClient {
    pub fn new(
        client_id: Option<String>,
        client_secret: Option<String>,
        callback_url: String,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| ApiError::Internal(e.into()))?;
        Ok(Self {
            http,
            client_id,
            client_secret,
            callback_url,
        })
    }

    fn client_id(&self) -> Result<&str, ApiError> {
        self.client_id
            .as_deref()
            .ok_or_else(|| ApiError::GoogleAuth("Google sign-in is not configured".into()))
    }

    fn client_secret(&self) -> Result<&str, ApiError> {
        self.client_secret
            .as_deref()
            .ok_or_else(|| ApiError::GoogleAuth("Google sign-in is not configured".into()))
    }

    /// Authorization URL the client should redirect the user to.
    pub fn auth_url(&self) -> Result<String, ApiError> {
        let client_id = self.client_id()?;
        Ok(format!(
            "{AUTHORIZE_URL}?client_id={}&redirect_uri={}&response_type=code&scope=openid%20email%20profile",
            urlencode(client_id),
            urlencode(&self.callback_url),
        ))
    }
}

/// Percent-encode a query component. Only the characters that actually occur
/// in client ids and callback URLs need escaping.
fn urlencode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

impl GoogleIdentityPort for GoogleClient {
    async fn verify_credential(&self, credential: &str) -> Result<ExternalProfile, ApiError> {
        let client_id = self.client_id()?;
        let response = self
            .http
            .get(TOKENINFO_URL)
            .query(&[("id_token", credential)])
            .send()
            .await
            .map_err(|e| ApiError::GoogleAuth(format!("tokeninfo request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(ApiError::GoogleAuth("invalid Google credential".into()));
        }
        let info: TokenInfo = response
            .json()
            .await
            .map_err(|e| ApiError::GoogleAuth(format!("malformed tokeninfo response: {e}")))?;

        // The token must have been minted for this application.
        if info.aud != client_id {
            return Err(ApiError::GoogleAuth("credential audience mismatch".into()));
        }

        Ok(ExternalProfile {
            email: info.email,
            name: info.name.unwrap_or_else(|| FALLBACK_NAME.to_owned()),
        })
    }

    async fn exchange_code(&self, code: &str) -> Result<ExternalProfile, ApiError> {
        let params = [
            ("client_id", self.client_id()?),
            ("client_secret", self.client_secret()?),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", &self.callback_url),
        ];
        let response = self
            .http
            .post(TOKEN_URL)
            .form(&params)
            .send()
            .await
            .map_err(|e| ApiError::GoogleAuth(format!("token exchange failed: {e}")))?;

        if !response.status().is_success() {
            return Err(ApiError::GoogleAuth(
                "authorization code was rejected".into(),
            ));
        }
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ApiError::GoogleAuth(format!("malformed token response: {e}")))?;

        let response = self
            .http
            .get(USERINFO_URL)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|e| ApiError::GoogleAuth(format!("userinfo request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(ApiError::GoogleAuth("could not fetch Google profile".into()));
        }
        let info: UserInfo = response
            .json()
            .await
            .map_err(|e| ApiError::GoogleAuth(format!("malformed userinfo response: {e}")))?;

        Ok(ExternalProfile {
            email: info.email,
            name: info.name.unwrap_or_else(|| FALLBACK_NAME.to_owned()),
        })
    }
}
