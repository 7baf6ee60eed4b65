//! Signup / login orchestration over the OTP and token services.
//!
//! Two parallel email flows (signup with verification, login) plus the
//! Google path that bypasses OTP entirely, trusting the external provider.

use quillbox_domain::email::{is_valid_email, normalize_email};
use quillbox_domain::user::{validate_date_of_birth, validate_name};
use uuid::Uuid;

use crate::domain::repository::{
    ExternalProfile, GoogleIdentityPort, MailPort, OtpRepository, UserRepository,
};
use crate::domain::types::{OtpPurpose, User};
use crate::error::ApiError;
use crate::usecase::otp::{RequestOtpUseCase, VerifyOtpUseCase};
use crate::usecase::token::issue_token;

/// Successful authentication: the account plus a fresh session token.
#[derive(Debug)]
pub struct AuthOutput {
    pub user: User,
    pub token: String,
}

fn checked_email(raw: &str) -> Result<String, ApiError> {
    let email = normalize_email(raw);
    if !is_valid_email(&email) {
        return Err(ApiError::Validation("invalid email format".into()));
    }
    Ok(email)
}

fn checked_otp_format(raw: &str) -> Result<(), ApiError> {
    if raw.len() == 6 && raw.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ApiError::Validation("OTP must be a 6-digit number".into()))
    }
}

// ── Signup ───────────────────────────────────────────────────────────────────

pub struct SignupInput {
    pub email: String,
    pub name: String,
    pub date_of_birth: String,
}

pub struct SignupUseCase<U, O, M>
where
    U: UserRepository,
    O: OtpRepository,
    M: MailPort,
{
    pub users: U,
    pub otps: O,
    pub request_otp: RequestOtpUseCase<O, M>,
}

impl<U, O, M> SignupUseCase<U, O, M>
where
    U: UserRepository,
    O: OtpRepository,
    M: MailPort,
{
    /// Create an unverified account and send the verification code.
    /// Returns the normalized email the code was sent to.
    pub async fn execute(&self, input: SignupInput) -> Result<User, ApiError> {
        let email = checked_email(&input.email)?;
        let name = validate_name(&input.name).map_err(|e| ApiError::Validation(e.to_string()))?;
        let date_of_birth = validate_date_of_birth(&input.date_of_birth)
            .map_err(|e| ApiError::Validation(e.to_string()))?;

        if let Some(existing) = self.users.find_by_email(&email).await? {
            if existing.is_email_verified {
                return Err(ApiError::UserAlreadyExists);
            }
            // Unverified leftover from an abandoned signup: replace it.
            self.users.delete(existing.id).await?;
            self.otps.delete_all_for_email(&email).await?;
        }

        let user = User::new_unverified(email.clone(), name, date_of_birth);
        self.users.create(&user).await?;

        if let Err(err) = self
            .request_otp
            .execute(&email, OtpPurpose::EmailVerification)
            .await
        {
            // Without a deliverable code the account is unusable; roll it back.
            self.users.delete(user.id).await?;
            return Err(err);
        }

        Ok(user)
    }
}

// ── Verify signup ────────────────────────────────────────────────────────────

pub struct VerifySignupUseCase<U, O>
where
    U: UserRepository,
    O: OtpRepository,
{
    pub users: U,
    pub verify_otp: VerifyOtpUseCase<O>,
    pub jwt_secret: String,
}

impl<U, O> VerifySignupUseCase<U, O>
where
    U: UserRepository,
    O: OtpRepository,
{
    pub async fn execute(&self, email: &str, otp: &str) -> Result<AuthOutput, ApiError> {
        let email = checked_email(email)?;
        checked_otp_format(otp)?;

        self.verify_otp
            .execute(&email, OtpPurpose::EmailVerification, otp)
            .await?;

        let user = self
            .users
            .mark_verified(&email)
            .await?
            .ok_or(ApiError::UserNotFound)?;

        let token = issue_token(user.id, &user.email, &self.jwt_secret)?;
        Ok(AuthOutput { user, token })
    }
}

// ── Login (request code) ─────────────────────────────────────────────────────

pub struct LoginUseCase<U, O, M>
where
    U: UserRepository,
    O: OtpRepository,
    M: MailPort,
{
    pub users: U,
    pub request_otp: RequestOtpUseCase<O, M>,
}

impl<U, O, M> LoginUseCase<U, O, M>
where
    U: UserRepository,
    O: OtpRepository,
    M: MailPort,
{
    pub async fn execute(&self, email: &str) -> Result<String, ApiError> {
        let email = checked_email(email)?;

        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(ApiError::UserNotFound)?;
        if !user.is_email_verified {
            return Err(ApiError::EmailNotVerified);
        }

        self.request_otp.execute(&email, OtpPurpose::Login).await?;
        Ok(email)
    }
}

// ── Verify login ─────────────────────────────────────────────────────────────

pub struct VerifyLoginUseCase<U, O>
where
    U: UserRepository,
    O: OtpRepository,
{
    pub users: U,
    pub verify_otp: VerifyOtpUseCase<O>,
    pub jwt_secret: String,
}

impl<U, O> VerifyLoginUseCase<U, O>
where
    U: UserRepository,
    O: OtpRepository,
{
    pub async fn execute(&self, email: &str, otp: &str) -> Result<AuthOutput, ApiError> {
        let email = checked_email(email)?;
        checked_otp_format(otp)?;

        self.verify_otp
            .execute(&email, OtpPurpose::Login, otp)
            .await?;

        // The account must still exist and still be verified; anything else
        // reads as not-found to the caller.
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .filter(|u| u.is_email_verified)
            .ok_or(ApiError::UserNotFound)?;

        // Return the stamped record so the response carries this login.
        let user = self
            .users
            .touch_last_login(user.id)
            .await?
            .ok_or(ApiError::UserNotFound)?;

        let token = issue_token(user.id, &user.email, &self.jwt_secret)?;
        Ok(AuthOutput { user, token })
    }
}

// ── Resend ───────────────────────────────────────────────────────────────────

pub struct ResendOtpUseCase<U, O, M>
where
    U: UserRepository,
    O: OtpRepository,
    M: MailPort,
{
    pub users: U,
    pub request_otp: RequestOtpUseCase<O, M>,
}

impl<U, O, M> ResendOtpUseCase<U, O, M>
where
    U: UserRepository,
    O: OtpRepository,
    M: MailPort,
{
    pub async fn execute(&self, email: &str, purpose: &str) -> Result<(), ApiError> {
        let email = checked_email(email)?;
        let purpose: OtpPurpose = purpose.parse().map_err(|_| {
            ApiError::Validation("purpose must be email_verification or login".into())
        })?;

        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(ApiError::UserNotFound)?;
        if purpose == OtpPurpose::Login && !user.is_email_verified {
            return Err(ApiError::EmailNotVerified);
        }

        self.request_otp.execute(&email, purpose).await
    }
}

// ── Google sign-in ───────────────────────────────────────────────────────────

pub struct GoogleSignInUseCase<U, G>
where
    U: UserRepository,
    G: GoogleIdentityPort,
{
    pub users: U,
    pub google: G,
    pub jwt_secret: String,
}

impl<U, G> GoogleSignInUseCase<U, G>
where
    U: UserRepository,
    G: GoogleIdentityPort,
{
    /// Bearer-credential variant: the client obtained an ID credential
    /// directly and posts it to us.
    pub async fn with_credential(&self, credential: &str) -> Result<AuthOutput, ApiError> {
        let profile = self.google.verify_credential(credential).await?;
        self.sign_in(profile).await
    }

    /// Redirect variant: we exchange the provider's authorization code.
    pub async fn with_code(&self, code: &str) -> Result<AuthOutput, ApiError> {
        let profile = self.google.exchange_code(code).await?;
        self.sign_in(profile).await
    }

    /// Find-or-create the account for a provider-verified identity. The
    /// provider is the trust anchor, so the account is born verified with a
    /// placeholder date of birth.
    async fn sign_in(&self, profile: ExternalProfile) -> Result<AuthOutput, ApiError> {
        let email = normalize_email(&profile.email);

        let user = match self.users.find_by_email(&email).await? {
            Some(user) => self
                .users
                .touch_last_login(user.id)
                .await?
                .ok_or(ApiError::UserNotFound)?,
            None => {
                let user = User::new_verified_external(email, profile.name);
                self.users.create(&user).await?;
                user
            }
        };

        let token = issue_token(user.id, &user.email, &self.jwt_secret)?;
        Ok(AuthOutput { user, token })
    }
}

// ── Profile ──────────────────────────────────────────────────────────────────

pub struct GetProfileUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> GetProfileUseCase<U> {
    pub async fn execute(&self, user_id: Uuid) -> Result<User, ApiError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(ApiError::UserNotFound)
    }
}
