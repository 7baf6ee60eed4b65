//! One-time code issue and verification.
//!
//! Per (email, purpose) a code moves `None → Pending → Verified` or dies as
//! expired/exhausted; issue and verify track cooldown, expiry, and a wrong-
//! guess budget independently, which bounds brute force at the attempt cap
//! per issued code.

use chrono::Utc;
use rand::RngExt;
use uuid::Uuid;

use crate::domain::repository::{MailPort, OtpRepository};
use crate::domain::types::{Otp, OtpPolicy, OtpPurpose};
use crate::error::ApiError;

fn generate_code() -> String {
    // Six decimal digits, no leading zero, from the thread-local CSPRNG.
    let mut rng = rand::rng();
    rng.random_range(100_000..1_000_000u32).to_string()
}

// ── RequestOtp ───────────────────────────────────────────────────────────────

pub struct RequestOtpUseCase<O, M>
where
    O: OtpRepository,
    M: MailPort,
{
    pub otps: O,
    pub mailer: M,
    pub policy: OtpPolicy,
}

impl<O, M> RequestOtpUseCase<O, M>
where
    O: OtpRepository,
    M: MailPort,
{
    /// Issue a fresh code for (email, purpose) and hand it to the mail
    /// collaborator. Enforces the resend cooldown against the most recent
    /// code regardless of its state — a just-verified code still throttles
    /// the next issue until the window passes.
    pub async fn execute(&self, email: &str, purpose: OtpPurpose) -> Result<(), ApiError> {
        if let Some(prev) = self.otps.latest(email, purpose).await? {
            let elapsed = Utc::now() - prev.created_at;
            let cooldown = self.policy.cooldown();
            if elapsed < cooldown {
                let wait_seconds = (cooldown - elapsed).num_seconds().max(1);
                return Err(ApiError::OtpCooldown { wait_seconds });
            }
        }

        // One authoritative code per (email, purpose).
        self.otps.delete_for(email, purpose).await?;

        let now = Utc::now();
        let otp = Otp {
            id: Uuid::new_v4(),
            email: email.to_owned(),
            code: generate_code(),
            purpose,
            expires_at: now + self.policy.ttl(),
            attempts: 0,
            verified: false,
            created_at: now,
        };
        self.otps.create(&otp).await?;

        if let Err(err) = self.mailer.send_otp(email, &otp.code, purpose).await {
            // Undelivered codes must not count against the user.
            self.otps.delete(otp.id).await?;
            return Err(err);
        }

        tracing::info!(email, %purpose, "OTP issued");
        Ok(())
    }
}

// ── VerifyOtp ────────────────────────────────────────────────────────────────

pub struct VerifyOtpUseCase<O: OtpRepository> {
    pub otps: O,
    pub policy: OtpPolicy,
}

impl<O: OtpRepository> VerifyOtpUseCase<O> {
    /// Check a submitted code against the pending one for (email, purpose).
    ///
    /// Attempts are counted unconditionally; the final wrong guess deletes
    /// the code, so a later submission — even the correct one — fails as
    /// not-found until a new code is requested.
    pub async fn execute(
        &self,
        email: &str,
        purpose: OtpPurpose,
        submitted: &str,
    ) -> Result<(), ApiError> {
        let Some(mut otp) = self.otps.find_pending(email, purpose).await? else {
            return Err(ApiError::InvalidOtp);
        };

        otp.attempts += 1;

        if otp.attempts > self.policy.max_attempts {
            self.otps.delete(otp.id).await?;
            return Err(ApiError::OtpExhausted);
        }

        if otp.code != submitted {
            if otp.attempts >= self.policy.max_attempts {
                self.otps.delete(otp.id).await?;
                return Err(ApiError::OtpExhausted);
            }
            let remaining = self.policy.max_attempts - otp.attempts;
            self.otps.update(&otp).await?;
            return Err(ApiError::WrongOtp { remaining });
        }

        // Consumed: marked verified, left for the sweep to remove.
        otp.verified = true;
        self.otps.update(&otp).await?;
        tracing::info!(email, %purpose, "OTP verified");
        Ok(())
    }
}

// ── Sweep ────────────────────────────────────────────────────────────────────

/// Periodic cleanup of expired and verified codes. Spawned at startup; the
/// verification queries never see those rows either way, so losing a tick is
/// harmless.
pub async fn run_otp_sweep<O: OtpRepository>(otps: O, interval_seconds: u64) {
    let mut ticker = tokio::time::interval(std::time::Duration::from_secs(interval_seconds));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        match otps.purge_stale().await {
            Ok(0) => {}
            Ok(n) => tracing::info!(purged = n, "swept stale OTPs"),
            Err(e) => tracing::warn!(error = %e, "OTP sweep failed"),
        }
    }
}
