pub mod auth;
pub mod note;

use crate::error::ApiError;
use crate::ratelimit::RateLimiter;

/// Charge one request against `limiter` for `key`, surfacing exhaustion as a
/// 429 with its retry-after hint.
fn charge(limiter: &RateLimiter, key: impl ToString) -> Result<(), ApiError> {
    limiter
        .check(&key.to_string())
        .map_err(|retry_after_seconds| ApiError::RateLimited {
            retry_after_seconds,
        })
}
