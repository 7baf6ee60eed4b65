use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use quillbox_domain::pagination::Sort;

// ── Users ────────────────────────────────────────────────────────────────────

/// Account record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub date_of_birth: NaiveDate,
    pub is_email_verified: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Fresh unverified account, as created by the signup flow.
    pub fn new_unverified(email: String, name: String, date_of_birth: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email,
            name,
            date_of_birth,
            is_email_verified: false,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Pre-verified account for an externally authenticated identity
    /// (Google). The provider does not supply a date of birth.
    pub fn new_verified_external(email: String, name: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email,
            name,
            date_of_birth: PLACEHOLDER_DATE_OF_BIRTH,
            is_email_verified: true,
            last_login: Some(now),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Date of birth recorded for externally authenticated accounts until the
/// user fills in their own.
pub const PLACEHOLDER_DATE_OF_BIRTH: NaiveDate = match NaiveDate::from_ymd_opt(1990, 1, 1) {
    Some(d) => d,
    None => unreachable!(),
};

// ── One-time codes ───────────────────────────────────────────────────────────

/// What an OTP was issued for. A code is only valid for the purpose it was
/// issued under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    EmailVerification,
    Login,
}

impl fmt::Display for OtpPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::EmailVerification => "email_verification",
            Self::Login => "login",
        })
    }
}

impl FromStr for OtpPurpose {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email_verification" => Ok(Self::EmailVerification),
            "login" => Ok(Self::Login),
            _ => Err(()),
        }
    }
}

/// One-time code record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Otp {
    pub id: Uuid,
    pub email: String,
    pub code: String,
    pub purpose: OtpPurpose,
    pub expires_at: DateTime<Utc>,
    pub attempts: i32,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

impl Otp {
    /// Pending = unverified and unexpired; the only state verification
    /// queries look at.
    pub fn is_pending(&self) -> bool {
        !self.verified && self.expires_at > Utc::now()
    }
}

/// OTP issue/verify policy. Built from config at startup and injected into
/// the usecases — no ambient globals.
#[derive(Debug, Clone, Copy)]
pub struct OtpPolicy {
    /// Code lifetime from issue.
    pub ttl_minutes: i64,
    /// Wrong-guess budget per issued code.
    pub max_attempts: i32,
    /// Minimum delay between two issues for the same (email, purpose).
    pub resend_cooldown_seconds: i64,
}

impl Default for OtpPolicy {
    fn default() -> Self {
        Self {
            ttl_minutes: 10,
            max_attempts: 3,
            resend_cooldown_seconds: 10,
        }
    }
}

impl OtpPolicy {
    pub fn ttl(&self) -> Duration {
        Duration::minutes(self.ttl_minutes)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::seconds(self.resend_cooldown_seconds)
    }
}

/// Number of decimal digits in a generated code.
pub const OTP_DIGITS: usize = 6;

/// Session token lifetime: 7 days, purely cryptographic (no revocation).
pub const TOKEN_TTL_SECS: u64 = 7 * 24 * 60 * 60;

// ── Notes ────────────────────────────────────────────────────────────────────

/// User-owned note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub is_pinned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Field a note listing is ordered by (after the always-first pinned sort).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoteSortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    Title,
}

impl NoteSortField {
    /// Parse the `sortBy` query value. Unknown values fall back to the
    /// default rather than erroring, matching the existing client contract.
    pub fn from_query(value: &str) -> Self {
        match value {
            "updatedAt" => Self::UpdatedAt,
            "title" => Self::Title,
            _ => Self::CreatedAt,
        }
    }
}

/// Filter applied to note listings and searches. `owner` scoping is implicit
/// in every repository call and not part of this struct.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteFilter {
    /// Restrict to pinned / unpinned notes.
    pub is_pinned: Option<bool>,
    /// Case-insensitive substring matched against title, content, and tags.
    pub query: Option<String>,
    /// Keep notes carrying at least one of these tags.
    pub tags: Option<Vec<String>>,
}

/// Ordering for note listings. Pinned notes always sort first; the field and
/// direction only break ties within each pinned group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoteOrder {
    pub field: NoteSortField,
    pub direction: Sort,
}

/// Field updates for a note; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct NoteChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_pinned: Option<bool>,
}
