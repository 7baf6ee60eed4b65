#![allow(async_fn_in_trait)]

use uuid::Uuid;

use quillbox_domain::pagination::PageRequest;

use crate::domain::types::{Note, NoteChanges, NoteFilter, NoteOrder, Otp, OtpPurpose, User};
use crate::error::ApiError;

/// Repository for account records.
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, ApiError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError>;

    async fn create(&self, user: &User) -> Result<(), ApiError>;

    /// Delete an account. Only ever called for unverified accounts being
    /// replaced by a fresh signup.
    async fn delete(&self, id: Uuid) -> Result<(), ApiError>;

    /// Flip the verified flag and return the updated record, or `None` if
    /// no account exists for the email.
    async fn mark_verified(&self, email: &str) -> Result<Option<User>, ApiError>;

    /// Stamp `last_login = now` and return the updated record, or `None`
    /// if the account vanished in the meantime.
    async fn touch_last_login(&self, id: Uuid) -> Result<Option<User>, ApiError>;
}

/// Repository for one-time codes.
pub trait OtpRepository: Send + Sync {
    /// Most recent code for (email, purpose), regardless of state. Drives
    /// the resend cooldown.
    async fn latest(&self, email: &str, purpose: OtpPurpose) -> Result<Option<Otp>, ApiError>;

    /// Most recent pending (unverified, unexpired) code for (email, purpose).
    async fn find_pending(&self, email: &str, purpose: OtpPurpose)
    -> Result<Option<Otp>, ApiError>;

    async fn create(&self, otp: &Otp) -> Result<(), ApiError>;

    /// Persist an updated attempt counter / verified flag.
    async fn update(&self, otp: &Otp) -> Result<(), ApiError>;

    async fn delete(&self, id: Uuid) -> Result<(), ApiError>;

    /// Remove every code for (email, purpose). Called before issuing a new
    /// one so at most one code is authoritative per pair.
    async fn delete_for(&self, email: &str, purpose: OtpPurpose) -> Result<(), ApiError>;

    /// Remove every code for an email across purposes (unverified-account
    /// re-registration).
    async fn delete_all_for_email(&self, email: &str) -> Result<(), ApiError>;

    /// TTL sweep: drop expired and already-verified codes, returning how
    /// many rows went away.
    async fn purge_stale(&self) -> Result<u64, ApiError>;
}

/// Repository for notes. Every operation is scoped to the owning user; a
/// note owned by someone else behaves exactly like a missing one.
pub trait NoteRepository: Send + Sync {
    async fn count(&self, owner: Uuid, filter: &NoteFilter) -> Result<u64, ApiError>;

    async fn list(
        &self,
        owner: Uuid,
        filter: &NoteFilter,
        order: NoteOrder,
        page: PageRequest,
    ) -> Result<Vec<Note>, ApiError>;

    async fn find(&self, id: Uuid, owner: Uuid) -> Result<Option<Note>, ApiError>;

    async fn insert(&self, note: &Note) -> Result<(), ApiError>;

    /// Apply changes and return the updated note, or `None` when the note
    /// is missing or not owned by `owner`.
    async fn update(
        &self,
        id: Uuid,
        owner: Uuid,
        changes: &NoteChanges,
    ) -> Result<Option<Note>, ApiError>;

    /// Returns `true` if a row was removed.
    async fn delete(&self, id: Uuid, owner: Uuid) -> Result<bool, ApiError>;

    /// Delete the listed notes that belong to `owner`, returning the count
    /// actually removed. Foreign and unknown ids are skipped silently.
    async fn delete_many(&self, ids: &[Uuid], owner: Uuid) -> Result<u64, ApiError>;
}

/// Outbound mail delivery for one-time codes.
pub trait MailPort: Send + Sync {
    async fn send_otp(&self, email: &str, code: &str, purpose: OtpPurpose) -> Result<(), ApiError>;
}

/// Identity profile obtained from the external OAuth provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalProfile {
    pub email: String,
    pub name: String,
}

/// Google OAuth collaborator: both the bearer-credential and the
/// authorization-code variants end in a verified [`ExternalProfile`].
pub trait GoogleIdentityPort: Send + Sync {
    async fn verify_credential(&self, credential: &str) -> Result<ExternalProfile, ApiError>;

    async fn exchange_code(&self, code: &str) -> Result<ExternalProfile, ApiError>;
}
