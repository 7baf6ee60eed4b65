//! Note CRUD, listing, and search. Every operation is scoped to the owner;
//! a note belonging to someone else is indistinguishable from a missing one.

use chrono::Utc;
use uuid::Uuid;

use quillbox_domain::pagination::{PageInfo, PageRequest};
use quillbox_domain::tag::normalize_tags;

use crate::domain::repository::NoteRepository;
use crate::domain::types::{Note, NoteChanges, NoteFilter, NoteOrder};
use crate::error::ApiError;

/// Title bounds in characters.
pub const MAX_TITLE_LEN: usize = 200;

/// Content bounds in characters.
pub const MAX_CONTENT_LEN: usize = 10_000;

fn checked_title(raw: &str) -> Result<String, ApiError> {
    let title = raw.trim();
    let len = title.chars().count();
    if len == 0 || len > MAX_TITLE_LEN {
        return Err(ApiError::Validation(format!(
            "title must be between 1 and {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(title.to_owned())
}

fn checked_content(raw: &str) -> Result<String, ApiError> {
    let len = raw.chars().count();
    if len == 0 || len > MAX_CONTENT_LEN {
        return Err(ApiError::Validation(format!(
            "content must be between 1 and {MAX_CONTENT_LEN} characters"
        )));
    }
    Ok(raw.to_owned())
}

/// A page of notes plus its metadata.
#[derive(Debug)]
pub struct NotePage {
    pub notes: Vec<Note>,
    pub page_info: PageInfo,
}

// ── List / search ────────────────────────────────────────────────────────────

pub struct ListNotesUseCase<R: NoteRepository> {
    pub repo: R,
}

impl<R: NoteRepository> ListNotesUseCase<R> {
    pub async fn execute(
        &self,
        owner: Uuid,
        filter: NoteFilter,
        order: NoteOrder,
        page: PageRequest,
    ) -> Result<NotePage, ApiError> {
        let page = page.clamped();
        let total = self.repo.count(owner, &filter).await?;
        let notes = self.repo.list(owner, &filter, order, page).await?;
        Ok(NotePage {
            notes,
            page_info: PageInfo::new(total, page),
        })
    }
}

// ── Create ───────────────────────────────────────────────────────────────────

pub struct CreateNoteInput {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub is_pinned: bool,
}

pub struct CreateNoteUseCase<R: NoteRepository> {
    pub repo: R,
}

impl<R: NoteRepository> CreateNoteUseCase<R> {
    pub async fn execute(&self, owner: Uuid, input: CreateNoteInput) -> Result<Note, ApiError> {
        let now = Utc::now();
        let note = Note {
            id: Uuid::new_v4(),
            user_id: owner,
            title: checked_title(&input.title)?,
            content: checked_content(&input.content)?,
            tags: normalize_tags(&input.tags),
            is_pinned: input.is_pinned,
            created_at: now,
            updated_at: now,
        };
        self.repo.insert(&note).await?;
        Ok(note)
    }
}

// ── Get ──────────────────────────────────────────────────────────────────────

pub struct GetNoteUseCase<R: NoteRepository> {
    pub repo: R,
}

impl<R: NoteRepository> GetNoteUseCase<R> {
    pub async fn execute(&self, id: Uuid, owner: Uuid) -> Result<Note, ApiError> {
        self.repo
            .find(id, owner)
            .await?
            .ok_or(ApiError::NoteNotFound)
    }
}

// ── Update ───────────────────────────────────────────────────────────────────

pub struct UpdateNoteInput {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_pinned: Option<bool>,
}

pub struct UpdateNoteUseCase<R: NoteRepository> {
    pub repo: R,
}

impl<R: NoteRepository> UpdateNoteUseCase<R> {
    pub async fn execute(
        &self,
        id: Uuid,
        owner: Uuid,
        input: UpdateNoteInput,
    ) -> Result<Note, ApiError> {
        let changes = NoteChanges {
            title: input.title.as_deref().map(checked_title).transpose()?,
            content: input.content.as_deref().map(checked_content).transpose()?,
            tags: input.tags.map(normalize_tags),
            is_pinned: input.is_pinned,
        };
        self.repo
            .update(id, owner, &changes)
            .await?
            .ok_or(ApiError::NoteNotFound)
    }
}

// ── Delete ───────────────────────────────────────────────────────────────────

pub struct DeleteNoteUseCase<R: NoteRepository> {
    pub repo: R,
}

impl<R: NoteRepository> DeleteNoteUseCase<R> {
    pub async fn execute(&self, id: Uuid, owner: Uuid) -> Result<(), ApiError> {
        if !self.repo.delete(id, owner).await? {
            return Err(ApiError::NoteNotFound);
        }
        Ok(())
    }
}

// ── Toggle pin ───────────────────────────────────────────────────────────────

pub struct TogglePinUseCase<R: NoteRepository> {
    pub repo: R,
}

impl<R: NoteRepository> TogglePinUseCase<R> {
    pub async fn execute(&self, id: Uuid, owner: Uuid) -> Result<Note, ApiError> {
        let note = self
            .repo
            .find(id, owner)
            .await?
            .ok_or(ApiError::NoteNotFound)?;
        let changes = NoteChanges {
            is_pinned: Some(!note.is_pinned),
            ..Default::default()
        };
        self.repo
            .update(id, owner, &changes)
            .await?
            .ok_or(ApiError::NoteNotFound)
    }
}

// ── Bulk delete ──────────────────────────────────────────────────────────────

pub struct BulkDeleteNotesUseCase<R: NoteRepository> {
    pub repo: R,
}

impl<R: NoteRepository> BulkDeleteNotesUseCase<R> {
    /// Delete the caller's notes among `ids`, reporting how many actually
    /// went away. Ids owned by others or unknown are skipped silently — the
    /// count is the only signal.
    pub async fn execute(&self, ids: &[Uuid], owner: Uuid) -> Result<u64, ApiError> {
        if ids.is_empty() {
            return Err(ApiError::Validation("note IDs array is required".into()));
        }
        self.repo.delete_many(ids, owner).await
    }
}
