use std::sync::{Arc, Mutex};

use chrono::{Duration, NaiveDate, Utc};
use uuid::Uuid;

use quillbox_api::domain::repository::{
    ExternalProfile, GoogleIdentityPort, MailPort, NoteRepository, OtpRepository, UserRepository,
};
use quillbox_api::domain::types::{
    Note, NoteChanges, NoteFilter, NoteOrder, NoteSortField, Otp, OtpPurpose, User,
};
use quillbox_api::error::ApiError;
use quillbox_domain::pagination::{PageRequest, Sort};

pub const TEST_SECRET: &str = "integration-test-secret";

// ── Fixtures ─────────────────────────────────────────────────────────────────

pub fn test_user(email: &str, verified: bool) -> User {
    let now = Utc::now();
    User {
        id: Uuid::new_v4(),
        email: email.to_owned(),
        name: "Test User".to_owned(),
        date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
        is_email_verified: verified,
        last_login: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn test_otp(email: &str, code: &str, purpose: OtpPurpose) -> Otp {
    let now = Utc::now();
    Otp {
        id: Uuid::new_v4(),
        email: email.to_owned(),
        code: code.to_owned(),
        purpose,
        expires_at: now + Duration::minutes(10),
        attempts: 0,
        verified: false,
        created_at: now,
    }
}

pub fn test_note(owner: Uuid, title: &str) -> Note {
    let now = Utc::now();
    Note {
        id: Uuid::new_v4(),
        user_id: owner,
        title: title.to_owned(),
        content: format!("content of {title}"),
        tags: vec![],
        is_pinned: false,
        created_at: now,
        updated_at: now,
    }
}

// ── MockUserRepo ─────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockUserRepo {
    pub users: Arc<Mutex<Vec<User>>>,
}

impl MockUserRepo {
    pub fn new(users: Vec<User>) -> Self {
        Self {
            users: Arc::new(Mutex::new(users)),
        }
    }

    pub fn empty() -> Self {
        Self::new(vec![])
    }

    pub fn handle(&self) -> Arc<Mutex<Vec<User>>> {
        Arc::clone(&self.users)
    }
}

impl UserRepository for MockUserRepo {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, ApiError> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn create(&self, user: &User) -> Result<(), ApiError> {
        self.users.lock().unwrap().push(user.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        self.users.lock().unwrap().retain(|u| u.id != id);
        Ok(())
    }

    async fn mark_verified(&self, email: &str) -> Result<Option<User>, ApiError> {
        let mut users = self.users.lock().unwrap();
        let Some(user) = users.iter_mut().find(|u| u.email == email) else {
            return Ok(None);
        };
        user.is_email_verified = true;
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn touch_last_login(&self, id: Uuid) -> Result<Option<User>, ApiError> {
        let mut users = self.users.lock().unwrap();
        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        user.last_login = Some(Utc::now());
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }
}

// ── MockOtpRepo ──────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockOtpRepo {
    pub otps: Arc<Mutex<Vec<Otp>>>,
}

impl MockOtpRepo {
    pub fn new(otps: Vec<Otp>) -> Self {
        Self {
            otps: Arc::new(Mutex::new(otps)),
        }
    }

    pub fn empty() -> Self {
        Self::new(vec![])
    }

    pub fn handle(&self) -> Arc<Mutex<Vec<Otp>>> {
        Arc::clone(&self.otps)
    }
}

impl OtpRepository for MockOtpRepo {
    async fn latest(&self, email: &str, purpose: OtpPurpose) -> Result<Option<Otp>, ApiError> {
        Ok(self
            .otps
            .lock()
            .unwrap()
            .iter()
            .filter(|o| o.email == email && o.purpose == purpose)
            .max_by_key(|o| o.created_at)
            .cloned())
    }

    async fn find_pending(
        &self,
        email: &str,
        purpose: OtpPurpose,
    ) -> Result<Option<Otp>, ApiError> {
        Ok(self
            .otps
            .lock()
            .unwrap()
            .iter()
            .filter(|o| o.email == email && o.purpose == purpose && o.is_pending())
            .max_by_key(|o| o.created_at)
            .cloned())
    }

    async fn create(&self, otp: &Otp) -> Result<(), ApiError> {
        self.otps.lock().unwrap().push(otp.clone());
        Ok(())
    }

    async fn update(&self, otp: &Otp) -> Result<(), ApiError> {
        let mut otps = self.otps.lock().unwrap();
        if let Some(stored) = otps.iter_mut().find(|o| o.id == otp.id) {
            stored.attempts = otp.attempts;
            stored.verified = otp.verified;
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        self.otps.lock().unwrap().retain(|o| o.id != id);
        Ok(())
    }

    async fn delete_for(&self, email: &str, purpose: OtpPurpose) -> Result<(), ApiError> {
        self.otps
            .lock()
            .unwrap()
            .retain(|o| !(o.email == email && o.purpose == purpose));
        Ok(())
    }

    async fn delete_all_for_email(&self, email: &str) -> Result<(), ApiError> {
        self.otps.lock().unwrap().retain(|o| o.email != email);
        Ok(())
    }

    async fn purge_stale(&self) -> Result<u64, ApiError> {
        let mut otps = self.otps.lock().unwrap();
        let before = otps.len();
        let now = Utc::now();
        otps.retain(|o| !o.verified && o.expires_at > now);
        Ok((before - otps.len()) as u64)
    }
}

// ── MockNoteRepo ─────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockNoteRepo {
    pub notes: Arc<Mutex<Vec<Note>>>,
}

impl MockNoteRepo {
    pub fn new(notes: Vec<Note>) -> Self {
        Self {
            notes: Arc::new(Mutex::new(notes)),
        }
    }

    pub fn empty() -> Self {
        Self::new(vec![])
    }

    pub fn handle(&self) -> Arc<Mutex<Vec<Note>>> {
        Arc::clone(&self.notes)
    }
}

fn matches(note: &Note, owner: Uuid, filter: &NoteFilter) -> bool {
    if note.user_id != owner {
        return false;
    }
    if let Some(pinned) = filter.is_pinned {
        if note.is_pinned != pinned {
            return false;
        }
    }
    if let Some(query) = filter.query.as_deref() {
        let query = query.to_lowercase();
        let hit = note.title.to_lowercase().contains(&query)
            || note.content.to_lowercase().contains(&query)
            || note.tags.iter().any(|t| t.to_lowercase().contains(&query));
        if !hit {
            return false;
        }
    }
    if let Some(tags) = filter.tags.as_ref() {
        if !tags.iter().any(|t| note.tags.contains(t)) {
            return false;
        }
    }
    true
}

fn sort_notes(notes: &mut [Note], order: NoteOrder) {
    notes.sort_by(|a, b| {
        b.is_pinned.cmp(&a.is_pinned).then_with(|| {
            let by_field = match order.field {
                NoteSortField::CreatedAt => a.created_at.cmp(&b.created_at),
                NoteSortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
                NoteSortField::Title => a.title.cmp(&b.title),
            };
            match order.direction {
                Sort::Asc => by_field,
                Sort::Desc => by_field.reverse(),
            }
        })
    });
}

impl NoteRepository for MockNoteRepo {
    async fn count(&self, owner: Uuid, filter: &NoteFilter) -> Result<u64, ApiError> {
        Ok(self
            .notes
            .lock()
            .unwrap()
            .iter()
            .filter(|n| matches(n, owner, filter))
            .count() as u64)
    }

    async fn list(
        &self,
        owner: Uuid,
        filter: &NoteFilter,
        order: NoteOrder,
        page: PageRequest,
    ) -> Result<Vec<Note>, ApiError> {
        let page = page.clamped();
        let mut selected: Vec<Note> = self
            .notes
            .lock()
            .unwrap()
            .iter()
            .filter(|n| matches(n, owner, filter))
            .cloned()
            .collect();
        sort_notes(&mut selected, order);
        Ok(selected
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.per_page as usize)
            .collect())
    }

    async fn find(&self, id: Uuid, owner: Uuid) -> Result<Option<Note>, ApiError> {
        Ok(self
            .notes
            .lock()
            .unwrap()
            .iter()
            .find(|n| n.id == id && n.user_id == owner)
            .cloned())
    }

    async fn insert(&self, note: &Note) -> Result<(), ApiError> {
        self.notes.lock().unwrap().push(note.clone());
        Ok(())
    }

    async fn update(
        &self,
        id: Uuid,
        owner: Uuid,
        changes: &NoteChanges,
    ) -> Result<Option<Note>, ApiError> {
        let mut notes = self.notes.lock().unwrap();
        let Some(note) = notes.iter_mut().find(|n| n.id == id && n.user_id == owner) else {
            return Ok(None);
        };
        if let Some(title) = &changes.title {
            note.title = title.clone();
        }
        if let Some(content) = &changes.content {
            note.content = content.clone();
        }
        if let Some(tags) = &changes.tags {
            note.tags = tags.clone();
        }
        if let Some(pinned) = changes.is_pinned {
            note.is_pinned = pinned;
        }
        note.updated_at = Utc::now();
        Ok(Some(note.clone()))
    }

    async fn delete(&self, id: Uuid, owner: Uuid) -> Result<bool, ApiError> {
        let mut notes = self.notes.lock().unwrap();
        let before = notes.len();
        notes.retain(|n| !(n.id == id && n.user_id == owner));
        Ok(notes.len() < before)
    }

    async fn delete_many(&self, ids: &[Uuid], owner: Uuid) -> Result<u64, ApiError> {
        let mut notes = self.notes.lock().unwrap();
        let before = notes.len();
        notes.retain(|n| !(ids.contains(&n.id) && n.user_id == owner));
        Ok((before - notes.len()) as u64)
    }
}

// ── MockMailer ───────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockMailer {
    pub sent: Arc<Mutex<Vec<(String, String, OtpPurpose)>>>,
    pub fail: bool,
}

impl MockMailer {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(vec![])),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            sent: Arc::new(Mutex::new(vec![])),
            fail: true,
        }
    }

    pub fn handle(&self) -> Arc<Mutex<Vec<(String, String, OtpPurpose)>>> {
        Arc::clone(&self.sent)
    }
}

impl MailPort for MockMailer {
    async fn send_otp(&self, email: &str, code: &str, purpose: OtpPurpose) -> Result<(), ApiError> {
        if self.fail {
            return Err(ApiError::MailDelivery(anyhow::anyhow!(
                "mail provider unavailable"
            )));
        }
        self.sent
            .lock()
            .unwrap()
            .push((email.to_owned(), code.to_owned(), purpose));
        Ok(())
    }
}

// ── MockGoogle ───────────────────────────────────────────────────────────────

pub struct MockGoogle {
    pub profile: Option<ExternalProfile>,
}

impl MockGoogle {
    pub fn returning(email: &str, name: &str) -> Self {
        Self {
            profile: Some(ExternalProfile {
                email: email.to_owned(),
                name: name.to_owned(),
            }),
        }
    }

    pub fn rejecting() -> Self {
        Self { profile: None }
    }

    fn profile(&self) -> Result<ExternalProfile, ApiError> {
        self.profile
            .clone()
            .ok_or_else(|| ApiError::GoogleAuth("invalid Google credential".into()))
    }
}

impl GoogleIdentityPort for MockGoogle {
    async fn verify_credential(&self, _credential: &str) -> Result<ExternalProfile, ApiError> {
        self.profile()
    }

    async fn exchange_code(&self, _code: &str) -> Result<ExternalProfile, ApiError> {
        self.profile()
    }
}
