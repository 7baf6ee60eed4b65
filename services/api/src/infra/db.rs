use anyhow::{Context as _, anyhow};
use chrono::Utc;
use sea_orm::sea_query::{Condition, Expr};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use quillbox_domain::pagination::{PageRequest, Sort};
use quillbox_schema::{notes, otps, users};

use crate::domain::repository::{NoteRepository, OtpRepository, UserRepository};
use crate::domain::types::{
    Note, NoteChanges, NoteFilter, NoteOrder, NoteSortField, Otp, OtpPurpose, User,
};
use crate::error::ApiError;

// ── User repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
}

impl UserRepository for DbUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, ApiError> {
        let model = users::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find user by id")?;
        Ok(model.map(user_from_model))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .context("find user by email")?;
        Ok(model.map(user_from_model))
    }

    async fn create(&self, user: &User) -> Result<(), ApiError> {
        users::ActiveModel {
            id: Set(user.id),
            email: Set(user.email.clone()),
            name: Set(user.name.clone()),
            date_of_birth: Set(user.date_of_birth),
            is_email_verified: Set(user.is_email_verified),
            last_login: Set(user.last_login),
            created_at: Set(user.created_at),
            updated_at: Set(user.updated_at),
        }
        .insert(&self.db)
        .await
        .context("create user")?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        users::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete user")?;
        Ok(())
    }

    async fn mark_verified(&self, email: &str) -> Result<Option<User>, ApiError> {
        let Some(model) = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .context("find user for verification")?
        else {
            return Ok(None);
        };

        let updated = users::ActiveModel {
            id: Set(model.id),
            is_email_verified: Set(true),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("mark user verified")?;
        Ok(Some(user_from_model(updated)))
    }

    async fn touch_last_login(&self, id: Uuid) -> Result<Option<User>, ApiError> {
        let now = Utc::now();
        let result = users::ActiveModel {
            id: Set(id),
            last_login: Set(Some(now)),
            updated_at: Set(now),
            ..Default::default()
        }
        .update(&self.db)
        .await;
        match result {
            Ok(model) => Ok(Some(user_from_model(model))),
            Err(sea_orm::DbErr::RecordNotUpdated) => Ok(None),
            Err(e) => Err(anyhow::Error::new(e).context("touch last login").into()),
        }
    }
}

fn user_from_model(model: users::Model) -> User {
    User {
        id: model.id,
        email: model.email,
        name: model.name,
        date_of_birth: model.date_of_birth,
        is_email_verified: model.is_email_verified,
        last_login: model.last_login,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

// ── OTP repository ───────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbOtpRepository {
    pub db: DatabaseConnection,
}

impl OtpRepository for DbOtpRepository {
    async fn latest(&self, email: &str, purpose: OtpPurpose) -> Result<Option<Otp>, ApiError> {
        let model = otps::Entity::find()
            .filter(otps::Column::Email.eq(email))
            .filter(otps::Column::Purpose.eq(purpose.to_string()))
            .order_by_desc(otps::Column::CreatedAt)
            .one(&self.db)
            .await
            .context("find latest otp")?;
        model.map(otp_from_model).transpose()
    }

    async fn find_pending(
        &self,
        email: &str,
        purpose: OtpPurpose,
    ) -> Result<Option<Otp>, ApiError> {
        let model = otps::Entity::find()
            .filter(otps::Column::Email.eq(email))
            .filter(otps::Column::Purpose.eq(purpose.to_string()))
            .filter(otps::Column::Verified.eq(false))
            .filter(otps::Column::ExpiresAt.gt(Utc::now()))
            .order_by_desc(otps::Column::CreatedAt)
            .one(&self.db)
            .await
            .context("find pending otp")?;
        model.map(otp_from_model).transpose()
    }

    async fn create(&self, otp: &Otp) -> Result<(), ApiError> {
        otps::ActiveModel {
            id: Set(otp.id),
            email: Set(otp.email.clone()),
            code: Set(otp.code.clone()),
            purpose: Set(otp.purpose.to_string()),
            expires_at: Set(otp.expires_at),
            attempts: Set(otp.attempts),
            verified: Set(otp.verified),
            created_at: Set(otp.created_at),
        }
        .insert(&self.db)
        .await
        .context("create otp")?;
        Ok(())
    }

    async fn update(&self, otp: &Otp) -> Result<(), ApiError> {
        otps::ActiveModel {
            id: Set(otp.id),
            attempts: Set(otp.attempts),
            verified: Set(otp.verified),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("update otp")?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        otps::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete otp")?;
        Ok(())
    }

    async fn delete_for(&self, email: &str, purpose: OtpPurpose) -> Result<(), ApiError> {
        otps::Entity::delete_many()
            .filter(otps::Column::Email.eq(email))
            .filter(otps::Column::Purpose.eq(purpose.to_string()))
            .exec(&self.db)
            .await
            .context("delete otps for email+purpose")?;
        Ok(())
    }

    async fn delete_all_for_email(&self, email: &str) -> Result<(), ApiError> {
        otps::Entity::delete_many()
            .filter(otps::Column::Email.eq(email))
            .exec(&self.db)
            .await
            .context("delete otps for email")?;
        Ok(())
    }

    async fn purge_stale(&self) -> Result<u64, ApiError> {
        let result = otps::Entity::delete_many()
            .filter(
                Condition::any()
                    .add(otps::Column::ExpiresAt.lt(Utc::now()))
                    .add(otps::Column::Verified.eq(true)),
            )
            .exec(&self.db)
            .await
            .context("purge stale otps")?;
        Ok(result.rows_affected)
    }
}

fn otp_from_model(model: otps::Model) -> Result<Otp, ApiError> {
    let purpose = model
        .purpose
        .parse::<OtpPurpose>()
        .map_err(|_| ApiError::Internal(anyhow!("unknown otp purpose: {}", model.purpose)))?;
    Ok(Otp {
        id: model.id,
        email: model.email,
        code: model.code,
        purpose,
        expires_at: model.expires_at,
        attempts: model.attempts,
        verified: model.verified,
        created_at: model.created_at,
    })
}

// ── Note repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbNoteRepository {
    pub db: DatabaseConnection,
}

/// Escape LIKE wildcards so user search text is matched literally.
fn escape_like(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

/// Owner scoping plus the optional pinned / substring / tag filters, shared
/// by count and list so the two can never disagree.
fn note_condition(owner: Uuid, filter: &NoteFilter) -> Condition {
    let mut cond = Condition::all().add(notes::Column::UserId.eq(owner));

    if let Some(pinned) = filter.is_pinned {
        cond = cond.add(notes::Column::IsPinned.eq(pinned));
    }

    if let Some(query) = filter.query.as_deref() {
        let query = query.trim();
        if !query.is_empty() {
            let pattern = format!("%{}%", escape_like(query));
            cond = cond.add(
                Condition::any()
                    .add(Expr::cust_with_values("title ILIKE $1", [pattern.clone()]))
                    .add(Expr::cust_with_values("content ILIKE $1", [pattern.clone()]))
                    .add(Expr::cust_with_values(
                        "EXISTS (SELECT 1 FROM unnest(tags) AS tag WHERE tag ILIKE $1)",
                        [pattern],
                    )),
            );
        }
    }

    if let Some(tags) = filter.tags.as_ref().filter(|t| !t.is_empty()) {
        // Array overlap: any requested tag present on the note.
        cond = cond.add(Expr::cust_with_values("tags && $1", [tags.clone()]));
    }

    cond
}

fn sort_column(field: NoteSortField) -> notes::Column {
    match field {
        NoteSortField::CreatedAt => notes::Column::CreatedAt,
        NoteSortField::UpdatedAt => notes::Column::UpdatedAt,
        NoteSortField::Title => notes::Column::Title,
    }
}

impl NoteRepository for DbNoteRepository {
    async fn count(&self, owner: Uuid, filter: &NoteFilter) -> Result<u64, ApiError> {
        let count = notes::Entity::find()
            .filter(note_condition(owner, filter))
            .count(&self.db)
            .await
            .context("count notes")?;
        Ok(count)
    }

    async fn list(
        &self,
        owner: Uuid,
        filter: &NoteFilter,
        order: NoteOrder,
        page: PageRequest,
    ) -> Result<Vec<Note>, ApiError> {
        let page = page.clamped();
        let direction = match order.direction {
            Sort::Asc => Order::Asc,
            Sort::Desc => Order::Desc,
        };
        let models = notes::Entity::find()
            .filter(note_condition(owner, filter))
            // Pinned notes first, always; the requested field breaks ties.
            .order_by_desc(notes::Column::IsPinned)
            .order_by(sort_column(order.field), direction)
            .offset(page.offset())
            .limit(u64::from(page.per_page))
            .all(&self.db)
            .await
            .context("list notes")?;
        Ok(models.into_iter().map(note_from_model).collect())
    }

    async fn find(&self, id: Uuid, owner: Uuid) -> Result<Option<Note>, ApiError> {
        let model = notes::Entity::find_by_id(id)
            .filter(notes::Column::UserId.eq(owner))
            .one(&self.db)
            .await
            .context("find note")?;
        Ok(model.map(note_from_model))
    }

    async fn insert(&self, note: &Note) -> Result<(), ApiError> {
        notes::ActiveModel {
            id: Set(note.id),
            user_id: Set(note.user_id),
            title: Set(note.title.clone()),
            content: Set(note.content.clone()),
            tags: Set(note.tags.clone()),
            is_pinned: Set(note.is_pinned),
            created_at: Set(note.created_at),
            updated_at: Set(note.updated_at),
        }
        .insert(&self.db)
        .await
        .context("insert note")?;
        Ok(())
    }

    async fn update(
        &self,
        id: Uuid,
        owner: Uuid,
        changes: &NoteChanges,
    ) -> Result<Option<Note>, ApiError> {
        // Ownership check first; the subsequent update is by primary key.
        if self.find(id, owner).await?.is_none() {
            return Ok(None);
        }

        let mut am = notes::ActiveModel {
            id: Set(id),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        if let Some(title) = &changes.title {
            am.title = Set(title.clone());
        }
        if let Some(content) = &changes.content {
            am.content = Set(content.clone());
        }
        if let Some(tags) = &changes.tags {
            am.tags = Set(tags.clone());
        }
        if let Some(pinned) = changes.is_pinned {
            am.is_pinned = Set(pinned);
        }

        let updated = am.update(&self.db).await.context("update note")?;
        Ok(Some(note_from_model(updated)))
    }

    async fn delete(&self, id: Uuid, owner: Uuid) -> Result<bool, ApiError> {
        let result = notes::Entity::delete_many()
            .filter(notes::Column::Id.eq(id))
            .filter(notes::Column::UserId.eq(owner))
            .exec(&self.db)
            .await
            .context("delete note")?;
        Ok(result.rows_affected > 0)
    }

    async fn delete_many(&self, ids: &[Uuid], owner: Uuid) -> Result<u64, ApiError> {
        let result = notes::Entity::delete_many()
            .filter(notes::Column::Id.is_in(ids.iter().copied()))
            .filter(notes::Column::UserId.eq(owner))
            .exec(&self.db)
            .await
            .context("bulk delete notes")?;
        Ok(result.rows_affected)
    }
}

fn note_from_model(model: notes::Model) -> Note {
    Note {
        id: model.id,
        user_id: model.user_id,
        title: model.title,
        content: model.content,
        tags: model.tags,
        is_pinned: model.is_pinned,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}
