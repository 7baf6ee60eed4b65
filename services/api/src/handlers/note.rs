//! Note endpoints. All of them require a bearer token; rate limits are
//! charged per user id.

use axum::Json;
use axum::extract::{Path, Query, RawQuery, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use quillbox_core::envelope::ApiResponse;
use quillbox_core::serde::to_rfc3339_ms;
use quillbox_domain::pagination::{PageInfo, PageRequest, Sort};

use crate::domain::types::{Note, NoteFilter, NoteOrder, NoteSortField};
use crate::error::ApiError;
use crate::extract::AuthUser;
use crate::handlers::charge;
use crate::state::AppState;
use crate::usecase::note::{
    BulkDeleteNotesUseCase, CreateNoteInput, CreateNoteUseCase, DeleteNoteUseCase, GetNoteUseCase,
    ListNotesUseCase, TogglePinUseCase, UpdateNoteInput, UpdateNoteUseCase,
};

// ── Wire types ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteResponse {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub is_pinned: bool,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub updated_at: DateTime<Utc>,
}

impl From<Note> for NoteResponse {
    fn from(note: Note) -> Self {
        Self {
            id: note.id,
            title: note.title,
            content: note.content,
            tags: note.tags,
            is_pinned: note.is_pinned,
            created_at: note.created_at,
            updated_at: note.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNotesQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub is_pinned: Option<bool>,
}

/// Search accepts repeated `tags[]` parameters, which the plain `Query`
/// extractor cannot represent; the raw string goes through `serde_qs`.
/// Pagination, sorting, and the pinned filter follow the list contract.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchNotesQuery {
    pub q: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub is_pinned: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct NotePageData {
    pub notes: Vec<NoteResponse>,
    pub pagination: PageInfo,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPageData {
    pub notes: Vec<NoteResponse>,
    pub search_query: Option<String>,
    pub pagination: PageInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_pinned: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNoteRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_pinned: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteRequest {
    #[serde(default)]
    pub note_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteData {
    pub deleted_count: u64,
}

fn to_page(page: Option<u32>, limit: Option<u32>) -> PageRequest {
    PageRequest::new(page.unwrap_or(1), limit.unwrap_or(10)).clamped()
}

fn to_order(sort_by: Option<&str>, sort_order: Option<&str>) -> NoteOrder {
    NoteOrder {
        field: NoteSortField::from_query(sort_by.unwrap_or_default()),
        direction: sort_order.and_then(Sort::from_query).unwrap_or_default(),
    }
}

/// A malformed id cannot name an existing note, so it reads as not-found
/// rather than as a validation error.
fn parse_note_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NoteNotFound)
}

// ── Handlers ─────────────────────────────────────────────────────────────────

pub async fn list_notes(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListNotesQuery>,
) -> Result<Json<ApiResponse<NotePageData>>, ApiError> {
    charge(&state.limits.notes, auth.user_id)?;

    let filter = NoteFilter {
        is_pinned: query.is_pinned,
        ..Default::default()
    };
    let order = to_order(query.sort_by.as_deref(), query.sort_order.as_deref());
    let usecase = ListNotesUseCase {
        repo: state.note_repo(),
    };
    let page = usecase
        .execute(auth.user_id, filter, order, to_page(query.page, query.limit))
        .await?;

    Ok(Json(ApiResponse::data(NotePageData {
        notes: page.notes.into_iter().map(Into::into).collect(),
        pagination: page.page_info,
    })))
}

pub async fn search_notes(
    State(state): State<AppState>,
    auth: AuthUser,
    RawQuery(raw): RawQuery,
) -> Result<Json<ApiResponse<SearchPageData>>, ApiError> {
    charge(&state.limits.search, auth.user_id)?;

    let query: SearchNotesQuery = serde_qs::from_str(raw.as_deref().unwrap_or_default())
        .map_err(|e| ApiError::Validation(format!("invalid search query: {e}")))?;

    let search_query = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
    let filter = NoteFilter {
        is_pinned: query.is_pinned,
        query: search_query.map(str::to_owned),
        tags: Some(query.tags.clone()).filter(|t| !t.is_empty()),
    };
    let order = to_order(query.sort_by.as_deref(), query.sort_order.as_deref());
    let usecase = ListNotesUseCase {
        repo: state.note_repo(),
    };
    let page = usecase
        .execute(
            auth.user_id,
            filter,
            order,
            to_page(query.page, query.limit),
        )
        .await?;

    Ok(Json(ApiResponse::data(SearchPageData {
        notes: page.notes.into_iter().map(Into::into).collect(),
        search_query: search_query.map(str::to_owned),
        pagination: page.page_info,
    })))
}

pub async fn create_note(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateNoteRequest>,
) -> Result<(StatusCode, Json<ApiResponse<NoteResponse>>), ApiError> {
    charge(&state.limits.notes, auth.user_id)?;

    let usecase = CreateNoteUseCase {
        repo: state.note_repo(),
    };
    let note = usecase
        .execute(
            auth.user_id,
            CreateNoteInput {
                title: body.title,
                content: body.content,
                tags: body.tags,
                is_pinned: body.is_pinned,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Note created successfully",
            note.into(),
        )),
    ))
}

pub async fn get_note(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<NoteResponse>>, ApiError> {
    charge(&state.limits.notes, auth.user_id)?;

    let usecase = GetNoteUseCase {
        repo: state.note_repo(),
    };
    let note = usecase.execute(parse_note_id(&id)?, auth.user_id).await?;
    Ok(Json(ApiResponse::data(note.into())))
}

pub async fn update_note(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<UpdateNoteRequest>,
) -> Result<Json<ApiResponse<NoteResponse>>, ApiError> {
    charge(&state.limits.notes, auth.user_id)?;

    let usecase = UpdateNoteUseCase {
        repo: state.note_repo(),
    };
    let note = usecase
        .execute(
            parse_note_id(&id)?,
            auth.user_id,
            UpdateNoteInput {
                title: body.title,
                content: body.content,
                tags: body.tags,
                is_pinned: body.is_pinned,
            },
        )
        .await?;
    Ok(Json(ApiResponse::with_message(
        "Note updated successfully",
        note.into(),
    )))
}

pub async fn delete_note(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    charge(&state.limits.notes, auth.user_id)?;

    let usecase = DeleteNoteUseCase {
        repo: state.note_repo(),
    };
    usecase.execute(parse_note_id(&id)?, auth.user_id).await?;
    Ok(Json(ApiResponse::message("Note deleted successfully")))
}

pub async fn toggle_pin(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<NoteResponse>>, ApiError> {
    charge(&state.limits.notes, auth.user_id)?;

    let usecase = TogglePinUseCase {
        repo: state.note_repo(),
    };
    let note = usecase.execute(parse_note_id(&id)?, auth.user_id).await?;
    let message = if note.is_pinned {
        "Note pinned successfully"
    } else {
        "Note unpinned successfully"
    };
    Ok(Json(ApiResponse::with_message(message, note.into())))
}

pub async fn bulk_delete_notes(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<BulkDeleteRequest>,
) -> Result<Json<ApiResponse<BulkDeleteData>>, ApiError> {
    charge(&state.limits.bulk, auth.user_id)?;

    if body.note_ids.is_empty() {
        return Err(ApiError::Validation("note IDs array is required".into()));
    }
    let ids = body
        .note_ids
        .iter()
        .map(|raw| Uuid::parse_str(raw))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| ApiError::Validation("invalid note IDs provided".into()))?;

    let usecase = BulkDeleteNotesUseCase {
        repo: state.note_repo(),
    };
    let deleted_count = usecase.execute(&ids, auth.user_id).await?;
    Ok(Json(ApiResponse::with_message(
        format!("{deleted_count} notes deleted successfully"),
        BulkDeleteData { deleted_count },
    )))
}
