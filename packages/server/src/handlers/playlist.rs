use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use tracing::{info, instrument};

use crate::entity::{playlist, problem, problem_in_playlist};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::playlist::*;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/",
    tag = "Playlists",
    operation_id = "createPlaylist",
    summary = "Create a playlist",
    request_body = CreatePlaylistRequest,
    responses(
        (status = 201, description = "Playlist created", body = PlaylistResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 409, description = "Name already used by the caller (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn create_playlist(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreatePlaylistRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_playlist(&payload)?;

    let now = chrono::Utc::now();
    let model = playlist::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        description: Set(payload
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())),
        user_id: Set(auth_user.user_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("A playlist with this name already exists".into())
        }
        _ => AppError::from(e),
    })?;

    Ok((
        StatusCode::CREATED,
        Json(PlaylistResponse::from_parts(model, Vec::new())),
    ))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Playlists",
    operation_id = "listPlaylists",
    summary = "List the caller's playlists",
    responses(
        (status = 200, description = "Playlists with their problems", body = Vec<PlaylistResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_playlists(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<PlaylistResponse>>, AppError> {
    let playlists = playlist::Entity::find()
        .filter(playlist::Column::UserId.eq(auth_user.user_id))
        .order_by_asc(playlist::Column::Id)
        .all(&state.db)
        .await?;

    let entries = problem_in_playlist::Entity::find()
        .filter(problem_in_playlist::Column::PlaylistId.is_in(playlists.iter().map(|p| p.id)))
        .order_by_asc(problem_in_playlist::Column::CreatedAt)
        .order_by_asc(problem_in_playlist::Column::ProblemId)
        .all(&state.db)
        .await?;

    let problems: HashMap<i32, PlaylistProblem> =
        load_problems(&state.db, entries.iter().map(|e| e.problem_id))
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

    let mut by_playlist: HashMap<i32, Vec<PlaylistProblem>> = HashMap::new();
    for entry in entries {
        if let Some(p) = problems.get(&entry.problem_id) {
            by_playlist
                .entry(entry.playlist_id)
                .or_default()
                .push(PlaylistProblem {
                    id: p.id,
                    title: p.title.clone(),
                    difficulty: p.difficulty,
                });
        }
    }

    let data = playlists
        .into_iter()
        .map(|pl| {
            let problems = by_playlist.remove(&pl.id).unwrap_or_default();
            PlaylistResponse::from_parts(pl, problems)
        })
        .collect();

    Ok(Json(data))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Playlists",
    operation_id = "getPlaylist",
    summary = "Get one of the caller's playlists",
    params(("id" = i32, Path, description = "Playlist ID")),
    responses(
        (status = 200, description = "Playlist with its problems", body = PlaylistResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Playlist not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_playlist(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<PlaylistResponse>, AppError> {
    let model = find_own_playlist(&state.db, id, auth_user.user_id).await?;
    let problems = playlist_problems(&state.db, id).await?;
    Ok(Json(PlaylistResponse::from_parts(model, problems)))
}

#[utoipa::path(
    post,
    path = "/{id}/problems",
    tag = "Playlists",
    operation_id = "addPlaylistProblems",
    summary = "Add problems to a playlist",
    description = "Problems already in the playlist are skipped. Every ID must refer to an existing problem. At most 100 IDs per request.",
    params(("id" = i32, Path, description = "Playlist ID")),
    request_body = PlaylistProblemsRequest,
    responses(
        (status = 200, description = "Number of problems added", body = PlaylistChangeResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Playlist or problem not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn add_problems(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<PlaylistProblemsRequest>,
) -> Result<Json<PlaylistChangeResponse>, AppError> {
    validate_playlist_problems(&payload)?;

    let txn = state.db.begin().await?;
    find_own_playlist(&txn, id, auth_user.user_id).await?;

    let found = problem::Entity::find()
        .filter(problem::Column::Id.is_in(payload.problem_ids.iter().copied()))
        .count(&txn)
        .await?;
    if found != payload.problem_ids.len() as u64 {
        return Err(AppError::NotFound("One or more problems not found".into()));
    }

    let now = chrono::Utc::now();
    let mut added = 0u64;
    for &problem_id in &payload.problem_ids {
        let entry = problem_in_playlist::ActiveModel {
            playlist_id: Set(id),
            problem_id: Set(problem_id),
            created_at: Set(now),
            ..Default::default()
        };
        let result = problem_in_playlist::Entity::insert(entry)
            .on_conflict(
                OnConflict::columns([
                    problem_in_playlist::Column::PlaylistId,
                    problem_in_playlist::Column::ProblemId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&txn)
            .await;

        match result {
            Ok(n) => added += n,
            Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e.into()),
        }
    }

    touch(&txn, id, now).await?;
    txn.commit().await?;

    info!(playlist_id = id, added, "Added problems to playlist");
    Ok(Json(PlaylistChangeResponse { count: added }))
}

#[utoipa::path(
    delete,
    path = "/{id}/problems",
    tag = "Playlists",
    operation_id = "removePlaylistProblems",
    summary = "Remove problems from a playlist",
    params(("id" = i32, Path, description = "Playlist ID")),
    request_body = PlaylistProblemsRequest,
    responses(
        (status = 200, description = "Number of problems removed", body = PlaylistChangeResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Playlist not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn remove_problems(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<PlaylistProblemsRequest>,
) -> Result<Json<PlaylistChangeResponse>, AppError> {
    validate_playlist_problems(&payload)?;

    let txn = state.db.begin().await?;
    find_own_playlist(&txn, id, auth_user.user_id).await?;

    let result = problem_in_playlist::Entity::delete_many()
        .filter(problem_in_playlist::Column::PlaylistId.eq(id))
        .filter(problem_in_playlist::Column::ProblemId.is_in(payload.problem_ids.iter().copied()))
        .exec(&txn)
        .await?;

    touch(&txn, id, chrono::Utc::now()).await?;
    txn.commit().await?;

    Ok(Json(PlaylistChangeResponse {
        count: result.rows_affected,
    }))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Playlists",
    operation_id = "deletePlaylist",
    summary = "Delete a playlist",
    params(("id" = i32, Path, description = "Playlist ID")),
    responses(
        (status = 204, description = "Playlist deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Playlist not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_playlist(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;
    find_own_playlist(&txn, id, auth_user.user_id).await?;

    problem_in_playlist::Entity::delete_many()
        .filter(problem_in_playlist::Column::PlaylistId.eq(id))
        .exec(&txn)
        .await?;
    playlist::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Another user's playlist is reported as missing.
async fn find_own_playlist<C: ConnectionTrait>(
    db: &C,
    id: i32,
    user_id: i32,
) -> Result<playlist::Model, AppError> {
    playlist::Entity::find_by_id(id)
        .one(db)
        .await?
        .filter(|p| p.user_id == user_id)
        .ok_or_else(|| AppError::NotFound("Playlist not found".into()))
}

async fn playlist_problems<C: ConnectionTrait>(
    db: &C,
    playlist_id: i32,
) -> Result<Vec<PlaylistProblem>, AppError> {
    let ids: Vec<i32> = problem_in_playlist::Entity::find()
        .filter(problem_in_playlist::Column::PlaylistId.eq(playlist_id))
        .order_by_asc(problem_in_playlist::Column::CreatedAt)
        .order_by_asc(problem_in_playlist::Column::ProblemId)
        .all(db)
        .await?
        .into_iter()
        .map(|e| e.problem_id)
        .collect();

    let mut problems: HashMap<i32, PlaylistProblem> = load_problems(db, ids.iter().copied())
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    Ok(ids.iter().filter_map(|id| problems.remove(id)).collect())
}

async fn load_problems<C: ConnectionTrait>(
    db: &C,
    ids: impl IntoIterator<Item = i32>,
) -> Result<Vec<PlaylistProblem>, AppError> {
    Ok(problem::Entity::find()
        .select_only()
        .column(problem::Column::Id)
        .column(problem::Column::Title)
        .column(problem::Column::Difficulty)
        .filter(problem::Column::Id.is_in(ids))
        .into_model::<PlaylistProblem>()
        .all(db)
        .await?)
}

async fn touch<C: ConnectionTrait>(
    db: &C,
    id: i32,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<(), AppError> {
    playlist::ActiveModel {
        id: Set(id),
        updated_at: Set(now),
        ..Default::default()
    }
    .update(db)
    .await?;
    Ok(())
}
