use chrono::{DateTime, Utc};
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};

use crate::entity::playlist;
use crate::entity::problem::Difficulty;
use crate::error::AppError;

use super::shared::validate_bulk_ids;

pub const MAX_PLAYLIST_BATCH: usize = 100;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreatePlaylistRequest {
    /// Unique among the caller's playlists (1-64 characters).
    #[schema(example = "Warm-ups")]
    pub name: String,
    pub description: Option<String>,
}

/// Problems to add to or remove from a playlist.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct PlaylistProblemsRequest {
    #[schema(example = json!([1, 2, 3]))]
    pub problem_ids: Vec<i32>,
}

#[derive(Serialize, FromQueryResult, utoipa::ToSchema)]
pub struct PlaylistProblem {
    pub id: i32,
    pub title: String,
    pub difficulty: Difficulty,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PlaylistResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub user_id: i32,
    pub problems: Vec<PlaylistProblem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PlaylistResponse {
    pub fn from_parts(m: playlist::Model, problems: Vec<PlaylistProblem>) -> Self {
        Self {
            id: m.id,
            name: m.name,
            description: m.description,
            user_id: m.user_id,
            problems,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Number of problems actually added or removed.
#[derive(Serialize, utoipa::ToSchema)]
pub struct PlaylistChangeResponse {
    #[schema(example = 2)]
    pub count: u64,
}

pub fn validate_create_playlist(req: &CreatePlaylistRequest) -> Result<(), AppError> {
    let name = req.name.trim();
    if name.is_empty() || name.chars().count() > 64 {
        return Err(AppError::Validation(
            "Playlist name must be 1-64 characters".into(),
        ));
    }
    if let Some(ref description) = req.description
        && description.chars().count() > 1000
    {
        return Err(AppError::Validation(
            "Description must be at most 1000 characters".into(),
        ));
    }
    Ok(())
}

pub fn validate_playlist_problems(req: &PlaylistProblemsRequest) -> Result<(), AppError> {
    validate_bulk_ids(&req.problem_ids, "problem_ids", MAX_PLAYLIST_BATCH)
}
