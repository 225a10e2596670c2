use axum::Json;
use axum::extract::{Path, Query, State};
use sea_orm::*;
use tracing::{info, instrument};

use crate::entity::{submission, test_case_result};
use crate::error::{AppError, ErrorBody};
use crate::evaluation::evaluate_and_persist;
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::handlers::problem::find_problem;
use crate::models::shared::{PageQuery, Pagination};
use crate::models::submission::*;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/{id}/execute",
    tag = "Submissions",
    operation_id = "executeCode",
    summary = "Run code against test cases and store the submission",
    description = "Runs the source once per (stdin, expected output) pair through the judge, compares trimmed outputs and stores the submission with one result per case. The verdict is `Accepted` only when every case matches; compile and runtime failures show up as failing cases. An accepted submission marks the problem solved for the caller. Requires `submission:submit` permission.",
    params(("id" = i32, Path, description = "Problem ID")),
    request_body = ExecuteCodeRequest,
    responses(
        (status = 200, description = "Submission judged and stored", body = SubmissionResponse),
        (status = 400, description = "Bad request (VALIDATION_ERROR, UNSUPPORTED_LANGUAGE)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Problem not found (NOT_FOUND)", body = ErrorBody),
        (status = 502, description = "Judge unavailable (UPSTREAM_ERROR)", body = ErrorBody),
        (status = 503, description = "Server shutting down (SERVICE_UNAVAILABLE)", body = ErrorBody),
        (status = 504, description = "Judge timed out (UPSTREAM_TIMEOUT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, problem_id, language = %payload.language))]
pub async fn execute_code(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(problem_id): Path<i32>,
    AppJson(payload): AppJson<ExecuteCodeRequest>,
) -> Result<Json<SubmissionResponse>, AppError> {
    auth_user.require_permission("submission:submit")?;
    validate_execute_request(&payload)?;
    find_problem(&state.db, problem_id).await?;

    let stored =
        evaluate_and_persist(&state, auth_user.user_id, problem_id, payload.into()).await?;

    info!(
        submission_id = stored.submission.id,
        verdict = %stored.submission.verdict,
        "Submission judged"
    );
    Ok(Json(SubmissionResponse::from_parts(
        stored.submission,
        stored.results,
    )))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Submissions",
    operation_id = "listSubmissions",
    summary = "List the caller's submissions",
    description = "Newest first.",
    params(PageQuery),
    responses(
        (status = 200, description = "Submissions", body = SubmissionListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_submissions(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<SubmissionListResponse>, AppError> {
    let select =
        submission::Entity::find().filter(submission::Column::UserId.eq(auth_user.user_id));
    Ok(Json(page_of(&state.db, select, &query).await?))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Submissions",
    operation_id = "getSubmission",
    summary = "Get one of the caller's submissions",
    params(("id" = i32, Path, description = "Submission ID")),
    responses(
        (status = 200, description = "Submission with per-case results", body = SubmissionResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Submission not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_submission(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<SubmissionResponse>, AppError> {
    let model = submission::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .filter(|s| s.user_id == auth_user.user_id)
        .ok_or_else(|| AppError::NotFound("Submission not found".into()))?;

    let results = test_case_result::Entity::find()
        .filter(test_case_result::Column::SubmissionId.eq(id))
        .order_by_asc(test_case_result::Column::TestCase)
        .all(&state.db)
        .await?;

    Ok(Json(SubmissionResponse::from_parts(model, results)))
}

#[utoipa::path(
    get,
    path = "/{id}/submissions",
    tag = "Submissions",
    operation_id = "listProblemSubmissions",
    summary = "List the caller's submissions for a problem",
    description = "Newest first.",
    params(("id" = i32, Path, description = "Problem ID"), PageQuery),
    responses(
        (status = 200, description = "Submissions", body = SubmissionListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Problem not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(problem_id))]
pub async fn list_problem_submissions(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(problem_id): Path<i32>,
    Query(query): Query<PageQuery>,
) -> Result<Json<SubmissionListResponse>, AppError> {
    find_problem(&state.db, problem_id).await?;

    let select = submission::Entity::find()
        .filter(submission::Column::UserId.eq(auth_user.user_id))
        .filter(submission::Column::ProblemId.eq(problem_id));
    Ok(Json(page_of(&state.db, select, &query).await?))
}

#[utoipa::path(
    get,
    path = "/{id}/submissions/count",
    tag = "Submissions",
    operation_id = "countProblemSubmissions",
    summary = "Count all submissions for a problem",
    params(("id" = i32, Path, description = "Problem ID")),
    responses(
        (status = 200, description = "Submission count across all users", body = SubmissionCountResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Problem not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(problem_id))]
pub async fn count_problem_submissions(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(problem_id): Path<i32>,
) -> Result<Json<SubmissionCountResponse>, AppError> {
    find_problem(&state.db, problem_id).await?;

    let count = submission::Entity::find()
        .filter(submission::Column::ProblemId.eq(problem_id))
        .count(&state.db)
        .await?;

    Ok(Json(SubmissionCountResponse { problem_id, count }))
}

async fn page_of(
    db: &DatabaseConnection,
    select: Select<submission::Entity>,
    query: &PageQuery,
) -> Result<SubmissionListResponse, AppError> {
    let (page, per_page) = query.bounds();

    let total = select.clone().paginate(db, per_page).num_items().await?;

    let data = select
        .select_only()
        .column(submission::Column::Id)
        .column(submission::Column::ProblemId)
        .column(submission::Column::Language)
        .column(submission::Column::Verdict)
        .column(submission::Column::CreatedAt)
        .order_by_desc(submission::Column::CreatedAt)
        .order_by_desc(submission::Column::Id)
        .offset(Some((page - 1) * per_page))
        .limit(Some(per_page))
        .into_model::<SubmissionListItem>()
        .all(db)
        .await?;

    Ok(SubmissionListResponse {
        data,
        pagination: Pagination::new(page, per_page, total),
    })
}
