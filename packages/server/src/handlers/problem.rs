use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use judge::{ReferenceCheck, TestCase, check_reference_solution};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr, LockType, Query as SeaQuery};
use sea_orm::*;
use tracing::{info, instrument};

use crate::entity::{
    problem, problem_in_playlist, problem_solved, submission, test_case, test_case_result,
};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::problem::*;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/",
    tag = "Problems",
    operation_id = "createProblem",
    summary = "Create a new problem",
    description = "Creates a problem with its test cases. Every reference solution is first run against every test case through the judge; the problem is stored only if all of them pass. Requires `problem:create` permission.",
    request_body = ProblemRequest,
    responses(
        (status = 201, description = "Problem created", body = ProblemResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR, UNSUPPORTED_LANGUAGE, REFERENCE_SOLUTION_FAILED)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 502, description = "Judge unavailable (UPSTREAM_ERROR)", body = ErrorBody),
        (status = 504, description = "Judge timed out (UPSTREAM_TIMEOUT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(title = %payload.title))]
pub async fn create_problem(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<ProblemRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("problem:create")?;
    validate_problem_request(&payload)?;
    verify_reference_solutions(&state, &payload).await?;

    let now = chrono::Utc::now();
    let txn = state.db.begin().await?;

    let new_problem = problem::ActiveModel {
        user_id: Set(auth_user.user_id),
        created_at: Set(now),
        ..Default::default()
    };
    let model = apply_request(new_problem, &payload, now)?.insert(&txn).await?;
    let cases = insert_test_cases(&txn, model.id, &payload.test_cases).await?;

    txn.commit().await?;

    info!(problem_id = model.id, cases = cases.len(), "Created problem");
    Ok((
        StatusCode::CREATED,
        Json(ProblemResponse::from_parts(model, cases)),
    ))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Problems",
    operation_id = "listProblems",
    summary = "List problems with pagination and filters",
    description = "Returns a paginated list of problems ordered by ID. Supports filtering by difficulty and case-insensitive title search.",
    params(ProblemListQuery),
    responses(
        (status = 200, description = "List of problems", body = ProblemListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, query))]
pub async fn list_problems(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ProblemListQuery>,
) -> Result<Json<ProblemListResponse>, AppError> {
    let (page, per_page) = query.bounds();

    let mut select = problem::Entity::find();

    if let Some(difficulty) = query.difficulty {
        select = select.filter(problem::Column::Difficulty.eq(difficulty));
    }
    if let Some(ref search) = query.search {
        let term = escape_like(search.trim());
        if !term.is_empty() {
            select = select.filter(
                Expr::expr(Func::lower(Expr::col(problem::Column::Title)))
                    .like(LikeExpr::new(format!("%{}%", term.to_lowercase())).escape('\\')),
            );
        }
    }

    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;

    let data = select
        .select_only()
        .column(problem::Column::Id)
        .column(problem::Column::Title)
        .column(problem::Column::Difficulty)
        .column(problem::Column::Tags)
        .column(problem::Column::CreatedAt)
        .order_by_asc(problem::Column::Id)
        .offset(Some((page - 1) * per_page))
        .limit(Some(per_page))
        .into_model::<ProblemListItem>()
        .all(&state.db)
        .await?;

    Ok(Json(ProblemListResponse {
        data,
        pagination: Pagination::new(page, per_page, total),
    }))
}

#[utoipa::path(
    get,
    path = "/solved",
    tag = "Problems",
    operation_id = "listSolvedProblems",
    summary = "Problems the caller has solved",
    description = "A problem counts as solved once the caller has at least one accepted submission for it. Most recently solved first.",
    responses(
        (status = 200, description = "Solved problems", body = Vec<SolvedProblemItem>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_solved_problems(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<SolvedProblemItem>>, AppError> {
    let markers = problem_solved::Entity::find()
        .filter(problem_solved::Column::UserId.eq(auth_user.user_id))
        .order_by_desc(problem_solved::Column::CreatedAt)
        .all(&state.db)
        .await?;

    let problems: HashMap<i32, problem::Model> = problem::Entity::find()
        .filter(problem::Column::Id.is_in(markers.iter().map(|m| m.problem_id)))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let solved = markers
        .into_iter()
        .filter_map(|marker| {
            problems.get(&marker.problem_id).map(|p| SolvedProblemItem {
                id: p.id,
                title: p.title.clone(),
                difficulty: p.difficulty,
                solved_at: marker.created_at,
            })
        })
        .collect();

    Ok(Json(solved))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Problems",
    operation_id = "getProblem",
    summary = "Get a problem by ID",
    description = "Returns the full problem, including its test cases in order.",
    params(("id" = i32, Path, description = "Problem ID")),
    responses(
        (status = 200, description = "Problem details", body = ProblemResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Problem not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(id))]
pub async fn get_problem(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProblemResponse>, AppError> {
    let model = find_problem(&state.db, id).await?;
    let cases = find_test_cases(&state.db, id).await?;
    Ok(Json(ProblemResponse::from_parts(model, cases)))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Problems",
    operation_id = "updateProblem",
    summary = "Replace an existing problem",
    description = "Replaces every field of a problem and its test cases. Reference solutions are re-checked against the new test cases before anything is written. Requires `problem:edit` permission.",
    params(("id" = i32, Path, description = "Problem ID")),
    request_body = ProblemRequest,
    responses(
        (status = 200, description = "Problem updated", body = ProblemResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR, UNSUPPORTED_LANGUAGE, REFERENCE_SOLUTION_FAILED)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Problem not found (NOT_FOUND)", body = ErrorBody),
        (status = 502, description = "Judge unavailable (UPSTREAM_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_problem(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<ProblemRequest>,
) -> Result<Json<ProblemResponse>, AppError> {
    auth_user.require_permission("problem:edit")?;
    validate_problem_request(&payload)?;
    find_problem(&state.db, id).await?;
    verify_reference_solutions(&state, &payload).await?;

    let now = chrono::Utc::now();
    let txn = state.db.begin().await?;

    let existing = find_problem_for_update(&txn, id).await?;
    let model = apply_request(existing.into(), &payload, now)?
        .update(&txn)
        .await?;

    test_case::Entity::delete_many()
        .filter(test_case::Column::ProblemId.eq(id))
        .exec(&txn)
        .await?;
    let cases = insert_test_cases(&txn, id, &payload.test_cases).await?;

    txn.commit().await?;

    Ok(Json(ProblemResponse::from_parts(model, cases)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Problems",
    operation_id = "deleteProblem",
    summary = "Delete a problem by ID",
    description = "Permanently deletes a problem together with its test cases, submissions and their results, solved markers and playlist entries. Requires `problem:delete` permission.",
    params(("id" = i32, Path, description = "Problem ID")),
    responses(
        (status = 204, description = "Problem deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Problem not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_problem(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("problem:delete")?;

    let txn = state.db.begin().await?;

    let _problem = find_problem_for_update(&txn, id).await?;

    test_case_result::Entity::delete_many()
        .filter(
            test_case_result::Column::SubmissionId.in_subquery(
                SeaQuery::select()
                    .column(submission::Column::Id)
                    .from(submission::Entity)
                    .and_where(submission::Column::ProblemId.eq(id))
                    .to_owned(),
            ),
        )
        .exec(&txn)
        .await?;
    submission::Entity::delete_many()
        .filter(submission::Column::ProblemId.eq(id))
        .exec(&txn)
        .await?;
    problem_solved::Entity::delete_many()
        .filter(problem_solved::Column::ProblemId.eq(id))
        .exec(&txn)
        .await?;
    problem_in_playlist::Entity::delete_many()
        .filter(problem_in_playlist::Column::ProblemId.eq(id))
        .exec(&txn)
        .await?;
    test_case::Entity::delete_many()
        .filter(test_case::Column::ProblemId.eq(id))
        .exec(&txn)
        .await?;
    problem::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    info!(problem_id = id, "Deleted problem");
    Ok(StatusCode::NO_CONTENT)
}

/// Run every reference solution against the request's test cases.
async fn verify_reference_solutions(
    state: &AppState,
    payload: &ProblemRequest,
) -> Result<(), AppError> {
    let cases: Vec<TestCase> = payload
        .test_cases
        .iter()
        .map(|tc| TestCase {
            input: tc.input.clone(),
            expected_output: tc.output.clone(),
        })
        .collect();
    let cancel = state.shutdown.child_token();

    for (language, source_code) in &payload.reference_solutions {
        let check = check_reference_solution(
            state.judge.as_ref(),
            language,
            source_code,
            &cases,
            &cancel,
        )
        .await?;

        if let ReferenceCheck::Failed { case, status } = check {
            return Err(AppError::ReferenceSolutionFailed(format!(
                "Reference solution for {language} failed test case {case}: {status}"
            )));
        }
    }
    Ok(())
}

fn apply_request(
    mut active: problem::ActiveModel,
    payload: &ProblemRequest,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<problem::ActiveModel, AppError> {
    active.title = Set(payload.title.trim().to_string());
    active.description = Set(payload.description.clone());
    active.difficulty = Set(payload.difficulty);
    active.tags = Set(to_json(&payload.tags)?);
    active.examples = Set(if serde_json::Value::is_null(&payload.examples) {
        serde_json::json!({})
    } else {
        payload.examples.clone()
    });
    active.constraints = Set(payload
        .constraints
        .as_ref()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty()));
    active.code_snippets = Set(to_json(&canonical_keys(&payload.code_snippets))?);
    active.reference_solutions = Set(to_json(&canonical_keys(&payload.reference_solutions))?);
    active.updated_at = Set(now);
    Ok(active)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(value).map_err(|e| AppError::Internal(format!("JSON error: {e}")))
}

async fn insert_test_cases<C: ConnectionTrait>(
    db: &C,
    problem_id: i32,
    cases: &[TestCaseBody],
) -> Result<Vec<test_case::Model>, AppError> {
    let mut inserted = Vec::with_capacity(cases.len());
    for (position, case) in cases.iter().enumerate() {
        let model = test_case::ActiveModel {
            input: Set(case.input.clone()),
            expected_output: Set(case.output.clone()),
            position: Set(position as i32),
            problem_id: Set(problem_id),
            ..Default::default()
        }
        .insert(db)
        .await?;
        inserted.push(model);
    }
    Ok(inserted)
}

pub(crate) async fn find_problem<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<problem::Model, AppError> {
    problem::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Problem not found".into()))
}

async fn find_problem_for_update(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<problem::Model, AppError> {
    problem::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Problem not found".into()))
}

async fn find_test_cases<C: ConnectionTrait>(
    db: &C,
    problem_id: i32,
) -> Result<Vec<test_case::Model>, AppError> {
    Ok(test_case::Entity::find()
        .filter(test_case::Column::ProblemId.eq(problem_id))
        .order_by_asc(test_case::Column::Position)
        .all(db)
        .await?)
}
