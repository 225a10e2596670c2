//! Judging a submission and storing the outcome.

pub mod persist;

use judge::EvaluationRequest;
use tracing::instrument;

use crate::error::AppError;
use crate::state::AppState;

pub use persist::{StoredSubmission, mark_solved, persist};

/// Run `request` through the judge and store the result for `(user_id, problem_id)`.
///
/// Nothing is written unless the judge produced a result for every case.
/// Polling stops early when the server shuts down.
#[instrument(skip(state, request), fields(language = %request.language))]
pub async fn evaluate_and_persist(
    state: &AppState,
    user_id: i32,
    problem_id: i32,
    request: EvaluationRequest,
) -> Result<StoredSubmission, AppError> {
    let cancel = state.shutdown.child_token();
    let evaluation = judge::evaluate(state.judge.as_ref(), request, &cancel).await?;
    Ok(persist(&state.db, user_id, problem_id, evaluation).await?)
}
