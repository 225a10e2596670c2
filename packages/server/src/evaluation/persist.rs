use chrono::{DateTime, Utc};
use judge::{CaseOutcome, Evaluation};
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use tracing::{debug, info, instrument};

use crate::entity::{problem_solved, submission, test_case_result};

/// A submission as read back inside its transaction, with its results in case order.
#[derive(Clone, Debug)]
pub struct StoredSubmission {
    pub submission: submission::Model,
    pub results: Vec<test_case_result::Model>,
}

/// Store an evaluated submission, its per-case results and, when accepted, the
/// solved marker, all in one transaction.
///
/// An existing solved marker is never removed; a wrong answer after an accepted
/// one leaves it in place.
#[instrument(skip(db, evaluation), fields(verdict = %evaluation.verdict, cases = evaluation.cases.len()))]
pub async fn persist(
    db: &DatabaseConnection,
    user_id: i32,
    problem_id: i32,
    evaluation: Evaluation,
) -> Result<StoredSubmission, DbErr> {
    let aggregates = evaluation.aggregates();
    let now = Utc::now();

    let txn = db.begin().await?;

    let submission = submission::ActiveModel {
        source_code: Set(evaluation.source_code),
        language: Set(evaluation.language),
        stdin: Set(evaluation.stdin),
        stdout: Set(aggregates.stdout),
        stderr: Set(aggregates.stderr),
        compile_output: Set(aggregates.compile_output),
        memory: Set(aggregates.memory),
        time: Set(aggregates.time),
        verdict: Set(evaluation.verdict),
        user_id: Set(user_id),
        problem_id: Set(problem_id),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    if evaluation.verdict.is_accepted() {
        mark_solved(&txn, user_id, problem_id, now).await?;
    }

    for case in &evaluation.cases {
        case_row(submission.id, case, now).insert(&txn).await?;
    }

    let results = test_case_result::Entity::find()
        .filter(test_case_result::Column::SubmissionId.eq(submission.id))
        .order_by_asc(test_case_result::Column::TestCase)
        .all(&txn)
        .await?;

    txn.commit().await?;

    info!(
        submission_id = submission.id,
        user_id,
        problem_id,
        results = results.len(),
        "Stored submission"
    );

    Ok(StoredSubmission {
        submission,
        results,
    })
}

/// Record that `user_id` solved `problem_id`. A marker that already exists is left as is.
pub async fn mark_solved<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    problem_id: i32,
    now: DateTime<Utc>,
) -> Result<(), DbErr> {
    let marker = problem_solved::ActiveModel {
        user_id: Set(user_id),
        problem_id: Set(problem_id),
        created_at: Set(now),
        ..Default::default()
    };

    let result = problem_solved::Entity::insert(marker)
        .on_conflict(
            OnConflict::columns([
                problem_solved::Column::UserId,
                problem_solved::Column::ProblemId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(db)
        .await;

    match result {
        Ok(_) => Ok(()),
        Err(DbErr::RecordNotInserted) => {
            debug!(user_id, problem_id, "Problem already marked solved");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

fn case_row(submission_id: i32, case: &CaseOutcome, now: DateTime<Utc>) -> test_case_result::ActiveModel {
    test_case_result::ActiveModel {
        submission_id: Set(submission_id),
        test_case: Set(case.ordinal),
        passed: Set(case.passed),
        stdout: Set(case.stdout.clone()),
        expected_output: Set(case.expected_output.clone()),
        stderr: Set(case.stderr.clone()),
        compile_output: Set(case.compile_output.clone()),
        status: Set(case.status.clone()),
        memory_used: Set(case.memory_used),
        time_used: Set(case.time_used),
        created_at: Set(now),
        ..Default::default()
    }
}
