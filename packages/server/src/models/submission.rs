use chrono::{DateTime, Utc};
use common::Verdict;
use judge::EvaluationRequest;
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::{submission, test_case_result};
use crate::error::AppError;

use super::shared::Pagination;

const MAX_SOURCE_BYTES: usize = 65_536;

/// Request body for running code against caller-supplied test cases.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct ExecuteCodeRequest {
    #[schema(example = "a, b = map(int, input().split())\nprint(a + b)")]
    pub source_code: String,
    /// One of `JAVA`, `PYTHON`, `C++` (case-insensitive).
    #[schema(example = "PYTHON")]
    pub language: String,
    /// One input per test case.
    #[schema(example = json!(["2 2", "3 4"]))]
    pub stdin: Vec<String>,
    /// Expected output per test case, parallel to `stdin`.
    #[schema(example = json!(["4", "7"]))]
    pub expected_outputs: Vec<String>,
}

pub fn validate_execute_request(req: &ExecuteCodeRequest) -> Result<(), AppError> {
    if req.source_code.trim().is_empty() {
        return Err(AppError::Validation("Source code must not be empty".into()));
    }
    if req.source_code.len() > MAX_SOURCE_BYTES {
        return Err(AppError::Validation(
            "Source code must be at most 64KB".into(),
        ));
    }
    Ok(())
}

impl From<ExecuteCodeRequest> for EvaluationRequest {
    fn from(req: ExecuteCodeRequest) -> Self {
        Self {
            source_code: req.source_code,
            language: req.language,
            stdin: req.stdin,
            expected_outputs: req.expected_outputs,
        }
    }
}

/// Outcome of one test case within a submission.
#[derive(Serialize, utoipa::ToSchema)]
pub struct TestCaseResultResponse {
    /// 1-based ordinal within the submission.
    #[schema(example = 1)]
    pub test_case: i32,
    pub passed: bool,
    pub stdout: Option<String>,
    pub expected_output: String,
    pub stderr: Option<String>,
    pub compile_output: Option<String>,
    #[schema(example = "Accepted")]
    pub status: String,
    /// Peak memory in kilobytes.
    pub memory_used: Option<i32>,
    /// Wall time in milliseconds.
    pub time_used: Option<i32>,
}

impl From<test_case_result::Model> for TestCaseResultResponse {
    fn from(m: test_case_result::Model) -> Self {
        Self {
            test_case: m.test_case,
            passed: m.passed,
            stdout: m.stdout,
            expected_output: m.expected_output,
            stderr: m.stderr,
            compile_output: m.compile_output,
            status: m.status,
            memory_used: m.memory_used,
            time_used: m.time_used,
        }
    }
}

/// Full submission details with per-case results.
#[derive(Serialize, utoipa::ToSchema)]
pub struct SubmissionResponse {
    #[schema(example = 1)]
    pub id: i32,
    pub user_id: i32,
    pub problem_id: i32,
    pub source_code: String,
    #[schema(example = "PYTHON")]
    pub language: String,
    pub stdin: String,
    #[schema(value_type = Option<Vec<Object>>)]
    pub stdout: Option<Value>,
    #[schema(value_type = Option<Vec<Object>>)]
    pub stderr: Option<Value>,
    #[schema(value_type = Option<Vec<Object>>)]
    pub compile_output: Option<Value>,
    #[schema(value_type = Option<Vec<Object>>)]
    pub memory: Option<Value>,
    #[schema(value_type = Option<Vec<Object>>)]
    pub time: Option<Value>,
    pub verdict: Verdict,
    pub created_at: DateTime<Utc>,
    pub test_cases: Vec<TestCaseResultResponse>,
}

impl SubmissionResponse {
    pub fn from_parts(m: submission::Model, results: Vec<test_case_result::Model>) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            problem_id: m.problem_id,
            source_code: m.source_code,
            language: m.language,
            stdin: m.stdin,
            stdout: m.stdout,
            stderr: m.stderr,
            compile_output: m.compile_output,
            memory: m.memory,
            time: m.time,
            verdict: m.verdict,
            created_at: m.created_at,
            test_cases: results.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Serialize, FromQueryResult, utoipa::ToSchema)]
pub struct SubmissionListItem {
    pub id: i32,
    pub problem_id: i32,
    pub language: String,
    pub verdict: Verdict,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SubmissionListResponse {
    pub data: Vec<SubmissionListItem>,
    pub pagination: Pagination,
}

/// Number of submissions for a problem across all users.
#[derive(Serialize, utoipa::ToSchema)]
pub struct SubmissionCountResponse {
    pub problem_id: i32,
    #[schema(example = 12)]
    pub count: u64,
}
