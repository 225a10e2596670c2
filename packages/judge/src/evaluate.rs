//! Runs a submission against caller-supplied test cases and classifies it.

use common::Verdict;
use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::client::JudgeBackend;
use crate::error::JudgeError;
use crate::language::canonical_language;
use crate::types::{BatchSubmission, JudgeResult, TestCase};

#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Language '{0}' is not supported")]
    UnsupportedLanguage(String),

    #[error(transparent)]
    Judge(#[from] JudgeError),
}

/// What the caller wants judged.
#[derive(Clone, Debug)]
pub struct EvaluationRequest {
    pub source_code: String,
    pub language: String,
    pub stdin: Vec<String>,
    pub expected_outputs: Vec<String>,
}

impl EvaluationRequest {
    /// Check the case arrays and resolve the language, without touching the judge.
    pub fn validate(&self) -> Result<(&'static str, u32), EvaluationError> {
        if self.stdin.is_empty() {
            return Err(EvaluationError::InvalidInput(
                "At least one test case is required".into(),
            ));
        }
        if self.stdin.len() != self.expected_outputs.len() {
            return Err(EvaluationError::InvalidInput(format!(
                "Got {} inputs but {} expected outputs",
                self.stdin.len(),
                self.expected_outputs.len()
            )));
        }
        canonical_language(&self.language)
            .ok_or_else(|| EvaluationError::UnsupportedLanguage(self.language.trim().to_string()))
    }
}

/// Outcome of a single test case.
#[derive(Clone, Debug, PartialEq)]
pub struct CaseOutcome {
    /// 1-based position of the case in the request.
    pub ordinal: i32,
    pub passed: bool,
    /// Trimmed program output; `None` when the program printed nothing.
    pub stdout: Option<String>,
    /// Trimmed expected output.
    pub expected_output: String,
    pub stderr: Option<String>,
    pub compile_output: Option<String>,
    /// Judge status description ("Accepted", "Compilation Error", ...).
    pub status: String,
    pub memory_used: Option<i32>,
    pub time_used: Option<i32>,
}

/// A fully judged submission, ready to be stored.
#[derive(Clone, Debug)]
pub struct Evaluation {
    pub source_code: String,
    /// Canonical language name, e.g. "PYTHON".
    pub language: String,
    pub language_id: u32,
    /// All inputs joined with newlines.
    pub stdin: String,
    pub verdict: Verdict,
    pub cases: Vec<CaseOutcome>,
}

/// Per-case fields collected into parallel JSON arrays.
///
/// A column is `None` when no case produced the field at all; otherwise it
/// holds one entry per case, `null` where a case lacked it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Aggregates {
    pub stdout: Option<Value>,
    pub stderr: Option<Value>,
    pub compile_output: Option<Value>,
    pub memory: Option<Value>,
    pub time: Option<Value>,
}

impl Evaluation {
    pub fn aggregates(&self) -> Aggregates {
        Aggregates {
            stdout: collect_column(self.cases.iter().map(|c| c.stdout.clone())),
            stderr: collect_column(self.cases.iter().map(|c| c.stderr.clone())),
            compile_output: collect_column(self.cases.iter().map(|c| c.compile_output.clone())),
            memory: collect_column(self.cases.iter().map(|c| c.memory_used)),
            time: collect_column(self.cases.iter().map(|c| c.time_used)),
        }
    }
}

fn collect_column<T: Into<Value>>(values: impl Iterator<Item = Option<T>>) -> Option<Value> {
    let values: Vec<Value> = values
        .map(|v| v.map_or(Value::Null, Into::into))
        .collect();
    if values.iter().all(Value::is_null) {
        None
    } else {
        Some(Value::Array(values))
    }
}

/// Trimmed exact comparison. A missing output compares as empty.
pub fn outputs_match(actual: Option<&str>, expected: &str) -> bool {
    actual.unwrap_or_default().trim() == expected.trim()
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.is_empty())
}

fn outcome(ordinal: usize, result: JudgeResult, expected: &str) -> CaseOutcome {
    let passed = outputs_match(result.stdout.as_deref(), expected);
    let memory_used = result.memory_kb();
    let time_used = result.time_ms();

    CaseOutcome {
        ordinal: ordinal as i32 + 1,
        passed,
        stdout: non_empty(result.stdout.map(|s| s.trim().to_string())),
        expected_output: expected.trim().to_string(),
        stderr: non_empty(result.stderr),
        compile_output: non_empty(result.compile_output),
        status: result.status.description,
        memory_used,
        time_used,
    }
}

/// Judge `request` and classify every case.
///
/// Validation happens before any call to `backend`. The verdict is
/// `Accepted` iff every case passes.
#[instrument(skip_all, fields(language = %request.language, cases = request.stdin.len()))]
pub async fn evaluate<B>(
    backend: &B,
    request: EvaluationRequest,
    cancel: &CancellationToken,
) -> Result<Evaluation, EvaluationError>
where
    B: JudgeBackend + ?Sized,
{
    let (language, language_id) = request.validate()?;

    let submissions: Vec<BatchSubmission> = request
        .stdin
        .iter()
        .map(|input| BatchSubmission {
            source_code: request.source_code.clone(),
            language_id,
            stdin: input.clone(),
            expected_output: None,
        })
        .collect();

    let tokens = backend.submit_batch(&submissions).await?;
    let results = backend.poll_until_complete(&tokens, cancel).await?;

    if results.len() != request.expected_outputs.len() {
        return Err(EvaluationError::Judge(JudgeError::Upstream(format!(
            "expected {} results, judge returned {}",
            request.expected_outputs.len(),
            results.len()
        ))));
    }

    let cases: Vec<CaseOutcome> = results
        .into_iter()
        .zip(&request.expected_outputs)
        .enumerate()
        .map(|(i, (result, expected))| outcome(i, result, expected))
        .collect();

    let verdict = Verdict::from_passes(cases.iter().map(|c| c.passed));
    let passed = cases.iter().filter(|c| c.passed).count();
    info!(%verdict, passed, total = cases.len(), "Evaluated submission");

    Ok(Evaluation {
        stdin: request.stdin.join("\n"),
        source_code: request.source_code,
        language: language.to_string(),
        language_id,
        verdict,
        cases,
    })
}

/// Result of running a reference solution against a problem's cases.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReferenceCheck {
    Passed,
    /// `case` is 1-based; `status` is the judge's description.
    Failed { case: usize, status: String },
}

/// Run a reference solution with `expected_output` set, letting the judge do
/// the comparison. Every case must come back with Judge0's accepted status.
#[instrument(skip(backend, source_code, cases, cancel), fields(cases = cases.len()))]
pub async fn check_reference_solution<B>(
    backend: &B,
    language: &str,
    source_code: &str,
    cases: &[TestCase],
    cancel: &CancellationToken,
) -> Result<ReferenceCheck, EvaluationError>
where
    B: JudgeBackend + ?Sized,
{
    let (_, language_id) = canonical_language(language)
        .ok_or_else(|| EvaluationError::UnsupportedLanguage(language.trim().to_string()))?;
    if cases.is_empty() {
        return Err(EvaluationError::InvalidInput(
            "At least one test case is required".into(),
        ));
    }

    let submissions: Vec<BatchSubmission> = cases
        .iter()
        .map(|case| BatchSubmission {
            source_code: source_code.to_string(),
            language_id,
            stdin: case.input.clone(),
            expected_output: Some(case.expected_output.clone()),
        })
        .collect();

    let tokens = backend.submit_batch(&submissions).await?;
    let results = backend.poll_until_complete(&tokens, cancel).await?;

    let failure = results
        .into_iter()
        .enumerate()
        .find(|(_, result)| !result.status.is_accepted());

    Ok(match failure {
        Some((i, result)) => ReferenceCheck::Failed {
            case: i + 1,
            status: result.status.description,
        },
        None => ReferenceCheck::Passed,
    })
}
