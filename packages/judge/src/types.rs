use serde::{Deserialize, Serialize};

/// Judge0 status ids that mean the submission has not finished yet.
pub const STATUS_IN_QUEUE: u32 = 1;
pub const STATUS_PROCESSING: u32 = 2;
/// Judge0 status id for a run whose output matched `expected_output`
/// (or, without one, a clean exit).
pub const STATUS_ACCEPTED: u32 = 3;

/// One (input, expected output) pair supplied by the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub input: String,
    pub expected_output: String,
}

/// A single entry of a `POST /submissions/batch` request.
#[derive(Clone, Debug, Serialize)]
pub struct BatchSubmission {
    pub source_code: String,
    pub language_id: u32,
    pub stdin: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_output: Option<String>,
}

/// Opaque identifier the judge hands back for each submitted case.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JudgeToken(pub String);

impl JudgeToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeStatus {
    pub id: u32,
    pub description: String,
}

impl JudgeStatus {
    /// A status is terminal once the judge is neither queueing nor running it.
    pub fn is_terminal(&self) -> bool {
        !matches!(self.id, STATUS_IN_QUEUE | STATUS_PROCESSING)
    }

    pub fn is_accepted(&self) -> bool {
        self.id == STATUS_ACCEPTED
    }
}

/// Execution result for one case as reported by `GET /submissions/batch`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JudgeResult {
    #[serde(default)]
    pub token: Option<JudgeToken>,
    pub status: JudgeStatus,
    #[serde(default)]
    pub stdout: Option<String>,
    #[serde(default)]
    pub stderr: Option<String>,
    #[serde(default)]
    pub compile_output: Option<String>,
    /// Peak memory in kilobytes.
    #[serde(default)]
    pub memory: Option<i64>,
    /// Wall time in seconds, as a decimal string ("0.004").
    #[serde(default)]
    pub time: Option<String>,
}

impl JudgeResult {
    /// Run time in whole milliseconds, if the judge reported a parseable time.
    pub fn time_ms(&self) -> Option<i32> {
        let secs: f64 = self.time.as_deref()?.trim().parse().ok()?;
        if !secs.is_finite() || secs < 0.0 {
            return None;
        }
        Some((secs * 1000.0).round() as i32)
    }

    pub fn memory_kb(&self) -> Option<i32> {
        self.memory.and_then(|m| i32::try_from(m).ok())
    }
}

#[derive(Deserialize)]
pub(crate) struct TokenEntry {
    pub token: Option<JudgeToken>,
}

#[derive(Deserialize)]
pub(crate) struct BatchResults {
    pub submissions: Vec<Option<JudgeResult>>,
}

#[derive(Serialize)]
pub(crate) struct BatchRequest<'a> {
    pub submissions: &'a [BatchSubmission],
}
