//! Client for the external Judge0 service and the evaluation logic built on it.

pub mod client;
pub mod error;
pub mod evaluate;
pub mod language;
pub mod types;

pub use client::{Judge0Client, JudgeBackend};
pub use error::JudgeError;
pub use evaluate::{
    Aggregates, CaseOutcome, Evaluation, EvaluationError, EvaluationRequest, ReferenceCheck,
    check_reference_solution, evaluate,
};
pub use types::{BatchSubmission, JudgeResult, JudgeStatus, JudgeToken, TestCase};
