use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use judge::language::canonical_language;
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::problem::Difficulty;
use crate::entity::{problem, test_case};
use crate::error::AppError;

pub use super::shared::{Pagination, escape_like};
use super::shared::{page_bounds, validate_title};

pub const MAX_TEST_CASES: usize = 100;
const MAX_TAGS: usize = 20;
const MAX_DESCRIPTION_BYTES: usize = 1_000_000;

/// One input/output pair of a problem.
#[derive(Clone, Deserialize, Serialize, utoipa::ToSchema)]
pub struct TestCaseBody {
    #[schema(example = "2 2")]
    pub input: String,
    #[schema(example = "4")]
    pub output: String,
}

/// Request body for creating a problem, or fully replacing one with `PUT`.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct ProblemRequest {
    #[schema(example = "Add Two Numbers")]
    pub title: String,
    /// Problem statement in Markdown.
    pub description: String,
    pub difficulty: Difficulty,
    #[serde(default)]
    #[schema(example = json!(["math"]))]
    pub tags: Vec<String>,
    /// Worked examples, keyed by language.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub examples: Value,
    pub constraints: Option<String>,
    /// Starter code keyed by language name.
    #[serde(default)]
    pub code_snippets: BTreeMap<String, String>,
    /// Solutions keyed by language name. Every one must pass every test case.
    pub reference_solutions: BTreeMap<String, String>,
    pub test_cases: Vec<TestCaseBody>,
}

/// Full problem details.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ProblemResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub tags: Vec<String>,
    #[schema(value_type = Object)]
    pub examples: Value,
    pub constraints: Option<String>,
    #[schema(value_type = Object)]
    pub code_snippets: Value,
    #[schema(value_type = Object)]
    pub reference_solutions: Value,
    pub test_cases: Vec<TestCaseBody>,
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProblemResponse {
    pub fn from_parts(m: problem::Model, cases: Vec<test_case::Model>) -> Self {
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            difficulty: m.difficulty,
            tags: tags_of(m.tags),
            examples: m.examples,
            constraints: m.constraints,
            code_snippets: m.code_snippets,
            reference_solutions: m.reference_solutions,
            test_cases: cases
                .into_iter()
                .map(|tc| TestCaseBody {
                    input: tc.input,
                    output: tc.expected_output,
                })
                .collect(),
            user_id: m.user_id,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

fn tags_of(tags: Value) -> Vec<String> {
    serde_json::from_value(tags).unwrap_or_default()
}

#[derive(Serialize, FromQueryResult, utoipa::ToSchema)]
pub struct ProblemListItem {
    pub id: i32,
    pub title: String,
    pub difficulty: Difficulty,
    #[schema(value_type = Vec<String>)]
    pub tags: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ProblemListResponse {
    pub data: Vec<ProblemListItem>,
    pub pagination: Pagination,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProblemListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub difficulty: Option<Difficulty>,
    /// Case-insensitive substring of the title.
    pub search: Option<String>,
}

impl ProblemListQuery {
    pub fn bounds(&self) -> (u64, u64) {
        page_bounds(self.page, self.per_page)
    }
}

/// A problem the caller has solved.
#[derive(Serialize, utoipa::ToSchema)]
pub struct SolvedProblemItem {
    pub id: i32,
    pub title: String,
    pub difficulty: Difficulty,
    pub solved_at: DateTime<Utc>,
}

pub fn validate_problem_request(req: &ProblemRequest) -> Result<(), AppError> {
    validate_title(&req.title)?;
    if req.description.trim().is_empty() || req.description.len() > MAX_DESCRIPTION_BYTES {
        return Err(AppError::Validation(
            "Description must be non-empty and at most 1MB".into(),
        ));
    }
    if req.tags.len() > MAX_TAGS {
        return Err(AppError::Validation(format!(
            "At most {MAX_TAGS} tags are allowed"
        )));
    }
    if req
        .tags
        .iter()
        .any(|t| t.trim().is_empty() || t.chars().count() > 32)
    {
        return Err(AppError::Validation("Tags must be 1-32 characters".into()));
    }
    if !(req.examples.is_null() || req.examples.is_object()) {
        return Err(AppError::Validation("Examples must be an object".into()));
    }
    if req.test_cases.is_empty() || req.test_cases.len() > MAX_TEST_CASES {
        return Err(AppError::Validation(format!(
            "Problems need 1-{MAX_TEST_CASES} test cases"
        )));
    }
    if req.reference_solutions.is_empty() {
        return Err(AppError::Validation(
            "At least one reference solution is required".into(),
        ));
    }
    for language in req
        .reference_solutions
        .keys()
        .chain(req.code_snippets.keys())
    {
        if canonical_language(language).is_none() {
            return Err(AppError::UnsupportedLanguage(language.clone()));
        }
    }
    if req.reference_solutions.values().any(|s| s.trim().is_empty()) {
        return Err(AppError::Validation(
            "Reference solutions must not be empty".into(),
        ));
    }
    Ok(())
}

/// Re-key a language map by canonical language name.
pub fn canonical_keys(map: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    map.iter()
        .map(|(language, code)| {
            let name = canonical_language(language)
                .map_or_else(|| language.clone(), |(name, _)| name.to_string());
            (name, code.clone())
        })
        .collect()
}
