use common::Verdict;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "submission")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(column_type = "Text")]
    pub source_code: String,
    pub language: String,
    /// All test inputs joined with newlines.
    #[sea_orm(column_type = "Text")]
    pub stdin: String,

    // Per-case columns below are JSON arrays in case order, NULL when no case
    // produced the field. test_case_result holds the authoritative values.
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub stdout: Option<Json>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub stderr: Option<Json>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub compile_output: Option<Json>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub memory: Option<Json>, // in kilobytes
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub time: Option<Json>, // in milliseconds

    pub verdict: Verdict,

    #[sea_orm(has_many)]
    pub results: HasMany<super::test_case_result::Entity>,

    pub user_id: i32,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    pub problem_id: i32,
    #[sea_orm(belongs_to, from = "problem_id", to = "id")]
    pub problem: HasOne<super::problem::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
