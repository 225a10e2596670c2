#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Overall classification of an evaluated submission.
///
/// Compilation and runtime failures are reported per test case and roll up
/// into `WrongAnswer`; there is no separate overall verdict for them.
///
/// When the `sea-orm` feature is enabled, this enum can be used directly in SeaORM entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
pub enum Verdict {
    /// Every test case produced the expected output.
    #[serde(rename = "Accepted")]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Accepted"))]
    Accepted,
    /// At least one test case failed.
    #[serde(rename = "Wrong Answer")]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Wrong Answer"))]
    WrongAnswer,
}

impl Verdict {
    /// Verdict for a set of per-case pass flags. An empty set is never accepted.
    pub fn from_passes(passes: impl IntoIterator<Item = bool>) -> Self {
        let mut any = false;
        for passed in passes {
            if !passed {
                return Self::WrongAnswer;
            }
            any = true;
        }
        if any { Self::Accepted } else { Self::WrongAnswer }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "Accepted",
            Self::WrongAnswer => "Wrong Answer",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
