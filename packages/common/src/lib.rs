pub mod config;
pub mod verdict;

pub use config::JudgeConfig;
pub use verdict::Verdict;
