use thiserror::Error;

#[derive(Debug, Error)]
pub enum JudgeError {
    /// The judge could not be reached or answered with something unusable.
    #[error("Judge upstream error: {0}")]
    Upstream(String),

    /// Polling ran out of attempts or hit its overall deadline.
    #[error("Judge did not finish in time: {0}")]
    Timeout(String),

    #[error("Judge polling was cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for JudgeError {
    fn from(err: reqwest::Error) -> Self {
        JudgeError::Upstream(err.to_string())
    }
}
