use thiserror::Error;

/// Failure of a single source lookup. Resolvers log these and move on.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),
}

/// Run-level failures surfaced to the user with a non-zero exit.
#[derive(Debug, Error, PartialEq)]
pub enum RunError {
    #[error(
        "There are {0} repos with missing licenses and no path provided to write the missing licenses output"
    )]
    MissingWithoutDestination(usize),
    #[error("run cancelled after {completed} of {total} dependencies were processed")]
    Cancelled { completed: usize, total: usize },
}
