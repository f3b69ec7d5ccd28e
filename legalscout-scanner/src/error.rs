use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid crawl strategy '{0}' (expected bfs, dfs or best_first)")]
    InvalidStrategy(String),

    #[error("Task join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, ScanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_problem() {
        assert_eq!(
            ScanError::InvalidStrategy("random".into()).to_string(),
            "Invalid crawl strategy 'random' (expected bfs, dfs or best_first)"
        );
        assert_eq!(
            ScanError::InvalidUrl("ftp://example.com".into()).to_string(),
            "Invalid URL: ftp://example.com"
        );
        assert_eq!(
            ScanError::InvalidConfig("max_pages must be at least 1".into()).to_string(),
            "Invalid configuration: max_pages must be at least 1"
        );
    }
}
