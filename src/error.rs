use reqwest::StatusCode;

use crate::search_client::RateLimit;

/// Problems with the command line, detected before any request is sent.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `-q` was empty
    #[error("a search query must be provided with -q")]
    MissingQuery,

    /// `-r` was empty
    #[error("a filter regex must be provided with -r")]
    MissingPattern,

    /// `-m` was something other than "", "urls" or "domains"
    #[error("invalid mode '{0}': -m must be 'urls' or 'domains'")]
    InvalidMode(String),

    #[error("failed to compile filter regex: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Every way a run can fail. None of these are retried.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// DNS, connection, TLS or timeout failure
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with something other than 200 OK
    #[error("API error (status {}): {}{}", .status.as_u16(), .body, .rate_limit.as_ref().map(|r| format!(" [{r}]")).unwrap_or_default())]
    Status {
        status: StatusCode,
        body: String,
        rate_limit: Option<RateLimit>,
    },

    #[error("failed to decode search response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}
