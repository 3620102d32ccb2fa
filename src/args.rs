use clap::Parser;
use std::time::Duration;

use crate::error::ConfigError;
use crate::filter::{FragmentFilter, MatchMode};

/// Search GitHub code and pull regex matches, URLs or domains out of the
/// returned fragments.
#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    about,
    long_about = "Queries the GitHub code search API page by page (up to the 1000 result cap) and prints every substring of the returned text fragments that matches a regex, optionally narrowed to URLs or domain names."
)]
pub struct Args {
    /// Search query sent to the GitHub API (e.g. "org:acme api_key").
    #[clap(short, long)]
    pub query: String,

    /// Regex used to filter the extracted results locally.
    #[clap(short, long)]
    pub regex: String,

    /// Extraction mode: "urls" or "domains". Empty applies the regex to the raw fragment.
    #[clap(short, long, default_value = "")]
    pub mode: String,

    /// Delay in seconds between page requests.
    #[clap(short, long, value_name = "SECONDS", default_value = "2")]
    pub delay: u64,

    /// Only print unique extracted results, without the source file URL.
    #[clap(short, long)]
    pub silent: bool,

    /// GitHub API token. Requests are unauthenticated when absent.
    #[clap(short, long, env = "GITHUB_KEY", hide_env_values = true)]
    pub token: Option<String>,
}

/// Validated settings for one run.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub query: String,
    pub filter: FragmentFilter,
    pub delay: Duration,
    pub silent: bool,
    pub token: Option<String>,
}

impl Args {
    /// Check every flag and compile the filter. Nothing here touches the network.
    pub fn into_config(self) -> Result<SearchConfig, ConfigError> {
        if self.query.is_empty() {
            return Err(ConfigError::MissingQuery);
        }
        if self.regex.is_empty() {
            return Err(ConfigError::MissingPattern);
        }

        let mode: MatchMode = self.mode.parse()?;
        let filter = FragmentFilter::new(&self.regex, mode)?;

        Ok(SearchConfig {
            query: self.query,
            filter,
            delay: Duration::from_secs(self.delay),
            silent: self.silent,
            token: self.token.filter(|t| !t.trim().is_empty()),
        })
    }
}
