//! # GitHub Code Extractor
//!
//! A Rust library for mining GitHub code search results: it pages through the
//! search API and pulls regex matches, URLs or domain names out of the text
//! fragments GitHub returns for each hit.
//!
//! ## Main Components
//!
//! - [`PaginationDriver`]: The fetch/filter/print loop with its termination rules
//! - [`SearchClient`]: One HTTP request per page against the code search endpoint
//! - [`FragmentFilter`]: Applies the user regex in one of the [`MatchMode`]s
//! - [`Args`]: Command line arguments, validated into a [`SearchConfig`]
//!
//! ## Example
//!
//! ```no_run
//! use github_code_extractor_lib::{Args, PaginationDriver, SearchClient};
//! use clap::Parser;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     // Parse and validate command line arguments
//!     let config = Args::parse().into_config()?;
//!
//!     // Build the client and run every page to completion
//!     let client = SearchClient::new(config.token.clone())?;
//!     let summary = PaginationDriver::new(client, config)
//!         .run(&mut std::io::stdout())
//!         .await?;
//!
//!     println!("{} results over {} pages", summary.emitted, summary.pages_fetched);
//!     Ok(())
//! }
//! ```

mod args;
mod dedup;
mod domain;
mod driver;
mod error;
mod filter;
mod search_client;

// Re-export main components for documentation and external use
pub use crate::args::{Args, SearchConfig};
pub use crate::dedup::SeenSet;
pub use crate::domain::extract_domain;
pub use crate::driver::{PaginationDriver, PaginationState, RunSummary, Termination, MAX_PAGES};
pub use crate::error::{ConfigError, SearchError};
pub use crate::filter::{FragmentFilter, MatchMode};
pub use crate::search_client::{
    RateLimit, SearchClient, SearchItem, SearchResponse, TextMatch, PER_PAGE, SEARCH_ENDPOINT,
};
