use console::style;
use indicatif::ProgressBar;
use std::io::Write;
use std::time::Duration;
use tracing::{debug, info};

use crate::args::SearchConfig;
use crate::dedup::SeenSet;
use crate::error::SearchError;
use crate::filter::FragmentFilter;
use crate::search_client::{SearchClient, SearchItem, PER_PAGE};

/// GitHub never returns more than 1000 results for a search.
pub const MAX_PAGES: u32 = 10;

/// Why pagination stopped. All of these are normal completions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// A page came back with no items
    EmptyPage,
    /// `page * per_page` reached `total_count`
    Exhausted,
    /// The 1000 result cap was reached
    PageCeiling,
}

/// Current position in the result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    pub page: u32,
    pub per_page: u32,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: PER_PAGE,
        }
    }
}

impl PaginationState {
    /// Decide whether the page just processed was the last one.
    pub fn termination(&self, total_count: u64) -> Option<Termination> {
        if u64::from(self.page) * u64::from(self.per_page) >= total_count {
            Some(Termination::Exhausted)
        } else if self.page >= MAX_PAGES {
            Some(Termination::PageCeiling)
        } else {
            None
        }
    }

    pub fn advance(&mut self) {
        self.page += 1;
    }
}

/// Totals for a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub pages_fetched: u32,
    pub total_count: u64,
    pub emitted: usize,
    pub termination: Termination,
}

/// Drives the fetch/filter/print loop for a single query.
pub struct PaginationDriver {
    client: SearchClient,
    query: String,
    filter: FragmentFilter,
    delay: Duration,
    silent: bool,
    color: bool,
    seen: SeenSet,
    state: PaginationState,
    progress: ProgressBar,
}

impl PaginationDriver {
    pub fn new(client: SearchClient, config: SearchConfig) -> Self {
        PaginationDriver {
            client,
            query: config.query,
            filter: config.filter,
            delay: config.delay,
            silent: config.silent,
            color: false,
            seen: SeenSet::new(),
            state: PaginationState::default(),
            progress: ProgressBar::hidden(),
        }
    }

    /// Style the source URL and match when printing non-silent lines.
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Report progress on the given bar. Output lines are printed with it suspended.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Fetch pages until a terminal condition is met, writing results to `out`.
    ///
    /// The first error aborts the run; nothing is retried.
    pub async fn run<W: Write>(mut self, out: &mut W) -> Result<RunSummary, SearchError> {
        let mut emitted = 0;

        let (termination, total_count) = loop {
            let page = self.state.page;
            self.progress
                .set_message(format!("Searching '{}' - page {}", self.query, page));

            let response = self.client.search_page(&self.query, page).await?;
            let total_count = response.total_count;

            if response.items.is_empty() {
                debug!("Page {} returned no items", page);
                if !self.silent {
                    self.print(out, "No results found or end of available results.")?;
                }
                break (Termination::EmptyPage, total_count);
            }

            let before = emitted;
            for item in &response.items {
                emitted += self.process_item(item, out)?;
            }
            info!(
                "Page {} processed: {} items, {} results (total_count {})",
                page,
                response.items.len(),
                emitted - before,
                total_count
            );

            if let Some(reason) = self.state.termination(total_count) {
                if !self.silent {
                    self.print(out, "End of available results.")?;
                }
                break (reason, total_count);
            }

            self.state.advance();

            if !self.delay.is_zero() {
                self.progress.set_message(format!(
                    "Waiting {}s before page {}",
                    self.delay.as_secs(),
                    self.state.page
                ));
                tokio::time::sleep(self.delay).await;
            }
        };

        self.progress.finish_and_clear();

        Ok(RunSummary {
            pages_fetched: self.state.page,
            total_count,
            emitted,
            termination,
        })
    }

    /// Run the filter over every fragment of one item and print what survives.
    fn process_item<W: Write>(&mut self, item: &SearchItem, out: &mut W) -> Result<usize, SearchError> {
        let mut emitted = 0;

        for text_match in &item.text_matches {
            for found in self.filter.extract(&text_match.fragment) {
                if self.silent {
                    if self.seen.offer(&found) {
                        self.print(out, &found)?;
                        emitted += 1;
                    }
                } else {
                    let line = format!(
                        "{} - {}",
                        style(&item.html_url).blue().force_styling(self.color),
                        style(&found).green().force_styling(self.color)
                    );
                    self.print(out, &line)?;
                    emitted += 1;
                }
            }
        }

        Ok(emitted)
    }

    fn print<W: Write>(&self, out: &mut W, line: &str) -> Result<(), SearchError> {
        self.progress.suspend(|| writeln!(out, "{}", line))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::MatchMode;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(pattern: &str, mode: MatchMode, silent: bool) -> SearchConfig {
        SearchConfig {
            query: "acme".to_string(),
            filter: FragmentFilter::new(pattern, mode).unwrap(),
            delay: Duration::ZERO,
            silent,
            token: None,
        }
    }

    fn item(url: &str, fragments: &[&str]) -> serde_json::Value {
        json!({
            "html_url": url,
            "text_matches": fragments.iter().map(|f| json!({ "fragment": f })).collect::<Vec<_>>()
        })
    }

    async fn mount_page(server: &MockServer, page: u32, total_count: u64, items: Vec<serde_json::Value>) {
        Mock::given(method("GET"))
            .and(path("/search/code"))
            .and(query_param("page", page.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_count": total_count,
                "items": items
            })))
            .expect(1)
            .mount(server)
            .await;
    }

    fn driver(server: &MockServer, config: SearchConfig) -> PaginationDriver {
        let client =
            SearchClient::with_endpoint(&format!("{}/search/code", server.uri()), None).unwrap();
        PaginationDriver::new(client, config)
    }

    #[test]
    fn termination_rules() {
        let mut state = PaginationState::default();
        assert_eq!(state.termination(250), None);
        state.advance();
        assert_eq!(state.termination(250), None);
        state.advance();
        assert_eq!(state.termination(250), Some(Termination::Exhausted));

        assert_eq!(PaginationState::default().termination(100), Some(Termination::Exhausted));
        assert_eq!(PaginationState::default().termination(0), Some(Termination::Exhausted));

        let ceiling = PaginationState {
            page: MAX_PAGES,
            per_page: PER_PAGE,
        };
        assert_eq!(ceiling.termination(50_000), Some(Termination::PageCeiling));
    }

    #[tokio::test]
    async fn fetches_three_pages_for_250_results() {
        let server = MockServer::start().await;
        mount_page(&server, 1, 250, vec![item("https://github.com/a", &["key=one"])]).await;
        mount_page(&server, 2, 250, vec![item("https://github.com/b", &["key=two"])]).await;
        mount_page(&server, 3, 250, vec![item("https://github.com/c", &["key=three"])]).await;
        Mock::given(method("GET"))
            .and(query_param("page", "4"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "total_count": 250, "items": [] })))
            .expect(0)
            .mount(&server)
            .await;

        let mut out = Vec::new();
        let summary = driver(&server, config("key=[a-z]+", MatchMode::RawRegex, false))
            .run(&mut out)
            .await
            .unwrap();

        assert_eq!(summary.pages_fetched, 3);
        assert_eq!(summary.total_count, 250);
        assert_eq!(summary.emitted, 3);
        assert_eq!(summary.termination, Termination::Exhausted);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "https://github.com/a - key=one\n\
             https://github.com/b - key=two\n\
             https://github.com/c - key=three\n\
             End of available results.\n"
        );
    }

    #[tokio::test]
    async fn stops_at_page_ceiling() {
        let server = MockServer::start().await;
        for page in 1..=MAX_PAGES {
            mount_page(&server, page, 1_000_000, vec![item("https://github.com/x", &["nothing"])]).await;
        }

        let mut out = Vec::new();
        let summary = driver(&server, config("zzz", MatchMode::RawRegex, true))
            .run(&mut out)
            .await
            .unwrap();

        assert_eq!(summary.pages_fetched, MAX_PAGES);
        assert_eq!(summary.termination, Termination::PageCeiling);
        assert!(out.is_empty());
        assert_eq!(server.received_requests().await.unwrap().len(), MAX_PAGES as usize);
    }

    #[tokio::test]
    async fn empty_page_ends_the_run() {
        let server = MockServer::start().await;
        mount_page(&server, 1, 500, vec![item("https://github.com/a", &["key=one"])]).await;
        mount_page(&server, 2, 500, vec![]).await;

        let mut out = Vec::new();
        let summary = driver(&server, config("key=[a-z]+", MatchMode::RawRegex, false))
            .run(&mut out)
            .await
            .unwrap();

        assert_eq!(summary.termination, Termination::EmptyPage);
        assert_eq!(summary.pages_fetched, 2);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "https://github.com/a - key=one\nNo results found or end of available results.\n"
        );
    }

    #[tokio::test]
    async fn silent_empty_page_prints_only_matches() {
        let server = MockServer::start().await;
        mount_page(
            &server,
            1,
            500,
            vec![
                item("https://github.com/a", &["key=one key=two"]),
                item("https://github.com/b", &["key=one"]),
            ],
        )
        .await;
        mount_page(&server, 2, 500, vec![]).await;

        let mut out = Vec::new();
        let summary = driver(&server, config("key=[a-z]+", MatchMode::RawRegex, true))
            .run(&mut out)
            .await
            .unwrap();

        assert_eq!(summary.termination, Termination::EmptyPage);
        assert_eq!(summary.pages_fetched, 2);
        assert_eq!(summary.emitted, 2);
        assert_eq!(String::from_utf8(out).unwrap(), "key=one\nkey=two\n");
    }

    #[tokio::test]
    async fn silent_mode_deduplicates_across_pages() {
        let server = MockServer::start().await;
        mount_page(
            &server,
            1,
            150,
            vec![
                item("https://github.com/a", &["https://api.acme.io/v1 https://api.acme.io:8443/v2"]),
                item("https://github.com/b", &["//cdn.acme.io/x.js https://other.net"]),
            ],
        )
        .await;
        mount_page(
            &server,
            2,
            150,
            vec![item("https://github.com/c", &["http://cdn.acme.io http://mail.acme.io"])],
        )
        .await;

        let mut out = Vec::new();
        let summary = driver(&server, config(r"acme\.io$", MatchMode::DomainExtract, true))
            .run(&mut out)
            .await
            .unwrap();

        assert_eq!(summary.emitted, 3);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "api.acme.io\ncdn.acme.io\nmail.acme.io\n"
        );
    }

    #[tokio::test]
    async fn non_silent_mode_prints_every_match() {
        let server = MockServer::start().await;
        mount_page(
            &server,
            1,
            2,
            vec![
                item("https://github.com/a", &["see https://good.com/x and https://bad.org/y"]),
                item("https://github.com/b", &["https://good.com/x"]),
            ],
        )
        .await;

        let mut out = Vec::new();
        driver(&server, config(r"good\.com", MatchMode::UrlExtract, false))
            .run(&mut out)
            .await
            .unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "https://github.com/a - https://good.com/x\n\
             https://github.com/b - https://good.com/x\n\
             End of available results.\n"
        );
    }

    #[tokio::test]
    async fn error_on_first_page_prints_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(422).set_body_string("Validation Failed"))
            .expect(1)
            .mount(&server)
            .await;

        let mut out = Vec::new();
        let err = driver(&server, config(".", MatchMode::RawRegex, false))
            .run(&mut out)
            .await
            .unwrap_err();

        assert!(matches!(err, SearchError::Status { .. }));
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn error_mid_run_aborts_without_retry() {
        let server = MockServer::start().await;
        mount_page(&server, 1, 300, vec![item("https://github.com/a", &["key=one"])]).await;
        Mock::given(method("GET"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&server)
            .await;

        let mut out = Vec::new();
        let err = driver(&server, config("key=[a-z]+", MatchMode::RawRegex, true))
            .run(&mut out)
            .await
            .unwrap_err();

        assert!(matches!(err, SearchError::Status { status, .. } if status.as_u16() == 500));
        assert_eq!(String::from_utf8(out).unwrap(), "key=one\n");
    }
}
