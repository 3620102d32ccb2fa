use clap::Parser;
use dotenv::dotenv;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::process::ExitCode;
use tokio::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use github_code_extractor_lib::{Args, PaginationDriver, SearchClient, SearchError};

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();

    let args = Args::parse();
    init_tracing(args.silent);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e, &mut std::io::stderr());
            ExitCode::FAILURE
        }
    }
}

/// The one place a fatal error reaches the user.
fn report<W: Write>(err: &SearchError, out: &mut W) {
    let _ = writeln!(out, "error: {}", err);
}

/// Logs go to stderr so stdout carries only results.
fn init_tracing(silent: bool) {
    let default_level = if silent { "warn" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: Args) -> Result<(), SearchError> {
    let config = args.into_config()?;

    let client = SearchClient::new(config.token.clone())?;
    if !client.is_authenticated() {
        warn!("GITHUB_KEY not set; sending unauthenticated requests with a lower rate limit");
    }

    info!(
        "Searching '{}' ({:?} mode, {}s delay)",
        config.query,
        config.filter.mode(),
        config.delay.as_secs()
    );

    let progress = if config.silent {
        ProgressBar::hidden()
    } else {
        spinner()
    };

    let mut stdout = std::io::stdout();
    let summary = PaginationDriver::new(client, config)
        .with_color(console::colors_enabled())
        .with_progress(progress)
        .run(&mut stdout)
        .await?;

    info!(
        "Finished after {} pages: {} results emitted, {} reported by GitHub ({:?})",
        summary.pages_fetched, summary.emitted, summary.total_count, summary.termination
    );
    Ok(())
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    match ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {wide_msg}") {
        Ok(style) => pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")),
        Err(e) => warn!("Falling back to the default spinner style: {}", e),
    }
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}
