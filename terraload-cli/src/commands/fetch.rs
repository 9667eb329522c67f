//! Fetch command - run real HTTP requests through the scheduler.
//!
//! URLs the scheduler turns away, or cancels while queued because their
//! server is saturated, are offered again on the next frame until the
//! timeout expires.

use std::collections::VecDeque;
use std::thread;
use std::time::{Duration, Instant};
use terraload::config::TerraloadConfig;
use terraload::request::{HttpFetcher, RequestHandle, RequestScheduler, RequestStatus};

use super::common::scheduler_config;
use crate::error::{CliError, CliResult};

/// Interval between scheduler ticks.
const FRAME: Duration = Duration::from_millis(16);

/// Arguments for the fetch command.
pub struct FetchArgs {
    pub urls: Vec<String>,
    pub max_requests: Option<usize>,
    pub max_requests_per_server: Option<usize>,
    pub timeout_secs: u64,
}

/// Run the fetch command.
pub fn run(args: FetchArgs, config: &TerraloadConfig) -> CliResult<()> {
    let runtime = tokio::runtime::Runtime::new().map_err(CliError::Runtime)?;
    let fetcher = HttpFetcher::new(runtime.handle().clone()).map_err(CliError::HttpClient)?;
    let mut scheduler = RequestScheduler::new(scheduler_config(
        &config.scheduler,
        args.max_requests,
        args.max_requests_per_server,
    ));

    let total = args.urls.len();
    let mut waiting: VecDeque<String> = args.urls.into();
    let mut in_flight: Vec<RequestHandle> = Vec::new();
    let mut failed = 0;
    let mut frames = 0usize;
    let start = Instant::now();
    let deadline = start + Duration::from_secs(args.timeout_secs);

    println!("Fetching {} URLs...", total);

    loop {
        while let Some(url) = waiting.pop_front() {
            match scheduler.request(fetcher.get(url.clone())) {
                Some(handle) => in_flight.push(handle),
                None => {
                    waiting.push_front(url);
                    break;
                }
            }
        }

        scheduler.update();
        frames += 1;

        in_flight.retain(|handle| match handle.poll() {
            RequestStatus::Pending => true,
            RequestStatus::Received(body) => {
                println!("  OK      {} ({} bytes)", handle.url(), body.len());
                false
            }
            RequestStatus::Failed(e) => {
                println!("  FAILED  {} ({})", handle.url(), e);
                failed += 1;
                false
            }
            RequestStatus::Cancelled => {
                tracing::debug!(url = handle.url(), "Request cancelled, retrying");
                waiting.push_back(handle.url().to_string());
                false
            }
        });

        if waiting.is_empty() && in_flight.is_empty() {
            break;
        }

        if Instant::now() >= deadline {
            for handle in &in_flight {
                println!("  TIMEOUT {}", handle.url());
                handle.cancel();
            }
            for url in &waiting {
                println!("  SKIPPED {}", url);
            }
            failed += in_flight.len() + waiting.len();
            scheduler.update();
            break;
        }

        thread::sleep(FRAME);
    }

    let statistics = scheduler.statistics();
    println!();
    println!(
        "Finished in {:.2}s over {} frames",
        start.elapsed().as_secs_f64(),
        frames
    );
    println!(
        "  Attempted: {}  Started: {}  Cancelled: {}  Failed: {}",
        statistics.number_of_attempted_requests,
        statistics.number_of_active_requests_ever,
        statistics.number_of_cancelled_requests,
        statistics.number_of_failed_requests
    );

    if failed > 0 {
        return Err(CliError::FetchIncomplete { failed, total });
    }
    Ok(())
}
