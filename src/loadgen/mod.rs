//! Single-user load driver.
//!
//! Sends a fixed number of requests to one target, strictly one after
//! another, and records `(start_time, response_time)` for each of them. Any
//! transport failure or non-200 status counts as an error; the 1st, 1001st,
//! 2001st… error is reported so a broken target does not flood the log.

mod client;
mod csv;

use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use chrono::Local;
use tracing::{info, warn};

use crate::error::Error;

pub use client::{Client, Target};
pub use csv::{CsvExporter, Sample};

/// Outcome of one [`run`].
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub requests: u64,
    pub errors: u64,
    pub csv_path: PathBuf,
}

/// Sends `requests` requests to `target` and exports the samples under `out_dir`.
///
/// Samples are buffered `requests / 10` at a time. Only CSV I/O aborts the
/// run; request failures are counted.
pub async fn run(target: Target, requests: u64, out_dir: &Path) -> Result<Summary, Error> {
    let capacity = usize::try_from(requests / 10).unwrap_or(usize::MAX);
    let mut csv = CsvExporter::create(out_dir, target.url(), Local::now(), capacity).await?;
    let mut client = Client::new(target);
    let mut errors = ErrorLog::default();

    info!(
        host = client.target().url(),
        requests,
        post = client.target().posts_messages(),
        csv = %csv.path().display(),
        "suite started"
    );

    for i in 0..requests {
        let start_time = unix_seconds();
        let started = Instant::now();
        let outcome = client.send(i).await;
        let response_time = started.elapsed().as_secs_f64() * 1000.0;

        let failure = match outcome {
            Ok(status) if status == http::StatusCode::OK => None,
            Ok(status) => Some(format!("returned HTTP status code {}", status.as_u16())),
            Err(e) => Some(format!("failed: {e}")),
        };
        if let Some(reason) = failure {
            errors.record(client.target().url(), &reason);
        }

        csv.push(Sample { start_time, response_time }).await?;
    }

    csv.flush().await?;

    let errors = errors.count();
    let summary = Summary { requests, errors, csv_path: csv.path().to_owned() };
    info!(requests, errors, csv = %summary.csv_path.display(), "suite finished");
    Ok(summary)
}

/// Counts request failures, warning on the 1st, 1001st, 2001st… one.
#[derive(Debug, Default)]
struct ErrorLog {
    count: u64,
}

impl ErrorLog {
    fn record(&mut self, host: &str, reason: &str) {
        self.count += 1;
        if self.count % 1000 == 1 {
            warn!("Error: Host {host} {reason}! Message: {}", self.count);
        }
    }

    fn count(&self) -> u64 { self.count }
}

fn unix_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}
