//! The create → write → read → log → delete cycle behind `POST /benchmark`.
//!
//! Everything here is blocking `std::fs` I/O. Callers on an async runtime run
//! [`FileCycle::run`] through `spawn_blocking`.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;
use tracing::{error, info, warn};

use crate::response::{IntoResponse, Response};
use crate::status::Status;

/// Source of per-request file ids: `0, 1, 2, …` for the life of the process.
///
/// `fetch_add` hands every caller a distinct id even when requests race.
#[derive(Debug, Default)]
pub struct FileCounter(AtomicU64);

impl FileCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the next id.
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }

    /// Number of ids handed out so far.
    pub fn issued(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Error)]
pub enum FileCycleError {
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl IntoResponse for FileCycleError {
    fn into_response(self) -> Response {
        error!(error = %self, "file operation failed");
        Response::status(Status::InternalServerError)
    }
}

/// Owns the working directory and the id counter for file cycles.
#[derive(Debug)]
pub struct FileCycle {
    dir: PathBuf,
    counter: FileCounter,
}

impl FileCycle {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), counter: FileCounter::new() }
    }

    pub fn dir(&self) -> &Path { &self.dir }
    pub fn counter(&self) -> &FileCounter { &self.counter }

    /// `<dir>/performanceFile<id>.txt`
    pub fn path_for(&self, file_id: u64) -> PathBuf {
        self.dir.join(format!("performanceFile{file_id}.txt"))
    }

    /// Runs one full cycle for `message` and returns the file id it used.
    ///
    /// Only the write is fatal. A file that cannot be read back or deleted is
    /// logged and the cycle still succeeds.
    pub fn run(&self, message: &str) -> Result<u64, FileCycleError> {
        let (file_id, path) = self.create_and_write(message)?;
        log_content(&path);
        delete(&path);
        Ok(file_id)
    }

    /// Allocates an id and writes `"<message> @file:<path>"`, truncating any
    /// file already at that path.
    fn create_and_write(&self, message: &str) -> Result<(u64, PathBuf), FileCycleError> {
        let file_id = self.counter.next();
        let path = self.path_for(file_id);

        let content = format!("{message} @file:{}", path.display());
        fs::write(&path, content)
            .map_err(|source| FileCycleError::Write { path: path.clone(), source })?;

        Ok((file_id, path))
    }
}

/// Logs every line of the file at info level.
fn log_content(path: &Path) {
    let lines = match File::open(path) {
        Ok(file) => BufReader::new(file).lines(),
        Err(_) => {
            info!("An error occurred while reading the file {}.", path.display());
            return;
        }
    };

    for line in lines {
        match line {
            Ok(line) => info!("{line}"),
            Err(_) => {
                info!("An error occurred while reading the file {}.", path.display());
                return;
            }
        }
    }
}

fn delete(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        warn!(error = %e, "Failed to delete the file \"{}\"", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::capture_logs;
    use std::sync::Arc;

    #[test]
    fn counter_starts_at_zero_and_increments() {
        let counter = FileCounter::new();
        assert_eq!(counter.next(), 0);
        assert_eq!(counter.next(), 1);
        assert_eq!(counter.issued(), 2);
    }

    #[test]
    fn concurrent_callers_never_share_an_id() {
        let counter = Arc::new(FileCounter::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let counter = Arc::clone(&counter);
                std::thread::spawn(move || (0..1000).map(|_| counter.next()).collect::<Vec<_>>())
            })
            .collect();

        let mut ids: Vec<u64> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 8000);
        assert_eq!(ids.last(), Some(&7999));
    }

    #[test]
    fn path_follows_the_naming_scheme() {
        let cycle = FileCycle::new("/tmp/sut");
        assert_eq!(cycle.path_for(12), PathBuf::from("/tmp/sut/performanceFile12.txt"));
    }

    #[test]
    fn run_leaves_no_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let cycle = FileCycle::new(dir.path());

        let id = cycle.run("abc").unwrap();

        assert_eq!(id, 0);
        assert!(!cycle.path_for(id).exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn sequential_runs_use_consecutive_ids() {
        let dir = tempfile::tempdir().unwrap();
        let cycle = FileCycle::new(dir.path());

        let first = cycle.run("one").unwrap();
        let second = cycle.run("two").unwrap();

        assert_eq!(second, first + 1);
        assert_ne!(cycle.path_for(first), cycle.path_for(second));
    }

    #[test]
    fn write_content_carries_the_path_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let cycle = FileCycle::new(dir.path());

        let (id, path) = cycle.create_and_write("hello").unwrap();
        let written = fs::read_to_string(&path).unwrap();

        assert_eq!(id, 0);
        assert_eq!(written, format!("hello @file:{}", path.display()));
    }

    #[test]
    fn existing_file_is_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let cycle = FileCycle::new(dir.path());
        fs::write(cycle.path_for(0), "stale content that is much longer than the new one").unwrap();

        let (_, path) = cycle.create_and_write("x").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), format!("x @file:{}", path.display()));
    }

    #[test]
    fn missing_directory_fails_the_write() {
        let dir = tempfile::tempdir().unwrap();
        let cycle = FileCycle::new(dir.path().join("does-not-exist"));

        let err = cycle.run("abc").unwrap_err();

        assert!(matches!(err, FileCycleError::Write { .. }));
        assert_eq!(err.into_response().status_code(), 500);
    }

    #[test]
    fn content_lines_are_logged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("performanceFile5.txt");
        fs::write(&path, "first line\nsecond line").unwrap();

        let logs = capture_logs(|| log_content(&path));

        assert!(logs.contains("first line"), "{logs}");
        assert!(logs.contains("second line"), "{logs}");
    }

    #[test]
    fn missing_file_is_logged_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("performanceFile99.txt");

        let logs = capture_logs(|| {
            log_content(&path);
            delete(&path);
        });

        let read_msg = format!("An error occurred while reading the file {}.", path.display());
        let delete_msg = format!("Failed to delete the file \"{}\"", path.display());
        assert!(logs.contains(&read_msg), "{logs}");
        assert!(logs.lines().any(|l| l.contains("WARN") && l.contains(&delete_msg)), "{logs}");
    }
}
