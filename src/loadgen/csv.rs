//! Buffered CSV export of latency samples.
//!
//! File layout:
//!
//! ```text
//! Host: http://localhost:8080/benchmark,
//! start_time,response_time
//! 1718000000.123456,1.734
//! ...
//! ```

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;

/// One request: Unix start time in seconds, response time in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub start_time: f64,
    pub response_time: f64,
}

/// Appends samples to one CSV file, flushing every `capacity` samples.
pub struct CsvExporter {
    path: PathBuf,
    file: File,
    buffer: Vec<Sample>,
    capacity: usize,
}

impl CsvExporter {
    /// Creates `<out_dir>/benchmark_<HH-MM-SS>_<unix millis>.csv` (and
    /// `out_dir` itself if needed) and writes the two header lines.
    pub async fn create(
        out_dir: &Path,
        host: &str,
        now: DateTime<Local>,
        capacity: usize,
    ) -> std::io::Result<Self> {
        fs::create_dir_all(out_dir).await?;

        let name = format!("benchmark_{}_{}.csv", now.format("%H-%M-%S"), now.timestamp_millis());
        let path = out_dir.join(name);

        let mut file = OpenOptions::new().create(true).append(true).open(&path).await?;
        file.write_all(format!("Host: {host}, \nstart_time,response_time\n").as_bytes()).await?;

        let capacity = capacity.max(1);
        Ok(Self { path, file, buffer: Vec::with_capacity(capacity), capacity })
    }

    pub fn path(&self) -> &Path { &self.path }

    pub async fn push(&mut self, sample: Sample) -> std::io::Result<()> {
        if self.buffer.len() >= self.capacity {
            self.flush().await?;
        }
        self.buffer.push(sample);
        Ok(())
    }

    /// Writes out and clears the buffer.
    pub async fn flush(&mut self) -> std::io::Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let mut out = String::with_capacity(self.buffer.len() * 32);
        for s in self.buffer.drain(..) {
            out.push_str(&format!("{},{}\n", s.start_time, s.response_time));
        }
        self.file.write_all(out.as_bytes()).await?;
        self.file.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[tokio::test]
    async fn writes_header_then_rows_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let now = Local.timestamp_millis_opt(1_700_000_000_123).unwrap();

        let mut csv = CsvExporter::create(&dir.path().join("out"), "http://h/benchmark", now, 2)
            .await
            .unwrap();
        assert!(csv.path().file_name().unwrap().to_str().unwrap().ends_with("_1700000000123.csv"));

        for i in 0..5u32 {
            csv.push(Sample { start_time: f64::from(i), response_time: 0.5 }).await.unwrap();
        }
        csv.flush().await.unwrap();

        let text = std::fs::read_to_string(csv.path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Host: http://h/benchmark, ");
        assert_eq!(lines[1], "start_time,response_time");
        assert_eq!(&lines[2..], ["0,0.5", "1,0.5", "2,0.5", "3,0.5", "4,0.5"]);
    }

    #[tokio::test]
    async fn flush_of_empty_buffer_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut csv = CsvExporter::create(dir.path(), "h", Local::now(), 10).await.unwrap();
        csv.flush().await.unwrap();

        let text = std::fs::read_to_string(csv.path()).unwrap();
        assert_eq!(text.lines().count(), 2);
    }
}
