//! Command-line and environment configuration for the three binaries.
//!
//! Every flag can also come from the environment variable named next to it,
//! which is how container deployments set them.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, ValueEnum};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines (default)
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Logging flags shared by every binary.
#[derive(Debug, Clone, Args)]
pub struct LogArgs {
    /// Default level filter; `RUST_LOG` takes precedence when set
    #[arg(long = "log-level", env = "LOG_LEVEL", default_value = "info")]
    pub level: String,

    /// Log output format
    #[arg(long = "log-format", env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub format: LogFormat,
}

/// Static hello-world page on `/`, 404 page everywhere else.
#[derive(Debug, Clone, Parser)]
#[command(name = "greeter", version)]
pub struct GreeterArgs {
    /// Address to listen on
    #[arg(long, env = "GREETER_ADDR", default_value = "0.0.0.0:8080")]
    pub addr: SocketAddr,

    #[command(flatten)]
    pub log: LogArgs,
}

/// Benchmark system under test: greeting plus a file create/read/delete cycle.
#[derive(Debug, Clone, Parser)]
#[command(name = "system-under-test", version)]
pub struct SutArgs {
    /// Address to listen on
    #[arg(long, env = "SUT_ADDR", default_value = "0.0.0.0:8080")]
    pub addr: SocketAddr,

    /// Directory for the per-request files [default: the platform temp dir]
    #[arg(long = "temp-dir", env = "SUT_TEMP_DIR")]
    pub temp_dir: Option<PathBuf>,

    /// Maximum number of open connections [default: unbounded]
    #[arg(long = "max-connections", env = "SUT_MAX_CONNECTIONS")]
    pub max_connections: Option<usize>,

    #[command(flatten)]
    pub log: LogArgs,
}

impl SutArgs {
    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// Single-user load driver writing per-request latency to CSV.
#[derive(Debug, Clone, Parser)]
#[command(name = "loadgen", version)]
pub struct LoadgenArgs {
    /// Target URL; a path containing `/benchmark` switches to JSON POSTs
    #[arg(long, env = "LOADGEN_HOST", default_value = "http://localhost:8080/")]
    pub host: String,

    /// Number of sequential requests to send
    #[arg(long, short = 'n', env = "LOADGEN_REQUESTS", default_value_t = 200_000)]
    pub requests: u64,

    /// Directory for the CSV export
    #[arg(long = "out-dir", env = "LOADGEN_OUT_DIR", default_value = "csv_exports")]
    pub out_dir: PathBuf,

    #[command(flatten)]
    pub log: LogArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sut_defaults() {
        let args = SutArgs::try_parse_from(["system-under-test"]).unwrap();
        assert_eq!(args.addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(args.max_connections, None);
        assert_eq!(args.log.format, LogFormat::Text);
    }

    #[test]
    fn sut_temp_dir_override() {
        let args = SutArgs::try_parse_from([
            "system-under-test",
            "--temp-dir",
            "/var/tmp/sut",
            "--max-connections",
            "64",
            "--log-format",
            "json",
        ])
        .unwrap();
        assert_eq!(args.temp_dir(), PathBuf::from("/var/tmp/sut"));
        assert_eq!(args.max_connections, Some(64));
        assert_eq!(args.log.format, LogFormat::Json);
    }

    #[test]
    fn greeter_rejects_bad_address() {
        assert!(GreeterArgs::try_parse_from(["greeter", "--addr", "not-an-addr"]).is_err());
    }

    #[test]
    fn loadgen_defaults() {
        let args = LoadgenArgs::try_parse_from(["loadgen", "-n", "10"]).unwrap();
        assert_eq!(args.requests, 10);
        assert_eq!(args.out_dir, PathBuf::from("csv_exports"));
    }
}
