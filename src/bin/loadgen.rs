//! Single-user load driver.
//!
//!   cargo run --release --bin loadgen -- --host http://localhost:8080/benchmark -n 10000
//!
//! Writes `csv_exports/benchmark_<time>.csv` with one `start_time,response_time`
//! row per request. Failed requests are counted in the final log summary;
//! only setup and CSV I/O failures make the process exit non-zero.

use clap::Parser;
use sutbench::config::LoadgenArgs;
use sutbench::loadgen::{self, Target};
use sutbench::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = LoadgenArgs::parse();
    logging::init(&args.log)?;

    let target = Target::parse(&args.host)?;
    loadgen::run(target, args.requests, &args.out_dir).await?;
    Ok(())
}
