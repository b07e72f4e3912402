//! Benchmark system under test.
//!
//!   cargo run --bin system-under-test -- --temp-dir /tmp --max-connections 512
//!   curl http://localhost:8080/
//!   curl -X POST http://localhost:8080/benchmark \
//!        -H 'content-type: application/json' \
//!        -d '{"message":"hello"}'

use std::sync::Arc;

use clap::Parser;
use sutbench::benchmark::{self, FileCycle};
use sutbench::config::SutArgs;
use sutbench::{Server, logging};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = SutArgs::parse();
    logging::init(&args.log)?;

    let cycle = Arc::new(FileCycle::new(args.temp_dir()));
    info!(temp_dir = %cycle.dir().display(), "file operations configured");

    Server::bind(args.addr)
        .max_connections(args.max_connections)
        .serve(benchmark::router(cycle))
        .await?;
    Ok(())
}
