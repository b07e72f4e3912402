//! Hello-world page on `/`, 404 page everywhere else.
//!
//!   RUST_LOG=debug cargo run --bin greeter -- --addr 0.0.0.0:8080
//!   curl -i http://localhost:8080/

use clap::Parser;
use sutbench::config::GreeterArgs;
use sutbench::{Server, greeter, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = GreeterArgs::parse();
    logging::init(&args.log)?;

    Server::bind(args.addr).serve(greeter::router()).await?;
    Ok(())
}
