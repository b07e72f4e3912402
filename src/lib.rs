//! # sutbench
//!
//! Two tiny HTTP services and the load driver used to benchmark them.
//!
//! - [`greeter`]: a static hello-world page on `/`, a 404 page elsewhere.
//! - [`benchmark`]: the system under test. `GET /` greets; `POST /benchmark`
//!   writes the posted message to a temp file, reads it back into the log,
//!   deletes it and answers with a fixed string.
//! - [`loadgen`]: one simulated user sending N sequential requests and
//!   exporting per-request latency to CSV.
//!
//! The services share a small HTTP layer built on hyper: a radix-tree
//! [`Router`] with a fallback, typed [`Method`] and [`Status`], buffered
//! [`Request`]s, and a [`Server`] with an explicit connection model and
//! graceful shutdown.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sutbench::{Server, benchmark::{self, FileCycle}};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sutbench::Error> {
//!     let cycle = Arc::new(FileCycle::new(std::env::temp_dir()));
//!     Server::bind("0.0.0.0:8080".parse().unwrap())
//!         .max_connections(Some(512))
//!         .serve(benchmark::router(cycle))
//!         .await
//! }
//! ```

mod error;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod server;
mod status;

pub mod benchmark;
pub mod config;
pub mod greeter;
pub mod loadgen;
pub mod logging;
pub mod middleware;

#[cfg(test)]
mod test_support;

pub use error::Error;
pub use handler::Handler;
pub use method::Method;
pub use request::{JsonRejection, Request};
pub use response::{IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
pub use status::Status;
