//! Per-request tracing span.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Instant;

use tracing::{Instrument, debug, debug_span};

use crate::response::Response;

/// Runs `fut` inside a `request` span and logs its outcome at debug level.
///
/// Handler log lines emitted while `fut` runs carry the span's fields, so a
/// `RUST_LOG=debug` run ties every file-cycle line to its request.
pub async fn trace<F>(method: &http::Method, path: &str, peer: SocketAddr, fut: F) -> Response
where
    F: Future<Output = Response>,
{
    let span = debug_span!("request", %method, path, %peer);
    let started = Instant::now();

    async move {
        let response = fut.await;
        debug!(
            status = response.status_code(),
            latency_us = started.elapsed().as_micros() as u64,
            "request finished"
        );
        response
    }
    .instrument(span)
    .await
}
