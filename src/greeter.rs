//! The greeter service: one static page on `/`, a 404 page everywhere else.

use crate::{Request, Response, Router, Status};

pub const GREETING: &str = "Hello World!<br />This is a test page.";
pub const NOT_FOUND: &str = "<h1>404 Not Found</h1>No context found for request";

/// Route table for the greeter: a single handler for every request.
pub fn router() -> Router {
    Router::new().fallback(greet)
}

/// Answers any method. Only the exact request target `/` is the page, so a
/// query string (`/?x=1`) is a miss too.
pub async fn greet(req: Request) -> Response {
    if req.target() == "/" {
        Response::html(GREETING)
    } else {
        Response::builder().status(Status::NotFound).html(NOT_FOUND)
    }
}
