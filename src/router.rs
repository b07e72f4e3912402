//! Radix-tree request router.
//!
//! One tree per HTTP method, O(path-length) lookup, plus an optional
//! fallback for requests no tree matches. Routes are registered once at
//! startup; the table is immutable while serving.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use matchit::Router as MatchitRouter;

use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

/// The application route table.
///
/// Each [`Router::on`] call returns `self` so registrations chain naturally.
///
/// Resolution order for a request:
/// 1. the tree for its method, if the path matches;
/// 2. `405 Method Not Allowed` (with an `allow` header) if the path matches
///    under another method;
/// 3. the fallback handler, if one is set;
/// 4. `404 Not Found`.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
    fallback: Option<BoxedHandler>,
}

pub(crate) enum Route {
    Matched(BoxedHandler, HashMap<String, String>),
    MethodNotAllowed(Vec<Method>),
    Fallback(BoxedHandler),
    NotFound,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new(), fallback: None }
    }

    /// Register a handler for a method + path pair. Returns `self` for chaining.
    ///
    /// Path parameters use `{name}` syntax and are read with `req.param("name")`.
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid route or conflicts with an earlier one.
    /// Routes are static program text, so this is a startup bug.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{method} {path}`: {e}"));
        self
    }

    /// Handler for every request that matches no route, whatever its method.
    pub fn fallback(mut self, handler: impl Handler) -> Self {
        self.fallback = Some(handler.into_boxed_handler());
        self
    }

    pub(crate) fn lookup(&self, method: &http::Method, path: &str) -> Route {
        if let Some(tree) = Method::try_from(method).ok().and_then(|m| self.routes.get(&m)) {
            if let Ok(matched) = tree.at(path) {
                let params = matched.params.iter()
                    .map(|(k, v)| (k.to_owned(), v.to_owned()))
                    .collect();
                return Route::Matched(Arc::clone(matched.value), params);
            }
        }

        let mut allowed: Vec<Method> = self.routes.iter()
            .filter(|(_, tree)| tree.at(path).is_ok())
            .map(|(m, _)| *m)
            .collect();

        if !allowed.is_empty() {
            allowed.sort_by_key(|m| m.as_str());
            return Route::MethodNotAllowed(allowed);
        }

        match &self.fallback {
            Some(handler) => Route::Fallback(Arc::clone(handler)),
            None => Route::NotFound,
        }
    }

    /// Runs one fully buffered request through the route table.
    ///
    /// This is the whole per-request path the server takes after reading the
    /// body, so it is also how services are exercised without a socket.
    pub async fn call(&self, req: http::Request<Bytes>) -> Response {
        let (parts, body) = req.into_parts();

        match self.lookup(&parts.method, parts.uri.path()) {
            Route::Matched(handler, params) => handler.call(Request::new(parts, body, params)).await,
            Route::Fallback(handler) => handler.call(Request::new(parts, body, HashMap::new())).await,
            Route::MethodNotAllowed(allowed) => {
                let allow = allowed.iter().map(|m| m.as_str()).collect::<Vec<_>>().join(", ");
                Response::builder()
                    .status(Status::MethodNotAllowed)
                    .header("allow", &allow)
                    .no_body()
            }
            Route::NotFound => Response::status(Status::NotFound),
        }
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get(uri: &str) -> http::Request<Bytes> {
        http::Request::get(uri).body(Bytes::new()).unwrap()
    }

    async fn echo_id(req: Request) -> String {
        format!("id={}", req.param("id").unwrap_or("none"))
    }

    #[tokio::test]
    async fn matches_method_and_extracts_params() {
        let app = Router::new().on(Method::Get, "/files/{id}", echo_id);
        let res = app.call(get("/files/7")).await;
        assert_eq!(res.status_code(), 200);
        assert_eq!(res.body(), b"id=7");
    }

    #[tokio::test]
    async fn unknown_path_is_404_without_fallback() {
        let app = Router::new().on(Method::Get, "/", |_req: Request| async { "root" });
        assert_eq!(app.call(get("/missing")).await.status_code(), 404);
    }

    #[tokio::test]
    async fn known_path_with_other_method_is_405() {
        let app = Router::new()
            .on(Method::Post, "/benchmark", |_req: Request| async { "posted" })
            .on(Method::Put, "/benchmark", |_req: Request| async { "put" });
        let res = app.call(get("/benchmark")).await;
        assert_eq!(res.status_code(), 405);
        assert_eq!(res.header("allow"), Some("POST, PUT"));
    }

    #[tokio::test]
    async fn fallback_sees_unmatched_requests_of_any_method() {
        let app = Router::new().fallback(|req: Request| async move { req.method().to_string() });
        let req = http::Request::builder()
            .method("PURGE")
            .uri("/anything")
            .body(Bytes::new())
            .unwrap();
        let res = app.call(req).await;
        assert_eq!(res.status_code(), 200);
        assert_eq!(res.body(), b"PURGE");
    }
}
