//! The benchmark system under test.
//!
//! | Route | Response |
//! |---|---|
//! | `GET /`, `HEAD /` | `Hello World!\n` |
//! | `POST /benchmark` `{"message": "…"}` | runs one [`FileCycle`], then `Successfully made file operation!\n` |

mod file_cycle;

use std::sync::Arc;

use serde::de::{self, Deserializer};
use serde::Deserialize;
use thiserror::Error;
use tokio::task::JoinError;
use tracing::{error, info};

use crate::request::JsonRejection;
use crate::{IntoResponse, Method, Request, Response, Router, Status};

pub use file_cycle::{FileCounter, FileCycle, FileCycleError};

pub const HELLO: &str = "Hello World!\n";
pub const SUCCESS: &str = "Successfully made file operation!\n";

/// Body of `POST /benchmark`.
///
/// Binding is lenient: a missing or `null` message is absent, and numbers
/// and booleans are taken as their JSON text. Arrays and objects are
/// rejected.
#[derive(Debug, Deserialize)]
pub struct MessageModel {
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub message: Option<String>,
}

impl MessageModel {
    /// The text written to the file; an absent message reads `null`.
    pub fn text(&self) -> &str {
        self.message.as_deref().unwrap_or("null")
    }
}

fn scalar_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(s) => Ok(Some(s)),
        serde_json::Value::Number(n) => Ok(Some(n.to_string())),
        serde_json::Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(de::Error::custom(format!("`message` must be a string, found {other}"))),
    }
}

/// Route table for the system under test, sharing one [`FileCycle`].
pub fn router(cycle: Arc<FileCycle>) -> Router {
    Router::new()
        .on(Method::Get, "/", hello)
        .on(Method::Head, "/", hello)
        .on(Method::Post, "/benchmark", move |req: Request| {
            let cycle = Arc::clone(&cycle);
            async move { file_operation(cycle, req).await }
        })
}

pub async fn hello(_req: Request) -> &'static str {
    info!("Hello World was called.");
    HELLO
}

/// Why `POST /benchmark` did not return the success string.
#[derive(Debug, Error)]
pub enum BenchmarkError {
    #[error(transparent)]
    Rejected(#[from] JsonRejection),

    #[error(transparent)]
    FileCycle(#[from] FileCycleError),

    #[error("file operation task failed: {0}")]
    Task(#[from] JoinError),
}

impl IntoResponse for BenchmarkError {
    fn into_response(self) -> Response {
        match self {
            Self::Rejected(e) => e.into_response(),
            Self::FileCycle(e) => e.into_response(),
            Self::Task(e) => {
                error!(error = %e, "file operation task failed");
                Response::status(Status::InternalServerError)
            }
        }
    }
}

async fn file_operation(cycle: Arc<FileCycle>, req: Request) -> Result<&'static str, BenchmarkError> {
    let model = req.json::<MessageModel>()?;
    tokio::task::spawn_blocking(move || cycle.run(model.text())).await??;
    Ok(SUCCESS)
}
