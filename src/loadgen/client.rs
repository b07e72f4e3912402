//! Keep-alive HTTP/1.1 client for one simulated user.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::client::conn::http1::{self, SendRequest};
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tracing::debug;

use crate::error::Error;

/// Where requests go and what they carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    url: String,
    authority: String,
    hostname: String,
    port: u16,
    path: String,
    post_message: bool,
}

impl Target {
    /// Parses an `http://` URL. A URL containing `/benchmark` anywhere
    /// switches the driver to JSON POSTs.
    pub fn parse(url: &str) -> Result<Self, Error> {
        let invalid = || Error::InvalidUrl(url.to_owned());

        let uri: http::Uri = url.parse().map_err(|_| invalid())?;
        if uri.scheme_str() != Some("http") {
            return Err(invalid());
        }
        let authority = uri.authority().ok_or_else(invalid)?;
        let path = uri.path_and_query().map_or("/", |pq| pq.as_str());

        Ok(Self {
            url: url.to_owned(),
            authority: authority.as_str().to_owned(),
            hostname: authority.host().to_owned(),
            port: authority.port_u16().unwrap_or(80),
            path: if path.is_empty() { "/".to_owned() } else { path.to_owned() },
            post_message: url.contains("/benchmark"),
        })
    }

    pub fn url(&self) -> &str { &self.url }
    pub fn path(&self) -> &str { &self.path }
    pub fn posts_messages(&self) -> bool { self.post_message }

    /// Request number `i`: `GET <path>`, or `POST <path>` with
    /// `{"message": "Benchmark nr. <i>"}`.
    pub fn request(&self, i: u64) -> Result<http::Request<Full<Bytes>>, Error> {
        let builder = http::Request::builder()
            .uri(self.path.as_str())
            .header(http::header::HOST, self.authority.as_str());

        let req = if self.post_message {
            let body = serde_json::json!({ "message": format!("Benchmark nr. {i}") });
            builder
                .method(http::Method::POST)
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(Full::new(Bytes::from(body.to_string())))?
        } else {
            builder.method(http::Method::GET).body(Full::new(Bytes::new()))?
        };
        Ok(req)
    }
}

/// One connection at a time, reopened after any transport failure.
pub struct Client {
    target: Target,
    sender: Option<SendRequest<Full<Bytes>>>,
}

impl Client {
    pub fn new(target: Target) -> Self {
        Self { target, sender: None }
    }

    pub fn target(&self) -> &Target { &self.target }

    /// Sends request number `i`, drains the body and returns the status.
    pub async fn send(&mut self, i: u64) -> Result<http::StatusCode, Error> {
        let req = self.target.request(i)?;
        let sender = self.sender().await?;

        let result = async {
            let res = sender.send_request(req).await?;
            let status = res.status();
            res.into_body().collect().await?;
            Ok::<_, hyper::Error>(status)
        }
        .await;

        result.map_err(|e| {
            self.sender = None;
            Error::from(e)
        })
    }

    async fn sender(&mut self) -> Result<&mut SendRequest<Full<Bytes>>, Error> {
        if let Some(sender) = self.sender.as_mut() {
            if sender.ready().await.is_err() {
                self.sender = None;
            }
        }

        let sender = match self.sender.take() {
            Some(sender) => sender,
            None => connect(&self.target).await?,
        };
        Ok(self.sender.insert(sender))
    }
}

async fn connect(target: &Target) -> Result<SendRequest<Full<Bytes>>, Error> {
    let stream = TcpStream::connect((target.hostname.as_str(), target.port)).await?;
    stream.set_nodelay(true)?;

    let (sender, conn) = http1::handshake(TokioIo::new(stream)).await?;
    tokio::spawn(async move {
        if let Err(e) = conn.await {
            debug!("connection closed: {e}");
        }
    });

    debug!(host = %target.authority, "connected");
    Ok(sender)
}
