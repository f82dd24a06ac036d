//! Content relay: fetch a remote http(s) resource and stream it back under a byte cap.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::error::RelayError;

const USER_AGENT: &str = "DisplayHubRelay/1.0";

/// An upstream response ready to be streamed to the caller.
pub struct RelayedBody {
    pub content_type: Option<String>,
    pub stream: std::pin::Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>,
}

#[derive(Clone)]
pub struct RelayService {
    client: reqwest::Client,
    max_bytes: u64,
}

impl RelayService {
    pub fn new(max_bytes: u64, timeout: Duration) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| RelayError::Fetch(e.to_string()))?;
        Ok(Self { client, max_bytes })
    }

    /// Accept only absolute http/https URLs.
    pub fn parse_target(raw: Option<&str>) -> Result<Url, RelayError> {
        let raw = raw.map(str::trim).filter(|s| !s.is_empty()).ok_or(RelayError::MissingUrl)?;
        let url = Url::parse(raw).map_err(|_| RelayError::InvalidUrl)?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            _ => Err(RelayError::UnsupportedScheme),
        }
    }

    /// Start the upstream fetch. Status, declared size and connect failures are
    /// reported here; a body that overruns the cap is cut off mid-stream.
    pub async fn fetch(&self, target: Url) -> Result<RelayedBody, RelayError> {
        let response = self.client.get(target.clone()).send().await.map_err(|e| {
            warn!(url = %target, error = %e, "relay fetch failed");
            RelayError::from(e)
        })?;

        let status = response.status();
        if status.as_u16() >= 400 {
            debug!(url = %target, status = status.as_u16(), "relay upstream error");
            return Err(RelayError::Upstream(status.as_u16()));
        }
        if response.content_length().is_some_and(|len| len > self.max_bytes) {
            warn!(url = %target, "relay declared size over cap");
            return Err(RelayError::TooLarge);
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let stream = capped(response.bytes_stream(), self.max_bytes, target);
        Ok(RelayedBody {
            content_type,
            stream: Box::pin(stream),
        })
    }
}

/// Pass chunks through until `max_bytes` is exceeded, then yield one error and stop.
fn capped<S>(
    upstream: S,
    max_bytes: u64,
    target: Url,
) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send
where
    S: Stream<Item = reqwest::Result<Bytes>> + Send + 'static,
{
    let mut received: u64 = 0;
    upstream
        .map(move |chunk| {
            let chunk = chunk.map_err(|e| {
                warn!(url = %target, error = %e, "relay stream aborted");
                std::io::Error::new(std::io::ErrorKind::Other, e)
            })?;
            received += chunk.len() as u64;
            if received > max_bytes {
                warn!(url = %target, received, "relay body over cap");
                return Err(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    RelayError::TooLarge.to_string(),
                ));
            }
            Ok(chunk)
        })
        .scan(false, |failed, item| {
            if *failed {
                return futures::future::ready(None);
            }
            *failed = item.is_err();
            futures::future::ready(Some(item))
        })
}
