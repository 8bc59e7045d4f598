//! HTTP transport seam.
//!
//! [`PriceTransport`] is the one place the price layer touches the network.
//! Retry policy, URL building and body decoding live above it in
//! [`PriceBatchClient`](crate::PriceBatchClient), so a mock transport
//! exercises all of that logic without sockets.

use crate::config::FetchConfig;
use crate::error::PriceError;
use reqwest::header::RETRY_AFTER;
use reqwest::StatusCode;
use std::future::Future;
use std::time::Duration;
use url::Url;

/// Idle connections kept per host.
const POOL_MAX_IDLE_PER_HOST: usize = 20;

/// How long an idle pooled connection is kept.
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

/// Minimal view of an HTTP response.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: StatusCode,
    /// Raw `Retry-After` header, if any.
    pub retry_after: Option<String>,
    pub body: String,
}

impl TransportResponse {
    /// 200 response carrying `body`.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            retry_after: None,
            body: body.into(),
        }
    }

    /// Empty-bodied response with the given status.
    pub fn status(status: StatusCode) -> Self {
        Self {
            status,
            retry_after: None,
            body: String::new(),
        }
    }

    /// 429 response with an optional `Retry-After` value.
    pub fn throttled(retry_after: Option<&str>) -> Self {
        Self {
            status: StatusCode::TOO_MANY_REQUESTS,
            retry_after: retry_after.map(str::to_string),
            body: String::new(),
        }
    }

    /// Set the body (builder pattern).
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Parsed `Retry-After` delay in whole seconds.
    ///
    /// Missing, non-numeric and zero values all yield `None`.
    pub fn retry_delay(&self) -> Option<Duration> {
        let seconds: u64 = self.retry_after.as_deref()?.trim().parse().ok()?;
        (seconds > 0).then(|| Duration::from_secs(seconds))
    }
}

/// Something that can perform an authenticated GET.
///
/// Uses native async traits (Rust 1.75+), same as the rest of the
/// workspace. Implementors must be `Send + Sync` so one transport can be
/// shared by concurrent batch tasks.
pub trait PriceTransport: Send + Sync {
    /// Issue a GET to `url`, attaching `bearer` as an
    /// `Authorization: Bearer` header when present.
    ///
    /// Only connection-level failures are errors; any HTTP status is
    /// returned as a response.
    fn get(
        &self,
        url: Url,
        bearer: Option<&str>,
    ) -> impl Future<Output = Result<TransportResponse, PriceError>> + Send;
}

/// `reqwest`-backed transport with a pooled client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a pooled client using the configured request timeout.
    pub fn new(config: &FetchConfig) -> Result<Self, PriceError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
            .pool_idle_timeout(POOL_IDLE_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }
}

impl PriceTransport for HttpTransport {
    async fn get(&self, url: Url, bearer: Option<&str>) -> Result<TransportResponse, PriceError> {
        let mut request = self.client.get(url);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;

        Ok(TransportResponse {
            status,
            retry_after,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_delay_parsing() {
        assert_eq!(
            TransportResponse::throttled(Some("2")).retry_delay(),
            Some(Duration::from_secs(2))
        );
        assert_eq!(
            TransportResponse::throttled(Some(" 7 ")).retry_delay(),
            Some(Duration::from_secs(7))
        );
        assert_eq!(TransportResponse::throttled(Some("0")).retry_delay(), None);
        assert_eq!(TransportResponse::throttled(Some("soon")).retry_delay(), None);
        assert_eq!(
            TransportResponse::throttled(Some("Wed, 21 Oct 2015 07:28:00 GMT")).retry_delay(),
            None
        );
        assert_eq!(TransportResponse::throttled(None).retry_delay(), None);
    }

    #[test]
    fn test_http_transport_builds() {
        assert!(HttpTransport::new(&FetchConfig::default()).is_ok());
    }
}
