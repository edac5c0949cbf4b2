//! Build notification delivery.
//!
//! A [`NotificationRequest`] pairs the parsed endpoint with the JSON body.
//! It is posted once through an [`HttpClient`]; there are no retries.
//! [`ReqwestHttpClient`] bounds both connection setup and the whole request
//! to 15 seconds.

use crate::types::NotifyError;
use crate::validate::ValidatedOptions;
use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;

/// Time allowed to establish the connection.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
/// Time allowed for the request to complete once sent.
pub const READ_TIMEOUT: Duration = Duration::from_secs(15);

const USER_AGENT: &str = concat!("bugsnag-build/", env!("CARGO_PKG_VERSION"));

/// Endpoint and body of a single build notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    url: Url,
    body: String,
}

impl NotificationRequest {
    /// Parses the endpoint and serializes the options.
    ///
    /// Only absolute `http` and `https` URLs are accepted. An empty path is
    /// sent as `/`.
    pub fn new(endpoint: &str, options: &ValidatedOptions) -> Result<Self, NotifyError> {
        let invalid = |reason: String| NotifyError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason,
        };

        let mut url = Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(invalid("missing host".to_string()));
        }
        if url.path().is_empty() {
            url.set_path("/");
        }

        let body = serde_json::to_string(&**options)?;
        Ok(Self { url, body })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// True when the request goes over TLS.
    pub fn is_https(&self) -> bool {
        self.url.scheme() == "https"
    }
}

/// Status and body returned by the endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    /// True for 4xx and 5xx statuses.
    pub fn is_failure(&self) -> bool {
        self.status >= 400
    }
}

/// Posts JSON bodies.
pub trait HttpClient {
    fn post_json(&self, request: &NotificationRequest) -> Result<HttpResponse, NotifyError>;
}

/// Blocking [`HttpClient`] built on reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    http: Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Result<Self, NotifyError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(READ_TIMEOUT)
            .build()?;
        Ok(Self { http })
    }
}

impl HttpClient for ReqwestHttpClient {
    fn post_json(&self, request: &NotificationRequest) -> Result<HttpResponse, NotifyError> {
        let resp = self
            .http
            .post(request.url().clone())
            .header(CONTENT_TYPE, "application/json")
            .body(request.body().to_string())
            .send()?;
        let status = resp.status().as_u16();
        let body = resp.text()?;
        Ok(HttpResponse { status, body })
    }
}

/// Sends the notification and checks the response status.
///
/// 4xx and 5xx responses are reported as [`NotifyError::Rejected`]. Any
/// other status counts as delivered.
pub fn send<H: HttpClient + ?Sized>(
    client: &H,
    request: &NotificationRequest,
) -> Result<HttpResponse, NotifyError> {
    tracing::debug!(
        url = %request.url(),
        tls = request.is_https(),
        body = request.body(),
        "posting build notification"
    );
    let response = client.post_json(request)?;
    if response.is_failure() {
        return Err(NotifyError::Rejected {
            status: response.status,
            body: response.body,
        });
    }
    println!(
        "Build notification sent to Bugsnag (status {})",
        response.status
    );
    Ok(response)
}
