//! HTTP checks against a deployed app

use async_trait::async_trait;

use crate::common::Result;
use crate::poll::Probe;

/// Result of one GET
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched {
    Response { status: u16, body: String },
    /// Connection could not be established; retryable
    Unreachable(String),
}

/// Something that can GET a URL
#[async_trait]
pub trait Endpoint: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Fetched>;
}

/// reqwest-backed endpoint
#[derive(Debug, Clone, Default)]
pub struct HttpEndpoint {
    client: reqwest::Client,
}

impl HttpEndpoint {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Endpoint for HttpEndpoint {
    async fn fetch(&self, url: &str) -> Result<Fetched> {
        let response = match self
            .client
            .get(url)
            .header("User-Agent", "gigalixir-smoke")
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_connect() => return Ok(Fetched::Unreachable(e.to_string())),
            Err(e) => return Err(e.into()),
        };

        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(Fetched::Response { status, body })
    }
}

/// Root URL an app is served from
pub fn app_url(app: &str, domain: &str) -> String {
    format!("https://{app}.{domain}/")
}

/// Extra requirement on a 200 response body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyCheck {
    Any,
    Contains(String),
}

/// Decide whether a fetch satisfies the check
pub fn classify(fetched: Fetched, check: &BodyCheck) -> Probe<()> {
    match fetched {
        Fetched::Unreachable(reason) => Probe::Pending(format!("ConnectionError: {reason}")),
        Fetched::Response { status, .. } if status != 200 => {
            Probe::Pending(format!("Received {status}"))
        }
        Fetched::Response { body, .. } => match check {
            BodyCheck::Contains(marker) if !body.contains(marker.as_str()) => {
                Probe::Pending(format!("{marker} not found."))
            }
            _ => Probe::Ready(()),
        },
    }
}
