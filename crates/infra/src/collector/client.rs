use agnost_core::CollectorTransport;
use agnost_domain::constants::{CAPTURE_EVENT_PATH, CAPTURE_SESSION_PATH, ORG_ID_HEADER};
use agnost_domain::{AgnostError, AnalyticsConfig, EventPayload, Result, SessionPayload};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use tracing::debug;

use crate::errors::InfraError;
use crate::http::HttpClient;

/// Longest response body excerpt carried in an error message.
const MAX_ERROR_BODY: usize = 256;

/// Client of the collector's session and event endpoints.
///
/// Every request carries the organization header and a JSON content type.
/// One call is one attempt.
#[derive(Clone, Debug)]
pub struct CollectorClient {
    http: HttpClient,
    session_url: String,
    event_url: String,
}

impl CollectorClient {
    /// Build a client for `org_id` against the configured endpoint.
    ///
    /// # Errors
    /// Fails with `AgnostError::Config` when the org id cannot be used as a
    /// header value or the HTTP client cannot be built.
    pub fn new(org_id: &str, config: &AnalyticsConfig) -> Result<Self> {
        let org_header = HeaderValue::from_str(org_id)
            .map_err(|_| AgnostError::Config(format!("invalid organization id: {org_id:?}")))?;

        let org_name = HeaderName::from_bytes(ORG_ID_HEADER.as_bytes())
            .map_err(|err| AgnostError::Internal(format!("invalid header name: {err}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(org_name, org_header);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http =
            HttpClient::builder().timeout(config.request_timeout).default_headers(headers).build()?;

        Ok(Self {
            http,
            session_url: config.endpoint_url(CAPTURE_SESSION_PATH),
            event_url: config.endpoint_url(CAPTURE_EVENT_PATH),
        })
    }

    async fn post<T: Serialize + ?Sized>(&self, url: &str, body: &T) -> Result<StatusCode> {
        let body = serde_json::to_vec(body).map_err(InfraError::from)?;
        let response = self.http.send(self.http.request(Method::POST, url).body(body)).await?;

        let status = response.status();
        if status.is_success() {
            return Ok(status);
        }

        let body = response.text().await.unwrap_or_default();
        Err(Self::map_status_error(status, url, &body))
    }

    fn map_status_error(status: StatusCode, url: &str, body: &str) -> AgnostError {
        let body = body.trim();
        let message = if body.is_empty() {
            format!("{url} returned status {status}")
        } else {
            let excerpt: String = body.chars().take(MAX_ERROR_BODY).collect();
            format!("{url} returned status {status}: {excerpt}")
        };
        AgnostError::Network(message)
    }
}

#[async_trait]
impl CollectorTransport for CollectorClient {
    async fn create_session(&self, payload: &SessionPayload) -> Result<()> {
        match self.post(&self.session_url, payload).await {
            Ok(status) => {
                debug!(session_id = %payload.session_id, %status, "Session registered");
                Ok(())
            }
            Err(err) => {
                debug!(session_id = %payload.session_id, error = %err, "Session registration request failed");
                Err(AgnostError::SessionCreation(err.to_string()))
            }
        }
    }

    async fn record_event(&self, payload: &EventPayload) -> Result<()> {
        match self.post(&self.event_url, payload).await {
            Ok(status) => {
                debug!(
                    primitive = %payload.primitive_name,
                    session_id = %payload.session_id,
                    %status,
                    "Event delivered"
                );
                Ok(())
            }
            Err(err) => {
                debug!(primitive = %payload.primitive_name, error = %err, "Event delivery attempt failed");
                Err(AgnostError::Delivery(err.to_string()))
            }
        }
    }
}
