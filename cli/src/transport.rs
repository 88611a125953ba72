//! Blocking `Transport` backed by ureq.

use tmdb_auth_core::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};

/// Sends each request once; 4xx/5xx come back as responses, not errors.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn send(&mut self, req: &HttpRequest) -> Result<HttpResponse, TransportError> {
        tracing::trace!(method = req.method.as_str(), url = req.redacted_url(), "sending");
        let result = match req.method {
            HttpMethod::Get => {
                let mut builder = self.agent.get(&req.url);
                for (k, v) in &req.headers {
                    builder = builder.header(k.as_str(), v.as_str());
                }
                builder.call()
            }
        };
        let mut response = result.map_err(|e| TransportError::new(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_vec()
            .map_err(|e| TransportError::new(e.to_string()))?;
        tracing::trace!(status, bytes = body.len(), "received");
        Ok(HttpResponse::new(status, body))
    }
}
