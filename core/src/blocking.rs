//! Blocking executor that pairs `OlogClient` with a persistent HTTP agent.
//!
//! # Design
//! `BlockingClient` owns a `ureq::Agent`, so connections are pooled and
//! reused across calls. Each public method is a thin round-trip: build the
//! request with the inner [`OlogClient`], execute it, hand the response back
//! to the matching parser. Status interpretation stays in the parsers;
//! ureq's status-as-error behavior is disabled so 4xx/5xx responses arrive
//! as data.

use std::fmt;

use crate::client::OlogClient;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{LogEntry, Logbook, LogsQuery, NewAttachment, Property, Tag};

/// Executing client for the Olog service.
///
/// Cloning is cheap and shares the underlying connection pool.
#[derive(Clone)]
pub struct BlockingClient {
    inner: OlogClient,
    agent: ureq::Agent,
}

impl fmt::Debug for BlockingClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockingClient")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl BlockingClient {
    /// Connect to the service root at `base_url` with basic-auth
    /// credentials.
    ///
    /// Certificate verification is off; the service is typically deployed
    /// behind a self-signed certificate.
    pub fn new(base_url: &str, user: &str, password: &str) -> Self {
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .tls_config(
                ureq::tls::TlsConfig::builder()
                    .disable_verification(true)
                    .build(),
            )
            .build();
        Self {
            inner: OlogClient::new(base_url, user, password),
            agent: config.new_agent(),
        }
    }

    /// The authenticated user, the only `owner` the service accepts.
    pub fn user(&self) -> &str {
        self.inner.user()
    }

    // --- logbooks ---

    pub fn get_logbooks(&self) -> Result<Vec<Logbook>, ApiError> {
        let response = self.execute(self.inner.build_get_logbooks())?;
        self.inner.parse_get_logbooks(response)
    }

    pub fn get_logbook(&self, name: &str) -> Result<Logbook, ApiError> {
        let response = self.execute(self.inner.build_get_logbook(name))?;
        self.inner.parse_get_logbook(response)
    }

    pub fn put_logbooks(&self, logbooks: &[Logbook]) -> Result<(), ApiError> {
        let response = self.execute(self.inner.build_put_logbooks(logbooks)?)?;
        self.inner.parse_put_logbooks(response)
    }

    /// Create or update a single logbook and verify the server's echo.
    pub fn put_logbook(&self, logbook: &Logbook) -> Result<Logbook, ApiError> {
        let response = self.execute(self.inner.build_put_logbook(logbook)?)?;
        self.inner.parse_put_logbook(logbook, response)
    }

    // --- logs ---

    pub fn get_logs(&self, query: &LogsQuery) -> Result<Vec<LogEntry>, ApiError> {
        let response = self.execute(self.inner.build_get_logs(query)?)?;
        self.inner.parse_get_logs(response)
    }

    pub fn get_log(&self, id: i64) -> Result<LogEntry, ApiError> {
        let response = self.execute(self.inner.build_get_log(id))?;
        self.inner.parse_get_log(response)
    }

    // --- attachments ---

    pub fn get_attachment(&self, id: i64, filename: &str) -> Result<Vec<u8>, ApiError> {
        let response = self.execute(self.inner.build_get_attachment(id, filename))?;
        self.inner.parse_get_attachment(response)
    }

    pub fn post_attachment(&self, id: i64, attachment: &NewAttachment) -> Result<(), ApiError> {
        let response = self.execute(self.inner.build_post_attachment(id, attachment))?;
        self.inner.parse_post_attachment(response)
    }

    // --- tags ---

    pub fn get_tags(&self) -> Result<Vec<Tag>, ApiError> {
        let response = self.execute(self.inner.build_get_tags())?;
        self.inner.parse_get_tags(response)
    }

    pub fn get_tag(&self, name: &str) -> Result<Tag, ApiError> {
        let response = self.execute(self.inner.build_get_tag(name))?;
        self.inner.parse_get_tag(response)
    }

    pub fn put_tags(&self, tags: &[Tag]) -> Result<(), ApiError> {
        let response = self.execute(self.inner.build_put_tags(tags)?)?;
        self.inner.parse_put_tags(response)
    }

    /// Create or update a single tag and verify the server's echo.
    pub fn put_tag(&self, tag: &Tag) -> Result<Tag, ApiError> {
        let response = self.execute(self.inner.build_put_tag(tag)?)?;
        self.inner.parse_put_tag(tag, response)
    }

    // --- properties ---

    pub fn get_properties(&self) -> Result<Vec<Property>, ApiError> {
        let response = self.execute(self.inner.build_get_properties())?;
        self.inner.parse_get_properties(response)
    }

    pub fn get_property(&self, name: &str) -> Result<Property, ApiError> {
        let response = self.execute(self.inner.build_get_property(name))?;
        self.inner.parse_get_property(response)
    }

    pub fn put_properties(&self, properties: &[Property]) -> Result<(), ApiError> {
        let response = self.execute(self.inner.build_put_properties(properties)?)?;
        self.inner.parse_put_properties(response)
    }

    /// Create or update a single property and verify the server's echo,
    /// ignoring attribute order.
    pub fn put_property(&self, property: &Property) -> Result<Property, ApiError> {
        let response = self.execute(self.inner.build_put_property(property)?)?;
        self.inner.parse_put_property(property, response)
    }

    /// Execute an `HttpRequest` over the pooled agent.
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let HttpRequest {
            method,
            path,
            headers,
            body,
        } = request;

        let result = match (method, body) {
            (HttpMethod::Get, _) => {
                let mut builder = self.agent.get(&path);
                for (name, value) in &headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.call()
            }
            (HttpMethod::Put, Some(body)) => {
                let mut builder = self.agent.put(&path);
                for (name, value) in &headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.send(body.as_slice())
            }
            (HttpMethod::Put, None) => {
                let mut builder = self.agent.put(&path);
                for (name, value) in &headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.send_empty()
            }
            (HttpMethod::Post, Some(body)) => {
                let mut builder = self.agent.post(&path);
                for (name, value) in &headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.send(body.as_slice())
            }
            (HttpMethod::Post, None) => {
                let mut builder = self.agent.post(&path);
                for (name, value) in &headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.send_empty()
            }
        };

        let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_vec()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers: Vec::new(),
            body,
        })
    }
}
