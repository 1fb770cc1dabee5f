//! Request builder and response parser for the Olog API.
//!
//! # Design
//! `OlogClient` holds the base URL, the authenticated user, and the
//! precomputed basic-auth header — nothing mutable. Each REST operation is
//! split into a `build_*` method that produces an `HttpRequest` and a
//! `parse_*` method that consumes an `HttpResponse`; `BlockingClient` (or a
//! test) executes the round-trip in between, keeping this layer
//! deterministic and free of I/O.
//!
//! Two checks happen here rather than on the server. Writes whose payload
//! names a different `owner` than the authenticated user fail before a
//! request exists, because the service rejects them anyway. And the
//! single-object put paths compare the server's echoed object against the
//! submission, surfacing writes the server acknowledged but did not persist.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::http::{append_query, basic_auth_header, HttpMethod, HttpRequest, HttpResponse};
use crate::types::{LogEntry, Logbook, LogsQuery, NewAttachment, Property, Tag};

/// Stateless builder/parser for Olog requests and responses.
///
/// Holds no connection; see `BlockingClient` for the executing wrapper.
#[derive(Clone)]
pub struct OlogClient {
    base_url: String,
    user: String,
    auth_header: String,
}

// Manual impl so the credential header never lands in debug output.
impl fmt::Debug for OlogClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OlogClient")
            .field("base_url", &self.base_url)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

impl OlogClient {
    /// `base_url` is the service root, such as `https://host:8181/Olog`;
    /// a trailing slash is tolerated and stripped.
    pub fn new(base_url: &str, user: &str, password: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            user: user.to_string(),
            auth_header: basic_auth_header(user, password),
        }
    }

    /// The authenticated user, the only `owner` the service accepts.
    pub fn user(&self) -> &str {
        &self.user
    }

    // --- logbooks ---

    pub fn build_get_logbooks(&self) -> HttpRequest {
        self.get_request(format!("{}/logbooks", self.base_url))
    }

    pub fn parse_get_logbooks(&self, response: HttpResponse) -> Result<Vec<Logbook>, ApiError> {
        parse_json(response)
    }

    /// Logbooks have an integer id on the server, but this endpoint is
    /// addressed by *name*; it does not accept an id.
    pub fn build_get_logbook(&self, name: &str) -> HttpRequest {
        self.get_request(format!(
            "{}/logbooks/{}",
            self.base_url,
            urlencoding::encode(name)
        ))
    }

    pub fn parse_get_logbook(&self, response: HttpResponse) -> Result<Logbook, ApiError> {
        parse_json(response)
    }

    pub fn build_put_logbooks(&self, logbooks: &[Logbook]) -> Result<HttpRequest, ApiError> {
        for logbook in logbooks {
            self.check_owner(logbook.owner.as_deref())?;
        }
        self.put_json(format!("{}/logbooks", self.base_url), logbooks)
    }

    /// Bulk puts only report transport-level success; the response body is
    /// not compared against the submission.
    pub fn parse_put_logbooks(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    pub fn build_put_logbook(&self, logbook: &Logbook) -> Result<HttpRequest, ApiError> {
        self.check_owner(logbook.owner.as_deref())?;
        self.put_json(
            format!(
                "{}/logbooks/{}",
                self.base_url,
                urlencoding::encode(&logbook.name)
            ),
            logbook,
        )
    }

    /// The server responds with a copy of what it inserted into its
    /// database. Comparing it with the submission catches writes that were
    /// acknowledged but not persisted; a mismatch is
    /// [`ApiError::SilentFailure`].
    pub fn parse_put_logbook(
        &self,
        submitted: &Logbook,
        response: HttpResponse,
    ) -> Result<Logbook, ApiError> {
        let echoed: Logbook = parse_json(response)?;
        if echoed != *submitted {
            return Err(silent_failure(submitted, &echoed));
        }
        Ok(echoed)
    }

    // --- logs ---

    pub fn build_get_logs(&self, query: &LogsQuery) -> Result<HttpRequest, ApiError> {
        let params = query.to_params()?;
        Ok(self.get_request(append_query(format!("{}/logs", self.base_url), &params)))
    }

    pub fn parse_get_logs(&self, response: HttpResponse) -> Result<Vec<LogEntry>, ApiError> {
        parse_json(response)
    }

    pub fn build_get_log(&self, id: i64) -> HttpRequest {
        self.get_request(format!("{}/logs/{id}", self.base_url))
    }

    pub fn parse_get_log(&self, response: HttpResponse) -> Result<LogEntry, ApiError> {
        parse_json(response)
    }

    // --- attachments ---

    pub fn build_get_attachment(&self, id: i64, filename: &str) -> HttpRequest {
        self.get_request(format!(
            "{}/logs/attachments/{id}/{}",
            self.base_url,
            urlencoding::encode(filename)
        ))
    }

    /// Attachments come back verbatim; the body is not interpreted.
    pub fn parse_get_attachment(&self, response: HttpResponse) -> Result<Vec<u8>, ApiError> {
        check_status(&response)?;
        Ok(response.body)
    }

    /// Uploads are `multipart/form-data`; the boundary is freshly generated
    /// per request and carried in the content-type header.
    pub fn build_post_attachment(&self, id: i64, attachment: &NewAttachment) -> HttpRequest {
        let boundary = format!("olog-{}", Uuid::new_v4());
        let body = encode_multipart(&boundary, attachment);
        HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}/logs/attachments/{id}", self.base_url),
            headers: self.multipart_headers(&boundary),
            body: Some(body),
        }
    }

    pub fn parse_post_attachment(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    // --- tags ---

    pub fn build_get_tags(&self) -> HttpRequest {
        self.get_request(format!("{}/tags", self.base_url))
    }

    pub fn parse_get_tags(&self, response: HttpResponse) -> Result<Vec<Tag>, ApiError> {
        parse_json(response)
    }

    pub fn build_get_tag(&self, name: &str) -> HttpRequest {
        self.get_request(format!("{}/tags/{}", self.base_url, urlencoding::encode(name)))
    }

    pub fn parse_get_tag(&self, response: HttpResponse) -> Result<Tag, ApiError> {
        parse_json(response)
    }

    pub fn build_put_tags(&self, tags: &[Tag]) -> Result<HttpRequest, ApiError> {
        self.put_json(format!("{}/tags", self.base_url), tags)
    }

    pub fn parse_put_tags(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    pub fn build_put_tag(&self, tag: &Tag) -> Result<HttpRequest, ApiError> {
        self.put_json(
            format!("{}/tags/{}", self.base_url, urlencoding::encode(&tag.name)),
            tag,
        )
    }

    /// Echo-verified like [`parse_put_logbook`](Self::parse_put_logbook).
    pub fn parse_put_tag(&self, submitted: &Tag, response: HttpResponse) -> Result<Tag, ApiError> {
        let echoed: Tag = parse_json(response)?;
        if echoed != *submitted {
            return Err(silent_failure(submitted, &echoed));
        }
        Ok(echoed)
    }

    // --- properties ---

    pub fn build_get_properties(&self) -> HttpRequest {
        self.get_request(format!("{}/properties", self.base_url))
    }

    pub fn parse_get_properties(&self, response: HttpResponse) -> Result<Vec<Property>, ApiError> {
        parse_json(response)
    }

    pub fn build_get_property(&self, name: &str) -> HttpRequest {
        self.get_request(format!(
            "{}/properties/{}",
            self.base_url,
            urlencoding::encode(name)
        ))
    }

    pub fn parse_get_property(&self, response: HttpResponse) -> Result<Property, ApiError> {
        parse_json(response)
    }

    pub fn build_put_properties(&self, properties: &[Property]) -> Result<HttpRequest, ApiError> {
        for property in properties {
            self.check_owner(property.owner.as_deref())?;
        }
        self.put_json(format!("{}/properties", self.base_url), properties)
    }

    pub fn parse_put_properties(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    pub fn build_put_property(&self, property: &Property) -> Result<HttpRequest, ApiError> {
        self.check_owner(property.owner.as_deref())?;
        self.put_json(
            format!(
                "{}/properties/{}",
                self.base_url,
                urlencoding::encode(&property.name)
            ),
            property,
        )
    }

    /// Echo-verified with attribute order normalized on both sides —
    /// attribute order is not significant and the server returns attributes
    /// sorted by name regardless of how they were sent.
    pub fn parse_put_property(
        &self,
        submitted: &Property,
        response: HttpResponse,
    ) -> Result<Property, ApiError> {
        let echoed: Property = parse_json(response)?;
        if echoed.normalized() != submitted.normalized() {
            return Err(silent_failure(submitted, &echoed));
        }
        Ok(echoed)
    }

    // --- shared plumbing ---

    /// The service only accepts writes whose `owner` is the authenticated
    /// user; a mismatched payload fails here instead of after a round-trip.
    fn check_owner(&self, owner: Option<&str>) -> Result<(), ApiError> {
        match owner {
            Some(owner) if owner != self.user => Err(ApiError::OwnerMismatch {
                owner: owner.to_string(),
                user: self.user.clone(),
            }),
            _ => Ok(()),
        }
    }

    fn get_request(&self, url: String) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: url,
            headers: self.json_headers(),
            body: None,
        }
    }

    fn put_json<T: Serialize + ?Sized>(
        &self,
        url: String,
        payload: &T,
    ) -> Result<HttpRequest, ApiError> {
        let body =
            serde_json::to_vec(payload).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Put,
            path: url,
            headers: self.json_headers(),
            body: Some(body),
        })
    }

    // Sent on every request, per the service's content negotiation rules.
    fn json_headers(&self) -> Vec<(String, String)> {
        vec![
            ("content-type".to_string(), "application/json".to_string()),
            ("accept".to_string(), "application/json".to_string()),
            ("authorization".to_string(), self.auth_header.clone()),
        ]
    }

    fn multipart_headers(&self, boundary: &str) -> Vec<(String, String)> {
        vec![
            (
                "content-type".to_string(),
                format!("multipart/form-data; boundary={boundary}"),
            ),
            ("accept".to_string(), "application/json".to_string()),
            ("authorization".to_string(), self.auth_header.clone()),
        ]
    }
}

/// Map non-2xx status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if (200..300).contains(&response.status) {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::HttpError {
        status: response.status,
        body: String::from_utf8_lossy(&response.body).into_owned(),
    })
}

fn parse_json<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    check_status(&response)?;
    serde_json::from_slice(&response.body)
        .map_err(|e| ApiError::DeserializationError(e.to_string()))
}

fn silent_failure<T: fmt::Debug>(submitted: &T, echoed: &T) -> ApiError {
    ApiError::SilentFailure {
        submitted: format!("{submitted:?}"),
        echoed: format!("{echoed:?}"),
    }
}

/// Encode the three multipart parts: `file` carries the blob under the
/// attachment's filename, `filename` repeats the name as a plain field, and
/// `fileMetadataDescription` rides along when present.
fn encode_multipart(boundary: &str, attachment: &NewAttachment) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            attachment.filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(&attachment.data);
    body.extend_from_slice(b"\r\n");
    push_text_part(&mut body, boundary, "filename", &attachment.filename);
    if let Some(description) = &attachment.metadata_description {
        push_text_part(&mut body, boundary, "fileMetadataDescription", description);
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

fn push_text_part(body: &mut Vec<u8>, boundary: &str, name: &str, value: &str) {
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
    );
    body.extend_from_slice(value.as_bytes());
    body.extend_from_slice(b"\r\n");
}
