//! HTTP wire types and header/query helpers.
//!
//! # Design
//! Requests and responses are plain data. `OlogClient` builds `HttpRequest`
//! values and interprets `HttpResponse` values without touching the network;
//! `BlockingClient` (or a test) executes the round-trip in between. This
//! keeps every URL, header, and body assertable without a server.
//!
//! Bodies are `Vec<u8>` rather than `String` because attachment downloads
//! and multipart uploads carry arbitrary bytes; the JSON paths serialize
//! into and deserialize out of the same field.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// HTTP method for a request. The Olog REST surface only ever issues these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Put,
    Post,
}

/// An HTTP request described as plain data.
///
/// `path` is the full URL, query string included. Headers always carry the
/// JSON content negotiation pair and the basic-auth credential; the
/// attachment upload path swaps the content type for its multipart variant.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

/// An HTTP response described as plain data, handed to `parse_*` methods.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// RFC 7617 `Basic` credential value for the `authorization` header.
pub(crate) fn basic_auth_header(user: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{user}:{password}")))
}

/// Append `params` to `url` as a percent-encoded query string. Parameters
/// with no value were already dropped by the caller; an empty slice leaves
/// the URL untouched.
pub(crate) fn append_query(url: String, params: &[(&'static str, String)]) -> String {
    if params.is_empty() {
        return url;
    }
    let query: Vec<String> = params
        .iter()
        .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
        .collect();
    format!("{url}?{}", query.join("&"))
}
