//! HTTP round-trip types handed to an `HttpExecutor`.
//!
//! # Design
//! Requests and responses are plain data. `FetchClient` builds an
//! `HttpRequest` without touching the network and decodes an `HttpResponse`
//! after the executor returns, so the encoding rules can be tested without
//! any I/O and any HTTP library can sit behind the executor seam.

/// Header carrying the request body's media type.
pub const CONTENT_TYPE: &str = "content-type";

/// Header carrying the bearer credential.
pub const AUTHORIZATION: &str = "authorization";

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// An HTTP request described as plain data.
///
/// Built by `FetchClient::build_*` methods and consumed by
/// `HttpExecutor::execute`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// First value of the header `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// An HTTP response described as plain data.
///
/// The status is informational: a non-2xx response is still decoded like any
/// other body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_ignores_case() {
        let req = HttpRequest {
            method: HttpMethod::Post,
            url: "http://localhost/".to_string(),
            headers: vec![("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string())],
            body: None,
        };
        assert_eq!(req.header(CONTENT_TYPE), Some(JSON_CONTENT_TYPE));
        assert_eq!(req.header(AUTHORIZATION), None);
    }

    #[test]
    fn success_range_is_2xx() {
        let mut resp = HttpResponse {
            status: 204,
            headers: Vec::new(),
            body: String::new(),
        };
        assert!(resp.is_success());
        resp.status = 404;
        assert!(!resp.is_success());
    }
}
