//! Concrete transport over any `HttpExecutor`.
//!
//! # Design
//! `FetchClient` holds only its executor and carries no mutable state between
//! calls. Each operation is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`; the
//! `Transport` impl glues them together around one `execute` call. The build
//! and parse halves never touch the network.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::Value;
use tracing::debug;

use crate::error::TransportError;
use crate::executor::{ExecutorConfig, HttpExecutor, ReqwestExecutor};
use crate::http::{
    HttpMethod, HttpRequest, HttpResponse, AUTHORIZATION, CONTENT_TYPE, FORM_CONTENT_TYPE,
    JSON_CONTENT_TYPE,
};
use crate::params::Params;
use crate::transport::{Response, ResponseFormat, Transport};

/// Stateless request transport.
#[derive(Debug, Clone)]
pub struct FetchClient<E> {
    executor: E,
}

impl FetchClient<ReqwestExecutor> {
    /// Client backed by reqwest with the given settings.
    pub fn with_config(config: &ExecutorConfig) -> Result<Self, TransportError> {
        Ok(Self::new(ReqwestExecutor::new(config)?))
    }
}

impl<E> FetchClient<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn build_form_post(
        &self,
        uri: &str,
        fields: &Params,
        bearer_token: Option<&str>,
    ) -> Result<HttpRequest, TransportError> {
        check_uri(uri)?;
        let mut headers = vec![(CONTENT_TYPE.to_string(), FORM_CONTENT_TYPE.to_string())];
        if let Some(token) = bearer_token {
            headers.push((AUTHORIZATION.to_string(), bearer_header(token)?));
        }
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: uri.to_string(),
            headers,
            body: Some(fields.to_form_body()),
        })
    }

    pub fn build_json_post(&self, uri: &str, payload: &Value) -> Result<HttpRequest, TransportError> {
        check_uri(uri)?;
        let body = serde_json::to_string(payload).map_err(TransportError::Serialization)?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: uri.to_string(),
            headers: vec![(CONTENT_TYPE.to_string(), JSON_CONTENT_TYPE.to_string())],
            body: Some(body),
        })
    }

    /// The query is appended after a literal `?`, even when it is empty.
    pub fn build_get(&self, uri: &str, params: &Params) -> Result<HttpRequest, TransportError> {
        check_uri(uri)?;
        Ok(HttpRequest {
            method: HttpMethod::Get,
            url: format!("{uri}?{}", params.to_query_string()),
            headers: Vec::new(),
            body: None,
        })
    }

    /// Decode `response` as JSON or keep it as text. The status is ignored.
    pub fn parse_body(
        &self,
        response: HttpResponse,
        format: ResponseFormat,
    ) -> Result<Response, TransportError> {
        match format {
            ResponseFormat::Json => parse_json(response).map(Response::Json),
            ResponseFormat::Text => Ok(Response::Text(response.body)),
        }
    }

    pub fn parse_text(&self, response: HttpResponse) -> String {
        response.body
    }
}

#[async_trait]
impl<E: HttpExecutor> Transport for FetchClient<E> {
    async fn form_post(
        &self,
        uri: &str,
        fields: &Params,
        bearer_token: Option<&str>,
        format: ResponseFormat,
    ) -> Result<Response, TransportError> {
        let request = self.build_form_post(uri, fields, bearer_token)?;
        debug!(fields = fields.len(), auth = bearer_token.is_some(), "form post");
        let response = self.round_trip(request).await?;
        self.parse_body(response, format)
    }

    async fn json_post(&self, uri: &str, payload: &Value) -> Result<String, TransportError> {
        let request = self.build_json_post(uri, payload)?;
        let response = self.round_trip(request).await?;
        Ok(self.parse_text(response))
    }

    async fn get(&self, uri: &str, params: &Params) -> Result<Value, TransportError> {
        let request = self.build_get(uri, params)?;
        debug!(fields = params.len(), "get");
        let response = self.round_trip(request).await?;
        parse_json(response)
    }
}

impl<E: HttpExecutor> FetchClient<E> {
    async fn round_trip(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        debug!(method = request.method.as_str(), url = %request.url, "sending request");
        let response = self.executor.execute(request).await?;
        debug!(status = response.status, success = response.is_success(), "response received");
        Ok(response)
    }
}

fn check_uri(uri: &str) -> Result<(), TransportError> {
    if uri.is_empty() {
        return Err(TransportError::InvalidUri(uri.to_string()));
    }
    Ok(())
}

/// `Bearer <base64(token)>`, encoding each character as one Latin-1 byte.
fn bearer_header(token: &str) -> Result<String, TransportError> {
    let bytes = token
        .chars()
        .map(|c| u8::try_from(c).map_err(|_| TransportError::InvalidCredential(c)))
        .collect::<Result<Vec<u8>, _>>()?;
    Ok(format!("Bearer {}", STANDARD.encode(bytes)))
}

fn parse_json(response: HttpResponse) -> Result<Value, TransportError> {
    serde_json::from_str(&response.body).map_err(|e| {
        debug!(status = response.status, error = %e, "response body is not JSON");
        TransportError::Decode(e)
    })
}
