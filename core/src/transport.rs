//! The request transport contract.
//!
//! Callers depend on [`Transport`] only, never on the HTTP library behind
//! it, so a test double or an alternate client can be swapped in without
//! touching call sites.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::TransportError;
use crate::params::Params;

/// How a form POST response body is decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseFormat {
    #[default]
    Json,
    Text,
}

/// A decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Json(Value),
    Text(String),
}

impl Response {
    pub fn format(&self) -> ResponseFormat {
        match self {
            Response::Json(_) => ResponseFormat::Json,
            Response::Text(_) => ResponseFormat::Text,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Response::Json(value) => Some(value),
            Response::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Response::Text(text) => Some(text),
            Response::Json(_) => None,
        }
    }

    pub fn into_json(self) -> Option<Value> {
        match self {
            Response::Json(value) => Some(value),
            Response::Text(_) => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            Response::Text(text) => Some(text),
            Response::Json(_) => None,
        }
    }
}

/// Three request shapes against a remote endpoint.
///
/// Every call is independent: implementations keep no per-call state, and
/// several calls may be in flight on one instance at once.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `fields` as a urlencoded form.
    ///
    /// When `bearer_token` is present it is sent as
    /// `authorization: Bearer <base64(token)>`. The base64 step is a
    /// compatibility quirk of the game API and must not be removed.
    async fn form_post(
        &self,
        uri: &str,
        fields: &Params,
        bearer_token: Option<&str>,
        format: ResponseFormat,
    ) -> Result<Response, TransportError>;

    /// POST `payload` as a JSON document and return the raw response text.
    async fn json_post(&self, uri: &str, payload: &Value) -> Result<String, TransportError>;

    /// GET `uri` with `params` as the query string and parse the body as JSON.
    async fn get(&self, uri: &str, params: &Params) -> Result<Value, TransportError>;
}

/// Conveniences available on every [`Transport`].
#[async_trait]
pub trait TransportExt: Transport {
    /// Serialize `payload` and send it with [`Transport::json_post`].
    async fn json_post_as<T>(&self, uri: &str, payload: &T) -> Result<String, TransportError>
    where
        T: Serialize + Sync + ?Sized;
}

#[async_trait]
impl<X: Transport + ?Sized> TransportExt for X {
    async fn json_post_as<T>(&self, uri: &str, payload: &T) -> Result<String, TransportError>
    where
        T: Serialize + Sync + ?Sized,
    {
        let value = serde_json::to_value(payload).map_err(TransportError::Serialization)?;
        self.json_post(uri, &value).await
    }
}
