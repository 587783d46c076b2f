//! Request transport for the game API.
//!
//! # Overview
//! One contract, [`Transport`], covers the three request shapes the
//! application needs: a urlencoded form POST with optional bearer auth, a
//! JSON POST that returns raw text, and a GET whose array fields become
//! repeated `name[]` query pairs. Callers depend on the trait only.
//!
//! # Design
//! - [`FetchClient`] is stateless: it holds an [`HttpExecutor`] and nothing
//!   else, so one instance serves any number of concurrent calls.
//! - Each operation is split into `build_*` (produces an [`HttpRequest`]) and
//!   `parse_*` (consumes an [`HttpResponse`]), so the wire encoding is tested
//!   without I/O.
//! - [`ReqwestExecutor`] is the production primitive; any other HTTP library
//!   plugs in by implementing [`HttpExecutor`].
//! - No caching, retry, or rate limiting. Failures surface as
//!   [`TransportError`] with the executor's error as the source.
//!
//! # Known quirk
//! The bearer token is base64 encoded before it is placed in the
//! `authorization` header (`Bearer <base64(token)>`). The game API expects
//! exactly this, so it is kept as is.

pub mod client;
pub mod error;
pub mod executor;
pub mod http;
pub mod params;
pub mod transport;

pub use client::FetchClient;
pub use error::TransportError;
pub use executor::{ExecutorConfig, HttpExecutor, ReqwestExecutor};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use params::{FieldValue, Params};
pub use transport::{Response, ResponseFormat, Transport, TransportExt};
