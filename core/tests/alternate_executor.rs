//! The same transport contract served by a blocking ureq agent.
//!
//! # Design
//! `FetchClient` only needs something that implements `HttpExecutor`. This
//! test plugs in ureq, runs each blocking call on tokio's blocking pool, and
//! checks that the wire format and decoding are unchanged.

use async_trait::async_trait;
use mock_server::RecordedRequest;
use serde_json::json;
use transport_core::{
    FetchClient, HttpExecutor, HttpMethod, HttpRequest, HttpResponse, Params, Response,
    ResponseFormat, Transport, TransportError,
};

/// Execute `HttpRequest`s with ureq.
///
/// Disables ureq's automatic status-code-as-error behavior so 4xx/5xx
/// responses are returned as data, matching the transport contract.
#[derive(Clone)]
struct UreqExecutor {
    agent: ureq::Agent,
}

impl UreqExecutor {
    fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

fn execute_blocking(agent: &ureq::Agent, req: HttpRequest) -> Result<HttpResponse, ureq::Error> {
    let mut response = match (req.method, req.body) {
        (HttpMethod::Get, _) => {
            let mut builder = agent.get(&req.url);
            for (name, value) in &req.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            builder.call()?
        }
        (HttpMethod::Post, body) => {
            let mut builder = agent.post(&req.url);
            for (name, value) in &req.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            match body {
                Some(body) => builder.send(body.as_bytes())?,
                None => builder.send_empty()?,
            }
        }
    };

    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    let body = response.body_mut().read_to_string()?;

    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}

#[async_trait]
impl HttpExecutor for UreqExecutor {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let agent = self.agent.clone();
        tokio::task::spawn_blocking(move || execute_blocking(&agent, request))
            .await
            .map_err(TransportError::transport)?
            .map_err(TransportError::transport)
    }
}

async fn start_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(mock_server::run(listener));
    format!("http://{addr}")
}

#[tokio::test(flavor = "multi_thread")]
async fn full_contract_over_ureq() {
    let base = start_server().await;
    let client = FetchClient::new(UreqExecutor::new());

    // Step 1: form post with a token, decoded as JSON.
    let response = client
        .form_post(
            &format!("{base}/echo"),
            &Params::new().with("user", "sulu").with("ids", vec![1, 2]),
            Some("secret-token"),
            ResponseFormat::Json,
        )
        .await
        .unwrap();
    let seen: RecordedRequest = serde_json::from_value(response.into_json().unwrap()).unwrap();
    assert_eq!(seen.body, "user=sulu&ids=1%2C2");
    assert_eq!(seen.authorization.as_deref(), Some("Bearer c2VjcmV0LXRva2Vu"));

    // Step 2: form post decoded as text.
    let response = client
        .form_post(
            &format!("{base}/fixed/json"),
            &Params::new(),
            None,
            ResponseFormat::Text,
        )
        .await
        .unwrap();
    assert_eq!(response, Response::Text(r#"{"a":1}"#.to_string()));

    // Step 3: json post returns raw text.
    let text = client
        .json_post(&format!("{base}/echo"), &json!({ "x": 1 }))
        .await
        .unwrap();
    let seen: RecordedRequest = serde_json::from_str(&text).unwrap();
    assert_eq!(seen.body, r#"{"x":1}"#);
    assert_eq!(seen.content_type.as_deref(), Some("application/json"));

    // Step 4: get with array parameters.
    let body = client
        .get(
            &format!("{base}/echo"),
            &Params::new().with("ids", vec![5, 6]),
        )
        .await
        .unwrap();
    let seen: RecordedRequest = serde_json::from_value(body).unwrap();
    assert_eq!(seen.query.as_deref(), Some("ids%5B%5D=5&ids%5B%5D=6"));

    // Step 5: a 500 still resolves.
    let body = client
        .get(&format!("{base}/status/500"), &Params::new())
        .await
        .unwrap();
    assert_eq!(body["status"], 500);

    // Step 6: the journal saw every echoed request in order.
    let journal = client
        .get(&format!("{base}/journal"), &Params::new())
        .await
        .unwrap();
    let entries: Vec<RecordedRequest> = serde_json::from_value(journal).unwrap();
    let methods: Vec<_> = entries.iter().map(|e| e.method.as_str()).collect();
    assert_eq!(methods, vec!["POST", "POST", "GET"]);
}
