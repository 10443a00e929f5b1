//! In-process stand-in for an InfluxDB 1.x server

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::IntoResponse,
    routing::any,
    Router,
};
use daq_db::{ConnectionBuilder, InfluxClient};
use tokio::net::TcpListener;
use url::form_urlencoded;

const EMPTY_RESULT: &str = r#"{"results":[{"statement_id":0}]}"#;

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub params: HashMap<String, String>,
    pub body: String,
    pub authorization: Option<String>,
}

#[derive(Default)]
pub struct FakeInflux {
    requests: Mutex<Vec<Recorded>>,
    responses: Mutex<Vec<(String, u16, String)>>,
}

impl FakeInflux {
    /// Answer queries starting with `q_prefix`
    pub fn respond(&self, q_prefix: &str, status: u16, body: &str) {
        self.responses
            .lock()
            .unwrap()
            .push((q_prefix.to_string(), status, body.to_string()));
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn queries(&self) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == "/query")
            .collect()
    }

    pub fn writes(&self) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == "/write")
            .collect()
    }
}

async fn handle(
    State(fake): State<Arc<FakeInflux>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    let mut params: HashMap<String, String> = uri
        .query()
        .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default();
    if uri.path() == "/query" && method == Method::POST {
        params.extend(form_urlencoded::parse(body.as_bytes()).into_owned());
    }
    let authorization = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    fake.requests.lock().unwrap().push(Recorded {
        method,
        path: uri.path().to_string(),
        params: params.clone(),
        body,
        authorization,
    });

    if uri.path() != "/query" {
        return StatusCode::NO_CONTENT.into_response();
    }

    let q = params.get("q").cloned().unwrap_or_default();
    let (status, body) = fake
        .responses
        .lock()
        .unwrap()
        .iter()
        .find(|(prefix, _, _)| q.starts_with(prefix.as_str()))
        .map(|(_, status, body)| (*status, body.clone()))
        .unwrap_or((200, EMPTY_RESULT.to_string()));

    (
        StatusCode::from_u16(status).unwrap(),
        [("content-type", "application/json")],
        body,
    )
        .into_response()
}

pub async fn spawn() -> (Arc<FakeInflux>, SocketAddr) {
    let fake = Arc::new(FakeInflux::default());
    let app = Router::new()
        .route("/ping", any(handle))
        .route("/query", any(handle))
        .route("/write", any(handle))
        .with_state(Arc::clone(&fake));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (fake, addr)
}

pub fn client(addr: SocketAddr) -> InfluxClient {
    ConnectionBuilder::new("dhblum")
        .host("127.0.0.1")
        .port(addr.port())
        .username("reader")
        .password("secret")
        .build()
        .unwrap()
}
