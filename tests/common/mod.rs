//! Scripted transport shared by the integration tests
//!
//! Responses are matched by request path (and optionally by a query or form
//! value). A route replays its responses in order and keeps answering with
//! the last one once the script runs out.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use upload_client::transport::{FormData, HttpRequest, HttpResponse, Method, RequestBody, Transport};
use upload_client::{Result, UploadClient, UploadSettings};

pub const API: &str = "http://api.test";
pub const PARTS: &str = "http://parts.test";
pub const PUBLIC_KEY: &str = "demopublickey";

#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

impl MockResponse {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Bytes::from(body.to_string()),
        }
    }

    pub fn ok(body: Value) -> Self {
        Self::json(200, body)
    }

    pub fn empty(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn throttled() -> Self {
        Self::json(
            429,
            serde_json::json!({
                "error": { "content": "Request was throttled.", "error_code": "RequestThrottledError" }
            }),
        )
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_lowercase(), value.to_string());
        self
    }
}

/// What the transport saw for one request
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub url: String,
    pub path: String,
    pub form: Option<FormData>,
    pub body_len: usize,
}

type Matcher = Box<dyn Fn(&HttpRequest, &str) -> bool + Send + Sync>;

struct Route {
    matcher: Matcher,
    responses: VecDeque<MockResponse>,
    delay: Option<Duration>,
}

#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<Recorded>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

fn path_of(url: &str) -> String {
    reqwest::Url::parse(url)
        .map(|url| url.path().to_string())
        .unwrap_or_default()
}

fn query_value(url: &str, name: &str) -> Option<String> {
    reqwest::Url::parse(url).ok().and_then(|url| {
        url.query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    })
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn add(&self, matcher: Matcher, responses: Vec<MockResponse>, delay: Option<Duration>) {
        self.routes.lock().unwrap().push(Route {
            matcher,
            responses: responses.into(),
            delay,
        });
    }

    /// Answers every request to `path`
    pub fn on(&self, path: &str, response: MockResponse) -> &Self {
        self.script(path, vec![response])
    }

    /// Answers requests to `path` with `responses` in order
    pub fn script(&self, path: &str, responses: Vec<MockResponse>) -> &Self {
        let path = path.to_string();
        self.add(Box::new(move |_, p| p == path), responses, None);
        self
    }

    /// Answers requests to `path` after `delay`
    pub fn delayed(&self, path: &str, delay: Duration, response: MockResponse) -> &Self {
        let path = path.to_string();
        self.add(Box::new(move |_, p| p == path), vec![response], Some(delay));
        self
    }

    /// Answers requests to `path` whose query carries `name=value`
    pub fn on_query(&self, path: &str, name: &str, value: &str, response: MockResponse) -> &Self {
        let (path, name, value) = (path.to_string(), name.to_string(), value.to_string());
        self.add(
            Box::new(move |request, p| {
                p == path && query_value(&request.url, &name).as_deref() == Some(value.as_str())
            }),
            vec![response],
            None,
        );
        self
    }

    /// Answers requests to `path` whose form carries `name=value`
    pub fn on_form(&self, path: &str, name: &str, value: &str, response: MockResponse) -> &Self {
        let (path, name, value) = (path.to_string(), name.to_string(), value.to_string());
        self.add(
            Box::new(move |request, p| {
                p == path
                    && request
                        .form_data()
                        .and_then(|form| form.get(&name))
                        .map_or(false, |field| field == value)
            }),
            vec![response],
            None,
        );
        self
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|request| request.path == path)
            .collect()
    }

    pub fn count(&self, path: &str) -> usize {
        self.requests_to(path).len()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_response(&self, request: &HttpRequest, path: &str) -> (MockResponse, Option<Duration>) {
        let mut routes = self.routes.lock().unwrap();
        let route = routes
            .iter_mut()
            .find(|route| (route.matcher)(request, path))
            .unwrap_or_else(|| panic!("No scripted response for {} {}", request.method, request.url));

        let response = if route.responses.len() > 1 {
            route.responses.pop_front().unwrap()
        } else {
            route.responses.front().cloned().unwrap()
        };
        (response, route.delay)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse> {
        let path = path_of(&request.url);
        let body_len = match &request.body {
            RequestBody::Bytes(data) => data.len(),
            _ => 0,
        };
        self.requests.lock().unwrap().push(Recorded {
            method: request.method,
            url: request.url.clone(),
            path: path.clone(),
            form: request.form_data().cloned(),
            body_len,
        });

        let (response, delay) = self.next_response(&request, &path);

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let (Some(callback), true) = (&request.on_upload_progress, response.status < 300) {
            callback(body_len as u64);
        }

        Ok(HttpResponse {
            status: response.status,
            headers: response.headers,
            body: response.body,
            request: request.summary(),
        })
    }
}

pub fn settings() -> UploadSettings {
    UploadSettings::new(PUBLIC_KEY)
        .base_url(API)
        .retry_base_delay(Duration::from_millis(1))
        .poll_interval(Duration::from_millis(10))
}

pub fn client(settings: UploadSettings, transport: &Arc<MockTransport>) -> UploadClient {
    let _ = env_logger::builder().is_test(true).try_init();
    UploadClient::with_transport(settings, transport.clone()).unwrap()
}

pub fn file_info(uuid: &str, size: u64) -> Value {
    serde_json::json!({
        "uuid": uuid,
        "size": size,
        "mime_type": "application/octet-stream",
        "is_image": false,
        "is_stored": true,
        "is_ready": true,
        "filename": "original",
        "original_filename": "original"
    })
}

/// Start response handing out `count` part URLs, keyed by index
pub fn start_response(uuid: &str, count: usize) -> Value {
    let parts: serde_json::Map<String, Value> = (0..count)
        .map(|i| (i.to_string(), Value::String(format!("{}/part/{}", PARTS, i))))
        .collect();
    serde_json::json!({ "uuid": uuid, "parts": parts })
}

pub fn progress_recorder() -> (
    impl Fn(upload_client::UploadProgress) + Send + Sync + 'static,
    Arc<Mutex<Vec<f64>>>,
) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    (
        move |progress: upload_client::UploadProgress| sink.lock().unwrap().push(progress.value),
        seen,
    )
}
