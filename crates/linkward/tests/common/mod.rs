//! An in-process HTTP server for validation runs.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use linkward::{Clock, ManualClock};
use linkward_fetch::{FetchError, HttpClient, Response};
use parking_lot::Mutex;

/// One canned response.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: i32,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Reply {
    pub fn status(status: i32) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn html(body: &str) -> Self {
        Self::status(200)
            .header("Content-Type", "text/html; charset=utf-8")
            .body(body)
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }
}

#[derive(Debug, Default)]
struct Route {
    replies: Vec<Reply>,
    served: usize,
    authorization: Option<String>,
}

/// A request as the server saw it.
#[derive(Debug, Clone)]
pub struct Access {
    pub uri: String,
    pub at_ms: u64,
    pub headers: Vec<(String, String)>,
}

#[derive(Debug)]
struct Inner {
    clock: Arc<ManualClock>,
    latency: Duration,
    routes: Mutex<HashMap<String, Route>>,
    log: Mutex<Vec<Access>>,
}

/// Replies per URI in turn, cycling through the replies of a route.
/// Unknown URIs get a `404`. Every request advances the clock by the latency.
#[derive(Debug, Clone)]
pub struct MockServer {
    inner: Arc<Inner>,
}

impl MockServer {
    pub fn new(clock: Arc<ManualClock>) -> Self {
        Self::with_latency(clock, Duration::ZERO)
    }

    pub fn with_latency(clock: Arc<ManualClock>, latency: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                clock,
                latency,
                routes: Mutex::new(HashMap::new()),
                log: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn route(self, uri: &str, replies: impl IntoIterator<Item = Reply>) -> Self {
        self.inner.routes.lock().insert(
            uri.to_string(),
            Route {
                replies: replies.into_iter().collect(),
                ..Route::default()
            },
        );
        self
    }

    pub fn page(self, uri: &str) -> Self {
        self.route(uri, [Reply::status(200)])
    }

    /// Answers `401` unless the request carries `authorization`.
    pub fn protect(self, uri: &str, authorization: &str) -> Self {
        if let Some(route) = self.inner.routes.lock().get_mut(uri) {
            route.authorization = Some(authorization.to_string());
        }
        self
    }

    pub fn log(&self) -> Vec<Access> {
        self.inner.log.lock().clone()
    }

    pub fn requested(&self) -> Vec<String> {
        self.log().into_iter().map(|access| access.uri).collect()
    }

    fn reply(&self, uri: &str, headers: &[(String, String)]) -> Reply {
        let mut routes = self.inner.routes.lock();
        let Some(route) = routes.get_mut(uri) else {
            return Reply::status(404);
        };
        if let Some(expected) = &route.authorization {
            let given = headers
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case("Authorization"))
                .map(|(_, value)| value);
            if given != Some(expected) {
                return Reply::status(401);
            }
        }
        if route.replies.is_empty() {
            return Reply::status(204);
        }
        let reply = route.replies[route.served % route.replies.len()].clone();
        route.served += 1;
        reply
    }
}

impl HttpClient for MockServer {
    async fn get(&self, url: &str, headers: &[(String, String)]) -> Result<Response, FetchError> {
        self.inner.log.lock().push(Access {
            uri: url.to_string(),
            at_ms: self.inner.clock.now_millis(),
            headers: headers.to_vec(),
        });
        self.inner.clock.advance(self.inner.latency);

        if url.contains("refused.invalid") {
            return Err(FetchError::ConnectionRefused("Connection refused".to_string()));
        }

        let reply = self.reply(url, headers);
        let mut response = Response::new(url, reply.status);
        for (name, value) in &reply.headers {
            response = response.header(name.as_str(), value.as_str());
        }
        Ok(response.body(reply.body))
    }
}

/// A clock at a fixed, recognizable instant.
pub fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(1_700_000_000_000))
}
