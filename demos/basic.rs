//! Minimal stint example: JSON endpoints with request timing.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!   SLOW_REQUEST_MS=20 BIND_ADDR=127.0.0.1:8080 cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/users/42
//!   curl http://localhost:3000/reports/monthly   (sleeps, logs a warning)
//!   curl -X POST http://localhost:3000/users -d '{"name":"alice"}'

use std::env;
use std::sync::Mutex;
use std::time::Duration;

use http::{header, HeaderValue, StatusCode};
use stint::middleware::{callback, slow, timed};
use stint::{Request, Response, Router, Server};

const DEFAULT_SLOW_MS: u64 = 100;
const DEFAULT_ADDR: &str = "0.0.0.0:3000";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let threshold = env::var("SLOW_REQUEST_MS")
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_millis(DEFAULT_SLOW_MS));
    let addr = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_owned());

    let latency = Mutex::new(Latency::default());

    let app = Router::new()
        .get("/users/{id}", slow(get_user, threshold, warn_slow))
        .get("/reports/{name}", slow(build_report, threshold, warn_slow))
        .post("/users", timed(create_user, [
            callback(|req, elapsed| {
                tracing::info!(method = %req.method(), path = req.path(), ?elapsed, "handled");
            }),
            callback(move |_: &Request, elapsed: Duration| {
                if let Ok(mut latency) = latency.lock() {
                    let avg = latency.record(elapsed);
                    tracing::debug!(requests = latency.count, ?avg, "create_user latency");
                }
            }),
        ]));

    Server::bind(addr)
        .serve(app)
        .await
        .expect("server error");
}

/// Running average of handler durations.
#[derive(Default)]
struct Latency {
    count: u32,
    total: Duration,
}

impl Latency {
    /// Adds one sample and returns the new average. Saturates instead of
    /// overflowing.
    fn record(&mut self, elapsed: Duration) -> Duration {
        self.count = self.count.saturating_add(1);
        self.total = self.total.saturating_add(elapsed);
        self.total / self.count
    }
}

fn warn_slow(req: &Request, elapsed: Duration) {
    tracing::warn!(method = %req.method(), path = req.path(), ?elapsed, "slow request");
}

// GET /users/{id}
async fn get_user(req: Request) -> Response {
    let id = req.param("id").unwrap_or("unknown");
    Response::json(format!(r#"{{"id":"{id}","name":"alice"}}"#))
}

// GET /reports/{name}: pretends to do real work
async fn build_report(req: Request) -> Response {
    tokio::time::sleep(Duration::from_millis(250)).await;
    let name = req.param("name").unwrap_or("unknown");
    Response::json(format!(r#"{{"report":"{name}","rows":0}}"#))
}

// POST /users
async fn create_user(req: Request) -> Response {
    if req.body().is_empty() {
        return Response::status(StatusCode::BAD_REQUEST);
    }

    Response::builder()
        .status(StatusCode::CREATED)
        .header(header::LOCATION, HeaderValue::from_static("/users/99"))
        .json(r#"{"id":"99","name":"new_user"}"#)
}
