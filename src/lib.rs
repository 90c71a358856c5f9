//! # stint
//!
//! Request timing for a minimal hyper-based HTTP framework.
//!
//! Wrap any handler in [`middleware::slow`] to hear about requests that take
//! longer than a threshold, or in [`middleware::timed`] to hand every
//! request's duration to a list of callbacks. The wrapped handler is still a
//! handler: register it on a [`Router`], wrap it again, or call it through
//! [`Router::dispatch`] in tests.
//!
//! What the timers deliberately leave to the callback: logging, metrics,
//! histograms, sampling. A callback receives the [`Request`] and a
//! [`Duration`](std::time::Duration) and does whatever it likes with them.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use stint::middleware::{callback, slow, timed};
//! use stint::{Request, Response, Router, Server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = Router::new()
//!         .get("/users/{id}", slow(get_user, Duration::from_millis(100), |req, elapsed| {
//!             tracing::warn!(path = req.path(), ?elapsed, "slow request");
//!         }))
//!         .post("/users", timed(create_user, [
//!             callback(|req, elapsed| tracing::info!(method = %req.method(), ?elapsed, "handled")),
//!         ]));
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await.unwrap();
//! }
//!
//! async fn get_user(req: Request) -> Response {
//!     let id = req.param("id").unwrap_or("unknown");
//!     Response::json(format!(r#"{{"id":"{id}"}}"#))
//! }
//!
//! async fn create_user(_req: Request) -> Response {
//!     Response::status(http::StatusCode::CREATED)
//! }
//! ```

mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;

pub mod middleware;

pub use error::Error;
pub use handler::Handler;
pub use request::Request;
pub use response::{IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::{DEFAULT_MAX_BODY_SIZE, Server};
