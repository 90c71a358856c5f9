//! Request timing.
//!
//! Two wrappers, each taking a handler and returning a handler:
//!
//! - [`slow`] calls one callback, only when a request takes longer than a
//!   threshold.
//! - [`timed`] calls every callback it was given, in order, for every request.
//!
//! The clock starts right before the inner handler is polled and stops right
//! after it resolves. The inner handler always runs to completion. The
//! threshold decides who hears about a slow request; it never cuts one short.
//!
//! Callbacks run on the request's task after the handler has finished, and
//! receive the same [`Request`] the handler saw. They are not isolated. A
//! panic in the handler means no callback runs. A panic in a callback skips
//! the callbacks after it. Either way the panic reaches whoever polls the
//! wrapped handler, exactly as it would without the wrapper.
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use stint::middleware::{callback, slow, timed};
//! use stint::{Request, Response, Router};
//!
//! async fn report(_req: Request) -> Response { Response::text("…") }
//!
//! let app = Router::new()
//!     .get("/report", slow(report, Duration::from_millis(250), |req, elapsed| {
//!         tracing::warn!(path = req.path(), ?elapsed, "slow request");
//!     }))
//!     .get("/orders", timed(report, [
//!         callback(|req, elapsed| tracing::info!(path = req.path(), ?elapsed, "served")),
//!     ]));
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::handler::{BoxedHandler, Handler};
use crate::request::Request;
use crate::response::Response;

/// An observer for [`timed`]: receives the request and how long its handler took.
pub type Callback = Box<dyn Fn(&Request, Duration) + Send + Sync + 'static>;

/// Boxes a closure as a [`Callback`], so different closures fit in one list.
pub fn callback<F>(f: F) -> Callback
where
    F: Fn(&Request, Duration) + Send + Sync + 'static,
{
    Box::new(f)
}

/// Wraps `handler` so that `on_slow` is called when a request takes strictly
/// longer than `max`.
///
/// A request that takes exactly `max` is not reported. `max` is a reporting
/// threshold only; the handler is never aborted.
pub fn slow<H, C>(handler: H, max: Duration, on_slow: C) -> impl Handler
where
    H: Handler,
    C: Fn(&Request, Duration) + Send + Sync + 'static,
{
    let inner = handler.into_boxed_handler();
    let on_slow = Arc::new(on_slow);
    debug!(threshold = ?max, "slow request timer installed");

    move |req: Request| {
        let inner = Arc::clone(&inner);
        let on_slow = Arc::clone(&on_slow);
        async move {
            let (res, elapsed) = run(&inner, req.clone()).await;
            if exceeds(elapsed, max) {
                on_slow(&req, elapsed);
            }
            res
        }
    }
}

/// Wraps `handler` so that every callback is called, in the order given, with
/// the duration of every request.
///
/// All callbacks of one request see the same duration. An empty list is
/// allowed; the handler then runs as if unwrapped.
pub fn timed<H, I>(handler: H, callbacks: I) -> impl Handler
where
    H: Handler,
    I: IntoIterator<Item = Callback>,
{
    let inner = handler.into_boxed_handler();
    let callbacks: Arc<[Callback]> = callbacks.into_iter().collect();
    debug!(callbacks = callbacks.len(), "request timer installed");

    move |req: Request| {
        let inner = Arc::clone(&inner);
        let callbacks = Arc::clone(&callbacks);
        async move {
            let (res, elapsed) = run(&inner, req.clone()).await;
            for cb in callbacks.iter() {
                cb(&req, elapsed);
            }
            res
        }
    }
}

async fn run(inner: &BoxedHandler, req: Request) -> (Response, Duration) {
    let start = Instant::now();
    let res = inner.call(req).await;
    (res, start.elapsed())
}

#[inline]
fn exceeds(elapsed: Duration, max: Duration) -> bool {
    elapsed > max
}
