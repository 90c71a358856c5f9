//! Timed handlers registered on a router, driven through `Router::dispatch`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use http::{Method, StatusCode};
use stint::middleware::{callback, slow, timed};
use stint::{Request, Response, Router};
use tokio::time::sleep;

fn request(method: Method, path: &str) -> Request {
    http::Request::builder()
        .method(method)
        .uri(path)
        .header("x-request-id", "abc-123")
        .body(Bytes::new())
        .unwrap()
        .into()
}

async fn get_order(req: Request) -> Response {
    if req.param("id") == Some("slow") {
        sleep(Duration::from_millis(50)).await;
    }
    Response::text(format!("order {}", req.param("id").unwrap_or("?")))
}

#[tokio::test(start_paused = true)]
async fn slow_route_reports_only_slow_requests() {
    let reported = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&reported);
    let app = Router::new().get(
        "/orders/{id}",
        slow(get_order, Duration::from_millis(10), move |req, elapsed| {
            sink.lock().unwrap().push((req.param("id").map(str::to_owned), elapsed));
        }),
    );

    let fast = app.dispatch(request(Method::GET, "/orders/7")).await;
    let delayed = app.dispatch(request(Method::GET, "/orders/slow")).await;

    assert_eq!(fast.body(), b"order 7");
    assert_eq!(delayed.body(), b"order slow");
    let reported = reported.lock().unwrap();
    assert_eq!(reported.len(), 1);
    assert_eq!(reported[0].0.as_deref(), Some("slow"));
    assert!(reported[0].1 >= Duration::from_millis(50));
}

#[tokio::test]
async fn callbacks_see_the_request_the_handler_saw() {
    let seen = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&seen);
    let app = Router::new().post(
        "/orders/{id}",
        timed(get_order, [callback(move |req, _| {
            *sink.lock().unwrap() = Some((
                req.method().clone(),
                req.path().to_owned(),
                req.param("id").map(str::to_owned),
                req.header("X-Request-Id").map(str::to_owned),
            ));
        })]),
    );

    app.dispatch(request(Method::POST, "/orders/9")).await;

    assert_eq!(
        seen.lock().unwrap().clone(),
        Some((
            Method::POST,
            "/orders/9".to_owned(),
            Some("9".to_owned()),
            Some("abc-123".to_owned()),
        )),
    );
}

#[tokio::test]
async fn unmatched_routes_never_reach_the_timer() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let app = Router::new().get(
        "/orders/{id}",
        timed(get_order, [callback(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        })]),
    );

    let res = app.dispatch(request(Method::GET, "/customers/1")).await;

    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_are_timed_independently() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let app = Arc::new(Router::new().get(
        "/orders/{id}",
        timed(get_order, [callback(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        })]),
    ));

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..16 {
        let app = Arc::clone(&app);
        tasks.spawn(async move {
            app.dispatch(request(Method::GET, &format!("/orders/{i}"))).await
        });
    }
    while let Some(res) = tasks.join_next().await {
        assert_eq!(res.unwrap().status_code(), StatusCode::OK);
    }

    assert_eq!(calls.load(Ordering::SeqCst), 16);
}
