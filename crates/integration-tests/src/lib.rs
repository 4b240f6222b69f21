//! Shared fixture for the end-to-end tests: a local axum server with the
//! files, slow endpoints and echo routes the request manager is driven against.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use courier_core::RequestManager;
use courier_infra_http::ReqwestTransport;

/// How long `/seq/{id}` holds a request
pub const SEQ_DELAY_MS: u64 = 60;

pub const FILES_LIST: &str = "file1.txt\nfile2.xml\n\n  file3.json  \n";
pub const FILES_LIST_WITH_ONE_MISSING: &str = "file1.txt\nmissing.txt\nfile3.json\n";

/// Observations made by the server while serving `/seq/{id}`
#[derive(Default)]
pub struct Tracker {
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    arrivals: Mutex<Vec<String>>,
}

impl Tracker {
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Ids in the order their requests reached the server
    pub fn arrivals(&self) -> Vec<String> {
        self.arrivals.lock().unwrap().clone()
    }
}

async fn tracked(State(tracker): State<Arc<Tracker>>, Path(id): Path<String>) -> String {
    tracker.arrivals.lock().unwrap().push(id.clone());
    let now = tracker.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    tracker.max_in_flight.fetch_max(now, Ordering::SeqCst);

    tokio::time::sleep(Duration::from_millis(SEQ_DELAY_MS)).await;

    tracker.in_flight.fetch_sub(1, Ordering::SeqCst);
    id
}

pub struct Fixture {
    pub base: String,
    pub tracker: Arc<Tracker>,
}

impl Fixture {
    /// Bind to an ephemeral port and serve in the background
    pub async fn start() -> Self {
        let tracker = Arc::new(Tracker::default());
        let app = Router::new()
            .route("/file1.txt", get(|| async { "text1" }))
            .route("/file2.xml", get(|| async { "<text>2</text>" }))
            .route("/file3.json", get(|| async { r#"{"text":3,"list":[1,2]}"# }))
            .route("/files-list.txt", get(|| async { FILES_LIST }))
            .route(
                "/files-list-with-one-missing.txt",
                get(|| async { FILES_LIST_WITH_ONE_MISSING }),
            )
            .route(
                "/bad-request",
                get(|| async { (StatusCode::BAD_REQUEST, "invalid parameters") }),
            )
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_millis(500)).await;
                    "late"
                }),
            )
            .route("/echo", post(|body: String| async move { body }))
            .route("/seq/{id}", get(tracked))
            .with_state(Arc::clone(&tracker));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base: format!("http://{}", addr),
            tracker,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }
}

/// Manager over the real HTTP transport, with plain http allowed for the fixture
pub fn manager(asynchronous: bool) -> RequestManager {
    let transport = ReqwestTransport::new().unwrap();
    let manager = RequestManager::new(asynchronous, Arc::new(transport));
    manager.set_only_https(false);
    manager
}
