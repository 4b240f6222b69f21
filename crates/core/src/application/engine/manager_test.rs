// Unit tests for the request manager

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use tokio_test::{assert_err, assert_ok};

use super::{on_finished, on_progress, BatchHandle, RequestManager};
use crate::config::ManagerConfig;
use crate::domain::{AdmissionPolicy, RequestDescriptor, RequestItem, ResponseBody, ResultFormat};
use crate::error::ManagerError;
use crate::port::http_transport::mocks::{MockBehavior, MockEvent, MockTransport};
use crate::port::id_provider::SequentialIdProvider;
use crate::port::time_provider::SystemTimeProvider;
use crate::port::TransportError;

const BASE: &str = "https://fixture.test";

fn url(path: &str) -> String {
    format!("{}/{}", BASE, path)
}

fn fixture() -> MockTransport {
    MockTransport::new()
        .route(url("file1.txt"), MockBehavior::ok("text1"))
        .route(url("file2.xml"), MockBehavior::ok("<a>text2</a>"))
        .route(url("file3.json"), MockBehavior::ok(r#"{"value":"text3"}"#))
        .route(url("bad-request"), MockBehavior::status(400, "invalid input"))
        .route(url("slow"), MockBehavior::slow("slow body", 300))
        .route(url("panic"), MockBehavior::Panic("transport exploded".into()))
}

fn manager(asynchronous: bool, transport: &MockTransport) -> RequestManager {
    RequestManager::with_providers(
        ManagerConfig::new(asynchronous),
        Arc::new(transport.clone()),
        Arc::new(SystemTimeProvider),
        Arc::new(SequentialIdProvider::default()),
    )
}

/// Shared log of callback invocations
#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<String>>>);

impl Recorder {
    fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    fn descriptor(&self, descriptor: RequestDescriptor, tag: &str) -> RequestDescriptor {
        let (ok, err, fin) = (self.clone(), self.clone(), self.clone());
        let (t1, t2, t3) = (tag.to_string(), tag.to_string(), tag.to_string());
        descriptor
            .on_success(move |body| ok.push(format!("{} success {}", t1, body)))
            .on_error(move |msg, code, _| err.push(format!("{} error {} {}", t2, code, msg)))
            .on_finally(move || fin.push(format!("{} finally", t3)))
    }
}

async fn wait(handle: BatchHandle) -> crate::domain::BatchOutcome {
    assert_ok!(handle.wait().await)
}

#[test]
fn test_defaults() {
    let transport = MockTransport::new();
    let manager = manager(true, &transport);
    assert!(manager.is_asynchronous());
    assert_eq!(manager.timeout_ms(), 0);
    assert!(manager.is_only_https());
    assert_eq!(manager.base_url(), "");
    assert_eq!(manager.count_queues(), 0);
    assert_eq!(manager.admission_policy(), AdmissionPolicy::Wait);
    assert_eq!(manager.internet_check_locations().len(), 3);

    manager.set_timeout_ms(250);
    manager.set_base_url(" https://a.test/ ");
    manager.set_only_https(false);
    let config = manager.config();
    assert_eq!(config.timeout_ms, 250);
    assert_eq!(config.base_url, "https://a.test/");
    assert!(!config.is_only_https);
    assert!(config.asynchronous);
}

#[test]
fn test_global_params_through_manager() {
    let manager = manager(true, &MockTransport::new());
    assert_ok!(manager.set_global_post_param("token", "abc"));
    assert!(manager.is_global_post_param("token").unwrap());
    assert_eq!(manager.get_global_post_param("token").unwrap(), "abc");
    assert_ok!(manager.delete_global_post_param("token"));
    assert!(!manager.is_global_post_param("token").unwrap());
    assert_err!(manager.get_global_post_param("token"));
}

#[test]
fn test_generate_url_query_string_through_manager() {
    let manager = manager(true, &MockTransport::new());
    let mut pairs = indexmap::IndexMap::new();
    pairs.insert("a".to_string(), json!(1));
    pairs.insert("b".to_string(), json!([1, 2, 3]));
    assert_eq!(
        manager.generate_url_query_string(&pairs).unwrap(),
        "a=1&b=%5B1%2C2%2C3%5D"
    );
    assert_eq!(
        manager.generate_url_query_string(&indexmap::IndexMap::new()),
        Err(ManagerError::EmptyInput)
    );
}

#[tokio::test]
async fn test_malformed_input_rejected_synchronously() {
    let transport = fixture();
    let manager = manager(true, &transport);

    let empty: Vec<String> = vec![];
    assert_eq!(manager.execute(empty, None, None).unwrap_err(), ManagerError::NoRequests);
    assert_eq!(manager.execute("", None, None).unwrap_err(), ManagerError::InvalidRequests);

    let err = manager
        .execute(vec![url("file1.txt"), String::new()], None, None)
        .unwrap_err();
    assert_eq!(err.to_string(), "url 1 must be a non-empty string");

    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn test_unknown_queue_rejected_without_side_effects() {
    let transport = fixture();
    let manager = manager(true, &transport);
    manager.create_queue("known").unwrap();

    let items: Vec<RequestItem> = vec![
        RequestDescriptor::get(url("file1.txt")).with_queue("known").into(),
        RequestDescriptor::get(url("file2.xml")).with_queue("missing").into(),
    ];
    let err = manager.execute(items, None, None).unwrap_err();
    assert!(matches!(err, ManagerError::NotFound(_)));
    assert!(!manager.is_queue_running("known").unwrap());
    assert_eq!(transport.call_count(), 0);
}

#[test]
fn test_asynchronous_requires_runtime() {
    let manager = manager(true, &fixture());
    let err = manager.execute(url("file1.txt"), None, None).unwrap_err();
    assert!(matches!(err, ManagerError::InvalidState(_)));
}

#[test]
fn test_synchronous_without_runtime_blocks_until_done() {
    let transport = fixture();
    let manager = manager(false, &transport);
    let recorder = Recorder::default();

    let finished = recorder.clone();
    let handle = manager
        .execute(
            recorder.descriptor(RequestDescriptor::get(url("file1.txt")), "r0"),
            on_finished(move |results, any_error| {
                finished.push(format!("finished {} {}", results.len(), any_error))
            }),
            None,
        )
        .unwrap();

    // Everything already happened before execute returned
    assert!(handle.is_finished());
    assert_eq!(
        recorder.entries(),
        vec!["r0 success text1", "r0 finally", "finished 1 false"]
    );
    match handle {
        BatchHandle::Completed(outcome) => assert_eq!(outcome.batch_id, "batch-1"),
        BatchHandle::Pending { .. } => panic!("synchronous batch should be complete"),
    }
}

#[tokio::test]
async fn test_synchronous_in_current_thread_runtime_rejected() {
    let manager = manager(false, &fixture());
    let err = manager.execute(url("file1.txt"), None, None).unwrap_err();
    assert!(matches!(err, ManagerError::InvalidState(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_synchronous_runs_one_at_a_time_in_order() {
    let transport = fixture();
    let manager = manager(false, &transport);

    let handle = manager
        .execute(vec![url("slow"), url("file1.txt"), url("file2.xml")], None, None)
        .unwrap();
    let outcome = wait(handle).await;

    assert_eq!(transport.max_in_flight(), 1);
    assert_eq!(
        transport.events(),
        vec![
            MockEvent::Start(url("slow")),
            MockEvent::End(url("slow")),
            MockEvent::Start(url("file1.txt")),
            MockEvent::End(url("file1.txt")),
            MockEvent::Start(url("file2.xml")),
            MockEvent::End(url("file2.xml")),
        ]
    );
    assert!(!outcome.any_error);
}

#[tokio::test]
async fn test_single_request_callback_order() {
    let transport = fixture();
    let manager = manager(true, &transport);
    let recorder = Recorder::default();

    let (progress, finished) = (recorder.clone(), recorder.clone());
    let handle = manager
        .execute(
            recorder.descriptor(RequestDescriptor::get(url("file1.txt")), "r0"),
            on_finished(move |results, any_error| {
                finished.push(format!("finished {} {}", results.len(), any_error))
            }),
            on_progress(move |done_url, total| progress.push(format!("progress {} {}", done_url, total))),
        )
        .unwrap();
    let outcome = wait(handle).await;

    assert_eq!(
        recorder.entries(),
        vec![
            "r0 success text1".to_string(),
            "r0 finally".to_string(),
            format!("progress {} 1", url("file1.txt")),
            "finished 1 false".to_string(),
        ]
    );
    assert_eq!(outcome.results[0].code, 200);
    assert_eq!(outcome.results[0].url, url("file1.txt"));
}

#[tokio::test]
async fn test_results_keep_submission_order() {
    let transport = fixture();
    let manager = manager(true, &transport);
    let progress_log = Recorder::default();

    let log = progress_log.clone();
    let handle = manager
        .execute(
            vec![url("slow"), url("file1.txt"), url("file2.xml"), url("file3.json")],
            None,
            on_progress(move |done_url, _| log.push(done_url)),
        )
        .unwrap();
    let outcome = wait(handle).await;

    let urls: Vec<&str> = outcome.results.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(urls, [url("slow"), url("file1.txt"), url("file2.xml"), url("file3.json")]);
    assert_eq!(outcome.results[0].response, ResponseBody::Text("slow body".into()));

    // Progress follows completion order: the slow request lands last
    let progress = progress_log.entries();
    assert_eq!(progress.len(), 4);
    assert_eq!(progress[3], url("slow"));
    assert!(transport.max_in_flight() > 1);
}

#[tokio::test]
async fn test_failures_are_isolated() {
    let transport = fixture();
    let manager = manager(true, &transport);

    let handle = manager
        .execute(
            vec![url("file1.txt"), url("nonexistent.txt"), "invalid url".to_string()],
            None,
            None,
        )
        .unwrap();
    let outcome = wait(handle).await;

    assert!(outcome.any_error);
    assert!(!outcome.results[0].is_error);
    assert_eq!(outcome.results[1].code, 404);
    assert_eq!(outcome.results[1].error_msg, "Not Found");
    assert!(outcome.results[2].is_error);
    assert_eq!(outcome.results[2].code, 0);
    assert!(outcome.results[2].response.is_empty());
}

#[tokio::test]
async fn test_bad_request_keeps_body() {
    let transport = fixture();
    let manager = manager(true, &transport);

    let outcome = wait(manager.execute(url("bad-request"), None, None).unwrap()).await;
    let result = &outcome.results[0];
    assert!(result.is_error);
    assert_eq!(result.code, 400);
    assert!(result.error_msg.contains("Bad Request"));
    assert_eq!(result.response, ResponseBody::Text("invalid input".into()));
}

#[tokio::test]
async fn test_json_format() {
    let transport = fixture();
    let manager = manager(true, &transport);
    let items: Vec<RequestItem> = vec![
        RequestDescriptor::get(url("file3.json"))
            .with_result_format(ResultFormat::Json)
            .into(),
        RequestDescriptor::get(url("file1.txt"))
            .with_result_format(ResultFormat::Json)
            .into(),
    ];

    let outcome = wait(manager.execute(items, None, None).unwrap()).await;
    assert_eq!(
        outcome.results[0].response,
        ResponseBody::Json(json!({"value": "text3"}))
    );
    assert!(outcome.results[1].is_error);
    assert_eq!(
        outcome.results[1].error_msg,
        "Could not parse request result as a json string"
    );
    assert_eq!(outcome.results[1].response, ResponseBody::Text("text1".into()));
}

#[tokio::test]
async fn test_insecure_urls_never_reach_the_transport() {
    let transport = fixture();
    let manager = manager(true, &transport);

    let outcome = wait(manager.execute("http://fixture.test/file1.txt", None, None).unwrap()).await;
    assert_eq!(
        outcome.results[0].error_msg,
        "Non secure http requests are forbidden. Set is_only_https=false to allow http://fixture.test/file1.txt"
    );
    assert_eq!(outcome.results[0].code, 0);
    assert_eq!(transport.call_count(), 0);

    manager.set_only_https(false);
    let outcome = wait(manager.execute("http://fixture.test/file1.txt", None, None).unwrap()).await;
    assert_eq!(outcome.results[0].code, 404);
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn test_base_url_composition() {
    let transport = fixture();
    let manager = manager(true, &transport);
    manager.set_base_url(format!("{}/", BASE));

    let outcome = wait(
        manager
            .execute(vec!["file1.txt".to_string(), url("file2.xml")], None, None)
            .unwrap(),
    )
    .await;
    assert_eq!(outcome.results[0].url, url("file1.txt"));
    assert_eq!(outcome.results[0].response, ResponseBody::Text("text1".into()));
    assert_eq!(outcome.results[1].url, url("file2.xml"));
}

#[tokio::test]
async fn test_post_body_includes_globals() {
    let transport = MockTransport::new().route(url("echo"), MockBehavior::ok("ok"));
    let manager = manager(true, &transport);
    manager.set_global_post_param("token", "s3cr3t").unwrap();

    let items: Vec<RequestItem> = vec![
        RequestDescriptor::post(url("echo"))
            .with_post_param("a", "h&b")
            .with_post_param("n", 1)
            .into(),
        RequestDescriptor::post(url("echo"))
            .with_post_param("a", 1)
            .ignoring_global_post_params()
            .into(),
        RequestDescriptor::get(url("echo")).into(),
    ];
    wait(manager.execute(items, None, None).unwrap()).await;

    let mut bodies: Vec<Option<String>> = transport.calls().into_iter().map(|c| c.body).collect();
    bodies.sort();
    assert_eq!(
        bodies,
        vec![
            None,
            Some("a=1".to_string()),
            Some("a=h%26b&n=1&token=s3cr3t".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_globals_snapshotted_at_admission() {
    let transport = MockTransport::new().route(url("echo"), MockBehavior::slow("ok", 50));
    let manager = manager(true, &transport);
    manager.set_global_post_param("v", "before").unwrap();

    let handle = manager
        .execute(RequestDescriptor::post(url("echo")), None, None)
        .unwrap();
    manager.set_global_post_param("v", "after").unwrap();
    wait(handle).await;

    assert_eq!(transport.calls()[0].body.as_deref(), Some("v=before"));
}

#[tokio::test]
async fn test_timeouts() {
    let transport = fixture();
    let manager = manager(true, &transport);
    manager.set_timeout_ms(50);

    let items: Vec<RequestItem> = vec![
        url("slow").into(),
        RequestDescriptor::get(url("slow")).with_timeout_ms(1000).into(),
    ];
    let outcome = wait(manager.execute(items, None, None).unwrap()).await;

    assert_eq!(outcome.results[0].error_msg, "50 ms Timeout reached");
    assert_eq!(outcome.results[0].code, 0);
    assert!(!outcome.results[1].is_error);
}

#[tokio::test]
async fn test_transport_errors_have_code_zero() {
    let transport = MockTransport::new().route(
        url("down"),
        MockBehavior::Fail(TransportError::Connect(url("down"))),
    );
    let manager = manager(true, &transport);
    let recorder = Recorder::default();

    let outcome = wait(
        manager
            .execute(recorder.descriptor(RequestDescriptor::get(url("down")), "r0"), None, None)
            .unwrap(),
    )
    .await;

    assert_eq!(outcome.results[0].code, 0);
    assert_eq!(
        recorder.entries(),
        vec![
            format!("r0 error 0 Could not connect with url: {}", url("down")),
            "r0 finally".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_panics_are_contained() {
    let transport = fixture();
    let manager = manager(true, &transport);
    let recorder = Recorder::default();

    let items: Vec<RequestItem> = vec![
        url("panic").into(),
        RequestDescriptor::get(url("file1.txt"))
            .on_success(|_| panic!("callback exploded"))
            .into(),
        recorder.descriptor(RequestDescriptor::get(url("file2.xml")), "r2").into(),
    ];
    let finished = recorder.clone();
    let outcome = wait(
        manager
            .execute(
                items,
                on_finished(move |_, any_error| finished.push(format!("finished {}", any_error))),
                None,
            )
            .unwrap(),
    )
    .await;

    assert!(outcome.results[0].is_error);
    assert!(outcome.results[0].error_msg.contains("transport exploded"));
    assert!(!outcome.results[1].is_error);
    assert!(!outcome.results[2].is_error);
    assert_eq!(recorder.entries().last().unwrap(), "finished true");
}

#[tokio::test]
async fn test_descriptor_can_be_resubmitted() {
    let transport = fixture();
    let manager = manager(true, &transport);
    let recorder = Recorder::default();
    let descriptor = recorder.descriptor(RequestDescriptor::get(url("file1.txt")), "r");

    wait(manager.execute(descriptor.clone(), None, None).unwrap()).await;
    wait(manager.execute(descriptor.clone(), None, None).unwrap()).await;

    assert_eq!(descriptor.url, url("file1.txt"));
    assert_eq!(
        recorder.entries(),
        vec!["r success text1", "r finally", "r success text1", "r finally"]
    );
}

#[tokio::test]
async fn test_batch_ids_come_from_provider() {
    let manager = manager(true, &fixture());
    let first = manager.execute(url("file1.txt"), None, None).unwrap();
    let second = manager.execute(url("file1.txt"), None, None).unwrap();
    assert_eq!(first.batch_id(), "batch-1");
    assert_eq!(second.batch_id(), "batch-2");
    assert_eq!(wait(second).await.batch_id, "batch-2");
    wait(first).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_queue_serializes_batches_in_admission_order() {
    let transport = fixture();
    let manager = manager(true, &transport);
    manager.create_queue("q").unwrap();

    let first = manager
        .execute(RequestDescriptor::get(url("slow")).with_queue("q"), None, None)
        .unwrap();
    assert!(manager.is_queue_running("q").unwrap());

    let second = manager
        .execute(RequestDescriptor::get(url("file1.txt")).with_queue("q"), None, None)
        .unwrap();

    wait(second).await;
    wait(first).await;

    assert_eq!(
        transport.events(),
        vec![
            MockEvent::Start(url("slow")),
            MockEvent::End(url("slow")),
            MockEvent::Start(url("file1.txt")),
            MockEvent::End(url("file1.txt")),
        ]
    );
    assert!(!manager.is_queue_running("q").unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_requests_of_one_batch_share_a_queue_in_order() {
    let transport = fixture();
    let manager = manager(true, &transport);
    manager.create_queue("q").unwrap();

    let items: Vec<RequestItem> = ["slow", "file1.txt", "file2.xml"]
        .iter()
        .map(|p| RequestDescriptor::get(url(p)).with_queue("q").into())
        .collect();
    wait(manager.execute(items, None, None).unwrap()).await;

    assert_eq!(transport.max_in_flight(), 1);
    let starts: Vec<MockEvent> = transport
        .events()
        .into_iter()
        .filter(|e| matches!(e, MockEvent::Start(_)))
        .collect();
    assert_eq!(
        starts,
        vec![
            MockEvent::Start(url("slow")),
            MockEvent::Start(url("file1.txt")),
            MockEvent::Start(url("file2.xml")),
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_distinct_queues_run_concurrently() {
    let transport = MockTransport::new()
        .route(url("a"), MockBehavior::slow("a", 150))
        .route(url("b"), MockBehavior::slow("b", 150));
    let manager = manager(true, &transport);
    manager.create_queue("qa").unwrap();
    manager.create_queue("qb").unwrap();

    let items: Vec<RequestItem> = vec![
        RequestDescriptor::get(url("a")).with_queue("qa").into(),
        RequestDescriptor::get(url("b")).with_queue("qb").into(),
    ];
    wait(manager.execute(items, None, None).unwrap()).await;
    assert_eq!(transport.max_in_flight(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_reject_policy() {
    let transport = fixture();
    let manager = manager(true, &transport);
    manager.set_admission_policy(AdmissionPolicy::Reject);
    manager.create_queue("q").unwrap();

    let first = manager
        .execute(RequestDescriptor::get(url("slow")).with_queue("q"), None, None)
        .unwrap();
    let second = manager
        .execute(
            vec![
                RequestItem::from(RequestDescriptor::get(url("file1.txt")).with_queue("q")),
                RequestItem::from(url("file2.xml")),
            ],
            None,
            None,
        )
        .unwrap();

    let rejected = wait(second).await;
    assert_eq!(rejected.results[0].error_msg, "Queue q is already running");
    assert_eq!(rejected.results[0].code, 0);
    assert!(!rejected.results[1].is_error);

    assert!(!wait(first).await.any_error);
    assert_eq!(transport.call_count(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_policy_tracks_without_exclusion() {
    let transport = MockTransport::new()
        .route(url("a"), MockBehavior::slow("a", 150))
        .route(url("b"), MockBehavior::slow("b", 150));
    let manager = manager(true, &transport);
    manager.set_admission_policy(AdmissionPolicy::Concurrent);
    manager.create_queue("q").unwrap();

    let handle = manager
        .execute(
            vec![
                RequestItem::from(RequestDescriptor::get(url("a")).with_queue("q")),
                RequestItem::from(RequestDescriptor::get(url("b")).with_queue("q")),
            ],
            None,
            None,
        )
        .unwrap();
    assert!(manager.is_queue_running("q").unwrap());
    wait(handle).await;

    assert_eq!(transport.max_in_flight(), 2);
    assert!(!manager.is_queue_running("q").unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_deleting_a_running_queue() {
    let transport = fixture();
    let manager = manager(true, &transport);
    manager.create_queue("q").unwrap();

    let handle = manager
        .execute(RequestDescriptor::get(url("slow")).with_queue("q"), None, None)
        .unwrap();
    manager.delete_queue("q").unwrap();
    assert!(matches!(manager.is_queue_running("q"), Err(ManagerError::NotFound(_))));

    manager.create_queue("q").unwrap();
    assert!(!manager.is_queue_running("q").unwrap());

    let outcome = tokio::time::timeout(Duration::from_secs(5), handle.wait())
        .await
        .unwrap()
        .unwrap();
    assert!(!outcome.any_error);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_queue_binds_requests_and_runs_until_finished() {
    let transport = fixture();
    let manager = Arc::new(manager(true, &transport));
    manager.create_queue("queue1").unwrap();
    manager.create_queue("queue2").unwrap();

    for (target, queue) in [("some invalid url".to_string(), "queue1"), (url("file1.txt"), "queue2")] {
        let seen = Arc::new(Mutex::new(None));
        let (sink, observer) = (Arc::clone(&seen), Arc::clone(&manager));
        let handle = manager
            .queue(
                target.as_str(),
                queue,
                on_finished(move |_, _| {
                    *sink.lock().unwrap() = Some(observer.is_queue_running(queue).unwrap());
                }),
                None,
            )
            .unwrap();
        assert!(manager.is_queue_running(queue).unwrap());

        wait(handle).await;
        assert_eq!(*seen.lock().unwrap(), Some(false));
        assert!(!manager.is_queue_running(queue).unwrap());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_queue_overrides_descriptor_queue() {
    let transport = fixture();
    let manager = manager(true, &transport);
    manager.create_queue("q").unwrap();

    let handle = manager
        .queue(
            vec![
                RequestDescriptor::get(url("slow")).with_queue("elsewhere"),
                RequestDescriptor::get(url("file1.txt")),
            ],
            "q",
            None,
            None,
        )
        .unwrap();
    assert_eq!(manager.queue_statuses()[0].pending, 2);
    wait(handle).await;

    assert_eq!(
        transport.events(),
        vec![
            MockEvent::Start(url("slow")),
            MockEvent::End(url("slow")),
            MockEvent::Start(url("file1.txt")),
            MockEvent::End(url("file1.txt")),
        ]
    );
}

#[test]
fn test_queue_rejects_unknown_or_empty_name() {
    let transport = fixture();
    let manager = manager(true, &transport);

    let missing = assert_err!(manager.queue(url("file1.txt"), "missing", None, None));
    assert!(matches!(missing, ManagerError::NotFound(_)));
    let empty = assert_err!(manager.queue(url("file1.txt"), "  ", None, None));
    assert!(matches!(empty, ManagerError::InvalidArgument(_)));
    assert_eq!(transport.call_count(), 0);
}
