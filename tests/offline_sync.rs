//! End to end: real API server on an ephemeral port, real HTTP client,
//! redb files in a temp dir.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::watch;

use pizza_hunt::api::{self, AppState};
use pizza_hunt::client::{self, ApiClient, Submission};
use pizza_hunt::network::NetworkStatus;
use pizza_hunt::offline_queue::OfflineQueue;
use pizza_hunt::storage::LocalStore;
use pizza_hunt::sync::{DrainOutcome, Notifier, SyncCoordinator};

#[derive(Default)]
struct CountingNotifier(AtomicUsize);

impl Notifier for CountingNotifier {
    fn batch_submitted(&self, _count: usize) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

async fn spawn_api(dir: &tempfile::TempDir) -> String {
    let store = LocalStore::open(&dir.path().join("pizzas.redb")).unwrap();
    let router = api::router(AppState::new(Arc::new(store)));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn unreachable_url() -> String {
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    format!("http://{addr}")
}

fn client(url: &str) -> ApiClient {
    ApiClient::new(url, Duration::from_secs(2)).unwrap()
}

#[tokio::test]
async fn offline_submissions_reach_the_api_after_reconnect() {
    let dir = tempfile::tempdir().unwrap();
    let url = spawn_api(&dir).await;
    let api = client(&url);

    let queue = Arc::new(OfflineQueue::open(&dir.path().join("queue.redb")).unwrap());
    let margherita = json!({"pizzaName": "Margherita", "toppings": ["basil"]});
    let pepperoni = json!({"pizzaName": "Pepperoni", "toppings": []});
    queue.enqueue(&margherita).unwrap();
    queue.enqueue(&pepperoni).unwrap();
    assert_eq!(queue.len().unwrap(), 2);

    let notifier = Arc::new(CountingNotifier::default());
    let sync = Arc::new(SyncCoordinator::new(
        queue.clone(),
        Arc::new(api.clone()),
        notifier.clone(),
    ));

    let (tx, rx) = watch::channel(NetworkStatus::Offline);
    let runner = tokio::spawn(sync.clone().run(rx));
    tx.send(NetworkStatus::Online).unwrap();

    for _ in 0..200 {
        if notifier.0.load(Ordering::SeqCst) > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(queue.is_empty().unwrap());
    assert_eq!(notifier.0.load(Ordering::SeqCst), 1);

    let stored = api.list_pizzas().await.unwrap();
    assert_eq!(stored.len(), 2);
    let mut names: Vec<&str> = stored
        .iter()
        .map(|p| p["pizzaName"].as_str().unwrap())
        .collect();
    names.sort();
    assert_eq!(names, vec!["Margherita", "Pepperoni"]);
    assert!(stored.iter().all(|p| p["size"] == "Large"));

    drop(tx);
    runner.await.unwrap();
}

#[tokio::test]
async fn failed_upload_keeps_queue_byte_for_byte() {
    let dir = tempfile::tempdir().unwrap();
    let queue = Arc::new(OfflineQueue::open(&dir.path().join("queue.redb")).unwrap());
    queue.enqueue(&json!({"pizzaName": "Stuck", "toppings": ["anchovy"]})).unwrap();
    let before = queue.drain_all().unwrap();

    let sync = SyncCoordinator::new(
        queue.clone(),
        Arc::new(client(&unreachable_url())),
        Arc::new(CountingNotifier::default()),
    );

    assert_eq!(sync.drain_cycle().await, DrainOutcome::Failed);
    assert_eq!(queue.drain_all().unwrap(), before);
}

#[tokio::test]
async fn rejected_batch_keeps_queue() {
    let dir = tempfile::tempdir().unwrap();
    let url = spawn_api(&dir).await;
    let queue = Arc::new(OfflineQueue::open(&dir.path().join("queue.redb")).unwrap());
    // No pizzaName: the server answers 400 with a message
    queue.enqueue(&json!({"toppings": ["mystery"]})).unwrap();

    let sync = SyncCoordinator::new(
        queue.clone(),
        Arc::new(client(&url)),
        Arc::new(CountingNotifier::default()),
    );

    assert_eq!(sync.drain_cycle().await, DrainOutcome::Failed);
    assert_eq!(queue.len().unwrap(), 1);
    assert!(client(&url).list_pizzas().await.unwrap().is_empty());
}

#[tokio::test]
async fn queue_survives_restart_then_drains() {
    let dir = tempfile::tempdir().unwrap();
    let queue_path = dir.path().join("queue.redb");
    let payload = json!({"pizzaName": "Phoenix", "toppings": ["chili"]});

    // Submit while the API is down, then "crash"
    {
        let queue = OfflineQueue::open(&queue_path).unwrap();
        let outcome = client::submit(&client(&unreachable_url()), &queue, payload.clone())
            .await
            .unwrap();
        assert!(matches!(outcome, Submission::Queued(_)));
    }

    let queue = Arc::new(OfflineQueue::open(&queue_path).unwrap());
    assert_eq!(queue.drain_all().unwrap()[0].payload, payload);

    let url = spawn_api(&dir).await;
    let sync = SyncCoordinator::new(
        queue.clone(),
        Arc::new(client(&url)),
        Arc::new(CountingNotifier::default()),
    );
    assert_eq!(sync.drain_cycle().await, DrainOutcome::Submitted(1));
    assert!(queue.is_empty().unwrap());
}

#[tokio::test]
async fn online_submit_goes_straight_to_api() {
    let dir = tempfile::tempdir().unwrap();
    let url = spawn_api(&dir).await;
    let queue = OfflineQueue::open(&dir.path().join("queue.redb")).unwrap();

    let outcome = client::submit(
        &client(&url),
        &queue,
        json!({"pizzaName": "Veggie", "toppings": ["pepper", "onion"]}),
    )
    .await
    .unwrap();

    match outcome {
        Submission::Sent(created) => {
            assert!(created["_id"].is_string());
            assert_eq!(created["size"], "Large");
        }
        other => panic!("expected direct send, got {other:?}"),
    }
    assert!(queue.is_empty().unwrap());
}

#[tokio::test]
async fn rejected_online_submit_is_not_queued() {
    let dir = tempfile::tempdir().unwrap();
    let url = spawn_api(&dir).await;
    let api = client(&url);
    let queue = Arc::new(OfflineQueue::open(&dir.path().join("queue.redb")).unwrap());

    let result = client::submit(&api, &queue, json!({"toppings": ["x"]})).await;
    assert!(result.is_err());
    assert!(queue.is_empty().unwrap());

    // A valid submission saved later still goes through on the next drain
    queue.enqueue(&json!({"pizzaName": "Good", "toppings": []})).unwrap();
    let sync = SyncCoordinator::new(
        queue.clone(),
        Arc::new(api.clone()),
        Arc::new(CountingNotifier::default()),
    );
    assert_eq!(sync.drain_cycle().await, DrainOutcome::Submitted(1));
    assert!(queue.is_empty().unwrap());

    let stored = api.list_pizzas().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0]["pizzaName"], "Good");
}
