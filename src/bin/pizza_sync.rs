//! pizza-sync: offline-capable pizza submission agent.
//!
//! Usage:
//!   pizza-sync submit '<pizza json>'   send now, or queue locally if the API is unreachable
//!   pizza-sync status                  show connectivity and queued submissions
//!   pizza-sync flush                   drain the queue once
//!   pizza-sync watch                   drain on every reconnect until Ctrl-C
//!   pizza-sync discard                 drop every queued submission

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde_json::Value;

use pizza_hunt::client::{self, ApiClient, Submission};
use pizza_hunt::config::Config;
use pizza_hunt::logging;
use pizza_hunt::network::{ConnectivityProbe, NetworkMonitor};
use pizza_hunt::offline_queue::OfflineQueue;
use pizza_hunt::sync::{ConsoleNotifier, DrainOutcome, SyncCoordinator};

const SERVICE_NAME: &str = "pizza-sync";
const USAGE: &str = "Usage: pizza-sync <submit <json> | status | flush | watch | discard>";

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let Some(command) = args.get(1) else {
        eprintln!("{USAGE}");
        std::process::exit(1);
    };

    let config = Config::load()?;
    logging::init(SERVICE_NAME, &config.logging);

    let queue = Arc::new(OfflineQueue::open(&config.queue_path()?)?);
    let client = ApiClient::new(
        &config.sync.api_url,
        Duration::from_millis(config.sync.request_timeout_ms),
    )?;

    match command.as_str() {
        "submit" => {
            let raw = args.get(2).context("submit needs a JSON pizza argument")?;
            let payload: Value = serde_json::from_str(raw).context("pizza argument is not valid JSON")?;
            cmd_submit(&client, &queue, payload).await
        }
        "status" => cmd_status(&client, &queue).await,
        "flush" => cmd_flush(client, queue).await,
        "watch" => cmd_watch(&config, client, queue).await,
        "discard" => {
            let count = queue.len()?;
            queue.clear()?;
            println!("Discarded {count} queued submission(s)");
            Ok(())
        }
        other => bail!("unknown command '{other}'\n{USAGE}"),
    }
}

async fn cmd_submit(client: &ApiClient, queue: &OfflineQueue, payload: Value) -> Result<()> {
    match client::submit(client, queue, payload).await? {
        Submission::Sent(created) => {
            println!("{}", serde_json::to_string_pretty(&created)?);
        }
        Submission::Queued(local_id) => {
            println!("API unreachable, saved offline as #{local_id}");
        }
    }
    Ok(())
}

async fn cmd_status(client: &ApiClient, queue: &OfflineQueue) -> Result<()> {
    let reachable = client.is_reachable().await;
    println!(
        "API {}: {}",
        client.base_url(),
        if reachable { "online" } else { "offline" }
    );

    let pending = queue.drain_all()?;
    println!("{} queued submission(s)", pending.len());
    for entry in pending {
        let name = entry
            .payload
            .get("pizzaName")
            .and_then(Value::as_str)
            .unwrap_or("<unnamed>");
        println!("  #{} {}", entry.local_id, name);
    }
    Ok(())
}

fn coordinator(client: ApiClient, queue: Arc<OfflineQueue>) -> Arc<SyncCoordinator> {
    Arc::new(SyncCoordinator::new(
        queue,
        Arc::new(client),
        Arc::new(ConsoleNotifier),
    ))
}

async fn cmd_flush(client: ApiClient, queue: Arc<OfflineQueue>) -> Result<()> {
    match coordinator(client, queue).drain_cycle().await {
        DrainOutcome::Submitted(_) => {}
        DrainOutcome::Empty => println!("Nothing queued"),
        DrainOutcome::Failed => println!("Upload failed; submissions kept for the next attempt"),
        DrainOutcome::Busy => println!("A drain is already running"),
    }
    Ok(())
}

async fn cmd_watch(config: &Config, client: ApiClient, queue: Arc<OfflineQueue>) -> Result<()> {
    let monitor = NetworkMonitor::new(Duration::from_millis(config.sync.probe_interval_ms));
    let status = monitor.subscribe();
    let probe: Arc<dyn ConnectivityProbe> = Arc::new(client.clone());
    let sync = coordinator(client, queue);

    tracing::info!(api = %config.sync.api_url, "watching connectivity");
    tokio::spawn(monitor.run(probe));
    tokio::select! {
        _ = sync.run(status) => {}
        _ = tokio::signal::ctrl_c() => tracing::info!("shutdown requested"),
    }
    Ok(())
}
