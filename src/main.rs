use std::sync::Arc;

use anyhow::Result;

use pizza_hunt::api::{self, AppState};
use pizza_hunt::config::Config;
use pizza_hunt::storage::{LocalStore, PizzaStore};
use pizza_hunt::{http, logging, server};

const SERVICE_NAME: &str = "pizza-hunt";

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    logging::init(SERVICE_NAME, &config.logging);

    let store = LocalStore::open(&config.store_path()?)?;
    tracing::info!(backend = store.backend_name(), "store ready");
    let state = AppState::new(Arc::new(store));

    let router = api::router(state);
    let router = http::apply_standard_layers(router, SERVICE_NAME, config.server.body_limit_bytes);
    server::serve(config.server.socket_addr()?, router).await
}
