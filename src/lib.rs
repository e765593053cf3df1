//! Pizza Hunt: a small pizza-ordering API plus an offline sync agent.
//!
//! Server side: [`api`] routes over a [`storage::PizzaStore`] (redb
//! documents in [`pizza_db`]).
//!
//! Client side: submissions that cannot reach the API land in the
//! [`offline_queue`]; the [`sync`] coordinator drains that queue as one
//! batch whenever the [`network`] monitor sees the API come back.

pub mod api;
pub mod client;
pub mod config;
pub mod http;
pub mod logging;
pub mod models;
pub mod network;
pub mod object_id;
pub mod offline_queue;
pub mod pizza_db;
pub mod server;
pub mod storage;
pub mod sync;
