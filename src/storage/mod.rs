//! Storage abstraction for the pizza documents.
//!
//! - [`LocalStore`]: redb file on the server host (the only backend today)
//!
//! The HTTP layer holds an `Arc<dyn PizzaStore>` and every request goes
//! through it, so handlers never see redb types.

pub mod local;

pub use local::LocalStore;

use async_trait::async_trait;

use crate::models::{NewComment, NewPizza, NewReply, Pizza, PizzaUpdate};

/// Failures surfaced by a [`PizzaStore`].
///
/// `NotFound` is kept apart from everything else so callers can answer
/// "no such document" without confusing it with a broken request.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    NotFound(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("database error: {0}")]
    Database(#[from] redb::Error),

    #[error("corrupt document: {0}")]
    Corrupt(#[from] serde_json::Error),
}

impl StoreError {
    pub fn pizza_not_found() -> Self {
        StoreError::NotFound("No pizza found with this id!".to_string())
    }

    pub fn comment_not_found() -> Self {
        StoreError::NotFound("No comment found with this id!".to_string())
    }

    pub fn reply_not_found() -> Self {
        StoreError::NotFound("No reply found with this id!".to_string())
    }
}

// redb reports each phase with its own error type; fold them all into
// `redb::Error` so `?` works across a whole transaction.
macro_rules! from_redb_error {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for StoreError {
                fn from(err: $ty) -> Self {
                    StoreError::Database(err.into())
                }
            }
        )*
    };
}

from_redb_error!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

/// Document operations behind the Remote API.
///
/// One call per HTTP route; implementations carry no business logic beyond
/// defaults and shape validation.
#[async_trait]
pub trait PizzaStore: Send + Sync {
    /// Human-readable backend name (e.g., "local").
    fn backend_name(&self) -> &str;

    // ── Pizzas ───────────────────────────────────────────────────────

    /// All pizzas with embedded comments, newest first.
    async fn list_pizzas(&self) -> Result<Vec<Pizza>, StoreError>;

    async fn get_pizza(&self, id: &str) -> Result<Pizza, StoreError>;

    /// Create every pizza in `batch` or none of them.
    async fn create_pizzas(&self, batch: Vec<NewPizza>) -> Result<Vec<Pizza>, StoreError>;

    async fn update_pizza(&self, id: &str, update: PizzaUpdate) -> Result<Pizza, StoreError>;

    /// Delete and return the removed document.
    async fn delete_pizza(&self, id: &str) -> Result<Pizza, StoreError>;

    // ── Comments ─────────────────────────────────────────────────────

    async fn add_comment(&self, pizza_id: &str, comment: NewComment) -> Result<Pizza, StoreError>;

    async fn add_reply(
        &self,
        pizza_id: &str,
        comment_id: &str,
        reply: NewReply,
    ) -> Result<Pizza, StoreError>;

    async fn remove_comment(&self, pizza_id: &str, comment_id: &str) -> Result<Pizza, StoreError>;

    async fn remove_reply(
        &self,
        pizza_id: &str,
        comment_id: &str,
        reply_id: &str,
    ) -> Result<Pizza, StoreError>;
}
