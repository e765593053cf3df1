//! Local storage backend: the redb pizza database on the server host.
//!
//! redb serializes write transactions itself, so the async trait methods
//! just call through.

use std::path::Path;

use async_trait::async_trait;

use super::{PizzaStore, StoreError};
use crate::models::{NewComment, NewPizza, NewReply, Pizza, PizzaUpdate};
use crate::pizza_db::PizzaDb;

pub struct LocalStore {
    db: PizzaDb,
}

impl LocalStore {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let db = PizzaDb::open(path)?;
        tracing::info!(path = %path.display(), "pizza store opened");
        Ok(Self { db })
    }
}

#[async_trait]
impl PizzaStore for LocalStore {
    fn backend_name(&self) -> &str {
        "local"
    }

    async fn list_pizzas(&self) -> Result<Vec<Pizza>, StoreError> {
        self.db.list()
    }

    async fn get_pizza(&self, id: &str) -> Result<Pizza, StoreError> {
        self.db.get(id)
    }

    async fn create_pizzas(&self, batch: Vec<NewPizza>) -> Result<Vec<Pizza>, StoreError> {
        self.db.create(batch)
    }

    async fn update_pizza(&self, id: &str, update: PizzaUpdate) -> Result<Pizza, StoreError> {
        self.db.update(id, update)
    }

    async fn delete_pizza(&self, id: &str) -> Result<Pizza, StoreError> {
        self.db.delete(id)
    }

    async fn add_comment(&self, pizza_id: &str, comment: NewComment) -> Result<Pizza, StoreError> {
        self.db.add_comment(pizza_id, comment)
    }

    async fn add_reply(
        &self,
        pizza_id: &str,
        comment_id: &str,
        reply: NewReply,
    ) -> Result<Pizza, StoreError> {
        self.db.add_reply(pizza_id, comment_id, reply)
    }

    async fn remove_comment(&self, pizza_id: &str, comment_id: &str) -> Result<Pizza, StoreError> {
        self.db.remove_comment(pizza_id, comment_id)
    }

    async fn remove_reply(
        &self,
        pizza_id: &str,
        comment_id: &str,
        reply_id: &str,
    ) -> Result<Pizza, StoreError> {
        self.db.remove_reply(pizza_id, comment_id, reply_id)
    }
}
