//! Pizza document collection backed by redb.
//!
//! One table, one JSON document per pizza:
//!
//! ```text
//! pizzas:  object_id → JSON Pizza (comments and replies embedded)
//! ```
//!
//! Object ids sort by creation time, so a reverse scan is the
//! newest-first listing.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use redb::{Database, ReadableTable, TableDefinition};

use crate::models::{NewComment, NewPizza, NewReply, Pizza, PizzaUpdate};
use crate::storage::StoreError;

const PIZZAS: TableDefinition<&str, &[u8]> = TableDefinition::new("pizzas");

/// Handle to the server's pizza database.
pub struct PizzaDb {
    db: Database,
}

impl PizzaDb {
    /// Open or create the database at `path`, creating parent directories.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let db = Database::create(path)
            .with_context(|| format!("failed to open pizza database at {}", path.display()))?;
        // Ensure table exists
        let txn = db.begin_write()?;
        {
            let _ = txn.open_table(PIZZAS)?;
        }
        txn.commit()?;
        Ok(Self { db })
    }

    /// Default location: `<data_dir>/pizza-hunt/pizzas.redb`
    pub fn default_path() -> anyhow::Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .context("Failed to get data directory")?
            .join("pizza-hunt");
        Ok(data_dir.join("pizzas.redb"))
    }

    pub fn list(&self) -> Result<Vec<Pizza>, StoreError> {
        let rtxn = self.db.begin_read()?;
        let table = rtxn.open_table(PIZZAS)?;
        let mut pizzas = Vec::new();
        for item in table.iter()?.rev() {
            let (_, val) = item?;
            pizzas.push(serde_json::from_slice(val.value())?);
        }
        Ok(pizzas)
    }

    pub fn get(&self, id: &str) -> Result<Pizza, StoreError> {
        let rtxn = self.db.begin_read()?;
        let table = rtxn.open_table(PIZZAS)?;
        match table.get(id)? {
            Some(val) => Ok(serde_json::from_slice(val.value())?),
            None => Err(StoreError::pizza_not_found()),
        }
    }

    pub fn create(&self, batch: Vec<NewPizza>) -> Result<Vec<Pizza>, StoreError> {
        let now = Utc::now();
        // Validate the whole batch before touching the table.
        let pizzas = batch
            .into_iter()
            .map(|new| new.into_pizza(now))
            .collect::<Result<Vec<_>, _>>()?;

        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(PIZZAS)?;
            for pizza in &pizzas {
                let json = serde_json::to_vec(pizza)?;
                table.insert(pizza.id.as_str(), json.as_slice())?;
            }
        }
        txn.commit()?;
        Ok(pizzas)
    }

    pub fn update(&self, id: &str, update: PizzaUpdate) -> Result<Pizza, StoreError> {
        self.modify(id, |pizza| {
            update.apply_to(pizza);
            Ok(())
        })
    }

    pub fn delete(&self, id: &str) -> Result<Pizza, StoreError> {
        let txn = self.db.begin_write()?;
        let removed = {
            let mut table = txn.open_table(PIZZAS)?;
            let removed = table.remove(id)?.map(|val| val.value().to_vec());
            removed
        };
        match removed {
            Some(bytes) => {
                let pizza = serde_json::from_slice(&bytes)?;
                txn.commit()?;
                Ok(pizza)
            }
            None => Err(StoreError::pizza_not_found()),
        }
    }

    pub fn add_comment(&self, pizza_id: &str, comment: NewComment) -> Result<Pizza, StoreError> {
        let comment = comment.into_comment(Utc::now())?;
        self.modify(pizza_id, move |pizza| {
            pizza.comments.push(comment);
            Ok(())
        })
    }

    pub fn add_reply(
        &self,
        pizza_id: &str,
        comment_id: &str,
        reply: NewReply,
    ) -> Result<Pizza, StoreError> {
        let reply = reply.into_reply(Utc::now())?;
        self.modify(pizza_id, move |pizza| {
            let comment = pizza
                .comments
                .iter_mut()
                .find(|c| c.comment_id == comment_id)
                .ok_or_else(StoreError::comment_not_found)?;
            comment.replies.push(reply);
            Ok(())
        })
    }

    pub fn remove_comment(&self, pizza_id: &str, comment_id: &str) -> Result<Pizza, StoreError> {
        self.modify(pizza_id, |pizza| {
            let pos = pizza
                .comments
                .iter()
                .position(|c| c.comment_id == comment_id)
                .ok_or_else(StoreError::comment_not_found)?;
            pizza.comments.remove(pos);
            Ok(())
        })
    }

    pub fn remove_reply(
        &self,
        pizza_id: &str,
        comment_id: &str,
        reply_id: &str,
    ) -> Result<Pizza, StoreError> {
        self.modify(pizza_id, |pizza| {
            let comment = pizza
                .comments
                .iter_mut()
                .find(|c| c.comment_id == comment_id)
                .ok_or_else(StoreError::comment_not_found)?;
            let pos = comment
                .replies
                .iter()
                .position(|r| r.reply_id == reply_id)
                .ok_or_else(StoreError::reply_not_found)?;
            comment.replies.remove(pos);
            Ok(())
        })
    }

    /// Read-modify-write of one document inside a single write transaction.
    ///
    /// The edited document is re-validated before it is stored; on any error
    /// the transaction is dropped uncommitted.
    fn modify<F>(&self, id: &str, edit: F) -> Result<Pizza, StoreError>
    where
        F: FnOnce(&mut Pizza) -> Result<(), StoreError>,
    {
        let txn = self.db.begin_write()?;
        let pizza = {
            let mut table = txn.open_table(PIZZAS)?;
            let existing = table.get(id)?.map(|val| val.value().to_vec());
            let Some(bytes) = existing else {
                return Err(StoreError::pizza_not_found());
            };
            let mut pizza: Pizza = serde_json::from_slice(&bytes)?;
            edit(&mut pizza)?;
            let pizza = pizza.normalized()?;
            let json = serde_json::to_vec(&pizza)?;
            table.insert(id, json.as_slice())?;
            pizza
        };
        txn.commit()?;
        Ok(pizza)
    }
}
