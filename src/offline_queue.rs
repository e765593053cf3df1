//! On-device queue of pizza submissions made while the API was unreachable.
//!
//! Two tables in one redb file:
//!   new_pizza:   local_id → JSON payload (opaque, sent to the API verbatim)
//!   queue_meta:  "next_local_id" → u64
//!
//! Local ids come from a persisted counter rather than the largest key, so
//! an id is never handed out twice even after the queue has been cleared.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};
use serde_json::Value;

const QUEUE_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("new_pizza");
const META_TABLE: TableDefinition<&str, u64> = TableDefinition::new("queue_meta");
const NEXT_ID_KEY: &str = "next_local_id";

/// One buffered submission awaiting upload.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSubmission {
    pub local_id: u64,
    pub payload: Value,
}

/// Handle to the local queue file. Opened once per process and shared
/// behind an `Arc`; dropping the last handle closes the file.
pub struct OfflineQueue {
    db: Database,
}

impl OfflineQueue {
    /// Open the queue at `path`, re-attaching to any entries left by a
    /// previous run.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let db = Database::create(path)
            .with_context(|| format!("failed to open offline queue at {}", path.display()))?;
        let txn = db.begin_write()?;
        {
            let _ = txn.open_table(QUEUE_TABLE)?;
            let _ = txn.open_table(META_TABLE)?;
        }
        txn.commit()?;

        let queue = Self { db };
        let pending = queue.len()?;
        if pending > 0 {
            tracing::info!(pending, "offline queue has unsent submissions");
        }
        Ok(queue)
    }

    /// Default location: `<data_dir>/pizza-hunt/offline_queue.redb`
    pub fn default_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .context("Failed to get data directory")?
            .join("pizza-hunt");
        Ok(data_dir.join("offline_queue.redb"))
    }

    /// Append a submission and commit before returning its local id.
    pub fn enqueue(&self, payload: &Value) -> Result<u64> {
        let json = serde_json::to_vec(payload).context("Failed to serialize submission")?;
        let txn = self.db.begin_write()?;
        let local_id = {
            let mut meta = txn.open_table(META_TABLE)?;
            let next = meta.get(NEXT_ID_KEY)?.map(|v| v.value()).unwrap_or(1);
            meta.insert(NEXT_ID_KEY, next + 1)?;

            let mut table = txn.open_table(QUEUE_TABLE)?;
            table.insert(next, json.as_slice())?;
            next
        };
        txn.commit().context("Failed to persist submission")?;
        tracing::debug!(local_id, "submission queued");
        Ok(local_id)
    }

    /// Every queued submission in local id order. Nothing is removed.
    pub fn drain_all(&self) -> Result<Vec<PendingSubmission>> {
        let rtxn = self.db.begin_read()?;
        let table = rtxn.open_table(QUEUE_TABLE)?;
        let mut pending = Vec::new();
        for item in table.iter()? {
            let (key, val) = item?;
            let payload = serde_json::from_slice(val.value())
                .with_context(|| format!("corrupt queued submission {}", key.value()))?;
            pending.push(PendingSubmission {
                local_id: key.value(),
                payload,
            });
        }
        Ok(pending)
    }

    /// Remove every queued submission.
    pub fn clear(&self) -> Result<()> {
        self.remove_where(|_| true).map(|_| ())
    }

    /// Remove submissions with `local_id <= last_local_id`, leaving anything
    /// queued after that point. Returns how many were removed.
    pub fn clear_through(&self, last_local_id: u64) -> Result<usize> {
        self.remove_where(|key| key <= last_local_id)
    }

    pub fn len(&self) -> Result<usize> {
        let rtxn = self.db.begin_read()?;
        let table = rtxn.open_table(QUEUE_TABLE)?;
        Ok(table.len()? as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn remove_where(&self, should_remove: impl Fn(u64) -> bool) -> Result<usize> {
        let txn = self.db.begin_write()?;
        let removed = {
            let mut table = txn.open_table(QUEUE_TABLE)?;
            // Collect keys first, then delete
            let keys: Vec<u64> = table
                .iter()?
                .map(|r| r.map(|(k, _)| k.value()))
                .collect::<std::result::Result<Vec<_>, _>>()?
                .into_iter()
                .filter(|key| should_remove(*key))
                .collect();
            for key in &keys {
                table.remove(*key)?;
            }
            keys.len()
        };
        txn.commit().context("Failed to clear offline queue")?;
        Ok(removed)
    }
}
