//! # Pending Slot
//!
//! A durable slot holding at most one unsynced item. Saving overwrites;
//! nothing queues.
//!
//! ```text
//!  save(a) ──► [ a ]      save(b) ──► [ b ]      clear() ──► [   ]
//! ```

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::DbResult;
use crate::repository::kv::KvRepository;

/// One pending item of type `T` stored under a fixed key.
#[derive(Debug)]
pub struct PendingSlot<T> {
    kv: KvRepository,
    key: &'static str,
    _item: PhantomData<fn() -> T>,
}

impl<T> Clone for PendingSlot<T> {
    fn clone(&self) -> Self {
        PendingSlot {
            kv: self.kv.clone(),
            key: self.key,
            _item: PhantomData,
        }
    }
}

impl<T> PendingSlot<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(kv: KvRepository, key: &'static str) -> Self {
        PendingSlot {
            kv,
            key,
            _item: PhantomData,
        }
    }

    /// Storage key of this slot.
    pub fn key(&self) -> &'static str {
        self.key
    }

    pub async fn get(&self) -> DbResult<Option<T>> {
        self.kv.get_json(self.key).await
    }

    /// Replaces whatever the slot held.
    pub async fn set(&self, item: &T) -> DbResult<()> {
        debug!(slot = self.key, "Saving pending item");
        self.kv.set_json(self.key, item).await
    }

    pub async fn clear(&self) -> DbResult<()> {
        debug!(slot = self.key, "Clearing pending item");
        self.kv.delete(self.key).await.map(|_| ())
    }

    pub async fn is_occupied(&self) -> DbResult<bool> {
        self.kv.contains(self.key).await
    }
}
