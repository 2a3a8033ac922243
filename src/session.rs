use std::{collections::HashMap, sync::Arc};

use anyhow::Context;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::error;
use uuid::Uuid;

use crate::logs::{FoodLog, WaterLog};
use crate::metrics::Profile;
use crate::storage::KvStore;

pub const PROFILE_KEY: &str = "profile";
pub const FOOD_LOG_KEY: &str = "food_log";
pub const WATER_LOG_KEY: &str = "water_log";

/// One write lock per user, held across load-modify-save.
#[derive(Default)]
pub struct SessionLocks {
    inner: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl SessionLocks {
    pub async fn acquire(&self, user_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = self.inner.lock().await.entry(user_id).or_default().clone();
        lock.lock_owned().await
    }
}

/// Collections owned by one user. Every key is namespaced by the user id so no
/// two sessions ever read each other's data.
pub struct Session<'a> {
    user_id: Uuid,
    store: &'a dyn KvStore,
    locks: &'a SessionLocks,
    retention: usize,
}

impl<'a> Session<'a> {
    pub fn new(user_id: Uuid, store: &'a dyn KvStore, locks: &'a SessionLocks, retention: usize) -> Self {
        Self {
            user_id,
            store,
            locks,
            retention,
        }
    }

    pub fn key(&self, collection: &str) -> String {
        format!("user:{}:{}", self.user_id, collection)
    }

    /// Absent collections come back as their default. A blob that no longer
    /// decodes is an error so it is never overwritten by a fresh default.
    async fn load<T: DeserializeOwned + Default>(&self, collection: &str) -> anyhow::Result<T> {
        let key = self.key(collection);
        let Some(value) = self.store.get(&key).await? else {
            return Ok(T::default());
        };
        serde_json::from_value(value).map_err(|e| {
            error!(error = %e, %key, "stored blob does not decode");
            anyhow::Error::new(e).context(format!("decode {key}"))
        })
    }

    async fn save<T: Serialize>(&self, collection: &str, value: &T) -> anyhow::Result<()> {
        let key = self.key(collection);
        let json = serde_json::to_value(value).with_context(|| format!("encode {key}"))?;
        self.store.set(&key, json).await
    }

    pub async fn profile(&self) -> anyhow::Result<Profile> {
        self.load(PROFILE_KEY).await
    }

    pub async fn save_profile(&self, profile: &Profile) -> anyhow::Result<()> {
        let _guard = self.locks.acquire(self.user_id).await;
        self.save(PROFILE_KEY, profile).await
    }

    pub async fn food_log(&self) -> anyhow::Result<FoodLog> {
        self.load(FOOD_LOG_KEY).await
    }

    /// Applies `change` to the stored food log under the user's lock and
    /// persists the result with retention applied.
    pub async fn update_food_log<R>(&self, change: impl FnOnce(&mut FoodLog) -> R) -> anyhow::Result<R> {
        let _guard = self.locks.acquire(self.user_id).await;
        let mut log: FoodLog = self.load(FOOD_LOG_KEY).await?;
        let out = change(&mut log);
        log.retain_recent(self.retention);
        self.save(FOOD_LOG_KEY, &log).await?;
        Ok(out)
    }

    pub async fn water_log(&self) -> anyhow::Result<WaterLog> {
        self.load(WATER_LOG_KEY).await
    }

    pub async fn update_water_log<R>(&self, change: impl FnOnce(&mut WaterLog) -> R) -> anyhow::Result<R> {
        let _guard = self.locks.acquire(self.user_id).await;
        let mut log: WaterLog = self.load(WATER_LOG_KEY).await?;
        let out = change(&mut log);
        log.retain_recent(self.retention);
        self.save(WATER_LOG_KEY, &log).await?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logs::FoodLogEntry;
    use crate::nutrition::Nutrition;
    use crate::storage::MemoryKvStore;
    use async_trait::async_trait;
    use serde_json::Value;
    use time::macros::date;

    /// Yields inside `get` so concurrent updates interleave.
    #[derive(Default)]
    struct SlowStore(MemoryKvStore);

    #[async_trait]
    impl KvStore for SlowStore {
        async fn get(&self, key: &str) -> anyhow::Result<Option<Value>> {
            let v = self.0.get(key).await;
            tokio::task::yield_now().await;
            v
        }

        async fn set(&self, key: &str, value: Value) -> anyhow::Result<()> {
            self.0.set(key, value).await
        }
    }

    #[tokio::test]
    async fn absent_collections_default() {
        let store = MemoryKvStore::default();
        let locks = SessionLocks::default();
        let s = Session::new(Uuid::new_v4(), &store, &locks, 100);
        assert_eq!(s.profile().await.unwrap(), Profile::default());
        assert!(s.food_log().await.unwrap().is_empty());
        assert_eq!(s.water_log().await.unwrap(), WaterLog::default());
    }

    #[tokio::test]
    async fn users_are_isolated() {
        let store = MemoryKvStore::default();
        let locks = SessionLocks::default();
        let alice = Session::new(Uuid::new_v4(), &store, &locks, 100);
        let bob = Session::new(Uuid::new_v4(), &store, &locks, 100);

        let p = Profile {
            weight_kg: 90.0,
            ..Profile::default()
        };
        alice.save_profile(&p).await.unwrap();
        assert_eq!(alice.profile().await.unwrap().weight_kg, 90.0);
        assert_eq!(bob.profile().await.unwrap(), Profile::default());
    }

    #[tokio::test]
    async fn food_log_is_truncated_on_save() {
        let store = MemoryKvStore::default();
        let locks = SessionLocks::default();
        let s = Session::new(Uuid::new_v4(), &store, &locks, 3);
        s.update_food_log(|log| {
            for i in 0..5 {
                log.append(FoodLogEntry::new(
                    date!(2026 - 03 - 01),
                    format!("item {i}"),
                    Nutrition::default(),
                ));
            }
        })
        .await
        .unwrap();
        let back = s.food_log().await.unwrap();
        assert_eq!(back.len(), 3);
        assert_eq!(back.entries()[0].name, "item 2");
    }

    #[tokio::test]
    async fn undecodable_blob_is_an_error_and_left_alone() {
        let store = MemoryKvStore::default();
        let locks = SessionLocks::default();
        let s = Session::new(Uuid::new_v4(), &store, &locks, 100);
        let key = s.key(FOOD_LOG_KEY);
        let broken = serde_json::json!([{"id": "not-a-uuid", "calories": null}]);
        store.set(&key, broken.clone()).await.unwrap();

        assert!(s.food_log().await.is_err());
        let appended = s
            .update_food_log(|log| {
                log.append(FoodLogEntry::new(date!(2026 - 03 - 01), "x", Nutrition::default()));
            })
            .await;
        assert!(appended.is_err());
        assert_eq!(store.get(&key).await.unwrap(), Some(broken));
    }

    #[tokio::test]
    async fn concurrent_water_adds_are_not_lost() {
        let store = SlowStore::default();
        let locks = SessionLocks::default();
        let s = Session::new(Uuid::new_v4(), &store, &locks, 100);
        let day = date!(2026 - 01 - 22);
        let (a, b, c, d) = tokio::join!(
            s.update_water_log(|log| log.add(day, 250)),
            s.update_water_log(|log| log.add(day, 250)),
            s.update_water_log(|log| log.add(day, 250)),
            s.update_water_log(|log| log.add(day, 250)),
        );
        for r in [a, b, c, d] {
            r.unwrap();
        }
        assert_eq!(s.water_log().await.unwrap().consumed_on(day), 1000);
    }
}
