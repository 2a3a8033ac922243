use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use bytes::Bytes;
use serde_json::Value;
use sqlx::{types::Json, PgPool};
use tokio::sync::RwLock;

use crate::config::S3Config;

/// Opaque key/value blob store. One value per fixed collection key.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<Value>>;
    async fn set(&self, key: &str, value: Value) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct PgKvStore {
    db: PgPool,
}

impl PgKvStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl KvStore for PgKvStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<Value>> {
        let row = sqlx::query_as::<_, (Json<Value>,)>(
            r#"
            SELECT value
              FROM kv_blobs
             WHERE key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.db)
        .await
        .with_context(|| format!("kv get {key}"))?;
        Ok(row.map(|(Json(v),)| v))
    }

    async fn set(&self, key: &str, value: Value) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO kv_blobs (key, value, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (key) DO UPDATE
               SET value = EXCLUDED.value,
                   updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(key)
        .bind(Json(value))
        .execute(&self.db)
        .await
        .with_context(|| format!("kv set {key}"))?;
        Ok(())
    }
}

/// One JSON object per key in an S3/MinIO bucket.
#[derive(Clone)]
pub struct S3KvStore {
    client: Client,
    bucket: String,
}

impl S3KvStore {
    pub async fn new(cfg: &S3Config) -> anyhow::Result<Self> {
        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(cfg.region.clone()))
            .credentials_provider(Credentials::new(
                &cfg.access_key,
                &cfg.secret_key,
                None,
                None,
                "static",
            ))
            .endpoint_url(&cfg.endpoint)
            .load()
            .await;

        let conf = S3ConfigBuilder::from(&shared)
            .endpoint_url(&cfg.endpoint)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(conf),
            bucket: cfg.bucket.clone(),
        })
    }

    fn object_key(key: &str) -> String {
        format!("kv/{}.json", key.replace(':', "/"))
    }
}

#[async_trait]
impl KvStore for S3KvStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<Value>> {
        let object_key = Self::object_key(key);
        let out = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .send()
            .await
        {
            Ok(out) => out,
            Err(e) => {
                let err = e.into_service_error();
                if err.is_no_such_key() {
                    return Ok(None);
                }
                return Err(anyhow::Error::new(err).context(format!("s3 get_object {object_key}")));
            }
        };
        let body = out
            .body
            .collect()
            .await
            .context("s3 read body")?
            .into_bytes();
        let value = serde_json::from_slice(&body)
            .with_context(|| format!("decode {object_key}"))?;
        Ok(Some(value))
    }

    async fn set(&self, key: &str, value: Value) -> anyhow::Result<()> {
        let object_key = Self::object_key(key);
        let body = Bytes::from(serde_json::to_vec(&value)?);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .body(ByteStream::from(body))
            .content_type("application/json")
            .send()
            .await
            .with_context(|| format!("s3 put_object {object_key}"))?;
        Ok(())
    }
}

/// Process-local store; contents vanish on restart.
#[derive(Default)]
pub struct MemoryKvStore {
    inner: RwLock<HashMap<String, Value>>,
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<Value>> {
        Ok(self.inner.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> anyhow::Result<()> {
        self.inner.write().await.insert(key.to_string(), value);
        Ok(())
    }
}
