//! `KVStore` backed by Redis. Uses a `ConnectionManager`, which reconnects
//! transparently, so one clone can be shared across every request and both
//! background loops without a connection pool.

use std::collections::HashMap;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use territory_core::kv::{KVStore, ScanPage};
use territory_protocol::StoreError;

pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url).map_err(to_store_error)?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(to_store_error)?;
        Ok(Self { conn })
    }
}

fn to_store_error(err: redis::RedisError) -> StoreError {
    StoreError::new(err.to_string())
}

#[async_trait]
impl KVStore for RedisStore {
    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        let mut conn = self.conn.clone();
        conn.hgetall(key).await.map_err(to_store_error)
    }

    async fn hash_set(
        &self,
        key: &str,
        fields: HashMap<String, String>,
    ) -> Result<usize, StoreError> {
        if fields.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn.clone();
        let count = fields.len();
        let pairs: Vec<(String, String)> = fields.into_iter().collect();
        let _: () = conn.hset_multiple(key, &pairs).await.map_err(to_store_error)?;
        Ok(count)
    }

    async fn hash_incr_by(&self, key: &str, field: &str, delta: i64) -> Result<i64, StoreError> {
        let mut conn = self.conn.clone();
        conn.hincr(key, field, delta).await.map_err(to_store_error)
    }

    async fn hash_set_nx(&self, key: &str, field: &str, value: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        conn.hset_nx(key, field, value).await.map_err(to_store_error)
    }

    async fn zset_incr_by(&self, key: &str, delta: f64, member: &str) -> Result<f64, StoreError> {
        let mut conn = self.conn.clone();
        conn.zincr(key, member, delta).await.map_err(to_store_error)
    }

    async fn zset_range_with_scores(
        &self,
        key: &str,
        min: isize,
        max: isize,
        reverse: bool,
    ) -> Result<Vec<(String, f64)>, StoreError> {
        let mut conn = self.conn.clone();
        if reverse {
            conn.zrevrange_withscores(key, min, max)
                .await
                .map_err(to_store_error)
        } else {
            conn.zrange_withscores(key, min, max)
                .await
                .map_err(to_store_error)
        }
    }

    async fn set_add(&self, key: &str, members: &[String]) -> Result<usize, StoreError> {
        if members.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn.clone();
        conn.sadd(key, members).await.map_err(to_store_error)
    }

    async fn set_remove(&self, key: &str, members: &[String]) -> Result<usize, StoreError> {
        if members.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn.clone();
        conn.srem(key, members).await.map_err(to_store_error)
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn.clone();
        conn.smembers(key).await.map_err(to_store_error)
    }

    async fn set_scan(
        &self,
        key: &str,
        cursor: &str,
        count: Option<usize>,
    ) -> Result<ScanPage, StoreError> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("SSCAN");
        cmd.arg(key).arg(cursor);
        if let Some(count) = count {
            cmd.arg("COUNT").arg(count);
        }
        let (next_cursor, members): (String, Vec<String>) =
            cmd.query_async(&mut conn).await.map_err(to_store_error)?;
        Ok(ScanPage {
            cursor: next_cursor,
            members,
        })
    }
}
