//! `SnapshotSink` backed by Postgres (spec.md §6.2, §6.3).

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use territory_core::snapshot::SnapshotSink;
use territory_protocol::{StoreError, Tile, TileType};

pub struct PgSnapshotSink {
    pool: PgPool,
}

impl PgSnapshotSink {
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(to_store_error)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS world_tiles (
                q BIGINT NOT NULL,
                r BIGINT NOT NULL,
                owner_id TEXT NULL,
                owner_alliance_tag TEXT NULL,
                owner_alliance_color TEXT NULL,
                energy FLOAT8 NOT NULL,
                integrity FLOAT8 NOT NULL,
                level INT NOT NULL DEFAULT 1,
                tile_type TEXT NOT NULL DEFAULT 'normal',
                last_update BIGINT NOT NULL,
                PRIMARY KEY (q, r)
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(to_store_error)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS world_tiles_owner_id_idx ON world_tiles (owner_id)")
            .execute(&pool)
            .await
            .map_err(to_store_error)?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS world_tiles_last_update_idx ON world_tiles (last_update)",
        )
        .execute(&pool)
        .await
        .map_err(to_store_error)?;

        Ok(Self { pool })
    }
}

fn to_store_error(err: sqlx::Error) -> StoreError {
    StoreError::new(err.to_string())
}

/// The `tile_type` column value for a given [`TileType`]. Exposed so the
/// wire format of the `world_tiles` table is pinned by a test against the
/// crate's own public API, the way `backbay-server` pins its protocol
/// encoding in `tests/integration.rs`.
pub fn tile_type_str(tile_type: TileType) -> &'static str {
    match tile_type {
        TileType::Normal => "normal",
        TileType::Nexus => "nexus",
    }
}

#[async_trait]
impl SnapshotSink for PgSnapshotSink {
    async fn upsert_tiles(&self, tiles: &[Tile]) -> Result<(), StoreError> {
        if tiles.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(to_store_error)?;
        for tile in tiles {
            sqlx::query(
                r#"
                INSERT INTO world_tiles
                    (q, r, owner_id, owner_alliance_tag, owner_alliance_color, energy, integrity, level, tile_type, last_update)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                ON CONFLICT (q, r) DO UPDATE SET
                    owner_id = EXCLUDED.owner_id,
                    owner_alliance_tag = EXCLUDED.owner_alliance_tag,
                    owner_alliance_color = EXCLUDED.owner_alliance_color,
                    energy = EXCLUDED.energy,
                    integrity = EXCLUDED.integrity,
                    level = EXCLUDED.level,
                    tile_type = EXCLUDED.tile_type,
                    last_update = EXCLUDED.last_update
                "#,
            )
            .bind(tile.coord.q as i64)
            .bind(tile.coord.r as i64)
            .bind(&tile.owner_id)
            .bind(&tile.owner_alliance_tag)
            .bind(&tile.owner_alliance_color)
            .bind(tile.energy)
            .bind(tile.integrity)
            .bind(tile.level as i32)
            .bind(tile_type_str(tile.tile_type))
            .bind(tile.last_update)
            .execute(&mut *tx)
            .await
            .map_err(to_store_error)?;
        }
        tx.commit().await.map_err(to_store_error)?;

        Ok(())
    }
}
