use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{Pool, Postgres, Row};

use super::{MasterClassStore, StoreError};
use crate::config::DatabaseConfig;
use crate::model::master_class::{MasterClass, NewMasterClass};

const TABLE: &str = "master_classes";

/// Store backed by a Postgres table. The database generates ids.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Pool<Postgres>,
}

impl PostgresStore {
    /// Connects to the database and makes sure the table exists.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(&config.url())
            .await
            .map_err(StoreError::Connect)?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        let mut transaction = self.pool.begin().await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS master_classes (
            id BIGINT PRIMARY KEY GENERATED ALWAYS AS IDENTITY,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            instructor TEXT NOT NULL,
            duration_minutes INTEGER NOT NULL CHECK (duration_minutes > 0),
            price NUMERIC NOT NULL CHECK (price > 0),
            created_at TIMESTAMPTZ NOT NULL
        );",
        )
        .execute(&mut *transaction)
        .await
        .map_err(|source| StoreError::Schema {
            table: TABLE,
            source,
        })?;

        transaction.commit().await?;
        tracing::info!("Table '{TABLE}' ready");
        Ok(())
    }
}

fn from_row(row: &PgRow) -> Result<MasterClass, sqlx::Error> {
    Ok(MasterClass {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        instructor: row.try_get("instructor")?,
        duration_minutes: row.try_get("duration_minutes")?,
        price: row.try_get("price")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl MasterClassStore for PostgresStore {
    async fn insert(&self, new: NewMasterClass) -> Result<MasterClass, StoreError> {
        let created_at = Utc::now();

        let row = sqlx::query(
            "INSERT INTO master_classes (title, description, instructor, duration_minutes, price, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, title, description, instructor, duration_minutes, price, created_at;",
        )
        .bind(new.title)
        .bind(new.description)
        .bind(new.instructor)
        .bind(new.duration_minutes)
        .bind(new.price)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;

        // Echo the stored row, timestamps are kept to the microsecond
        let stored = from_row(&row)?;
        tracing::info!("Stored master class {}", stored.id);
        Ok(stored)
    }

    async fn list_all(&self) -> Result<Vec<MasterClass>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, title, description, instructor, duration_minutes, price, created_at
            FROM master_classes ORDER BY id;",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(from_row).collect::<Result<Vec<_>, _>>()?)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM master_classes;")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
