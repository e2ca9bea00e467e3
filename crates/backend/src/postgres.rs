use async_trait::async_trait;
use chrono::Utc;
use common::RecordId;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{BackendError, DataStore, Result, StoredRecord};

/// PostgreSQL-backed data store.
///
/// All rows live in a single `records` table keyed by UUID, with the
/// logical table name in a column and the row contents in a jsonb
/// payload. Object storage and the change feed stay delegated to the
/// hosted backend and are not implemented here.
#[derive(Clone)]
pub struct PostgresBackend {
    pool: PgPool,
}

impl PostgresBackend {
    /// Creates a new PostgreSQL data store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_record(row: PgRow) -> Result<StoredRecord> {
        Ok(StoredRecord {
            id: RecordId::from_uuid(row.try_get::<Uuid, _>("id")?),
            payload: row.try_get("payload")?,
            inserted_at: row.try_get("inserted_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn map_insert_error(table: &str, e: sqlx::Error) -> BackendError {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            tracing::warn!(table, constraint = ?db_err.constraint(), "insert rejected");
            return BackendError::Rejected {
                target: table.to_string(),
                reason: db_err.message().to_string(),
            };
        }
        BackendError::Database(e)
    }
}

#[async_trait]
impl DataStore for PostgresBackend {
    async fn insert(&self, table: &str, row: serde_json::Value) -> Result<StoredRecord> {
        let now = Utc::now();
        let record = StoredRecord {
            id: RecordId::new(),
            payload: row,
            inserted_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO records (id, table_name, payload, inserted_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(table)
        .bind(&record.payload)
        .bind(record.inserted_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| Self::map_insert_error(table, e))?;

        Ok(record)
    }

    async fn insert_batch(
        &self,
        table: &str,
        rows: Vec<serde_json::Value>,
    ) -> Result<Vec<StoredRecord>> {
        // Deliberately not wrapped in a transaction: the hosted backend
        // applies batch rows one by one, and a failure part-way leaves the
        // earlier rows behind. Compensation handles the applied subset.
        let mut stored = Vec::with_capacity(rows.len());
        for row in rows {
            stored.push(self.insert(table, row).await?);
        }
        Ok(stored)
    }

    async fn update(
        &self,
        table: &str,
        id: RecordId,
        patch: serde_json::Value,
    ) -> Result<StoredRecord> {
        let Some(fields) = patch.as_object().cloned() else {
            return Err(BackendError::Rejected {
                target: table.to_string(),
                reason: "patch must be a JSON object".to_string(),
            });
        };

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            SELECT id, payload, inserted_at, updated_at
            FROM records
            WHERE id = $1 AND table_name = $2
            FOR UPDATE
            "#,
        )
        .bind(id.as_uuid())
        .bind(table)
        .fetch_optional(&mut *tx)
        .await?;

        let row = row.ok_or_else(|| BackendError::RowNotFound {
            table: table.to_string(),
            id,
        })?;

        let mut record = Self::row_to_record(row)?;
        if let Some(payload) = record.payload.as_object_mut() {
            for (key, value) in fields {
                payload.insert(key, value);
            }
        }
        record.updated_at = Utc::now();

        sqlx::query(
            r#"
            UPDATE records SET payload = $1, updated_at = $2
            WHERE id = $3 AND table_name = $4
            "#,
        )
        .bind(&record.payload)
        .bind(record.updated_at)
        .bind(id.as_uuid())
        .bind(table)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(record)
    }

    async fn delete(&self, table: &str, id: RecordId) -> Result<()> {
        // Idempotent: zero affected rows is fine.
        sqlx::query("DELETE FROM records WHERE id = $1 AND table_name = $2")
            .bind(id.as_uuid())
            .bind(table)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_matching(
        &self,
        table: &str,
        field: &str,
        value: &serde_json::Value,
    ) -> Result<u64> {
        let result =
            sqlx::query("DELETE FROM records WHERE table_name = $1 AND payload -> $2 = $3")
                .bind(table)
                .bind(field)
                .bind(value)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }

    async fn fetch(&self, table: &str, id: RecordId) -> Result<Option<StoredRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, payload, inserted_at, updated_at
            FROM records
            WHERE id = $1 AND table_name = $2
            "#,
        )
        .bind(id.as_uuid())
        .bind(table)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_record).transpose()
    }

    async fn fetch_matching(
        &self,
        table: &str,
        field: &str,
        value: &serde_json::Value,
    ) -> Result<Vec<StoredRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, payload, inserted_at, updated_at
            FROM records
            WHERE table_name = $1 AND payload -> $2 = $3
            ORDER BY inserted_at ASC
            "#,
        )
        .bind(table)
        .bind(field)
        .bind(value)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_record).collect()
    }

    async fn fetch_all(&self, table: &str) -> Result<Vec<StoredRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, payload, inserted_at, updated_at
            FROM records
            WHERE table_name = $1
            ORDER BY inserted_at ASC
            "#,
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_record).collect()
    }
}
