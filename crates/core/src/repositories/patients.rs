//! Identity-record repository.
//!
//! Every operation maps to exactly one parameterised statement against the identity
//! table, keyed by `patient_id`. Failures propagate immediately; nothing here retries.
//!
//! ## Cancellation
//!
//! All operations are futures. Dropping one (request timeout, client disconnect)
//! aborts the in-flight statement and returns the connection to the pool.

use crate::constants::PATIENT_TABLE;
use crate::error::{CoreError, CoreResult};
use crate::patient::{role_or_default, PatientRecord, PatientUpdate};
use crate::types::PatientId;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use std::time::Duration;

/// PostgreSQL SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// CRUD over identity records.
#[async_trait]
pub trait PatientRepository: Send + Sync {
    /// Insert a new record. Fails with [`CoreError::Conflict`] if the id exists.
    async fn create(&self, record: &PatientRecord) -> CoreResult<()>;

    /// All records ordered by name. Rows that cannot be decoded are logged and skipped.
    async fn list(&self) -> CoreResult<Vec<PatientRecord>>;

    /// One record. Fails with [`CoreError::NotFound`] when no row matches.
    async fn get(&self, patient_id: &PatientId) -> CoreResult<PatientRecord>;

    /// Overwrite every mutable column. Fails with [`CoreError::NotFound`] when no row
    /// is affected.
    async fn update(&self, patient_id: &PatientId, update: &PatientUpdate) -> CoreResult<()>;

    /// Remove a record. Fails with [`CoreError::NotFound`] when no row is affected.
    async fn delete(&self, patient_id: &PatientId) -> CoreResult<()>;
}

/// A row as stored: every column nullable until proven otherwise.
#[derive(Debug, Clone, Default, FromRow)]
pub struct PatientRow {
    pub patient_id: Option<String>,
    pub name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub email: Option<String>,
    pub medical_history: Option<String>,
    pub role: Option<String>,
}

impl PatientRow {
    /// Recover a record from a stored row, applying the role default.
    ///
    /// The password column is never selected, so the result has no password.
    pub fn into_record(self) -> CoreResult<PatientRecord> {
        let raw_id = self.patient_id.unwrap_or_default();
        let patient_id = PatientId::new(&raw_id).map_err(|_| CoreError::MalformedRow {
            patient_id: raw_id.clone(),
            reason: "patient_id is NULL or blank".into(),
        })?;
        let name = self.name.ok_or_else(|| CoreError::MalformedRow {
            patient_id: raw_id,
            reason: "name is NULL".into(),
        })?;

        Ok(PatientRecord {
            patient_id,
            name,
            date_of_birth: self.date_of_birth,
            gender: self.gender,
            email: self.email,
            password: None,
            medical_history: self.medical_history,
            role: role_or_default(self.role),
        })
    }
}

/// Decode rows one at a time, keeping every row that decodes.
///
/// A single bad row must not fail the listing, so failures are logged and dropped.
/// The returned count may therefore be lower than the stored count.
pub fn decode_rows<E: std::fmt::Display>(
    rows: impl IntoIterator<Item = Result<PatientRow, E>>,
) -> Vec<PatientRecord> {
    let mut records = Vec::new();
    for (index, row) in rows.into_iter().enumerate() {
        let decoded = row
            .map_err(|e| e.to_string())
            .and_then(|r| r.into_record().map_err(|e| e.to_string()));
        match decoded {
            Ok(record) => records.push(record),
            Err(e) => tracing::warn!(row = index, "skipping undecodable patient row: {}", e),
        }
    }
    records
}

/// [`PatientRepository`] backed by a PostgreSQL pool.
///
/// The pool is safe for concurrent use; clones share it.
#[derive(Clone, Debug)]
pub struct PostgresPatientRepository {
    pool: PgPool,
}

impl PostgresPatientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Build a lazily-connecting pool. Connections are opened on first use, so the
    /// process can start while the database is still coming up.
    pub fn connect_lazy(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> CoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect_lazy(url)?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn map_insert_error(patient_id: &PatientId, err: sqlx::Error) -> CoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return CoreError::Conflict(patient_id.to_string());
        }
    }
    CoreError::Database(err)
}

#[async_trait]
impl PatientRepository for PostgresPatientRepository {
    async fn create(&self, record: &PatientRecord) -> CoreResult<()> {
        let sql = format!(
            "INSERT INTO {PATIENT_TABLE} \
             (patient_id, name, date_of_birth, gender, email, password, medical_history, rol_account) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        );

        sqlx::query(&sql)
            .bind(record.patient_id.as_str())
            .bind(&record.name)
            .bind(record.date_of_birth)
            .bind(&record.gender)
            .bind(&record.email)
            .bind(&record.password)
            .bind(&record.medical_history)
            .bind(&record.role)
            .execute(&self.pool)
            .await
            .map_err(|e| map_insert_error(&record.patient_id, e))?;
        Ok(())
    }

    async fn list(&self) -> CoreResult<Vec<PatientRecord>> {
        let sql = format!("{} ORDER BY name", select_columns());
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        Ok(decode_rows(rows.iter().map(PatientRow::from_row)))
    }

    async fn get(&self, patient_id: &PatientId) -> CoreResult<PatientRecord> {
        let sql = format!("{} WHERE patient_id = $1", select_columns());
        let row = sqlx::query_as::<_, PatientRow>(&sql)
            .bind(patient_id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => row.into_record(),
            None => Err(CoreError::NotFound(patient_id.to_string())),
        }
    }

    async fn update(&self, patient_id: &PatientId, update: &PatientUpdate) -> CoreResult<()> {
        let sql = format!(
            "UPDATE {PATIENT_TABLE} SET name = $1, date_of_birth = $2, gender = $3, email = $4, \
             medical_history = $5, rol_account = $6 WHERE patient_id = $7"
        );

        let result = sqlx::query(&sql)
            .bind(&update.name)
            .bind(update.date_of_birth)
            .bind(&update.gender)
            .bind(&update.email)
            .bind(&update.medical_history)
            .bind(&update.role)
            .bind(patient_id.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(patient_id.to_string()));
        }
        Ok(())
    }

    async fn delete(&self, patient_id: &PatientId) -> CoreResult<()> {
        let sql = format!("DELETE FROM {PATIENT_TABLE} WHERE patient_id = $1");

        let result = sqlx::query(&sql)
            .bind(patient_id.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(patient_id.to_string()));
        }
        Ok(())
    }
}

fn select_columns() -> String {
    format!(
        "SELECT patient_id, name, date_of_birth, gender, email, medical_history, \
         rol_account AS role FROM {PATIENT_TABLE}"
    )
}
