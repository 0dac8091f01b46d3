use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use pulse_core::{Appointment, AppointmentStatus};
use sqlx::{Row, SqlitePool};

/// Where confirmed bookings end up. `append` is the only call the
/// dialogue path depends on; the rest backs the appointments screen.
///
/// Futures are `Send` so agents built on any store can run on a
/// multi-threaded runtime.
pub trait AppointmentRepository: Send + Sync {
    fn append(&self, appointment: &Appointment) -> impl Future<Output = Result<()>> + Send;
    /// Oldest first, in append order.
    fn list(&self) -> impl Future<Output = Result<Vec<Appointment>>> + Send;
    /// Returns false when no appointment has that id.
    fn set_status(
        &self,
        id: &str,
        status: AppointmentStatus,
    ) -> impl Future<Output = Result<bool>> + Send;
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    appointments: Arc<RwLock<Vec<Appointment>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AppointmentRepository for MemoryStore {
    async fn append(&self, appointment: &Appointment) -> Result<()> {
        self.appointments.write().push(appointment.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Appointment>> {
        Ok(self.appointments.read().clone())
    }

    async fn set_status(&self, id: &str, status: AppointmentStatus) -> Result<bool> {
        let mut appointments = self.appointments.write();
        match appointments.iter_mut().find(|appointment| appointment.id == id) {
            Some(appointment) => {
                appointment.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .with_context(|| format!("failed connecting to sqlite at {}", database_url))?;

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS appointments (
              seq INTEGER PRIMARY KEY AUTOINCREMENT,
              id TEXT NOT NULL UNIQUE,
              center TEXT NOT NULL,
              date TEXT NOT NULL,
              time TEXT NOT NULL,
              status TEXT NOT NULL,
              created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

impl AppointmentRepository for SqliteStore {
    async fn append(&self, appointment: &Appointment) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO appointments (id, center, date, time, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&appointment.id)
        .bind(&appointment.center)
        .bind(&appointment.date)
        .bind(&appointment.time)
        .bind(appointment.status.as_str())
        .bind(appointment.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed inserting appointment {}", appointment.id))?;

        Ok(())
    }

    async fn list(&self) -> Result<Vec<Appointment>> {
        let rows = sqlx::query(
            r#"
            SELECT id, center, date, time, status, created_at
            FROM appointments
            ORDER BY seq
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let status: String = row.get("status");
                let created_at: String = row.get("created_at");
                Ok(Appointment {
                    id: row.get("id"),
                    center: row.get("center"),
                    date: row.get("date"),
                    time: row.get("time"),
                    status: AppointmentStatus::parse(&status)
                        .with_context(|| format!("unknown appointment status {status}"))?,
                    created_at: created_at
                        .parse::<DateTime<Utc>>()
                        .with_context(|| format!("invalid created_at {created_at}"))?,
                })
            })
            .collect()
    }

    async fn set_status(&self, id: &str, status: AppointmentStatus) -> Result<bool> {
        let result = sqlx::query("UPDATE appointments SET status = ?1 WHERE id = ?2")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[derive(Clone)]
pub enum Store {
    Memory(MemoryStore),
    Sqlite(SqliteStore),
}

impl Store {
    pub fn memory() -> Self {
        Self::Memory(MemoryStore::new())
    }

    pub async fn sqlite(database_url: &str) -> Result<Self> {
        let sqlite = SqliteStore::connect(database_url).await?;
        Ok(Self::Sqlite(sqlite))
    }
}

impl AppointmentRepository for Store {
    async fn append(&self, appointment: &Appointment) -> Result<()> {
        match self {
            Store::Memory(store) => store.append(appointment).await,
            Store::Sqlite(store) => store.append(appointment).await,
        }
    }

    async fn list(&self) -> Result<Vec<Appointment>> {
        match self {
            Store::Memory(store) => store.list().await,
            Store::Sqlite(store) => store.list().await,
        }
    }

    async fn set_status(&self, id: &str, status: AppointmentStatus) -> Result<bool> {
        match self {
            Store::Memory(store) => store.set_status(id, status).await,
            Store::Sqlite(store) => store.set_status(id, status).await,
        }
    }
}
