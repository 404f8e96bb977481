//! Local store of tracked bindings.
//!
//! Plays the role the host's state file played in the declarative setup:
//! `list` and drift inspection work without a remote call. Every successful
//! set/status/import refreshes the row; unset deletes it. The remote listing
//! is always authoritative.

use std::{
    fs,
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
};

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OpenFlags, Row, params};
use serde::Serialize;

use crate::binding::{BindingId, BindingState};

/// One tracked binding with the state from its last refresh.
#[derive(Debug, Clone, Serialize)]
pub struct BindingRecord {
    /// Persisted identifier, `app::cname::issuer`.
    pub id: String,
    pub app: String,
    pub cname: String,
    pub issuer: String,
    pub routers: Vec<String>,
    pub certificates: Vec<String>,
    pub ready: bool,
    /// Earliest leaf expiry across `certificates`, when parseable.
    pub not_after: Option<DateTime<Utc>>,
    pub refreshed_at: DateTime<Utc>,
}

impl BindingRecord {
    pub fn from_state(id: &BindingId, state: &BindingState) -> Self {
        Self {
            id: id.compose(),
            app: id.app.clone(),
            cname: id.cname.clone(),
            issuer: id.issuer.clone(),
            routers: state.routers.clone(),
            certificates: state.certificates.clone(),
            ready: state.ready,
            not_after: crate::certinfo::earliest_expiry(&state.certificates),
            refreshed_at: Utc::now(),
        }
    }
}

/// SQLite-based storage for tracked bindings. All access goes through a
/// mutex-guarded connection.
#[derive(Clone)]
pub struct BindingStore {
    conn: Arc<Mutex<Connection>>,
}

impl BindingStore {
    /// Opens (creating if needed) `bindings.sqlite` under `data_dir`.
    pub fn initialize(data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir)?;

        let db_path = data_dir.join("bindings.sqlite");
        let conn = Connection::open_with_flags(
            &db_path,
            OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_FULL_MUTEX,
        )
        .with_context(|| format!("failed to open SQLite database at {}", db_path.display()))?;

        Self::configure_connection(&conn)?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn initialize_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn configure_connection(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA foreign_keys = ON;
            "#,
        )?;
        Ok(())
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS bindings (
                id TEXT PRIMARY KEY,
                app TEXT NOT NULL,
                cname TEXT NOT NULL,
                issuer TEXT NOT NULL,
                routers TEXT NOT NULL,
                certificates TEXT NOT NULL,
                ready INTEGER NOT NULL,
                not_after TEXT,
                refreshed_at TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    pub fn upsert(&self, record: &BindingRecord) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO bindings (
                id, app, cname, issuer, routers, certificates, ready, not_after, refreshed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                record.id,
                record.app,
                record.cname,
                record.issuer,
                serde_json::to_string(&record.routers)?,
                serde_json::to_string(&record.certificates)?,
                record.ready as i64,
                record.not_after.map(|ts| ts.to_rfc3339()),
                record.refreshed_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Option<BindingRecord>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, app, cname, issuer, routers, certificates, ready, not_after, refreshed_at
            FROM bindings
            WHERE id = ?1
            "#,
        )?;

        let mut rows = stmt.query(params![id])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::row_to_record(row)?))
        } else {
            Ok(None)
        }
    }

    /// All tracked bindings, soonest-expiring certificates first.
    pub fn list(&self) -> Result<Vec<BindingRecord>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, app, cname, issuer, routers, certificates, ready, not_after, refreshed_at
            FROM bindings
            ORDER BY not_after IS NULL, not_after ASC, id ASC
            "#,
        )?;

        let mut rows = stmt.query([])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(Self::row_to_record(row)?);
        }
        Ok(records)
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute("DELETE FROM bindings WHERE id = ?1", params![id])?;
        Ok(())
    }

    fn row_to_record(row: &Row<'_>) -> Result<BindingRecord> {
        let id: String = row.get(0)?;
        let app: String = row.get(1)?;
        let cname: String = row.get(2)?;
        let issuer: String = row.get(3)?;
        let routers_raw: String = row.get(4)?;
        let certificates_raw: String = row.get(5)?;
        let ready: i64 = row.get(6)?;
        let not_after_raw: Option<String> = row.get(7)?;
        let refreshed_at_raw: String = row.get(8)?;

        let not_after = not_after_raw
            .map(|raw| {
                DateTime::parse_from_rfc3339(&raw)
                    .map(|ts| ts.with_timezone(&Utc))
                    .context("failed to parse not_after timestamp")
            })
            .transpose()?;
        let refreshed_at = DateTime::parse_from_rfc3339(&refreshed_at_raw)
            .map(|ts| ts.with_timezone(&Utc))
            .context("failed to parse refreshed_at timestamp")?;

        Ok(BindingRecord {
            id,
            app,
            cname,
            issuer,
            routers: serde_json::from_str(&routers_raw).context("failed to deserialize routers")?,
            certificates: serde_json::from_str(&certificates_raw)
                .context("failed to deserialize certificates")?,
            ready: ready != 0,
            not_after,
            refreshed_at,
        })
    }

    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|err| anyhow!("SQLite connection poisoned: {err}"))
    }
}
