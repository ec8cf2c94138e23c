//! SQLite-backed step store.

use std::path::Path;

use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use tokio_rusqlite::Connection;
use tracing::debug;
use webscout_core_types::{parse_command_log, serialize_command_log, Command};

use crate::errors::StoreError;
use crate::model::{FlowStep, FlowSummary, StepInput, UpsertOutcome};
use crate::schema::init_schema;

/// Deterministic identity of a flow step: a digest of the flow id, the
/// URL reached, and the command log that led there.
pub fn content_hash(flow: &str, url: &str, command_log: &[Command]) -> String {
    let payload = serde_json::json!({
        "flow": flow,
        "url": url,
        "command_log": command_log,
    });
    blake3::hash(payload.to_string().as_bytes())
        .to_hex()
        .to_string()
}

/// Content-addressed persistence of observed steps and path metadata.
///
/// Writes are last-writer-wins per `(path_id, seq)`; a single explorer
/// instance owns a given path's sequence numbers.
pub struct StepStore {
    conn: Connection,
}

impl StepStore {
    /// Open an in-memory database (tests, demo runs).
    pub async fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Self::with_connection(conn).await
    }

    /// Open or create a file-backed database.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(path)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Self::with_connection(conn).await
    }

    async fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.call(|conn| Ok(init_schema(conn)?))
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Record one `(path, seq)` observation.
    ///
    /// Absent -> insert and return `New`; present with a different DOM
    /// hash -> update in place and return `Changed`; identical ->
    /// refresh the path's `last_seen` and return `Same`.
    pub async fn upsert_step(
        &self,
        path_id: &str,
        seq: u32,
        url: &str,
        dom_snapshot: &str,
        screenshot_ref: &str,
    ) -> Result<UpsertOutcome, StoreError> {
        let dom_hash = blake3::hash(dom_snapshot.as_bytes()).to_hex().to_string();
        let now = Utc::now().to_rfc3339();
        let path_id = path_id.to_string();
        let url = url.to_string();
        let screenshot_ref = screenshot_ref.to_string();

        let outcome = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;

                let existing: Option<String> = tx
                    .query_row(
                        "SELECT dom_hash FROM steps WHERE path_id = ?1 AND seq = ?2",
                        params![path_id, seq],
                        |row| row.get(0),
                    )
                    .optional()?;

                let outcome = match existing {
                    None => {
                        tx.execute(
                            "INSERT INTO steps (path_id, seq, url, dom_hash, screenshot_ref)
                             VALUES (?1, ?2, ?3, ?4, ?5)",
                            params![path_id, seq, url, dom_hash, screenshot_ref],
                        )?;
                        tx.execute(
                            "INSERT INTO paths (path_id, first_seen, last_seen)
                             VALUES (?1, ?2, ?2)
                             ON CONFLICT(path_id) DO NOTHING",
                            params![path_id, now],
                        )?;
                        UpsertOutcome::New
                    }
                    Some(stored) if stored != dom_hash => {
                        tx.execute(
                            "UPDATE steps SET dom_hash = ?3, screenshot_ref = ?4
                             WHERE path_id = ?1 AND seq = ?2",
                            params![path_id, seq, dom_hash, screenshot_ref],
                        )?;
                        UpsertOutcome::Changed
                    }
                    Some(_) => {
                        tx.execute(
                            "UPDATE paths SET last_seen = ?2 WHERE path_id = ?1",
                            params![path_id, now],
                        )?;
                        UpsertOutcome::Same
                    }
                };

                tx.commit()?;
                Ok(outcome)
            })
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        debug!(outcome = ?outcome, "step upserted");
        Ok(outcome)
    }

    /// Refresh a path's `last_seen` timestamp.
    pub async fn touch_path(&self, path_id: &str) -> Result<(), StoreError> {
        let path_id = path_id.to_string();
        let now = Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE paths SET last_seen = ?2 WHERE path_id = ?1",
                    params![path_id, now],
                )?;
                Ok(())
            })
            .await
            .map_err(|e| StoreError::Query(e.to_string()))
    }

    /// Append a step to a flow's content-hashed log. Repeated identical
    /// steps no-op silently on hash collision.
    pub async fn add_step(&self, flow: &str, step: StepInput) -> Result<(), StoreError> {
        let hash = content_hash(flow, &step.url, &step.command_log);
        let command_log = serialize_command_log(&step.command_log);
        let now = Utc::now().to_rfc3339();
        let flow = flow.to_string();

        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;

                tx.execute(
                    "INSERT INTO flows (name) VALUES (?1)
                     ON CONFLICT(name) DO NOTHING",
                    params![flow],
                )?;
                let flow_id: i64 = tx.query_row(
                    "SELECT id FROM flows WHERE name = ?1",
                    params![flow],
                    |row| row.get(0),
                )?;

                tx.execute(
                    "INSERT INTO flow_steps (flow_id, hash, url, screenshot, command_log, recorded_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                     ON CONFLICT(hash) DO NOTHING",
                    params![flow_id, hash, step.url, step.screenshot, command_log, now],
                )?;

                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(|e| StoreError::Query(e.to_string()))
    }

    /// All steps recorded for a flow, in insertion order.
    pub async fn flow_steps(&self, flow: &str) -> Result<Vec<FlowStep>, StoreError> {
        let flow = flow.to_string();
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT s.url, s.screenshot, s.command_log
                     FROM flow_steps s
                     JOIN flows f ON f.id = s.flow_id
                     WHERE f.name = ?1
                     ORDER BY s.id",
                )?;
                let steps = stmt
                    .query_map(params![flow], |row| {
                        let url: String = row.get(0)?;
                        let screenshot: String = row.get(1)?;
                        let raw_log: String = row.get(2)?;
                        Ok((url, screenshot, raw_log))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(steps)
            })
            .await
            .map_err(|e| StoreError::Query(e.to_string()))
            .map(|steps| {
                steps
                    .into_iter()
                    .map(|(url, screenshot, raw_log)| FlowStep {
                        url,
                        screenshot,
                        command_log: parse_command_log(&raw_log),
                    })
                    .collect()
            })
    }

    /// Every recorded flow with its step count.
    pub async fn all_flows(&self) -> Result<Vec<FlowSummary>, StoreError> {
        self.conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT f.name, COUNT(s.id)
                     FROM flows f
                     LEFT JOIN flow_steps s ON s.flow_id = f.id
                     GROUP BY f.id
                     ORDER BY f.id",
                )?;
                let flows = stmt
                    .query_map([], |row| {
                        let name: String = row.get(0)?;
                        let steps: i64 = row.get(1)?;
                        Ok(FlowSummary {
                            name,
                            steps: steps as usize,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(flows)
            })
            .await
            .map_err(|e| StoreError::Query(e.to_string()))
    }

    /// Flows that gained steps since they were last marked documented.
    pub async fn modified_flows(&self) -> Result<Vec<String>, StoreError> {
        self.conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT f.name FROM flows f
                     WHERE f.last_run IS NULL
                        OR EXISTS (
                            SELECT 1 FROM flow_steps s
                            WHERE s.flow_id = f.id AND s.recorded_at > f.last_run
                        )
                     ORDER BY f.id",
                )?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(|e| StoreError::Query(e.to_string()))
    }

    /// Stamp every flow as documented as of now.
    pub async fn mark_all_documented(&self) -> Result<(), StoreError> {
        let now = Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| {
                conn.execute("UPDATE flows SET last_run = ?1", params![now])?;
                Ok(())
            })
            .await
            .map_err(|e| StoreError::Query(e.to_string()))
    }
}
