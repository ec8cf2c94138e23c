//! Database schema, created idempotently on open.

use rusqlite::Connection;

pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS paths (
            path_id    TEXT PRIMARY KEY,
            first_seen TEXT NOT NULL,
            last_seen  TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS steps (
            path_id        TEXT NOT NULL,
            seq            INTEGER NOT NULL,
            url            TEXT NOT NULL,
            dom_hash       TEXT NOT NULL,
            screenshot_ref TEXT NOT NULL,
            UNIQUE (path_id, seq)
        );
        CREATE TABLE IF NOT EXISTS flows (
            id       INTEGER PRIMARY KEY AUTOINCREMENT,
            name     TEXT NOT NULL UNIQUE,
            last_run TEXT
        );
        CREATE TABLE IF NOT EXISTS flow_steps (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            flow_id     INTEGER NOT NULL,
            hash        TEXT NOT NULL UNIQUE,
            url         TEXT NOT NULL,
            screenshot  TEXT NOT NULL,
            command_log TEXT NOT NULL,
            recorded_at TEXT NOT NULL,
            FOREIGN KEY (flow_id) REFERENCES flows(id)
        );",
    )
}
