//! Database schema and migrations for Feedloft.
//!
//! Migrations are applied sequentially when the database is first opened
//! or upgraded.

/// Database migrations.
///
/// Each migration is a SQL script that will be executed in order.
/// The schema_version table tracks which migrations have been applied.
pub const MIGRATIONS: &[&str] = &[
    // v1: Users
    r#"
CREATE TABLE users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    email       TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password    TEXT NOT NULL,           -- Argon2 hash
    name        TEXT NOT NULL,
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);
"#,
    // v2: Feeds, folders and subscriptions
    r#"
CREATE TABLE feeds (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    fetch_url           TEXT NOT NULL UNIQUE,
    url                 TEXT,
    title               TEXT NOT NULL DEFAULT '',
    last_fetched_at     TEXT,
    fetch_error_count   INTEGER NOT NULL DEFAULT 0,
    last_error          TEXT,
    created_at          TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at          TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE folders (
    id                          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id                     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    title                       TEXT NOT NULL,
    subscriptions_updated_at    TEXT NOT NULL DEFAULT (datetime('now')),
    created_at                  TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE(user_id, title)
);

CREATE TABLE feed_subscriptions (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    feed_id     INTEGER NOT NULL REFERENCES feeds(id) ON DELETE CASCADE,
    folder_id   INTEGER REFERENCES folders(id) ON DELETE SET NULL,
    created_at  TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE(user_id, feed_id)
);

CREATE INDEX idx_feed_subscriptions_feed ON feed_subscriptions(feed_id);
CREATE INDEX idx_feed_subscriptions_folder ON feed_subscriptions(folder_id);
"#,
    // v3: Entries, tombstones and per-user read state
    r#"
CREATE TABLE entries (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    feed_id     INTEGER NOT NULL REFERENCES feeds(id) ON DELETE CASCADE,
    guid        TEXT NOT NULL,
    url         TEXT NOT NULL,
    title       TEXT NOT NULL,
    author      TEXT,
    content     TEXT,
    summary     TEXT,
    published   TEXT NOT NULL,
    created_at  TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at  TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE(feed_id, guid)
);

CREATE INDEX idx_entries_feed_published ON entries(feed_id, published DESC);

CREATE TABLE deleted_entries (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    feed_id     INTEGER NOT NULL REFERENCES feeds(id) ON DELETE CASCADE,
    guid        TEXT NOT NULL,
    created_at  TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE(feed_id, guid)
);

CREATE TABLE entry_states (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    read        INTEGER NOT NULL DEFAULT 0,
    user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    entry_id    INTEGER NOT NULL REFERENCES entries(id) ON DELETE CASCADE,
    created_at  TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at  TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE(user_id, entry_id)
);

CREATE INDEX idx_entry_states_entry ON entry_states(entry_id);
"#,
    // v4: Background job state
    r#"
CREATE TABLE subscribe_job_states (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    fetch_url   TEXT NOT NULL,
    state       TEXT NOT NULL DEFAULT 'RUNNING'
                CHECK (state IN ('RUNNING', 'SUCCESS', 'ERROR')),
    feed_id     INTEGER REFERENCES feeds(id) ON DELETE SET NULL,
    created_at  TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_subscribe_job_states_user ON subscribe_job_states(user_id);

CREATE TABLE opml_export_job_states (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     INTEGER NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
    state       TEXT NOT NULL DEFAULT 'NONE'
                CHECK (state IN ('NONE', 'RUNNING', 'SUCCESS', 'ERROR')),
    show_alert  INTEGER NOT NULL DEFAULT 1,
    export_date TEXT,
    opml_data   TEXT,
    created_at  TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
);
"#,
];
