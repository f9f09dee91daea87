/// Inline SQL migrations for the statline database schema.
///
/// We use simple inline migrations rather than sqlx migration files
/// because the schema is small and self-contained.

pub const MIGRATIONS: &[&str] = &[
    // Migration 1: snapshot timeline.
    // queried_at is unix milliseconds; player_data is the JSON-encoded PlayerStats.
    r#"
CREATE TABLE IF NOT EXISTS player_snapshots (
    id TEXT PRIMARY KEY,
    player_uuid TEXT NOT NULL,
    queried_at INTEGER NOT NULL,
    data_format_version INTEGER NOT NULL,
    player_data TEXT NOT NULL
);
"#,
    // Migration 2: every timeline read is (player, time range)
    r#"
CREATE UNIQUE INDEX IF NOT EXISTS idx_player_snapshots_player_time
    ON player_snapshots(player_uuid, queried_at);
"#,
];
