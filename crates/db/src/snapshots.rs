// crates/db/src/snapshots.rs
//! Row mapping and store queries for the `player_snapshots` table.
//!
//! Every query is scoped to one player and takes a `&mut SqliteConnection`,
//! so the same helper runs on a pooled connection or inside an ingestion
//! transaction. Timestamps are stored as unix milliseconds and the stats as
//! their JSON encoding, which keeps absent fields distinct from zero.

use chrono::{DateTime, Utc};
use sqlx::{Row, SqliteConnection};

use statline_core::{RequestContext, ValidationError};
use statline_types::{millis_precision, PlayerId, PlayerStats, Snapshot};

use crate::{parse_player, run_scoped, Database, DbError, DbResult, Operation};

#[derive(Debug)]
pub(crate) struct SnapshotRow {
    id: String,
    player_uuid: String,
    queried_at: i64,
    data_format_version: i64,
    player_data: String,
}

impl<'r> sqlx::FromRow<'r, sqlx::sqlite::SqliteRow> for SnapshotRow {
    fn from_row(row: &'r sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            player_uuid: row.try_get("player_uuid")?,
            queried_at: row.try_get("queried_at")?,
            data_format_version: row.try_get("data_format_version")?,
            player_data: row.try_get("player_data")?,
        })
    }
}

impl SnapshotRow {
    pub(crate) fn into_snapshot(self) -> DbResult<Snapshot> {
        let corrupt = |reason: String| DbError::Corrupt {
            id: self.id.clone(),
            reason,
        };
        let player = PlayerId::parse(&self.player_uuid).map_err(|e| corrupt(e.to_string()))?;
        let queried_at = DateTime::<Utc>::from_timestamp_millis(self.queried_at)
            .ok_or_else(|| corrupt(format!("timestamp {} out of range", self.queried_at)))?;
        let data_format_version = u32::try_from(self.data_format_version).map_err(|_| {
            corrupt(format!(
                "data format version {} out of range",
                self.data_format_version
            ))
        })?;
        let stats: PlayerStats = serde_json::from_str(&self.player_data)
            .map_err(|e| corrupt(format!("player data: {e}")))?;

        Ok(Snapshot {
            id: self.id,
            player,
            queried_at,
            data_format_version,
            stats,
        })
    }
}

fn millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

fn decode_all(rows: Vec<SnapshotRow>) -> DbResult<Vec<Snapshot>> {
    rows.into_iter().map(SnapshotRow::into_snapshot).collect()
}

pub(crate) async fn insert_snapshot(conn: &mut SqliteConnection, snapshot: &Snapshot) -> DbResult<()> {
    let player_data = serde_json::to_string(&snapshot.stats).map_err(|e| DbError::Corrupt {
        id: snapshot.id.clone(),
        reason: format!("player data: {e}"),
    })?;

    sqlx::query(
        r#"
        INSERT INTO player_snapshots (id, player_uuid, queried_at, data_format_version, player_data)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(&snapshot.id)
    .bind(snapshot.player.as_str())
    .bind(millis(snapshot.queried_at))
    .bind(i64::from(snapshot.data_format_version))
    .bind(player_data)
    .execute(conn)
    .await?;
    Ok(())
}

/// Number of snapshots stored strictly after `after`.
pub(crate) async fn count_newer_than(
    conn: &mut SqliteConnection,
    player: &PlayerId,
    after: DateTime<Utc>,
) -> DbResult<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM player_snapshots WHERE player_uuid = ?1 AND queried_at > ?2",
    )
    .bind(player.as_str())
    .bind(millis(after))
    .fetch_one(conn)
    .await?;
    Ok(count)
}

/// Latest snapshot stored strictly after `after`.
pub(crate) async fn latest_newer_than(
    conn: &mut SqliteConnection,
    player: &PlayerId,
    after: DateTime<Utc>,
) -> DbResult<Option<Snapshot>> {
    let row: Option<SnapshotRow> = sqlx::query_as(
        r#"
        SELECT id, player_uuid, queried_at, data_format_version, player_data
        FROM player_snapshots
        WHERE player_uuid = ?1 AND queried_at > ?2
        ORDER BY queried_at DESC
        LIMIT 1
        "#,
    )
    .bind(player.as_str())
    .bind(millis(after))
    .fetch_optional(conn)
    .await?;
    row.map(SnapshotRow::into_snapshot).transpose()
}

/// Earliest snapshot in the half-open range `[from, to)`.
pub(crate) async fn earliest_in_range(
    conn: &mut SqliteConnection,
    player: &PlayerId,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> DbResult<Option<Snapshot>> {
    let row: Option<SnapshotRow> = sqlx::query_as(
        r#"
        SELECT id, player_uuid, queried_at, data_format_version, player_data
        FROM player_snapshots
        WHERE player_uuid = ?1 AND queried_at >= ?2 AND queried_at < ?3
        ORDER BY queried_at ASC
        LIMIT 1
        "#,
    )
    .bind(player.as_str())
    .bind(millis(from))
    .bind(millis(to))
    .fetch_optional(conn)
    .await?;
    row.map(SnapshotRow::into_snapshot).transpose()
}

/// Latest snapshot in the closed range `[from, to]`.
pub(crate) async fn latest_in_range(
    conn: &mut SqliteConnection,
    player: &PlayerId,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> DbResult<Option<Snapshot>> {
    let row: Option<SnapshotRow> = sqlx::query_as(
        r#"
        SELECT id, player_uuid, queried_at, data_format_version, player_data
        FROM player_snapshots
        WHERE player_uuid = ?1 AND queried_at BETWEEN ?2 AND ?3
        ORDER BY queried_at DESC
        LIMIT 1
        "#,
    )
    .bind(player.as_str())
    .bind(millis(from))
    .bind(millis(to))
    .fetch_optional(conn)
    .await?;
    row.map(SnapshotRow::into_snapshot).transpose()
}

/// All snapshots in the closed range `[from, to]`, ascending.
pub(crate) async fn select_in_range(
    conn: &mut SqliteConnection,
    player: &PlayerId,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> DbResult<Vec<Snapshot>> {
    let rows: Vec<SnapshotRow> = sqlx::query_as(
        r#"
        SELECT id, player_uuid, queried_at, data_format_version, player_data
        FROM player_snapshots
        WHERE player_uuid = ?1 AND queried_at BETWEEN ?2 AND ?3
        ORDER BY queried_at ASC
        "#,
    )
    .bind(player.as_str())
    .bind(millis(from))
    .bind(millis(to))
    .fetch_all(conn)
    .await?;
    decode_all(rows)
}

impl Database {
    /// Every stored snapshot for `player` in `[start, end]`, ascending.
    pub async fn timeline(
        &self,
        ctx: &RequestContext,
        player: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<Vec<Snapshot>> {
        let op = Operation::Timeline;
        let player = parse_player(op, player)?;
        let (start, end) = (millis_precision(start), millis_precision(end));
        if end < start {
            return Err(DbError::validation(op, ValidationError::empty_range(start, end)));
        }
        run_scoped(ctx, op, &player, self.load_range(&player, start, end)).await
    }

    pub(crate) async fn load_range(
        &self,
        player: &PlayerId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<Vec<Snapshot>> {
        let mut conn = self.pool.acquire().await?;
        select_in_range(&mut conn, player, from, to).await
    }
}
