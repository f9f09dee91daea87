// Shared fixtures for the statline-db integration tests.
#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use statline_core::{IngestOutcome, RequestContext, TimelineConfig};
use statline_db::Database;
use statline_types::{GamemodeStats, IncomingSnapshot, PlayerStats};

pub const PLAYER: &str = "a937646b-f115-44c3-8dbf-9ae4a65669a0";
pub const OTHER_PLAYER: &str = "5f1e6c9a-2b3d-4e8f-9a0b-1c2d3e4f5a6b";

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 9, 20, 0, 0).unwrap()
}

pub fn at(minutes: i64) -> DateTime<Utc> {
    t0() + Duration::minutes(minutes)
}

pub fn stats(games: i64) -> PlayerStats {
    PlayerStats {
        experience: 10_000.0 + 35.0 * games as f64,
        overall: GamemodeStats {
            games_played: Some(games),
            wins: Some(games / 2),
            ..Default::default()
        },
        fours: GamemodeStats {
            games_played: Some(games),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn incoming(minutes: i64, games: i64) -> IncomingSnapshot {
    IncomingSnapshot {
        queried_at: at(minutes),
        data_format_version: 1,
        stats: stats(games),
    }
}

/// Timeline windows with content dedup effectively off: nothing can be
/// stored within a second of an earlier snapshot anyway.
pub fn without_dedup() -> TimelineConfig {
    TimelineConfig {
        dedup_window_secs: 1,
        ..TimelineConfig::default()
    }
}

pub async fn ingest(db: &Database, player: &str, minutes: i64, games: i64) -> IngestOutcome {
    db.ingest(&RequestContext::new(), player, &incoming(minutes, games))
        .await
        .unwrap()
}

/// Ingest `(minutes, games)` pairs in order and return the stored ids.
pub async fn ingest_all(db: &Database, player: &str, points: &[(i64, i64)]) -> Vec<String> {
    let mut ids = Vec::new();
    for &(minutes, games) in points {
        match ingest(db, player, minutes, games).await {
            IngestOutcome::Stored { id } => ids.push(id),
            other => panic!("snapshot at +{minutes}m was not stored: {other:?}"),
        }
    }
    ids
}

pub async fn stored_count(db: &Database) -> i64 {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM player_snapshots")
        .fetch_one(db.pool())
        .await
        .unwrap();
    row.0
}
