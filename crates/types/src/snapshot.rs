// crates/types/src/snapshot.rs
//! Stored snapshots and the projections computed from them.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::{PlayerId, PlayerStats};

/// Truncate a timestamp to the millisecond precision used by the store.
pub fn millis_precision(at: DateTime<Utc>) -> DateTime<Utc> {
    at.trunc_subsecs(3)
}

/// A snapshot as received for ingestion, before it has an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingSnapshot {
    pub queried_at: DateTime<Utc>,
    /// Bumped whenever the shape of `stats` changes upstream.
    pub data_format_version: u32,
    pub stats: PlayerStats,
}

/// One immutable, stored point-in-time capture of a player's stats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// ULID, sortable by creation time.
    pub id: String,
    pub player: PlayerId,
    pub queried_at: DateTime<Utc>,
    pub data_format_version: u32,
    pub stats: PlayerStats,
}

impl Snapshot {
    /// Same format version and equal stats; id, player and timestamp are ignored.
    pub fn same_content(&self, incoming: &IncomingSnapshot) -> bool {
        self.data_format_version == incoming.data_format_version && self.stats == incoming.stats
    }
}

/// A history point is just the snapshot chosen for its bucket.
pub type HistoryPoint = Snapshot;

/// A reconstructed play session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub start: Snapshot,
    pub end: Snapshot,
    /// False when `overall.gamesPlayed` jumped by more than one between two
    /// snapshots of the session, i.e. some game was never observed.
    pub consecutive: bool,
}

impl Session {
    pub fn duration(&self) -> chrono::Duration {
        self.end.queried_at - self.start.queried_at
    }
}
