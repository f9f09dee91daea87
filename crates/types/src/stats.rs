// crates/types/src/stats.rs
//! Stat payload carried by every snapshot.

use serde::{Deserialize, Serialize};

/// Counters for one gamemode.
///
/// Every counter is optional: `None` means the field was never observed,
/// which is not the same thing as `Some(0)`. Serialized as JSON `null` so the
/// distinction survives storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GamemodeStats {
    pub winstreak: Option<i64>,
    pub games_played: Option<i64>,
    pub wins: Option<i64>,
    pub losses: Option<i64>,
    pub beds_broken: Option<i64>,
    pub beds_lost: Option<i64>,
    pub final_kills: Option<i64>,
    pub final_deaths: Option<i64>,
    pub kills: Option<i64>,
    pub deaths: Option<i64>,
}

/// Experience plus the five gamemode blocks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    pub experience: f64,
    #[serde(default)]
    pub solo: GamemodeStats,
    #[serde(default)]
    pub doubles: GamemodeStats,
    #[serde(default)]
    pub threes: GamemodeStats,
    #[serde(default)]
    pub fours: GamemodeStats,
    #[serde(default)]
    pub overall: GamemodeStats,
}
