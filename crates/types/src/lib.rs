// crates/types/src/lib.rs
//! Shared domain types for statline: player identities, stat payloads,
//! stored snapshots and the read-time projections built from them.

pub mod player;
pub mod snapshot;
pub mod stats;

pub use player::{PlayerId, PlayerIdError};
pub use snapshot::{millis_precision, HistoryPoint, IncomingSnapshot, Session, Snapshot};
pub use stats::{GamemodeStats, PlayerStats};
