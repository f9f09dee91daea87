// crates/core/src/dedup.rs
//! Ingestion dedup policy.
//!
//! The store answers two questions about a player's timeline and this module
//! decides what they mean:
//!
//! 1. Is anything stored later than `queried_at - min_spacing`? Then the
//!    incoming snapshot is too close to an existing one and is dropped. The
//!    check only looks forward in time, so it also refuses to backfill a point
//!    that sits behind an already-stored later point.
//! 2. Otherwise, what is the latest snapshot later than
//!    `queried_at - dedup_window`? If it has the same format version and equal
//!    stats the incoming snapshot is a pure repeat and is dropped.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use statline_types::{IncomingSnapshot, Snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DedupPolicy {
    pub min_spacing: Duration,
    pub dedup_window: Duration,
}

impl Default for DedupPolicy {
    fn default() -> Self {
        Self {
            min_spacing: Duration::minutes(1),
            dedup_window: Duration::hours(1),
        }
    }
}

/// What ingestion did with a snapshot. Only `Stored` wrote anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum IngestOutcome {
    Stored { id: String },
    /// Another snapshot is stored within the minimum spacing window (or later).
    TooFrequent,
    /// The latest snapshot within the dedup window carries the same data.
    Unchanged { existing_id: String },
}

impl IngestOutcome {
    pub fn is_stored(&self) -> bool {
        matches!(self, Self::Stored { .. })
    }
}

impl DedupPolicy {
    /// Anything stored strictly after this instant blocks the incoming snapshot.
    pub fn spacing_cutoff(&self, queried_at: DateTime<Utc>) -> DateTime<Utc> {
        queried_at - self.min_spacing
    }

    /// The latest snapshot strictly after this instant is compared for equality.
    pub fn dedup_cutoff(&self, queried_at: DateTime<Utc>) -> DateTime<Utc> {
        queried_at - self.dedup_window
    }

    /// Apply both rules to the store's answers. `None` means keep the snapshot.
    pub fn discard_reason(
        &self,
        newer_within_spacing: i64,
        latest_within_window: Option<&Snapshot>,
        incoming: &IncomingSnapshot,
    ) -> Option<IngestOutcome> {
        if newer_within_spacing > 0 {
            return Some(IngestOutcome::TooFrequent);
        }
        match latest_within_window {
            Some(latest) if latest.same_content(incoming) => Some(IngestOutcome::Unchanged {
                existing_id: latest.id.clone(),
            }),
            _ => None,
        }
    }
}
