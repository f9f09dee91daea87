// crates/db/src/ingest.rs
//! Snapshot ingestion with spacing and content dedup.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;
use ulid::Generator;

use statline_core::{IngestOutcome, RequestContext, ValidationError};
use statline_types::{millis_precision, IncomingSnapshot, PlayerId, Snapshot};

use crate::snapshots::{count_newer_than, insert_snapshot, latest_newer_than};
use crate::{parse_player, run_scoped, Database, DbError, DbResult, Operation};

impl Database {
    /// Store `snapshot` for `player` unless it is too close to, or identical
    /// with, what is already stored.
    ///
    /// The checks and the insert run in one `BEGIN IMMEDIATE` transaction, so
    /// concurrent ingestions for the same player see each other's writes.
    /// SQLite has a single writer, so ingestions for different players are
    /// serialized too; each holds the write lock only for its own checks and
    /// insert. Discards are reported through [`IngestOutcome`], not as errors.
    pub async fn ingest(
        &self,
        ctx: &RequestContext,
        player: &str,
        snapshot: &IncomingSnapshot,
    ) -> DbResult<IngestOutcome> {
        let op = Operation::Ingest;
        let player = parse_player(op, player)?;
        let experience = snapshot.stats.experience;
        if !experience.is_finite() {
            return Err(DbError::validation(
                op,
                ValidationError::NonFiniteExperience(experience),
            ));
        }

        let incoming = IncomingSnapshot {
            queried_at: millis_precision(snapshot.queried_at),
            ..snapshot.clone()
        };
        run_scoped(ctx, op, &player, self.ingest_locked(&player, &incoming)).await
    }

    async fn ingest_locked(
        &self,
        player: &PlayerId,
        incoming: &IncomingSnapshot,
    ) -> DbResult<IngestOutcome> {
        let policy = self.timeline.dedup_policy();
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        let newer =
            count_newer_than(&mut tx, player, policy.spacing_cutoff(incoming.queried_at)).await?;
        let latest = if newer == 0 {
            latest_newer_than(&mut tx, player, policy.dedup_cutoff(incoming.queried_at)).await?
        } else {
            None
        };

        if let Some(outcome) = policy.discard_reason(newer, latest.as_ref(), incoming) {
            tx.rollback().await?;
            debug!(
                player = %player,
                queried_at = %incoming.queried_at,
                ?outcome,
                "Snapshot discarded"
            );
            return Ok(outcome);
        }

        let id = self.ids.next()?.to_string();
        let snapshot = Snapshot {
            id: id.clone(),
            player: player.clone(),
            queried_at: incoming.queried_at,
            data_format_version: incoming.data_format_version,
            stats: incoming.stats.clone(),
        };
        insert_snapshot(&mut tx, &snapshot).await?;
        tx.commit().await?;

        debug!(player = %player, queried_at = %incoming.queried_at, %id, "Snapshot stored");
        Ok(IngestOutcome::Stored { id })
    }
}

/// Snapshot ids: ULIDs that keep increasing within this process even when
/// several are minted in the same millisecond.
#[derive(Clone)]
pub(crate) struct SnapshotIds(Arc<Mutex<Generator>>);

impl SnapshotIds {
    pub(crate) fn new() -> Self {
        Self(Arc::new(Mutex::new(Generator::new())))
    }

    fn next(&self) -> DbResult<ulid::Ulid> {
        let mut generator = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(generator.generate()?)
    }
}

impl fmt::Debug for SnapshotIds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SnapshotIds")
    }
}
