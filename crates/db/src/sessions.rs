// crates/db/src/sessions.rs
use chrono::{DateTime, Utc};
use tracing::debug;

use statline_core::{reconstruct_sessions, RequestContext, ValidationError};
use statline_types::{millis_precision, Session};

use crate::{parse_player, run_scoped, Database, DbError, DbResult, Operation};

impl Database {
    /// Play sessions visible in `[start, end]`, ordered by start.
    ///
    /// The store read reaches back by the configured lookback so a session
    /// that began before `start` is split the same way as in a wider query.
    pub async fn get_sessions(
        &self,
        ctx: &RequestContext,
        player: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<Vec<Session>> {
        let op = Operation::Sessions;
        let player = parse_player(op, player)?;
        let (start, end) = (millis_precision(start), millis_precision(end));
        if end <= start {
            return Err(DbError::validation(op, ValidationError::empty_range(start, end)));
        }

        let config = self.timeline.session_config();
        let timeline =
            run_scoped(ctx, op, &player, self.load_range(&player, config.read_from(start), end))
                .await?;
        let sessions = reconstruct_sessions(&timeline, start, end, &config);

        debug!(
            player = %player,
            snapshots = timeline.len(),
            sessions = sessions.len(),
            "Sessions reconstructed"
        );
        Ok(sessions)
    }
}
