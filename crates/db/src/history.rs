// crates/db/src/history.rs
use chrono::{DateTime, Utc};
use tracing::debug;

use statline_core::{HistoryPlan, RequestContext};
use statline_types::{HistoryPoint, PlayerId};

use crate::snapshots::{earliest_in_range, latest_in_range};
use crate::{parse_player, run_scoped, Database, DbError, DbResult, Operation};

impl Database {
    /// Up to `limit` snapshots evenly spread over `[start, end]`, ascending,
    /// always ending on the latest snapshot of the final window.
    ///
    /// `limit` must be within `2..=1000` and `end` after `start`.
    pub async fn get_history(
        &self,
        ctx: &RequestContext,
        player: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: u32,
    ) -> DbResult<Vec<HistoryPoint>> {
        let op = Operation::History;
        let player = parse_player(op, player)?;
        let plan = HistoryPlan::new(start, end, limit).map_err(|e| DbError::validation(op, e))?;
        run_scoped(ctx, op, &player, self.select_history(&player, &plan)).await
    }

    async fn select_history(
        &self,
        player: &PlayerId,
        plan: &HistoryPlan,
    ) -> DbResult<Vec<HistoryPoint>> {
        let mut conn = self.pool.acquire().await?;

        let mut points = Vec::with_capacity(plan.buckets().len() + 1);
        for bucket in plan.buckets() {
            if let Some(point) = earliest_in_range(&mut conn, player, bucket.from, bucket.to).await? {
                points.push(point);
            }
        }
        let tail = plan.tail();
        let last = latest_in_range(&mut conn, player, tail.from, tail.to).await?;

        let points = HistoryPlan::assemble(points, last);
        debug!(
            player = %player,
            buckets = plan.buckets().len(),
            points = points.len(),
            "History selected"
        );
        Ok(points)
    }
}
