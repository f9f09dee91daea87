// crates/core/src/history.rs
//! Evenly-spaced history downsampling.
//!
//! `[start, end)` is cut into `limit - 1` buckets of (near) equal width `w`.
//! Each bucket contributes its earliest snapshot, if it has one. A final pick
//! takes the latest snapshot in the closed window `[end - w, end]`, so the series
//! always ends on the freshest state known at `end`. Empty buckets leave gaps;
//! nothing is interpolated.

use chrono::{DateTime, Duration, Utc};

use statline_types::{millis_precision, HistoryPoint, Snapshot};

use crate::error::ValidationError;

pub const MIN_LIMIT: u32 = 2;
pub const MAX_LIMIT: u32 = 1000;

/// A time window. Buckets treat `to` as exclusive, the tail window as inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct HistoryPlan {
    width: Duration,
    buckets: Vec<Window>,
    tail: Window,
}

impl HistoryPlan {
    /// Validate the request and lay out the buckets.
    ///
    /// Bounds are truncated to millisecond precision first. Boundaries are
    /// whole milliseconds; when the range is shorter than `limit - 1` ms some
    /// buckets are empty intervals, and the rest still cover `[start, end)`.
    pub fn new(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: u32,
    ) -> Result<Self, ValidationError> {
        if !(MIN_LIMIT..=MAX_LIMIT).contains(&limit) {
            return Err(ValidationError::LimitOutOfRange {
                limit,
                min: MIN_LIMIT,
                max: MAX_LIMIT,
            });
        }
        let (start, end) = (millis_precision(start), millis_precision(end));
        if end <= start {
            return Err(ValidationError::empty_range(start, end));
        }

        let bucket_count = limit - 1;
        let span = (end - start).num_milliseconds();
        // Each boundary is computed from `start` directly so rounding never
        // accumulates and the last bucket ends exactly at `end`.
        let boundary = |i: u32| {
            let offset = i128::from(span) * i128::from(i) / i128::from(bucket_count);
            start + Duration::milliseconds(offset as i64)
        };
        let buckets: Vec<Window> = (0..bucket_count)
            .map(|i| Window {
                from: boundary(i),
                to: boundary(i + 1),
            })
            .collect();
        let tail_from = buckets.last().map_or(start, |last| last.from);

        Ok(Self {
            width: Duration::milliseconds(span / i64::from(bucket_count)),
            buckets,
            tail: Window {
                from: tail_from,
                to: end,
            },
        })
    }

    /// Nominal bucket width, rounded down to whole milliseconds. Individual
    /// buckets may be one millisecond wider.
    pub fn width(&self) -> Duration {
        self.width
    }

    /// Half-open windows, ascending.
    pub fn buckets(&self) -> &[Window] {
        &self.buckets
    }

    /// Closed window for the freshest-at-end pick.
    pub fn tail(&self) -> Window {
        self.tail
    }

    /// Join the per-bucket picks (ascending) with the tail pick.
    ///
    /// The tail pick is always at or after every bucket pick; when it is the
    /// same snapshot as the last bucket pick it is dropped.
    pub fn assemble(mut points: Vec<HistoryPoint>, tail: Option<HistoryPoint>) -> Vec<HistoryPoint> {
        if let Some(tail) = tail {
            if points.last().map(|last| last.id != tail.id).unwrap_or(true) {
                points.push(tail);
            }
        }
        debug_assert!(points
            .windows(2)
            .all(|pair| pair[0].queried_at < pair[1].queried_at));
        points
    }

    /// Run the same selection over an ascending in-memory timeline.
    pub fn select_from(&self, timeline: &[Snapshot]) -> Vec<HistoryPoint> {
        let points = self
            .buckets
            .iter()
            .filter_map(|bucket| {
                let idx = timeline.partition_point(|s| s.queried_at < bucket.from);
                timeline
                    .get(idx)
                    .filter(|s| s.queried_at < bucket.to)
                    .cloned()
            })
            .collect();

        let idx = timeline.partition_point(|s| s.queried_at <= self.tail.to);
        let tail = idx
            .checked_sub(1)
            .map(|i| &timeline[i])
            .filter(|s| s.queried_at >= self.tail.from)
            .cloned();

        Self::assemble(points, tail)
    }
}
