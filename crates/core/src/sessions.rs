// crates/core/src/sessions.rs
//! Session reconstruction from a player's snapshot timeline.
//!
//! Two adjacent snapshots form a *link* when they are at most
//! `idle_threshold` apart, and a *changed* pair when their stats differ.
//! Walking the timeline in order:
//!
//! - a gap longer than the idle threshold closes the open session;
//! - unchanged links are absorbed and do not move the session's end;
//! - a changed link extends the open session when it lands within the idle
//!   threshold of the session's last change, otherwise it starts a new
//!   session at its earlier snapshot.
//!
//! A player who sits in the lobby for an hour after their last game therefore
//! starts a new session with their next game, even when the tracker kept
//! polling them in between.

use chrono::{DateTime, Duration, Utc};

use statline_types::{Session, Snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Longest gap, inclusive, that still links two snapshots.
    pub idle_threshold: Duration,
    /// How far before the query start the store read must reach.
    pub lookback: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_threshold: Duration::hours(1),
            lookback: Duration::hours(2),
        }
    }
}

impl SessionConfig {
    /// Earliest timestamp the reconstructor needs to see for a query starting at `start`.
    pub fn read_from(&self, start: DateTime<Utc>) -> DateTime<Utc> {
        start - self.lookback
    }
}

/// Index range `[first, last]` into the timeline; both ends belong to changed pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    first: usize,
    last: usize,
}

/// Reconstruct the sessions visible in `[start, end]`.
///
/// `timeline` must be ascending by `queried_at` and should reach back to
/// [`SessionConfig::read_from`] so that sessions straddling `start` are split
/// the same way they would be in a query covering their whole length.
/// Only snapshots inside `[start, end]` appear in the result.
pub fn reconstruct_sessions(
    timeline: &[Snapshot],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    config: &SessionConfig,
) -> Vec<Session> {
    debug_assert!(timeline
        .windows(2)
        .all(|pair| pair[0].queried_at <= pair[1].queried_at));

    activity_spans(timeline, config.idle_threshold)
        .into_iter()
        .filter_map(|span| clip(timeline, span, start, end))
        .map(|span| Session {
            start: timeline[span.first].clone(),
            end: timeline[span.last].clone(),
            consecutive: is_consecutive(&timeline[span.first..=span.last]),
        })
        .collect()
}

fn is_changed(prev: &Snapshot, next: &Snapshot) -> bool {
    prev.stats != next.stats
}

fn activity_spans(timeline: &[Snapshot], idle_threshold: Duration) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut open: Option<Span> = None;

    for (i, pair) in timeline.windows(2).enumerate() {
        let (prev, next) = (&pair[0], &pair[1]);
        if next.queried_at - prev.queried_at > idle_threshold {
            spans.extend(open.take());
            continue;
        }
        if !is_changed(prev, next) {
            continue;
        }
        match open.as_mut() {
            Some(span) if next.queried_at - timeline[span.last].queried_at <= idle_threshold => {
                span.last = i + 1;
            }
            _ => {
                spans.extend(open.take());
                open = Some(Span {
                    first: i,
                    last: i + 1,
                });
            }
        }
    }

    spans.extend(open);
    spans
}

/// Shrink a span to the changed pairs that lie entirely inside `[start, end]`.
fn clip(timeline: &[Snapshot], span: Span, start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Span> {
    let in_range = |s: &Snapshot| s.queried_at >= start && s.queried_at <= end;
    let qualifies = |i: &usize| {
        let (prev, next) = (&timeline[*i - 1], &timeline[*i]);
        in_range(prev) && in_range(next) && is_changed(prev, next)
    };

    let first_change = (span.first + 1..=span.last).find(qualifies)?;
    let last_change = (span.first + 1..=span.last).rev().find(qualifies)?;
    Some(Span {
        first: first_change - 1,
        last: last_change,
    })
}

/// No jump of more than one game between successive known `overall.gamesPlayed` values.
fn is_consecutive(span: &[Snapshot]) -> bool {
    let mut known = span.iter().filter_map(|s| s.stats.overall.games_played);
    let Some(mut previous) = known.next() else {
        return true;
    };
    for games in known {
        if games - previous > 1 {
            return false;
        }
        previous = games;
    }
    true
}
