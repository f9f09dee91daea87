//! Cancellation, deadlines and concurrent ingestion.

use std::time::Duration;

use pretty_assertions::assert_eq;
use statline_core::{Config, IngestOutcome, Interrupted, RequestContext};
use statline_db::{Database, DbError};
use statline_types::IncomingSnapshot;

mod timeline_shared;
use timeline_shared::{at, incoming, ingest_all, stats, stored_count, t0, PLAYER};

fn interrupted_by(err: &DbError) -> Option<Interrupted> {
    match err {
        DbError::Interrupted { reason, .. } => Some(*reason),
        _ => None,
    }
}

// ============================================================================
// Cancellation and deadlines
// ============================================================================

#[tokio::test]
async fn test_cancelled_ingest_writes_nothing() {
    let db = Database::new_in_memory().await.unwrap();
    let ctx = RequestContext::new();
    ctx.cancel();

    let err = db.ingest(&ctx, PLAYER, &incoming(0, 1)).await.unwrap_err();
    assert!(err.is_interrupted());
    assert!(!err.is_retriable());
    assert_eq!(interrupted_by(&err), Some(Interrupted::Cancelled));
    assert_eq!(err.to_string(), format!("ingest for player {PLAYER} cancelled"));
    assert_eq!(stored_count(&db).await, 0);
}

#[tokio::test]
async fn test_expired_deadline_interrupts_every_operation() {
    let db = Database::new_in_memory().await.unwrap();
    ingest_all(&db, PLAYER, &[(0, 1), (10, 2)]).await;
    let ctx = RequestContext::with_timeout(Duration::ZERO);

    let err = db.ingest(&ctx, PLAYER, &incoming(20, 3)).await.unwrap_err();
    assert_eq!(interrupted_by(&err), Some(Interrupted::DeadlineExceeded));
    let err = db
        .get_history(&ctx, PLAYER, t0(), at(60), 10)
        .await
        .unwrap_err();
    assert_eq!(interrupted_by(&err), Some(Interrupted::DeadlineExceeded));
    let err = db.get_sessions(&ctx, PLAYER, t0(), at(60)).await.unwrap_err();
    assert_eq!(interrupted_by(&err), Some(Interrupted::DeadlineExceeded));
    let err = db.timeline(&ctx, PLAYER, t0(), at(60)).await.unwrap_err();
    assert_eq!(interrupted_by(&err), Some(Interrupted::DeadlineExceeded));

    assert_eq!(stored_count(&db).await, 2);
}

#[tokio::test]
async fn test_validation_is_reported_before_interruption() {
    let db = Database::new_in_memory().await.unwrap();
    let ctx = RequestContext::new();
    ctx.cancel();

    let err = db
        .get_history(&ctx, PLAYER, t0(), at(60), 1)
        .await
        .unwrap_err();
    assert!(err.is_validation());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_deadline_while_waiting_for_write_lock() {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.database.path = Some(tmp.path().join("locked.db"));
    config.database.busy_timeout_secs = 2;
    let db = Database::from_config(&config).await.unwrap();

    // Another writer holds the lock for longer than the request may wait.
    let mut holder = db.pool().acquire().await.unwrap();
    sqlx::query("BEGIN IMMEDIATE")
        .execute(&mut *holder)
        .await
        .unwrap();

    let ctx = RequestContext::with_timeout(Duration::from_millis(200));
    let err = db.ingest(&ctx, PLAYER, &incoming(0, 1)).await.unwrap_err();
    assert_eq!(interrupted_by(&err), Some(Interrupted::DeadlineExceeded));

    sqlx::query("ROLLBACK").execute(&mut *holder).await.unwrap();
    drop(holder);
    assert_eq!(stored_count(&db).await, 0);
}

// ============================================================================
// Concurrent ingestion
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_ingest_for_one_player_stores_once() {
    let tmp = tempfile::tempdir().unwrap();
    let db = Database::new(&tmp.path().join("race.db")).await.unwrap();

    // Eight snapshots a few seconds apart, all inside one spacing window.
    let mut handles = Vec::new();
    for i in 0..8i64 {
        let db = db.clone();
        handles.push(tokio::spawn(async move {
            let snapshot = IncomingSnapshot {
                queried_at: t0() + chrono::Duration::seconds(i * 3),
                data_format_version: 1,
                stats: stats(100 + i),
            };
            db.ingest(&RequestContext::new(), PLAYER, &snapshot).await
        }));
    }

    let mut stored = 0;
    let mut too_frequent = 0;
    for handle in handles {
        match handle.await.unwrap().unwrap() {
            IngestOutcome::Stored { .. } => stored += 1,
            IngestOutcome::TooFrequent => too_frequent += 1,
            other => panic!("unexpected outcome {other:?}"),
        }
    }
    assert_eq!(stored, 1);
    assert_eq!(too_frequent, 7);
    assert_eq!(stored_count(&db).await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_ingest_for_many_players_stores_all() {
    let tmp = tempfile::tempdir().unwrap();
    let db = Database::new(&tmp.path().join("fanout.db")).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..16u32 {
        let db = db.clone();
        handles.push(tokio::spawn(async move {
            let player = format!("00000000-0000-4000-8000-{i:012x}");
            db.ingest(&RequestContext::new(), &player, &incoming(0, 5))
                .await
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().unwrap().is_stored());
    }
    assert_eq!(stored_count(&db).await, 16);
}
