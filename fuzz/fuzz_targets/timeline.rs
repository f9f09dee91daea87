#![no_main]

use chrono::{DateTime, Duration, TimeZone, Utc};
use libfuzzer_sys::fuzz_target;
use statline_core::{reconstruct_sessions, HistoryPlan, SessionConfig};
use statline_types::{GamemodeStats, PlayerId, PlayerStats, Snapshot};

fn origin() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// Three bytes per snapshot: gap in 15s units, games played since the
/// previous snapshot, and flags (experience bump, games counter hidden).
fn timeline(bytes: &[u8]) -> Vec<Snapshot> {
    let player = PlayerId::parse("00000000-0000-4000-8000-00000000f022").unwrap();
    let mut at = origin();
    let mut games = 0i64;
    let mut experience = 0.0;
    bytes
        .chunks_exact(3)
        .enumerate()
        .map(|(i, chunk)| {
            at += Duration::seconds(15 * (i64::from(chunk[0]) + 1));
            games += i64::from(chunk[1] % 4);
            if chunk[2] & 1 != 0 {
                experience += 12.5;
            }
            Snapshot {
                id: format!("{i:06}"),
                player: player.clone(),
                queried_at: at,
                data_format_version: 1,
                stats: PlayerStats {
                    experience,
                    overall: GamemodeStats {
                        games_played: (chunk[2] & 2 == 0).then_some(games),
                        ..Default::default()
                    },
                    ..Default::default()
                },
            }
        })
        .collect()
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 6 {
        return;
    }
    let limit = 2 + u32::from(u16::from_le_bytes([data[0], data[1]])) % 999;
    let start = origin() + Duration::minutes(i64::from(data[2]) * 7);
    let end = start + Duration::minutes(1 + i64::from(u16::from_le_bytes([data[3], data[4]])));
    let timeline = timeline(&data[6..]);

    let plan = HistoryPlan::new(start, end, limit).expect("valid plan");
    let points = plan.select_from(&timeline);
    assert!(points.len() <= limit as usize);
    assert!(points.windows(2).all(|p| p[0].queried_at < p[1].queried_at));
    assert!(points.iter().all(|p| p.queried_at >= start && p.queried_at <= end));

    let config = SessionConfig::default();
    let sessions = reconstruct_sessions(&timeline, start, end, &config);
    for session in &sessions {
        assert!(session.start.queried_at < session.end.queried_at);
        assert!(session.start.queried_at >= start && session.end.queried_at <= end);
    }
    assert!(sessions
        .windows(2)
        .all(|pair| pair[0].end.queried_at <= pair[1].start.queried_at));

    let from = config.read_from(start);
    let window: Vec<_> = timeline
        .iter()
        .filter(|s| s.queried_at >= from && s.queried_at <= end)
        .cloned()
        .collect();
    assert_eq!(reconstruct_sessions(&window, start, end, &config), sessions);
});
