//! Integration tests for the tick scheduler.
//!
//! Uses `start_paused = true` so the Tokio clock only moves when every
//! task is idle (or when a test calls `advance`), which makes one-second
//! ticks instant and exact.

use std::time::Duration;

use quizhall_tick::{TickConfig, TickPolicy, TickScheduler};
use tokio::time::Instant;

const SECOND: Duration = Duration::from_secs(1);

// =========================================================================
// TickConfig
// =========================================================================

#[test]
fn test_default_config_ticks_every_second() {
    let cfg = TickConfig::default();
    assert_eq!(cfg.period, SECOND);
    assert_eq!(cfg.policy, TickPolicy::Skip);
}

#[test]
fn test_validated_clamps_zero_period() {
    let cfg = TickConfig::with_period(Duration::ZERO).validated();
    assert_eq!(cfg.period, TickConfig::MIN_PERIOD);
}

#[test]
fn test_validated_clamps_threshold() {
    let cfg = TickConfig {
        budget_warn_threshold: 3.0,
        ..TickConfig::default()
    }
    .validated();
    assert_eq!(cfg.budget_warn_threshold, 1.0);
}

// =========================================================================
// Firing
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_new_scheduler_state() {
    let s = TickScheduler::new(TickConfig::default());
    assert_eq!(s.tick_count(), 0);
    assert!(!s.is_paused());
    assert_eq!(s.period(), SECOND);
}

#[tokio::test(start_paused = true)]
async fn test_first_tick_fires_one_period_after_creation() {
    let start = Instant::now();
    let mut s = TickScheduler::new(TickConfig::default());

    let info = s.wait_for_tick().await;
    assert_eq!(info.tick, 1);
    assert!(!info.overrun);
    assert_eq!(Instant::now() - start, SECOND);
}

#[tokio::test(start_paused = true)]
async fn test_ticks_increment_monotonically() {
    let start = Instant::now();
    let mut s = TickScheduler::new(TickConfig::default());

    for expected in 1..=5 {
        let info = s.wait_for_tick().await;
        assert_eq!(info.tick, expected);
    }
    assert_eq!(s.tick_count(), 5);
    assert_eq!(Instant::now() - start, 5 * SECOND);
}

// =========================================================================
// Idle / pause / resume
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_idle_scheduler_never_fires() {
    let mut s = TickScheduler::idle(TickConfig::default());
    assert!(s.is_paused());

    let result = tokio::time::timeout(Duration::from_secs(60), s.wait_for_tick()).await;
    assert!(result.is_err(), "idle scheduler should pend");
    assert_eq!(s.tick_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_resume_fires_one_period_after_resume() {
    let mut s = TickScheduler::idle(TickConfig::default());
    tokio::time::sleep(Duration::from_secs(30)).await;

    s.resume();
    let resumed_at = Instant::now();
    let info = s.wait_for_tick().await;

    assert_eq!(info.tick, 1);
    assert!(!info.overrun, "time spent idle is not lateness");
    assert_eq!(Instant::now() - resumed_at, SECOND);
}

#[tokio::test(start_paused = true)]
async fn test_pause_prevents_ticks() {
    let mut s = TickScheduler::new(TickConfig::default());
    s.wait_for_tick().await;

    s.pause();
    let result = tokio::time::timeout(Duration::from_secs(5), s.wait_for_tick()).await;
    assert!(result.is_err(), "paused scheduler should pend");
    assert_eq!(s.tick_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_pause_resume_idempotent() {
    let mut s = TickScheduler::new(TickConfig::default());
    s.pause();
    s.pause();
    assert!(s.is_paused());
    s.resume();
    s.resume();
    assert!(!s.is_paused());
}

// =========================================================================
// Late ticks
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_skip_policy_reports_and_reschedules_from_now() {
    let mut s = TickScheduler::new(TickConfig::default());
    s.wait_for_tick().await;

    // Stall for 3.5 periods: the tick due at +1s fires 2.5s late.
    tokio::time::advance(Duration::from_millis(3500)).await;
    let info = s.wait_for_tick().await;
    assert!(info.overrun);
    assert_eq!(info.ticks_skipped, 2);

    let fired_at = Instant::now();
    s.wait_for_tick().await;
    assert_eq!(Instant::now() - fired_at, SECOND);

    assert_eq!(s.metrics().total_overruns, 1);
    assert_eq!(s.metrics().total_skipped, 2);
}

#[tokio::test(start_paused = true)]
async fn test_drop_policy_keeps_original_cadence() {
    let mut s = TickScheduler::new(TickConfig {
        policy: TickPolicy::Drop,
        ..TickConfig::default()
    });
    s.wait_for_tick().await;

    tokio::time::advance(Duration::from_millis(1500)).await;
    let late = s.wait_for_tick().await;
    assert!(late.overrun);

    // Next deadline is the original +3s mark, already 0.5s away.
    let fired_at = Instant::now();
    s.wait_for_tick().await;
    assert_eq!(Instant::now() - fired_at, Duration::from_millis(500));
}

// =========================================================================
// Metrics
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_metrics_count_ticks() {
    let mut s = TickScheduler::new(TickConfig::default());
    for _ in 0..3 {
        s.wait_for_tick().await;
        s.record_tick_end();
    }
    assert_eq!(s.metrics().total_ticks, 3);
    assert_eq!(s.metrics().total_overruns, 0);
}

#[tokio::test(start_paused = true)]
async fn test_record_tick_end_without_wait_is_noop() {
    let mut s = TickScheduler::new(TickConfig::default());
    s.record_tick_end();
    assert_eq!(s.metrics().max_tick_time, Duration::ZERO);
}

// =========================================================================
// select! loop pattern (mirrors the game actor)
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_select_loop_interleaves_commands_and_ticks() {
    let mut s = TickScheduler::idle(TickConfig::default());
    let (tx, mut rx) = tokio::sync::mpsc::channel::<&str>(10);

    tokio::spawn(async move {
        tx.send("start").await.ok();
        tokio::time::sleep(Duration::from_millis(3500)).await;
        tx.send("stop").await.ok();
    });

    let mut ticks = 0u64;
    loop {
        tokio::select! {
            Some(cmd) = rx.recv() => match cmd {
                "start" => s.resume(),
                _ => break,
            },
            info = s.wait_for_tick() => {
                ticks += 1;
                s.record_tick_end();
                assert_eq!(info.tick, ticks);
            }
        }
    }

    assert_eq!(ticks, 3);
}
