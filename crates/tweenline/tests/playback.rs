//! Integration tests for the frame loop + tween state machine
//!
//! These tests drive the scheduler through a manual frame clock exactly the
//! way a host would: wait for a frame request, fire `step` with a timestamp,
//! repeat. They verify that:
//! - progress follows the elastic curve and snaps to the boundary exactly
//! - per-target delays hold targets at the start value until their window
//! - pause/resume and reverse carry instance time across session boundaries
//! - the frame loop stops one frame after the last tween completes

use std::sync::{Arc, Mutex};
use tweenline::{
    Delay, FrameScheduler, ManualClock, TargetId, Tween, TweenBuilder,
};

type ValueLog = Arc<Mutex<Vec<(u64, f32)>>>;

fn recording_sink(log: &ValueLog) -> impl FnMut(TargetId, f32) + Send {
    let log = Arc::clone(log);
    move |target: TargetId, value: f32| {
        log.lock().unwrap().push((target.raw(), value));
    }
}

fn last_value_for(log: &ValueLog, target: u64) -> Option<f32> {
    log.lock()
        .unwrap()
        .iter()
        .rev()
        .find(|(id, _)| *id == target)
        .map(|(_, value)| *value)
}

/// Fire one scheduled frame, asserting the loop actually requested it.
fn fire_frame(scheduler: &FrameScheduler, clock: &ManualClock, timestamp: f32) {
    assert!(
        clock.take_pending().is_some(),
        "frame loop should be running"
    );
    scheduler.step(timestamp);
}

#[test]
fn elastic_playback_reaches_the_boundary_exactly() {
    let clock = ManualClock::new();
    let scheduler = FrameScheduler::new(clock.clone());
    let log: ValueLog = Arc::new(Mutex::new(Vec::new()));

    let tween = TweenBuilder::new()
        .target(TargetId::new(1))
        .from(0.0)
        .to(100.0)
        .duration(1000.0)
        .output(recording_sink(&log))
        .build(scheduler.handle());

    tween.play();
    fire_frame(&scheduler, &clock, 0.0);
    assert_eq!(last_value_for(&log, 1), Some(0.0));
    assert_eq!(tween.progress(), 0.0);

    fire_frame(&scheduler, &clock, 16.0);
    let mid = last_value_for(&log, 1).unwrap();
    assert!(mid > 0.0 && mid < 100.0);
    // the elastic curve is nowhere near linear this early
    assert!((mid - 1.6).abs() > 0.5);
    assert!((tween.progress() - 1.6).abs() < 1e-3);

    fire_frame(&scheduler, &clock, 1000.0);
    assert_eq!(last_value_for(&log, 1), Some(100.0));
    assert_eq!(tween.current_time(), 1000.0);
    assert_eq!(tween.progress(), 100.0);
    assert!(tween.is_completed());
    assert!(tween.is_paused());
}

#[test]
fn frame_loop_stops_one_frame_after_completion() {
    let clock = ManualClock::new();
    let scheduler = FrameScheduler::new(clock.clone());
    let tween = TweenBuilder::new()
        .target(TargetId::new(1))
        .to(100.0)
        .duration(100.0)
        .build(scheduler.handle());

    tween.play();
    fire_frame(&scheduler, &clock, 0.0);
    fire_frame(&scheduler, &clock, 150.0);
    assert!(tween.is_completed());

    // completion emptied the set mid-pass; one more frame was still
    // requested, and firing it shuts the loop down
    fire_frame(&scheduler, &clock, 166.0);
    assert!(clock.pending().is_none());
    assert_eq!(scheduler.active_count(), 0);

    let requests = clock.request_count();
    scheduler.step(182.0);
    assert_eq!(clock.request_count(), requests);
}

#[test]
fn delayed_target_holds_until_its_window_opens() {
    let clock = ManualClock::new();
    let scheduler = FrameScheduler::new(clock.clone());
    let log: ValueLog = Arc::new(Mutex::new(Vec::new()));

    let tween = TweenBuilder::new()
        .targets([TargetId::new(1), TargetId::new(2)])
        .from(0.0)
        .to(100.0)
        .duration(1200.0)
        .delay(Delay::per_index(|index| index as f32 * 200.0))
        .output(recording_sink(&log))
        .build(scheduler.handle());

    // base duration inflated by the largest delay
    assert_eq!(tween.duration(), 1400.0);

    tween.seek(100.0);
    assert!(last_value_for(&log, 1).unwrap() > 0.0);
    assert_eq!(last_value_for(&log, 2), Some(0.0));

    tween.seek(200.0);
    assert_eq!(last_value_for(&log, 2), Some(0.0));

    tween.seek(260.0);
    assert!(last_value_for(&log, 2).unwrap() > 0.0);
}

#[test]
fn pause_carries_instance_time_into_the_next_session() {
    let clock = ManualClock::new();
    let scheduler = FrameScheduler::new(clock.clone());
    let tween = TweenBuilder::new()
        .target(TargetId::new(1))
        .to(100.0)
        .duration(1000.0)
        .build(scheduler.handle());

    tween.play();
    fire_frame(&scheduler, &clock, 0.0);
    fire_frame(&scheduler, &clock, 100.0);
    assert_eq!(tween.current_time(), 100.0);

    tween.pause();
    assert!(tween.is_paused());
    assert_eq!(tween.current_time(), 100.0);

    // resume much later: the wall-clock gap while paused does not count
    tween.play();
    fire_frame(&scheduler, &clock, 5000.0);
    assert_eq!(tween.current_time(), 100.0);
    fire_frame(&scheduler, &clock, 5100.0);
    assert_eq!(tween.current_time(), 200.0);
}

#[test]
fn seek_then_play_resumes_from_the_sought_position() {
    let clock = ManualClock::new();
    let scheduler = FrameScheduler::new(clock.clone());
    let tween = TweenBuilder::new()
        .target(TargetId::new(1))
        .to(100.0)
        .duration(1000.0)
        .build(scheduler.handle());

    tween.seek(600.0);
    assert_eq!(tween.current_time(), 600.0);

    tween.play();
    fire_frame(&scheduler, &clock, 0.0);
    assert_eq!(tween.current_time(), 600.0);
    fire_frame(&scheduler, &clock, 100.0);
    assert_eq!(tween.current_time(), 700.0);
}

#[test]
fn reverse_continues_smoothly_and_completes_at_the_visual_start() {
    let clock = ManualClock::new();
    let scheduler = FrameScheduler::new(clock.clone());
    let log: ValueLog = Arc::new(Mutex::new(Vec::new()));

    let tween = TweenBuilder::new()
        .target(TargetId::new(1))
        .from(0.0)
        .to(100.0)
        .duration(1000.0)
        .output(recording_sink(&log))
        .build(scheduler.handle());

    tween.seek(600.0);
    tween.reverse();
    tween.play();

    // no snap: the first tick lands on the position the seek left behind
    fire_frame(&scheduler, &clock, 0.0);
    assert_eq!(tween.current_time(), 600.0);

    // and instance time now runs backward
    fire_frame(&scheduler, &clock, 100.0);
    assert_eq!(tween.current_time(), 500.0);

    // the reversed session runs out its remaining 400ms and settles at the
    // visual start
    fire_frame(&scheduler, &clock, 600.0);
    assert!(tween.is_completed());
    assert_eq!(tween.current_time(), 0.0);
    assert_eq!(last_value_for(&log, 1), Some(0.0));
}

#[test]
fn restart_replays_from_zero() {
    let clock = ManualClock::new();
    let scheduler = FrameScheduler::new(clock.clone());
    let tween = TweenBuilder::new()
        .target(TargetId::new(1))
        .to(100.0)
        .duration(1000.0)
        .build(scheduler.handle());

    tween.seek(1500.0);
    assert!(tween.is_completed());

    tween.restart();
    assert!(!tween.is_completed());
    assert!(!tween.is_paused());
    assert_eq!(tween.current_time(), 0.0);
    assert_eq!(scheduler.active_count(), 1);

    fire_frame(&scheduler, &clock, 0.0);
    fire_frame(&scheduler, &clock, 1000.0);
    assert!(tween.is_completed());
    assert_eq!(tween.progress(), 100.0);
}

#[test]
fn elasticity_extremes_produce_different_motion() {
    let clock = ManualClock::new();
    let scheduler = FrameScheduler::new(clock.clone());
    let log: ValueLog = Arc::new(Mutex::new(Vec::new()));

    let springy = TweenBuilder::new()
        .target(TargetId::new(1))
        .from(0.0)
        .to(100.0)
        .duration(1000.0)
        .elasticity(1.0)
        .output(recording_sink(&log))
        .build(scheduler.handle());
    let stiff = TweenBuilder::new()
        .target(TargetId::new(2))
        .from(0.0)
        .to(100.0)
        .duration(1000.0)
        .elasticity(999.0)
        .output(recording_sink(&log))
        .build(scheduler.handle());

    springy.seek(500.0);
    stiff.seek(500.0);

    let springy_value = last_value_for(&log, 1).unwrap();
    let stiff_value = last_value_for(&log, 2).unwrap();
    assert!((springy_value - stiff_value).abs() > 1.0);
    // minimal elasticity overshoots past the target mid-flight
    assert!(springy_value > 100.0);
    // maximal raw elasticity behaves like a plain ease-out
    assert!(stiff_value < 100.0);
}

#[test]
fn update_callback_may_start_another_tween() {
    let clock = ManualClock::new();
    let scheduler = FrameScheduler::new(clock.clone());

    let follower: Tween = TweenBuilder::new()
        .target(TargetId::new(2))
        .to(50.0)
        .duration(500.0)
        .build(scheduler.handle());

    let leader = TweenBuilder::new()
        .target(TargetId::new(1))
        .to(100.0)
        .duration(1000.0)
        .on_update(move |_status| {
            follower.play();
        })
        .build(scheduler.handle());

    leader.play();
    assert_eq!(scheduler.active_count(), 1);
    fire_frame(&scheduler, &clock, 0.0);
    // the callback registered the follower without deadlocking the pass
    assert_eq!(scheduler.active_count(), 2);
}
