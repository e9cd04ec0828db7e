//! Tween instances and playback controls
//!
//! A [`Tween`] advances a set of independently-delayed targets from one
//! numeric value to another over a shared duration, eased by the elastic
//! curve in [`crate::easing`]. The tween owns its state; the scheduler only
//! holds a weak slot while the tween is playing, so dropping a `Tween`
//! simply leaves a dead slot for the frame loop to skip.

use crate::easing::{ease_out_elastic, elastic_period, Elasticity};
use crate::scheduler::SchedulerHandle;
use smallvec::SmallVec;
use std::sync::{Arc, Mutex};

/// Opaque handle for a host-side animated element.
///
/// The engine never interprets the value; it is handed back verbatim through
/// the [`OutputSink`] so the host can route the computed number to whatever
/// visual property it stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetId(u64);

impl TargetId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl From<u64> for TargetId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// Write-only sink the engine pushes computed values into, once per target
/// per settle.
///
/// The sink is invoked with the tween's internal lock held: it must write
/// and return, never call back into the engine.
pub trait OutputSink: Send {
    fn write(&mut self, target: TargetId, value: f32);
}

impl<F> OutputSink for F
where
    F: FnMut(TargetId, f32) + Send,
{
    fn write(&mut self, target: TargetId, value: f32) {
        self(target, value)
    }
}

/// Per-target start delay: one constant for every target, or a closure
/// evaluated per target index at construction.
pub enum Delay {
    Constant(f32),
    PerIndex(Box<dyn Fn(usize) -> f32 + Send>),
}

impl Delay {
    pub fn per_index<F>(f: F) -> Self
    where
        F: Fn(usize) -> f32 + Send + 'static,
    {
        Self::PerIndex(Box::new(f))
    }

    fn resolve(&self, index: usize) -> f32 {
        match self {
            Self::Constant(delay) => *delay,
            Self::PerIndex(f) => f(index),
        }
    }
}

impl From<f32> for Delay {
    fn from(delay: f32) -> Self {
        Self::Constant(delay)
    }
}

impl Default for Delay {
    fn default() -> Self {
        Self::Constant(0.0)
    }
}

/// Snapshot of a tween's observable state, passed to the update callback
/// after every settle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TweenStatus {
    /// Instance-local time of the last settle, in clock units (ms).
    pub current_time: f32,
    /// `current_time / duration * 100`.
    pub progress: f32,
    pub paused: bool,
    pub completed: bool,
    pub reversed: bool,
}

type UpdateFn = Box<dyn FnMut(&TweenStatus) + Send>;

struct TargetSlot {
    target: TargetId,
    delay: f32,
}

/// Builder for a [`Tween`].
///
/// Defaults mirror a plain "do nothing" tween: no targets, `0 -> 0`,
/// 1200ms, no delay, elasticity 500.
pub struct TweenBuilder {
    targets: SmallVec<[TargetId; 4]>,
    from: f32,
    to: f32,
    duration: f32,
    delay: Delay,
    elasticity: Elasticity,
    update: Option<UpdateFn>,
    output: Option<Box<dyn OutputSink>>,
}

impl TweenBuilder {
    pub fn new() -> Self {
        Self {
            targets: SmallVec::new(),
            from: 0.0,
            to: 0.0,
            duration: 1200.0,
            delay: Delay::default(),
            elasticity: Elasticity::default(),
            update: None,
            output: None,
        }
    }

    /// Add one animated target.
    pub fn target(mut self, target: TargetId) -> Self {
        self.targets.push(target);
        self
    }

    /// Add several animated targets.
    pub fn targets<I>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = TargetId>,
    {
        self.targets.extend(targets);
        self
    }

    /// Start value of the interpolation.
    pub fn from(mut self, value: f32) -> Self {
        self.from = value;
        self
    }

    /// End value of the interpolation.
    pub fn to(mut self, value: f32) -> Self {
        self.to = value;
        self
    }

    /// Base duration in clock units (conventionally milliseconds).
    pub fn duration(mut self, duration: f32) -> Self {
        self.duration = duration;
        self
    }

    /// Per-target delay: a constant, or [`Delay::per_index`].
    pub fn delay(mut self, delay: impl Into<Delay>) -> Self {
        self.delay = delay.into();
        self
    }

    /// Raw elasticity coefficient (1-999, larger = less overshoot), or
    /// [`Elasticity::dynamic`] for a live-tunable source.
    pub fn elasticity(mut self, elasticity: impl Into<Elasticity>) -> Self {
        self.elasticity = elasticity.into();
        self
    }

    /// Callback invoked after every settle, including at completion and on
    /// reset. Runs with no engine lock held, so it may control other tweens.
    pub fn on_update<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&TweenStatus) + Send + 'static,
    {
        self.update = Some(Box::new(callback));
        self
    }

    /// Sink the computed per-target values are written to.
    pub fn output<S>(mut self, sink: S) -> Self
    where
        S: OutputSink + 'static,
    {
        self.output = Some(Box::new(sink));
        self
    }

    /// Build the tween, resolving per-target delays and inflating the
    /// duration by the largest delay so every target finishes inside it.
    pub fn build(self, scheduler: SchedulerHandle) -> Tween {
        let targets: SmallVec<[TargetSlot; 4]> = self
            .targets
            .iter()
            .enumerate()
            .map(|(index, &target)| TargetSlot {
                target,
                delay: self.delay.resolve(index),
            })
            .collect();

        let max_delay = targets.iter().map(|slot| slot.delay).fold(0.0_f32, f32::max);
        let duration = if targets.is_empty() {
            self.duration
        } else {
            self.duration + max_delay
        };

        let core = TweenCore {
            targets,
            from: self.from,
            to: self.to,
            duration,
            elasticity: self.elasticity,
            reversed: false,
            paused: true,
            completed: false,
            current_time: 0.0,
            progress: 0.0,
            start_time: None,
            last_time: 0.0,
            update: self.update,
            output: self.output,
        };

        Tween {
            core: Arc::new(Mutex::new(core)),
            scheduler,
        }
    }
}

impl Default for TweenBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) struct TweenCore {
    targets: SmallVec<[TargetSlot; 4]>,
    from: f32,
    to: f32,
    /// Base duration plus the largest per-target delay.
    duration: f32,
    elasticity: Elasticity,
    reversed: bool,
    paused: bool,
    completed: bool,
    current_time: f32,
    progress: f32,
    /// Engine timestamp anchoring the current play session; `None` until the
    /// first tick after `play()`/`reverse()`.
    start_time: Option<f32>,
    /// Instance-local time carried over across pause/resume boundaries.
    last_time: f32,
    update: Option<UpdateFn>,
    output: Option<Box<dyn OutputSink>>,
}

impl TweenCore {
    fn adjust_time(&self, time: f32) -> f32 {
        if self.reversed {
            self.duration - time
        } else {
            time
        }
    }

    fn tick(&mut self, timestamp: f32) -> TweenStatus {
        let start = *self.start_time.get_or_insert(timestamp);
        let engine_time = self.last_time + (timestamp - start);
        self.advance(engine_time)
    }

    /// Map cumulative engine time onto a settle, snapping to the boundary
    /// exactly once, and flip into the completed state when the session has
    /// run out the duration.
    ///
    /// Returns the snapshot the update callback should observe: captured
    /// after the settle but before the completion transition, matching what
    /// a callback sees mid-flight.
    fn advance(&mut self, engine_time: f32) -> TweenStatus {
        let ins_time = self.adjust_time(engine_time);
        if ins_time < self.duration {
            self.settle(ins_time);
        } else if self.current_time != self.duration || self.duration == 0.0 {
            self.settle(self.duration);
        }
        let status = self.status();
        if engine_time >= self.duration {
            self.paused = true;
            self.completed = true;
            // next play() restarts the local clock from zero
            self.last_time = 0.0;
        }
        status
    }

    /// Compute and write eased output values for all targets at `ins_time`.
    fn settle(&mut self, ins_time: f32) {
        let period = elastic_period(self.elasticity.sample());
        for slot in &self.targets {
            let elapsed = (ins_time - slot.delay).max(0.0).min(self.duration) / self.duration;
            // 0/0 when the duration is zero: treat as fully settled
            let eased = if elapsed.is_nan() {
                1.0
            } else {
                ease_out_elastic(elapsed, period)
            };
            let value = self.from + eased * (self.to - self.from);
            if let Some(sink) = self.output.as_mut() {
                sink.write(slot.target, value);
            }
        }
        self.current_time = ins_time;
        self.progress = ins_time / self.duration * 100.0;
    }

    fn status(&self) -> TweenStatus {
        TweenStatus {
            current_time: self.current_time,
            progress: self.progress,
            paused: self.paused,
            completed: self.completed,
            reversed: self.reversed,
        }
    }
}

/// Advance one tween to `timestamp` and fire its update callback.
///
/// Returns true if the tween paused itself (reached its duration) during
/// this tick, so the scheduler can drop it from the active set.
pub(crate) fn drive(core: &Arc<Mutex<TweenCore>>, timestamp: f32) -> bool {
    let (status, callback, paused) = {
        let mut core = core.lock().unwrap();
        let status = core.tick(timestamp);
        (status, core.update.take(), core.paused)
    };
    finish_update(core, status, callback);
    paused
}

/// Invoke the update callback outside the instance lock, then hand it back.
///
/// Taking the callback out for the call means a callback that re-enters the
/// engine cannot deadlock; a nested settle during the call simply finds no
/// callback installed and skips it.
fn finish_update(core: &Arc<Mutex<TweenCore>>, status: TweenStatus, callback: Option<UpdateFn>) {
    if let Some(mut callback) = callback {
        callback(&status);
        core.lock().unwrap().update = Some(callback);
    }
}

/// One tween: a set of delayed targets sharing a duration, with
/// play/pause/seek/reverse/reset controls.
///
/// Created through [`TweenBuilder`]. The caller owns the tween; the
/// scheduler only ever holds a weak reference.
pub struct Tween {
    core: Arc<Mutex<TweenCore>>,
    scheduler: SchedulerHandle,
}

impl Tween {
    pub fn builder() -> TweenBuilder {
        TweenBuilder::new()
    }

    /// Resume from the current position. No-op while already playing.
    pub fn play(&self) {
        let armed = {
            let mut core = self.core.lock().unwrap();
            if core.paused {
                core.paused = false;
                core.start_time = None;
                let carried = core.adjust_time(core.current_time);
                core.last_time = carried;
                true
            } else {
                false
            }
        };
        if armed {
            self.scheduler.register(Arc::downgrade(&self.core));
        }
    }

    /// Freeze in place. Idempotent; does not alter progress or completion.
    pub fn pause(&self) {
        self.scheduler.unregister(&Arc::downgrade(&self.core));
        self.core.lock().unwrap().paused = true;
    }

    /// Scrub directly to an absolute instance time, playing or paused.
    ///
    /// Leaves the session anchors untouched, so a `play()` right after a
    /// paused seek resumes from the sought position. Seeking at or past the
    /// duration completes the tween.
    pub fn seek(&self, time: f32) {
        let (status, callback, paused) = {
            let mut core = self.core.lock().unwrap();
            let adjusted = core.adjust_time(time);
            let status = core.advance(adjusted);
            (status, core.update.take(), core.paused)
        };
        finish_update(&self.core, status, callback);
        if paused {
            self.scheduler.unregister(&Arc::downgrade(&self.core));
        }
    }

    /// Return to the start position: time zero, not completed, paused.
    ///
    /// A reversed tween's start is visually the end, so it settles at the
    /// duration instead of zero.
    pub fn reset(&self) {
        self.scheduler.unregister(&Arc::downgrade(&self.core));
        let (status, callback) = {
            let mut core = self.core.lock().unwrap();
            core.paused = true;
            core.current_time = 0.0;
            core.completed = false;
            let rest = if core.reversed { core.duration } else { 0.0 };
            core.settle(rest);
            (core.status(), core.update.take())
        };
        finish_update(&self.core, status, callback);
    }

    /// Back to the start and immediately playing again.
    pub fn restart(&self) {
        self.pause();
        self.reset();
        self.play();
    }

    /// Flip playback direction, continuing smoothly from the current visual
    /// position on the next tick.
    pub fn reverse(&self) {
        let mut core = self.core.lock().unwrap();
        core.reversed = !core.reversed;
        core.start_time = None;
        let carried = core.adjust_time(core.current_time);
        core.last_time = carried;
    }

    pub fn is_paused(&self) -> bool {
        self.core.lock().unwrap().paused
    }

    pub fn is_completed(&self) -> bool {
        self.core.lock().unwrap().completed
    }

    pub fn is_reversed(&self) -> bool {
        self.core.lock().unwrap().reversed
    }

    /// Instance-local time of the last settle.
    pub fn current_time(&self) -> f32 {
        self.core.lock().unwrap().current_time
    }

    /// Progress percentage (0-100).
    pub fn progress(&self) -> f32 {
        self.core.lock().unwrap().progress
    }

    /// Effective duration: base duration plus the largest target delay.
    pub fn duration(&self) -> f32 {
        self.core.lock().unwrap().duration
    }
}

impl Drop for Tween {
    fn drop(&mut self) {
        self.scheduler.unregister(&Arc::downgrade(&self.core));
    }
}
