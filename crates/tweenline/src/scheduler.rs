//! Frame scheduler
//!
//! Multiplexes every playing tween onto a single frame-clock registration.
//! The scheduler keeps at most one frame request outstanding: it requests a
//! frame lazily when the first tween starts playing and lets the loop lapse
//! once a frame observes an empty active set.
//!
//! The host owns the timing source. When its frame callback fires it calls
//! [`FrameScheduler::step`] with the frame timestamp; the scheduler fans the
//! timestamp out to every active tween in registration order.

use crate::tween::{self, TweenCore};
use std::sync::{Arc, Mutex, OnceLock, Weak};
use tracing::{debug, trace};

// ============================================================================
// Global Scheduler State
// ============================================================================

/// Global scheduler handle for access from anywhere in the application
static GLOBAL_SCHEDULER: OnceLock<SchedulerHandle> = OnceLock::new();

/// Set the global scheduler handle
///
/// This should be called once at startup after creating the [`FrameScheduler`].
///
/// # Panics
///
/// Panics if called more than once.
pub fn set_global_scheduler(handle: SchedulerHandle) {
    if GLOBAL_SCHEDULER.set(handle).is_err() {
        panic!("set_global_scheduler() called more than once");
    }
}

/// Get the global scheduler handle
///
/// # Panics
///
/// Panics if `set_global_scheduler()` has not been called.
pub fn get_scheduler() -> SchedulerHandle {
    GLOBAL_SCHEDULER
        .get()
        .expect("Tween scheduler not initialized. Call set_global_scheduler() at startup.")
        .clone()
}

/// Try to get the global scheduler (returns None if not initialized)
pub fn try_get_scheduler() -> Option<SchedulerHandle> {
    GLOBAL_SCHEDULER.get().cloned()
}

/// Check if the global scheduler has been initialized
pub fn is_scheduler_initialized() -> bool {
    GLOBAL_SCHEDULER.get().is_some()
}

// ============================================================================
// Frame Clock
// ============================================================================

/// Handle for one outstanding frame request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRequest(u64);

impl FrameRequest {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// The single primitive the engine needs from its host: schedule one future
/// invocation of [`FrameScheduler::step`] at the next visual frame, and
/// cancel such a request.
///
/// Frame timestamps passed to `step` must be non-decreasing; the engine does
/// not validate this.
pub trait FrameClock: Send {
    /// Request that the host call `step` once at the next frame.
    fn request_frame(&mut self) -> FrameRequest;

    /// Cancel a previously issued request.
    fn cancel_frame(&mut self, request: FrameRequest);
}

/// A frame clock driven by hand.
///
/// Records requests instead of scheduling anything; the driver (a test, or a
/// host that paces frames itself) takes the pending request and calls
/// [`FrameScheduler::step`] with whatever timestamp it likes.
#[derive(Clone, Default)]
pub struct ManualClock {
    state: Arc<Mutex<ManualClockState>>,
}

#[derive(Default)]
struct ManualClockState {
    next_id: u64,
    pending: Option<FrameRequest>,
    requested: u64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// The outstanding request, if any.
    pub fn pending(&self) -> Option<FrameRequest> {
        self.state.lock().unwrap().pending
    }

    /// Consume the outstanding request, marking it as fired.
    pub fn take_pending(&self) -> Option<FrameRequest> {
        self.state.lock().unwrap().pending.take()
    }

    /// Total number of frame requests issued so far.
    pub fn request_count(&self) -> u64 {
        self.state.lock().unwrap().requested
    }
}

impl FrameClock for ManualClock {
    fn request_frame(&mut self) -> FrameRequest {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        state.requested += 1;
        let request = FrameRequest(state.next_id);
        state.pending = Some(request);
        request
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        let mut state = self.state.lock().unwrap();
        if state.pending == Some(request) {
            state.pending = None;
        }
    }
}

// ============================================================================
// Scheduler
// ============================================================================

/// Internal state of the frame scheduler
struct SchedulerInner {
    clock: Box<dyn FrameClock>,
    /// Active tweens in registration order. Unregistration tombstones the
    /// slot so a pass in flight can skip it; slots are compacted at the end
    /// of each pass.
    active: Vec<Option<Weak<Mutex<TweenCore>>>>,
    /// The one outstanding frame request, if the loop is running.
    frame_request: Option<FrameRequest>,
}

/// The shared per-frame pump that ticks all playing tweens
///
/// Typically one per process, published via [`set_global_scheduler`]. Tweens
/// register themselves on `play()` and drop out on `pause()` or completion.
#[derive(Clone)]
pub struct FrameScheduler {
    inner: Arc<Mutex<SchedulerInner>>,
}

impl FrameScheduler {
    pub fn new(clock: impl FrameClock + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SchedulerInner {
                clock: Box::new(clock),
                active: Vec::new(),
                frame_request: None,
            })),
        }
    }

    /// Get a handle to this scheduler for building tweens against
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Number of tweens currently in the active set
    pub fn active_count(&self) -> usize {
        self.inner.lock().unwrap().active.iter().flatten().count()
    }

    /// Advance every active tween to `timestamp`.
    ///
    /// Called by the host when the frame request fires. Tweens are ticked in
    /// registration order; the set may be mutated mid-pass (a tween pausing
    /// itself, a callback starting another) without upsetting the iteration.
    /// If the active set is empty the loop stops; otherwise the next frame is
    /// requested before returning, so a set that empties during the pass is
    /// only observed as empty on the following frame.
    pub fn step(&self, timestamp: f32) {
        let count = {
            let mut inner = self.inner.lock().unwrap();
            if inner.active.iter().all(Option::is_none) {
                if let Some(request) = inner.frame_request.take() {
                    inner.clock.cancel_frame(request);
                }
                inner.active.clear();
                debug!("frame loop stopped");
                return;
            }
            // the spent request stays in place as the loop-running marker,
            // so a register() from inside the pass does not double-request
            inner.active.len()
        };

        for index in 0..count {
            // re-fetch each slot so entries unregistered earlier in this
            // same pass are skipped
            let slot = {
                let inner = self.inner.lock().unwrap();
                inner.active.get(index).cloned().flatten()
            };
            let Some(weak) = slot else { continue };
            let Some(core) = weak.upgrade() else { continue };
            if tween::drive(&core, timestamp) {
                // paused itself (completion) during this tick
                let mut inner = self.inner.lock().unwrap();
                if let Some(entry) = inner.active.get_mut(index) {
                    *entry = None;
                }
            }
        }

        let mut inner = self.inner.lock().unwrap();
        inner
            .active
            .retain(|slot| slot.as_ref().is_some_and(|weak| weak.strong_count() > 0));
        inner.frame_request = Some(inner.clock.request_frame());
    }
}

/// A weak handle to the frame scheduler
///
/// Passed to tweens at construction. Operations no-op once the scheduler has
/// been dropped.
#[derive(Clone)]
pub struct SchedulerHandle {
    inner: Weak<Mutex<SchedulerInner>>,
}

impl SchedulerHandle {
    /// Add a tween to the active set, starting the frame loop if idle.
    pub(crate) fn register(&self, instance: Weak<Mutex<TweenCore>>) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let mut inner = inner.lock().unwrap();
        let present = inner
            .active
            .iter()
            .flatten()
            .any(|slot| slot.ptr_eq(&instance));
        if !present {
            inner.active.push(Some(instance));
            trace!(active = inner.active.len(), "tween registered");
        }
        if inner.frame_request.is_none() {
            let request = inner.clock.request_frame();
            inner.frame_request = Some(request);
            debug!("frame loop started");
        }
    }

    /// Tombstone a tween's slot. The frame loop keeps running until it
    /// observes an empty set on its next pass.
    pub(crate) fn unregister(&self, instance: &Weak<Mutex<TweenCore>>) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let mut inner = inner.lock().unwrap();
        for slot in inner.active.iter_mut() {
            if slot.as_ref().is_some_and(|weak| weak.ptr_eq(instance)) {
                *slot = None;
                trace!("tween unregistered");
            }
        }
    }

    /// Check if the scheduler is still alive
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}
