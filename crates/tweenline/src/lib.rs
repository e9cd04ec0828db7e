//! Tweenline
//!
//! A minimal frame-driven tween engine: many independently-delayed numeric
//! tweens multiplexed onto one shared frame clock.
//!
//! # Features
//!
//! - **Shared Scheduler**: one frame-callback registration fans out to every
//!   playing tween; starts lazily, stops when the active set empties
//! - **Elastic Easing**: ease-out-elastic with a tunable 1-999 elasticity
//!   coefficient, constant or live-sampled
//! - **Playback Controls**: play, pause, seek, reverse, reset, restart
//! - **Injectable Clock**: the host supplies the frame source; a manual
//!   clock drives tests frame-by-frame

pub mod easing;
pub mod scheduler;
pub mod tween;

pub use easing::{ease_out_elastic, elastic_period, Elasticity};
pub use scheduler::{
    get_scheduler, is_scheduler_initialized, set_global_scheduler, try_get_scheduler, FrameClock,
    FrameRequest, FrameScheduler, ManualClock, SchedulerHandle,
};
pub use tween::{Delay, OutputSink, TargetId, Tween, TweenBuilder, TweenStatus};
