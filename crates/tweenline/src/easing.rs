//! Elastic easing for tween progress

use std::f64::consts::TAU;

/// Easing period derived from a raw elasticity coefficient.
///
/// Raw elasticity is clamped to `1..=999`. Values near 1 produce a long
/// period (pronounced overshoot and oscillation); values near 999 produce a
/// period close to 0, which behaves like a plain ease-out.
pub fn elastic_period(raw: f32) -> f32 {
    (1000.0 - raw.max(1.0).min(999.0)) / 1000.0
}

/// Elastic ease-out curve: the ease-in kernel played backward.
///
/// `t` is the elapsed fraction, already clamped to `[0, 1]` by the caller.
/// `ease_out_elastic(0, p) == 0` and `ease_out_elastic(1, p) == 1` for any
/// valid period; in between the curve may overshoot past 1 depending on the
/// period.
///
/// Computes in f64 internally to avoid f32 precision jitter at 120fps.
pub fn ease_out_elastic(t: f32, period: f32) -> f32 {
    (1.0 - elastic_in(1.0 - t as f64, period as f64)) as f32
}

/// Elastic ease-in kernel; identity at both endpoints.
fn elastic_in(t: f64, period: f64) -> f64 {
    if t == 0.0 || t == 1.0 {
        return t;
    }
    // (p / 2π) · asin(1) reduces to p/4
    let offset = period / 4.0;
    -(2.0_f64.powf(10.0 * (t - 1.0))) * (((t - 1.0) - offset) * TAU / period).sin()
}

/// Elasticity source for a tween: a constant coefficient, or a closure
/// re-sampled on every settle so springiness can be tuned while the tween
/// is running.
pub enum Elasticity {
    Constant(f32),
    Dynamic(Box<dyn FnMut() -> f32 + Send>),
}

impl Elasticity {
    /// Wrap a closure that supplies the raw coefficient each settle.
    pub fn dynamic<F>(f: F) -> Self
    where
        F: FnMut() -> f32 + Send + 'static,
    {
        Self::Dynamic(Box::new(f))
    }

    /// Current raw coefficient (unclamped).
    pub fn sample(&mut self) -> f32 {
        match self {
            Self::Constant(value) => *value,
            Self::Dynamic(f) => f(),
        }
    }
}

impl From<f32> for Elasticity {
    fn from(value: f32) -> Self {
        Self::Constant(value)
    }
}

impl Default for Elasticity {
    fn default() -> Self {
        Self::Constant(500.0)
    }
}
