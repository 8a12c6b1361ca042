// src/motion/mod.rs - Movement requests and the motion error taxonomy

pub mod controller;
pub mod resolve;
pub mod supplier;
pub mod validate;

pub use controller::{MotionController, StopHandle};
pub use resolve::ResolvedMovement;
pub use supplier::MovementPlan;
pub use validate::ValidationError;

use thiserror::Error;

/// Snapshot handed to provider and velocity closures, once per tick.
///
/// Suppliers are assumed deterministic given this state; no purity is
/// enforced at runtime.
#[derive(Debug, Clone)]
pub struct TickContext<'a> {
    /// Canonical name of the axis being advanced.
    pub axis: &'a str,
    /// Tracked axis value before this tick, as a scalar.
    pub value: f64,
    /// Zero-based step index of this invocation.
    pub step: u32,
    /// Total steps the movement will run.
    pub total_steps: u32,
    /// Seconds elapsed since the batch started running.
    pub elapsed: f64,
    /// Update frequency of the host, in Hz.
    pub frequency_hz: u32,
    /// Sign of `to - from` for velocity-driven movements, else 0.
    pub direction: i8,
}

/// Caller-supplied function producing the next axis value.
pub type ProviderFn = dyn Fn(&TickContext<'_>) -> f64 + Send;
/// Caller-supplied function producing a per-tick delta.
pub type VelocityFn = dyn Fn(&TickContext<'_>) -> f64 + Send;

/// Where a movement should end up.
pub enum Target {
    /// Constant scalar in [0, 1], for non-boolean axes.
    Scalar(f64),
    /// Constant switch state, for boolean axes.
    Switch(bool),
    /// Dynamic target: the closure is invoked once per tick and its return
    /// value becomes the axis value.
    Provider(Box<ProviderFn>),
}

impl std::fmt::Debug for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Scalar(v) => f.debug_tuple("Scalar").field(v).finish(),
            Target::Switch(on) => f.debug_tuple("Switch").field(on).finish(),
            Target::Provider(_) => f.write_str("Provider(<fn>)"),
        }
    }
}

/// How a movement's timing is specified. Speed, duration and sync are
/// mutually exclusive by construction.
#[derive(Debug, Clone, PartialEq)]
pub enum Timing {
    None,
    /// Units per second, > 0.
    Speed(f64),
    /// Seconds, > 0.
    Duration(f64),
    /// Inherit timing from another axis in the same batch, transitively.
    Sync(String),
}

/// One per-axis movement intent. Build with the constructors, chain the
/// builder methods, submit through `MotionController::move_axes`.
pub struct Movement {
    /// Axis name or alias. `None` falls back to the configured default axis.
    pub axis: Option<String>,
    pub target: Target,
    pub timing: Timing,
    /// Per-tick delta producer; only legal with a constant scalar target.
    pub velocity: Option<Box<VelocityFn>>,
}

impl Movement {
    /// Movement to a constant scalar target.
    pub fn to(value: f64) -> Self {
        Self {
            axis: None,
            target: Target::Scalar(value),
            timing: Timing::None,
            velocity: None,
        }
    }

    /// Movement setting a boolean axis.
    pub fn switch(on: bool) -> Self {
        Self {
            axis: None,
            target: Target::Switch(on),
            timing: Timing::None,
            velocity: None,
        }
    }

    /// Movement driven by a caller-supplied value provider.
    pub fn provider(f: impl Fn(&TickContext<'_>) -> f64 + Send + 'static) -> Self {
        Self {
            axis: None,
            target: Target::Provider(Box::new(f)),
            timing: Timing::None,
            velocity: None,
        }
    }

    pub fn on(mut self, axis: impl Into<String>) -> Self {
        self.axis = Some(axis.into());
        self
    }

    pub fn speed(mut self, units_per_second: f64) -> Self {
        self.timing = Timing::Speed(units_per_second);
        self
    }

    pub fn duration(mut self, seconds: f64) -> Self {
        self.timing = Timing::Duration(seconds);
        self
    }

    pub fn sync(mut self, axis: impl Into<String>) -> Self {
        self.timing = Timing::Sync(axis.into());
        self
    }

    pub fn velocity(mut self, f: impl Fn(&TickContext<'_>) -> f64 + Send + 'static) -> Self {
        self.velocity = Some(Box::new(f));
        self
    }
}

impl std::fmt::Debug for Movement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Movement")
            .field("axis", &self.axis)
            .field("target", &self.target)
            .field("timing", &self.timing)
            .field("velocity", &self.velocity.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum MotionError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("no output devices registered")]
    NoOutputDevices,
    #[error("update frequency must be a positive integer, got {0}")]
    InvalidFrequency(u32),
    #[error("motion cancelled before completion")]
    Cancelled,
}
