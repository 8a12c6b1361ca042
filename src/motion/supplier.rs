// src/motion/supplier.rs - Per-movement value suppliers and step bookkeeping

use crate::axis::{AxisKind, AxisValue};
use crate::motion::resolve::ResolvedMovement;
use crate::motion::{ProviderFn, Target, TickContext, VelocityFn};

enum ValueSupplier {
    /// Constant switch state; fires exactly once.
    SwitchConst(bool),
    /// Uniform interpolation towards a constant scalar target.
    Linear { from: f64, to: f64 },
    /// Caller closure producing a per-tick delta on top of the current value.
    Velocity(Box<VelocityFn>),
    /// Caller closure producing the axis value outright.
    Provider(Box<ProviderFn>),
}

/// One movement's supplier paired with its resolved step bookkeeping. The
/// scheduler drives `advance` once per tick until `is_done`.
pub struct MovementPlan {
    pub(crate) slot: usize,
    pub(crate) axis_name: String,
    kind: AxisKind,
    direction: i8,
    supplier: ValueSupplier,
    total_steps: u32,
    step: u32,
    fired: bool,
}

impl MovementPlan {
    fn from_resolved(resolved: ResolvedMovement) -> Self {
        let ResolvedMovement {
            slot,
            axis_name,
            kind,
            from,
            target,
            velocity,
            total_steps,
            direction,
            ..
        } = resolved;
        let (supplier, total_steps) = match (target, velocity) {
            (Target::Switch(on), _) => (ValueSupplier::SwitchConst(on), 0),
            (Target::Provider(f), _) => (ValueSupplier::Provider(f), total_steps.unwrap_or(0)),
            (Target::Scalar(_), Some(f)) => (ValueSupplier::Velocity(f), total_steps.unwrap_or(0)),
            (Target::Scalar(to), None) => (ValueSupplier::Linear { from, to }, total_steps.unwrap_or(0)),
        };
        Self {
            slot,
            axis_name,
            kind,
            direction,
            supplier,
            total_steps,
            step: 0,
            fired: false,
        }
    }

    /// True once this movement needs no further ticks. Single-shot suppliers
    /// are done after their one invocation; zero-step movements are born done.
    pub fn is_done(&self) -> bool {
        match self.supplier {
            ValueSupplier::SwitchConst(_) => self.fired,
            _ => self.step >= self.total_steps,
        }
    }

    /// Computes the next axis value from the current tracked value and bumps
    /// the step index. Must not be called once `is_done` reports true.
    pub fn advance(&mut self, current: AxisValue, frequency_hz: u32) -> AxisValue {
        let ctx = TickContext {
            axis: &self.axis_name,
            value: current.as_f64(),
            step: self.step,
            total_steps: self.total_steps,
            elapsed: self.step as f64 / frequency_hz as f64,
            frequency_hz,
            direction: self.direction,
        };
        let next = match &self.supplier {
            ValueSupplier::SwitchConst(on) => AxisValue::Switch(*on),
            ValueSupplier::Linear { from, to } => {
                let index = self.step + 1;
                // the final step lands on the target itself, so completion
                // is exact regardless of accumulated float error
                let value = if index >= self.total_steps {
                    *to
                } else {
                    from + (to - from) * (index as f64 / self.total_steps as f64)
                };
                AxisValue::Scalar(value)
            }
            ValueSupplier::Velocity(f) => AxisValue::Scalar(ctx.value + f(&ctx)),
            ValueSupplier::Provider(f) => {
                let value = f(&ctx);
                if self.kind.is_boolean() {
                    AxisValue::Switch(value != 0.0)
                } else {
                    AxisValue::Scalar(value)
                }
            }
        };
        self.step = self.step.saturating_add(1);
        self.fired = true;
        next
    }
}

impl std::fmt::Debug for MovementPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let supplier = match self.supplier {
            ValueSupplier::SwitchConst(_) => "SwitchConst",
            ValueSupplier::Linear { .. } => "Linear",
            ValueSupplier::Velocity(_) => "Velocity",
            ValueSupplier::Provider(_) => "Provider",
        };
        f.debug_struct("MovementPlan")
            .field("axis", &self.axis_name)
            .field("supplier", &supplier)
            .field("step", &self.step)
            .field("total_steps", &self.total_steps)
            .finish()
    }
}

/// Builds one plan per resolved movement. The factory never runs ticks.
pub fn build_plans(resolved: Vec<ResolvedMovement>) -> Vec<MovementPlan> {
    resolved.into_iter().map(MovementPlan::from_resolved).collect()
}
