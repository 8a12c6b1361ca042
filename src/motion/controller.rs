// src/motion/controller.rs - Batch scheduler and engine facade

use crate::axis::{Axis, AxisConfig, AxisConfigError, AxisKind, AxisRegistry};
use crate::config::{ConfigError, HostConfig};
use crate::device::{DeviceUpdate, OutputDevice};
use crate::motion::resolve::resolve_batch;
use crate::motion::supplier::{build_plans, MovementPlan};
use crate::motion::validate::validate_batch;
use crate::motion::{Movement, MotionError, ValidationError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

const DEFAULT_HOME_VALUE: f64 = 0.5;
const DEFAULT_HOME_SPEED: f64 = 0.5;

#[derive(Debug, Default)]
struct StopSignal {
    requested: AtomicBool,
    notify: Notify,
}

/// Cloneable handle that halts the running batch before its next tick. The
/// interrupted batch fails with `MotionError::Cancelled`; axes stay at their
/// last written value.
#[derive(Debug, Clone)]
pub struct StopHandle {
    signal: Arc<StopSignal>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.signal.requested.store(true, Ordering::SeqCst);
        self.signal.notify.notify_one();
    }
}

/// The engine facade: owns the axis registry, the output devices and the
/// fixed-frequency tick loop. One controller runs one batch at a time;
/// `move_axes` takes `&mut self`, so overlapping submissions are a compile
/// error rather than a runtime hazard.
pub struct MotionController {
    registry: AxisRegistry,
    devices: Vec<Box<dyn OutputDevice>>,
    frequency_hz: u32,
    default_axis: Option<String>,
    stop: Arc<StopSignal>,
}

impl MotionController {
    pub fn new(frequency_hz: u32, default_axis: Option<String>) -> Result<Self, MotionError> {
        if frequency_hz == 0 {
            return Err(MotionError::InvalidFrequency(frequency_hz));
        }
        Ok(Self {
            registry: AxisRegistry::new(),
            devices: Vec::new(),
            frequency_hz,
            default_axis,
            stop: Arc::new(StopSignal::default()),
        })
    }

    /// Builds a controller from a loaded host configuration and registers
    /// every configured axis.
    pub fn from_config(config: &HostConfig) -> Result<Self, ConfigError> {
        let mut controller = Self::new(config.update_rate_hz, config.default_axis.clone())
            .map_err(|_| ConfigError::InvalidUpdateRate)?;
        for axis in config.axis_configs() {
            controller.register_axis(axis)?;
        }
        Ok(controller)
    }

    /// Installs or replaces an axis. Setup-time only in spirit: a registered
    /// axis starts at its default value and is owned by the controller from
    /// here on.
    pub fn register_axis(&mut self, config: AxisConfig) -> Result<(), AxisConfigError> {
        let name = config.name.clone();
        self.registry.register(config)?;
        tracing::info!("Registered axis '{}'", name);
        Ok(())
    }

    pub fn add_device(&mut self, device: Box<dyn OutputDevice>) {
        tracing::info!("Registered output device '{}'", device.name());
        self.devices.push(device);
    }

    pub fn axis(&self, name_or_alias: &str) -> Option<&Axis> {
        self.registry.lookup(name_or_alias)
    }

    pub fn axes(&self) -> Vec<&Axis> {
        self.registry.list()
    }

    pub fn frequency_hz(&self) -> u32 {
        self.frequency_hz
    }

    pub fn default_axis(&self) -> Option<&str> {
        self.default_axis.as_deref()
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            signal: Arc::clone(&self.stop),
        }
    }

    /// Submits one batch of simultaneous movements. Validation happens
    /// before the first tick; the returned future resolves when every
    /// movement has completed, or fails with the error taxonomy of
    /// `MotionError`.
    pub async fn move_axes(&mut self, batch: Vec<Movement>) -> Result<(), MotionError> {
        if self.devices.is_empty() {
            return Err(MotionError::NoOutputDevices);
        }
        let checked = validate_batch(batch, &self.registry, self.default_axis.as_deref())?;
        let resolved = resolve_batch(checked, &self.registry, self.frequency_hz);
        let ticks = resolved
            .iter()
            .filter_map(|m| m.total_steps)
            .max()
            .unwrap_or(0);
        tracing::debug!(
            "Resolved batch of {} movements, {} ticks at {} Hz",
            resolved.len(),
            ticks,
            self.frequency_hz
        );
        let mut plans = build_plans(resolved);
        self.run_batch(&mut plans).await
    }

    /// Moves every linear and rotation axis to `to` (default mid-scale) at
    /// the default homing speed.
    pub async fn home(&mut self, to: Option<f64>) -> Result<(), MotionError> {
        let to = to.unwrap_or(DEFAULT_HOME_VALUE);
        if !to.is_finite() {
            return Err(ValidationError::NonFiniteHome(to).into());
        }
        let batch: Vec<Movement> = self
            .registry
            .list()
            .iter()
            .filter(|axis| matches!(axis.kind, AxisKind::Linear | AxisKind::Rotation))
            .map(|axis| Movement::to(to).on(axis.name.clone()).speed(DEFAULT_HOME_SPEED))
            .collect();
        tracing::info!("Homing {} axes to {:.2}", batch.len(), to);
        self.move_axes(batch).await
    }

    /// The tick loop. Each tick advances every unfinished plan, stores the
    /// new values, then emits one combined update to every device. All
    /// supplier results for a tick are computed before any device write, so
    /// observers never see a partially-updated tick.
    async fn run_batch(&mut self, plans: &mut [MovementPlan]) -> Result<(), MotionError> {
        // re-arm the stop signal; a stale stop() from a previous batch must
        // not cancel this one
        self.stop.requested.store(false, Ordering::SeqCst);
        let period = Duration::from_secs_f64(1.0 / self.frequency_hz as f64);
        let start = tokio::time::Instant::now();
        let mut interval = tokio::time::interval_at(start + period, period);
        let mut tick: u64 = 0;
        loop {
            if plans.iter().all(MovementPlan::is_done) {
                tracing::debug!("Batch completed after {} ticks", tick);
                return Ok(());
            }
            tokio::select! {
                _ = self.stop.notify.notified() => {
                    if self.stop.requested.load(Ordering::SeqCst) {
                        tracing::warn!("Motion batch cancelled after {} ticks", tick);
                        return Err(MotionError::Cancelled);
                    }
                    // stale wakeup from a previous batch's stop
                    continue;
                }
                _ = interval.tick() => {}
            }
            tick += 1;
            let mut update = DeviceUpdate::default();
            for plan in plans.iter_mut() {
                if plan.is_done() {
                    continue;
                }
                let current = self.registry.get(plan.slot).value();
                let next = plan.advance(current, self.frequency_hz);
                self.registry.set_value(plan.slot, next);
                update.push(plan.axis_name.clone(), next);
            }
            if update.is_empty() {
                continue;
            }
            tracing::trace!("Tick {}: {} channels", tick, update.len());
            for device in self.devices.iter_mut() {
                if let Err(e) = device.write(&update).await {
                    tracing::warn!("Output device '{}' write failed: {}", device.name(), e);
                }
            }
        }
    }
}

impl std::fmt::Debug for MotionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MotionController")
            .field("axes", &self.registry.len())
            .field("devices", &self.devices.len())
            .field("frequency_hz", &self.frequency_hz)
            .field("default_axis", &self.default_axis)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_frequency_is_rejected() {
        assert!(matches!(
            MotionController::new(0, None).unwrap_err(),
            MotionError::InvalidFrequency(0)
        ));
    }

    #[test]
    fn batches_need_a_registered_device() {
        let mut controller = MotionController::new(50, None).unwrap();
        controller
            .register_axis(AxisConfig {
                name: "stroke".to_string(),
                alias: None,
                kind: AxisKind::Linear,
                min: 0.0,
                max: 1.0,
            })
            .unwrap();
        let result = tokio_test::block_on(
            controller.move_axes(vec![Movement::to(0.0).on("stroke").speed(1.0)]),
        );
        assert!(matches!(result, Err(MotionError::NoOutputDevices)));
    }
}
