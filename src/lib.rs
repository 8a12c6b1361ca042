// axis_host: movement resolution and synchronized execution for multi-axis
// actuator devices. Callers submit batches of per-axis movement intents; the
// engine validates them, resolves timing across sync chains, and drives a
// fixed-frequency tick loop that advances every axis in lockstep.

pub mod axis;
pub mod config;
pub mod device;
pub mod motion;

pub use axis::{Axis, AxisConfig, AxisConfigError, AxisKind, AxisRegistry, AxisValue};
pub use config::{load_config, AxisSpec, ConfigError, HostConfig};
pub use device::{DeviceUpdate, DeviceWriteError, OutputDevice, TraceDevice};
pub use motion::{
    Movement, MotionController, MotionError, StopHandle, Target, TickContext, Timing,
    ValidationError,
};
