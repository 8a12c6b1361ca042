// src/device.rs - Output device boundary

use crate::axis::AxisValue;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct DeviceWriteError(String);

impl DeviceWriteError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// One tick's worth of axis updates, in supplier invocation order. How this
/// is encoded on the wire is the device's business.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceUpdate {
    channels: Vec<(String, AxisValue)>,
}

impl DeviceUpdate {
    pub(crate) fn push(&mut self, axis: String, value: AxisValue) {
        self.channels.push((axis, value));
    }

    pub fn channels(&self) -> &[(String, AxisValue)] {
        &self.channels
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

/// Sink for per-tick axis updates. The scheduler calls `write` once per tick
/// per registered device; a failed write is logged and isolated, it never
/// aborts the batch for the other devices.
#[async_trait]
pub trait OutputDevice: Send {
    fn name(&self) -> &str;
    async fn write(&mut self, update: &DeviceUpdate) -> Result<(), DeviceWriteError>;
}

/// Reference device that reports every update through tracing. Useful when
/// bringing a configuration up without hardware attached.
pub struct TraceDevice {
    name: String,
}

impl TraceDevice {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl OutputDevice for TraceDevice {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(&mut self, update: &DeviceUpdate) -> Result<(), DeviceWriteError> {
        for (axis, value) in update.channels() {
            match value {
                AxisValue::Scalar(v) => tracing::debug!("[{}] {} = {:.4}", self.name, axis, v),
                AxisValue::Switch(on) => tracing::debug!("[{}] {} = {}", self.name, axis, on),
            }
        }
        Ok(())
    }
}
