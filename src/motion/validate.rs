// src/motion/validate.rs - Structural validation of a movement batch

use crate::axis::{AxisKind, AxisRegistry};
use crate::motion::{Movement, Target, Timing};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("movement batch is empty")]
    EmptyBatch,
    #[error("unknown axis '{0}'")]
    UnknownAxis(String),
    #[error("movement omits its axis and no default axis is configured")]
    NoDefaultAxis,
    #[error("axis '{0}' is targeted by more than one movement in the batch")]
    DuplicateAxis(String),
    #[error("axis '{axis}': target {value} is outside [0, 1]")]
    TargetOutOfRange { axis: String, value: f64 },
    #[error("axis '{axis}': target kind does not match the axis domain")]
    TargetKindMismatch { axis: String },
    #[error("axis '{axis}': speed must be positive and finite, got {value}")]
    InvalidSpeed { axis: String, value: f64 },
    #[error("axis '{axis}': duration must be positive and finite, got {value}")]
    InvalidDuration { axis: String, value: f64 },
    #[error("axis '{axis}': a provider target needs an explicit duration or a sync reference")]
    ProviderNeedsDuration { axis: String },
    #[error("axis '{axis}': a provider target cannot take a speed")]
    ProviderWithSpeed { axis: String },
    #[error("axis '{axis}': velocity cannot be combined with a provider target")]
    VelocityWithProvider { axis: String },
    #[error("axis '{axis}': sync reference must not be empty")]
    EmptySync { axis: String },
    #[error("axis '{axis}': sync reference '{via}' is not an axis in this batch")]
    SyncUnknownAxis { axis: String, via: String },
    #[error("axis '{axis}': sync chain loops back on itself")]
    SyncCycle { axis: String },
    #[error("axis '{axis}': boolean axes take no speed")]
    BooleanWithSpeed { axis: String },
    #[error("axis '{axis}': boolean axes take no velocity")]
    BooleanWithVelocity { axis: String },
    #[error("axis '{axis}': boolean axes take no duration for a constant target")]
    BooleanWithDuration { axis: String },
    #[error("no movement in the batch specifies a speed or duration")]
    NoTiming,
    #[error("home value must be finite, got {0}")]
    NonFiniteHome(f64),
}

/// A movement bound to its resolved registry slot.
pub struct CheckedMovement {
    pub(crate) movement: Movement,
    pub(crate) slot: usize,
    pub(crate) axis_name: String,
    pub(crate) kind: AxisKind,
    /// Registry slot of the direct sync target, resolved during the chain walk.
    pub(crate) sync_slot: Option<usize>,
}

impl std::fmt::Debug for CheckedMovement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckedMovement")
            .field("axis", &self.axis_name)
            .field("movement", &self.movement)
            .finish()
    }
}

/// Checks a batch against every structural rule before any timing math runs.
/// Returns the movements bound to their axes, in submission order.
pub fn validate_batch(
    batch: Vec<Movement>,
    registry: &AxisRegistry,
    default_axis: Option<&str>,
) -> Result<Vec<CheckedMovement>, ValidationError> {
    if batch.is_empty() {
        return Err(ValidationError::EmptyBatch);
    }
    let mut checked: Vec<CheckedMovement> = Vec::with_capacity(batch.len());
    let mut seen: HashSet<usize> = HashSet::new();
    for movement in batch {
        let key = match movement.axis.as_deref() {
            Some(key) => key,
            None => default_axis.ok_or(ValidationError::NoDefaultAxis)?,
        };
        let slot = registry
            .slot_of(key)
            .ok_or_else(|| ValidationError::UnknownAxis(key.to_string()))?;
        let axis = registry.get(slot);
        if !seen.insert(slot) {
            return Err(ValidationError::DuplicateAxis(axis.name.clone()));
        }
        check_movement(&movement, axis.name.as_str(), axis.kind)?;
        checked.push(CheckedMovement {
            movement,
            slot,
            axis_name: axis.name.clone(),
            kind: axis.kind,
            sync_slot: None,
        });
    }

    resolve_sync_chains(&mut checked, registry)?;

    let has_timing = checked
        .iter()
        .any(|c| matches!(c.movement.timing, Timing::Speed(_) | Timing::Duration(_)));
    let any_numeric = checked.iter().any(|c| !c.kind.is_boolean());
    if !has_timing && any_numeric {
        return Err(ValidationError::NoTiming);
    }
    Ok(checked)
}

fn check_movement(movement: &Movement, axis: &str, kind: AxisKind) -> Result<(), ValidationError> {
    match movement.timing {
        Timing::Speed(value) if !(value.is_finite() && value > 0.0) => {
            return Err(ValidationError::InvalidSpeed {
                axis: axis.to_string(),
                value,
            });
        }
        Timing::Duration(value) if !(value.is_finite() && value > 0.0) => {
            return Err(ValidationError::InvalidDuration {
                axis: axis.to_string(),
                value,
            });
        }
        Timing::Sync(ref target) if target.is_empty() => {
            return Err(ValidationError::EmptySync {
                axis: axis.to_string(),
            });
        }
        _ => {}
    }

    match (&movement.target, kind.is_boolean()) {
        (Target::Scalar(value), false) => {
            if !(value.is_finite() && (0.0..=1.0).contains(&value)) {
                return Err(ValidationError::TargetOutOfRange {
                    axis: axis.to_string(),
                    value,
                });
            }
        }
        (Target::Scalar(_), true) | (Target::Switch(_), false) => {
            return Err(ValidationError::TargetKindMismatch {
                axis: axis.to_string(),
            });
        }
        (Target::Switch(_), true) => {}
        (Target::Provider(_), _) => {
            match movement.timing {
                Timing::Duration(_) | Timing::Sync(_) => {}
                Timing::Speed(_) => {
                    return Err(ValidationError::ProviderWithSpeed {
                        axis: axis.to_string(),
                    });
                }
                Timing::None => {
                    return Err(ValidationError::ProviderNeedsDuration {
                        axis: axis.to_string(),
                    });
                }
            }
            if movement.velocity.is_some() {
                return Err(ValidationError::VelocityWithProvider {
                    axis: axis.to_string(),
                });
            }
        }
    }

    if kind.is_boolean() {
        if matches!(movement.timing, Timing::Speed(_)) {
            return Err(ValidationError::BooleanWithSpeed {
                axis: axis.to_string(),
            });
        }
        if movement.velocity.is_some() {
            return Err(ValidationError::BooleanWithVelocity {
                axis: axis.to_string(),
            });
        }
        if matches!(movement.timing, Timing::Duration(_))
            && matches!(movement.target, Target::Switch(_))
        {
            return Err(ValidationError::BooleanWithDuration {
                axis: axis.to_string(),
            });
        }
    }
    Ok(())
}

/// Walks every sync chain: the referenced axis must belong to the batch and
/// following the chain must never revisit the movement's own axis. Chains are
/// single-successor, so a walk bounded by the batch length is a full cycle
/// check.
fn resolve_sync_chains(
    checked: &mut [CheckedMovement],
    registry: &AxisRegistry,
) -> Result<(), ValidationError> {
    let mut direct: Vec<Option<usize>> = vec![None; checked.len()];
    for (i, entry) in checked.iter().enumerate() {
        let Timing::Sync(ref start) = entry.movement.timing else {
            continue;
        };
        let mut key = start.as_str();
        let mut hops = 0;
        loop {
            let slot = registry.slot_of(key).ok_or_else(|| ValidationError::SyncUnknownAxis {
                axis: entry.axis_name.clone(),
                via: key.to_string(),
            })?;
            if slot == entry.slot {
                return Err(ValidationError::SyncCycle {
                    axis: entry.axis_name.clone(),
                });
            }
            let target = checked.iter().find(|c| c.slot == slot).ok_or_else(|| {
                ValidationError::SyncUnknownAxis {
                    axis: entry.axis_name.clone(),
                    via: key.to_string(),
                }
            })?;
            if hops == 0 {
                direct[i] = Some(slot);
            }
            match target.movement.timing {
                Timing::Sync(ref next) => {
                    hops += 1;
                    if hops > checked.len() {
                        // the chain runs in a circle that excludes this axis
                        return Err(ValidationError::SyncCycle {
                            axis: entry.axis_name.clone(),
                        });
                    }
                    key = next.as_str();
                }
                _ => break,
            }
        }
    }
    for (entry, slot) in checked.iter_mut().zip(direct) {
        entry.sync_slot = slot;
    }
    Ok(())
}
