// src/motion/resolve.rs - Two-pass timing resolution over a validated batch

use crate::axis::{AxisKind, AxisRegistry};
use crate::motion::validate::CheckedMovement;
use crate::motion::{Target, Timing, VelocityFn};

/// A movement annotated with everything the scheduler needs: start value,
/// effective duration and speed, step count and velocity direction.
pub struct ResolvedMovement {
    pub(crate) slot: usize,
    pub(crate) axis_name: String,
    pub(crate) kind: AxisKind,
    pub(crate) from: f64,
    pub(crate) target: Target,
    pub(crate) velocity: Option<Box<VelocityFn>>,
    pub duration: Option<f64>,
    pub speed: Option<f64>,
    pub total_steps: Option<u32>,
    pub direction: i8,
}

impl ResolvedMovement {
    pub fn axis(&self) -> &str {
        &self.axis_name
    }
}

impl std::fmt::Debug for ResolvedMovement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedMovement")
            .field("axis", &self.axis_name)
            .field("from", &self.from)
            .field("target", &self.target)
            .field("duration", &self.duration)
            .field("speed", &self.speed)
            .field("total_steps", &self.total_steps)
            .field("direction", &self.direction)
            .finish()
    }
}

/// Resolves effective duration, speed and step count for every movement.
///
/// Pass 1 derives the per-movement values that need no cross-movement
/// context; pass 2 settles sync chains and backfills the batch-wide maximum
/// duration into untimed numeric movements.
pub fn resolve_batch(
    checked: Vec<CheckedMovement>,
    registry: &AxisRegistry,
    frequency_hz: u32,
) -> Vec<ResolvedMovement> {
    let mut sync_slots: Vec<Option<usize>> = Vec::with_capacity(checked.len());
    let mut resolved: Vec<ResolvedMovement> = Vec::with_capacity(checked.len());
    let mut max_duration = 0.0f64;

    for entry in checked {
        let CheckedMovement {
            movement,
            slot,
            axis_name,
            kind,
            sync_slot,
        } = entry;
        let from = registry.get(slot).value().as_f64();
        let mut duration = None;
        let mut speed = None;
        match (&movement.timing, &movement.target) {
            (Timing::Duration(d), Target::Scalar(to)) => {
                duration = Some(*d);
                speed = Some((to - from).abs() / d);
            }
            (Timing::Duration(d), _) => duration = Some(*d),
            (Timing::Speed(s), Target::Scalar(to)) => {
                speed = Some(*s);
                duration = Some((to - from).abs() / s);
            }
            _ => {}
        }
        let direction = match (&movement.velocity, &movement.target) {
            (Some(_), Target::Scalar(to)) => {
                if *to > from {
                    1
                } else if *to < from {
                    -1
                } else {
                    0
                }
            }
            _ => 0,
        };
        if let Some(d) = duration {
            max_duration = max_duration.max(d);
        }
        sync_slots.push(sync_slot);
        resolved.push(ResolvedMovement {
            slot,
            axis_name,
            kind,
            from,
            target: movement.target,
            velocity: movement.velocity,
            duration,
            speed,
            total_steps: None,
            direction,
        });
    }

    // Pass 2: sync adoption, max-duration backfill, step counts.
    for i in 0..resolved.len() {
        let immediate = resolved[i].kind.is_boolean() && !matches!(resolved[i].target, Target::Provider(_));
        if immediate {
            continue;
        }
        if resolved[i].duration.is_none() {
            let adopted = match sync_slots[i] {
                Some(slot) => terminal_duration(&resolved, &sync_slots, slot).unwrap_or(max_duration),
                None => max_duration,
            };
            resolved[i].duration = Some(adopted);
            if let Target::Scalar(to) = resolved[i].target {
                if adopted > 0.0 {
                    resolved[i].speed = Some((to - resolved[i].from).abs() / adopted);
                }
            }
        }
        let duration = resolved[i].duration.unwrap_or(0.0);
        resolved[i].total_steps = Some(if duration > 0.0 {
            ((duration * frequency_hz as f64).round() as u32).max(1)
        } else {
            0
        });
    }
    resolved
}

/// Duration of the terminal (non-syncing) movement a chain ends at. The
/// chain is acyclic by validation, so the walk is finite.
fn terminal_duration(
    resolved: &[ResolvedMovement],
    sync_slots: &[Option<usize>],
    mut slot: usize,
) -> Option<f64> {
    loop {
        // the slot was bound to a batch member during validation
        let i = resolved.iter().position(|m| m.slot == slot)?;
        match sync_slots[i] {
            Some(next) => slot = next,
            None => return resolved[i].duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::{AxisConfig, AxisKind};
    use crate::motion::validate::validate_batch;
    use crate::motion::Movement;

    fn registry() -> AxisRegistry {
        let mut registry = AxisRegistry::new();
        for (name, alias, kind) in [
            ("stroke", Some("L0"), AxisKind::Linear),
            ("twist", Some("R0"), AxisKind::Rotation),
            ("roll", Some("R1"), AxisKind::Rotation),
            ("pitch", Some("R2"), AxisKind::Rotation),
            ("valve", Some("A0"), AxisKind::Boolean),
        ] {
            registry
                .register(AxisConfig {
                    name: name.to_string(),
                    alias: alias.map(str::to_string),
                    kind,
                    min: 0.0,
                    max: 1.0,
                })
                .unwrap();
        }
        registry
    }

    fn resolve(batch: Vec<Movement>, registry: &AxisRegistry, hz: u32) -> Vec<ResolvedMovement> {
        let checked = validate_batch(batch, registry, None).unwrap();
        resolve_batch(checked, registry, hz)
    }

    #[test]
    fn speed_and_duration_derive_each_other() {
        let registry = registry();
        let resolved = resolve(
            vec![
                Movement::to(0.0).on("stroke").speed(1.0),
                Movement::to(1.0).on("twist").duration(2.0),
            ],
            &registry,
            50,
        );
        // stroke: |0.0 - 0.5| / 1.0 = 0.5 s
        assert_eq!(resolved[0].duration, Some(0.5));
        assert_eq!(resolved[0].total_steps, Some(25));
        // twist: |1.0 - 0.5| / 2.0 = 0.25 units/s
        assert_eq!(resolved[1].speed, Some(0.25));
        assert_eq!(resolved[1].total_steps, Some(100));
    }

    #[test]
    fn sync_adopts_the_terminal_duration_transitively() {
        let registry = registry();
        let resolved = resolve(
            vec![
                Movement::to(0.0).on("stroke").speed(1.0),
                Movement::to(1.0).on("twist").sync("stroke"),
                Movement::to(1.0).on("roll").sync("twist"),
                Movement::to(1.0).on("pitch").sync("roll"),
            ],
            &registry,
            50,
        );
        for movement in &resolved {
            assert_eq!(movement.duration, Some(0.5), "axis {}", movement.axis());
            assert_eq!(movement.total_steps, Some(25));
        }
        // twist covers 0.5 units in 0.5 s
        assert_eq!(resolved[1].speed, Some(1.0));
    }

    #[test]
    fn untimed_numeric_movements_adopt_the_batch_maximum() {
        let registry = registry();
        let resolved = resolve(
            vec![
                Movement::to(1.0).on("stroke").duration(2.0),
                Movement::to(0.0).on("twist"),
            ],
            &registry,
            50,
        );
        assert_eq!(resolved[1].duration, Some(2.0));
        assert_eq!(resolved[1].total_steps, Some(100));
    }

    #[test]
    fn zero_delta_speed_movement_resolves_to_zero_steps() {
        let registry = registry();
        let resolved = resolve(vec![Movement::to(0.5).on("stroke").speed(1.0)], &registry, 50);
        assert_eq!(resolved[0].duration, Some(0.0));
        assert_eq!(resolved[0].total_steps, Some(0));
    }

    #[test]
    fn boolean_constant_gets_no_step_count() {
        let registry = registry();
        let resolved = resolve(
            vec![
                Movement::switch(true).on("valve"),
                Movement::to(0.0).on("stroke").duration(1.0),
            ],
            &registry,
            50,
        );
        assert_eq!(resolved[0].duration, None);
        assert_eq!(resolved[0].total_steps, None);
        assert_eq!(resolved[1].total_steps, Some(50));
    }

    #[test]
    fn velocity_direction_follows_the_target_sign() {
        let registry = registry();
        let resolved = resolve(
            vec![
                Movement::to(0.9).on("stroke").duration(1.0).velocity(|_| 0.01),
                Movement::to(0.1).on("twist").duration(1.0).velocity(|_| -0.01),
            ],
            &registry,
            50,
        );
        assert_eq!(resolved[0].direction, 1);
        assert_eq!(resolved[1].direction, -1);
    }

    #[test]
    fn tiny_durations_still_get_one_step() {
        let registry = registry();
        let resolved = resolve(vec![Movement::to(0.6).on("stroke").duration(0.001)], &registry, 50);
        assert_eq!(resolved[0].total_steps, Some(1));
    }
}
