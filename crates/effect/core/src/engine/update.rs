//! Per-frame time advancement: elapsed accounting, periodic ticks, expiry.

use crate::entity::EntityId;
use crate::events::FeedbackEvent;
use crate::instance::InstanceId;

use super::EffectEngine;

impl EffectEngine {
    /// Advances the whole engine by `dt` milliseconds: scheduled immunity
    /// revocations first, then every tracked entity's active effects.
    pub fn update(&mut self, dt: f32) {
        self.clock += dt;
        self.advance_immunity_timers(dt);
        for entity in self.entities.handles() {
            self.update_entity_effects(entity, dt);
        }
    }

    /// Advances one entity's active effects by `dt` milliseconds.
    ///
    /// Each instance accumulates elapsed time and, while its periodic timer
    /// holds at least one whole interval, fires one full tick per interval.
    /// A slow frame catches up with multiple identical ticks, undamped
    /// unless `EngineConfig::max_catchup_ticks` caps it. An instance whose
    /// duration lapses this frame expires without ticking; expiry wins the
    /// boundary. Expired instances are removed after the scan, never
    /// mid-iteration.
    pub fn update_entity_effects(&mut self, entity: EntityId, dt: f32) {
        let Some(record) = self.entities.get_mut(entity) else {
            return;
        };
        let ids: Vec<InstanceId> = record.effects.active.iter().map(|i| i.id).collect();
        let cap = self.config().max_catchup_ticks;

        for id in ids {
            let mut ticks = 0u32;
            {
                let Some(record) = self.entities.get_mut(entity) else {
                    return;
                };
                let Some(instance) = record.effects.instance_mut(id) else {
                    continue;
                };
                instance.elapsed += dt;
                if instance.is_expired() {
                    continue;
                }
                if let Some(periodic) = instance.periodic {
                    instance.periodic_timer += dt;
                    while instance.periodic_timer >= periodic.interval {
                        if cap.is_some_and(|cap| ticks >= cap) {
                            // Drop the excess whole intervals, keep the phase.
                            instance.periodic_timer %= periodic.interval;
                            break;
                        }
                        instance.periodic_timer -= periodic.interval;
                        ticks += 1;
                    }
                }
            }
            for _ in 0..ticks {
                self.fire_periodic_tick(entity, id);
            }
        }

        let Some(record) = self.entities.get_mut(entity) else {
            return;
        };
        let removed = record.effects.remove_where(|i| i.is_expired());
        for instance in &removed {
            tracing::debug!(%entity, type_id = %instance.type_id, id = %instance.id, "effect expired");
        }
    }

    /// Fires one periodic tick for an instance: applies stack-scaled damage
    /// or healing to the entity and emits a numeric-feedback notification.
    pub(crate) fn fire_periodic_tick(&mut self, entity: EntityId, id: InstanceId) {
        let Some(record) = self.entities.get_mut(entity) else {
            return;
        };
        let Some((periodic, stacks, color)) = record.effects.instance(id).and_then(|instance| {
            let periodic = instance.periodic?;
            let color = instance
                .resolved
                .visual
                .as_ref()
                .and_then(|v| v.get("color"))
                .and_then(|c| c.as_str())
                .map(str::to_owned);
            Some((periodic, instance.stack_count as f32, color))
        }) else {
            return;
        };

        let position = record.position;
        let is_player = record.is_player();
        let mut amount = 0.0;

        if periodic.damage > 0.0 {
            let dealt = periodic.damage * stacks;
            record.health = (record.health - dealt).max(0.0);
            amount -= dealt;
            if record.health <= 0.0 && is_player {
                // Health at zero signals death to the owning collaborator;
                // for the protagonist we additionally raise the polled flag.
                self.player_downed = true;
            }
        }
        if periodic.heal > 0.0 {
            let healed = periodic.heal * stacks;
            record.health = (record.health + healed).min(record.max_health);
            amount += healed;
        }

        if amount != 0.0 {
            self.feedback.push(FeedbackEvent {
                entity,
                position,
                amount,
                color,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::EngineConfig;
    use crate::engine::testkit::*;
    use crate::instance::ApplyOptions;

    #[test]
    fn elapsed_advances_and_instances_expire() {
        let mut engine = engine();
        let entity = spawn_enemy(&mut engine);
        engine.apply_effect(entity, "haste", ApplyOptions::new());

        engine.update(3999.0);
        assert!(engine.has_effect(entity, "haste"));
        engine.update(1.0);
        assert!(!engine.has_effect(entity, "haste"));
        // Expiry invalidated the cache; aggregation is back to defaults.
        assert_eq!(engine.modifiers(entity).unwrap().get("speed_mult"), Some(1.0));
    }

    #[test]
    fn apply_on_enter_tick_accounting() {
        let mut engine = engine();
        let entity = spawn_enemy(&mut engine);

        // 2000ms duration, 500ms interval, 3 damage, apply_on_enter: ticks
        // land at t=0, 500, 1000, 1500. The instance expires exactly at
        // t=2000 before a fifth tick.
        engine.apply_effect(entity, "fire.minor", ApplyOptions::new());
        assert_eq!(engine.entity(entity).unwrap().health, 97.0);

        for _ in 0..4 {
            engine.update(500.0);
        }
        assert_eq!(engine.entity(entity).unwrap().health, 88.0);
        assert!(!engine.has_effect(entity, "fire.minor"));
    }

    #[test]
    fn periodic_damage_scales_with_stack_count() {
        let mut engine = engine();
        let entity = spawn_enemy(&mut engine);

        for _ in 0..3 {
            engine.apply_effect(entity, "poison", ApplyOptions::new());
        }
        engine.update(1000.0);
        // 3 damage * 3 stacks.
        assert_eq!(engine.entity(entity).unwrap().health, 91.0);
    }

    #[test]
    fn slow_frame_catches_up_whole_ticks() {
        let mut engine = engine();
        let entity = spawn_enemy(&mut engine);
        engine.apply_effect(entity, "poison", ApplyOptions::new());

        // One 3500ms frame: three whole 1000ms intervals, no partial tick.
        engine.update(3500.0);
        assert_eq!(engine.entity(entity).unwrap().health, 91.0);
        // The half-interval phase is kept.
        engine.update(500.0);
        assert_eq!(engine.entity(entity).unwrap().health, 88.0);
    }

    #[test]
    fn catchup_cap_drops_excess_ticks() {
        let mut engine = engine_with_config(EngineConfig::with_max_catchup_ticks(2));
        let entity = spawn_enemy(&mut engine);
        engine.apply_effect(entity, "poison", ApplyOptions::new());

        engine.update(5500.0);
        assert_eq!(engine.entity(entity).unwrap().health, 94.0);
    }

    #[test]
    fn healing_clamps_to_max_health() {
        let mut engine = engine();
        let entity = spawn_enemy(&mut engine);
        engine.entity_mut(entity).unwrap().health = 98.0;
        engine.apply_effect(entity, "regen", ApplyOptions::new());

        engine.update(1000.0);
        assert_eq!(engine.entity(entity).unwrap().health, 100.0);
    }

    #[test]
    fn damage_clamps_to_zero_and_flags_downed_player() {
        let mut engine = engine();
        let player = spawn_player(&mut engine);
        engine.entity_mut(player).unwrap().health = 5.0;
        engine.apply_effect(player, "poison", ApplyOptions::new());

        engine.update(1000.0);
        assert_eq!(engine.entity(player).unwrap().health, 2.0);
        assert!(!engine.player_downed());

        engine.update(1000.0);
        assert_eq!(engine.entity(player).unwrap().health, 0.0);
        assert!(engine.player_downed());
    }

    #[test]
    fn enemy_death_does_not_flag_player_downed() {
        let mut engine = engine();
        let enemy = spawn_enemy(&mut engine);
        engine.entity_mut(enemy).unwrap().health = 1.0;
        engine.apply_effect(enemy, "poison", ApplyOptions::new());

        engine.update(1000.0);
        assert_eq!(engine.entity(enemy).unwrap().health, 0.0);
        assert!(!engine.player_downed());
    }

    #[test]
    fn ticks_emit_signed_feedback_with_visual_color() {
        let mut engine = engine();
        let entity = spawn_enemy(&mut engine);
        engine.apply_effect(entity, "fire.minor", ApplyOptions::new());

        let feedback = engine.drain_feedback();
        assert_eq!(feedback.len(), 1);
        assert_eq!(feedback[0].amount, -3.0);
        assert_eq!(feedback[0].color.as_deref(), Some("#ff4400"));

        engine.update(500.0);
        let feedback = engine.drain_feedback();
        assert_eq!(feedback.len(), 1);
        assert!(engine.drain_feedback().is_empty());
    }

    #[test]
    fn expiring_one_instance_does_not_skip_the_next() {
        let mut engine = engine();
        let entity = spawn_enemy(&mut engine);
        // Two instances expiring the same frame plus one survivor.
        engine.apply_effect(entity, "haste", ApplyOptions::new().with_duration(1000.0));
        engine.apply_effect(entity, "surge", ApplyOptions::new().with_duration(1000.0));
        engine.apply_effect(entity, "shield", ApplyOptions::new());

        engine.update(1000.0);
        let effects = engine.effects(entity).unwrap();
        assert_eq!(effects.len(), 1);
        assert!(effects.instance_of_type("shield").is_some());
    }
}
