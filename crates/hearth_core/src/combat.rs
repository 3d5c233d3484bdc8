//! Damage formulas and single-direction hit resolution.
//!
//! This module implements:
//! - Flat armor/resist reduction with a floor of 1 damage
//! - Percentage armor penetration
//! - Damage kind chosen from the attacker's own offense stats
//! - Per-archetype capabilities (on-hit status, bonus vs base, heat on hit)
//!
//! There is no counterattack: a hit flows from attacker to defender only.

use serde::{Deserialize, Serialize};

use crate::components::{EntityId, LifeState, Stats};
use crate::error::{GameError, Result};
use crate::events::GameEvent;
use crate::math::{floor_hundredths, percent_of, PERCENT};
use crate::simulation::Simulation;

/// Minimum damage dealt by any hit.
pub const MIN_DAMAGE: u32 = 1;

/// Damage formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageKind {
    /// Physical attack reduced by armor.
    Physical,
    /// Magic attack reduced by resist.
    Magic,
    /// Both attack stats, no reduction.
    True,
}

impl DamageKind {
    /// Kind used by a normal attack: physical unless magic attack is strictly
    /// higher.
    #[must_use]
    pub fn for_attacker(stats: &Stats) -> Self {
        if stats.phys_atk >= stats.mag_atk {
            Self::Physical
        } else {
            Self::Magic
        }
    }
}

/// Calculate damage from already-effective stats.
///
/// Formula:
/// ```text
/// Physical = floor(physAtk × coef − armor × (1 − pen))
/// Magic    = floor(magAtk × coef − resist)
/// True     = floor((physAtk + magAtk) × coef)
/// Result   = max(1, value)
/// ```
///
/// # Arguments
/// * `attacker` - Attacker's effective stats
/// * `defender` - Defender's effective stats
/// * `kind` - Damage formula
/// * `coefficient` - Attack multiplier in percent (100 = 1.0)
/// * `armor_penetration` - Armor ignored in percent, physical only
#[must_use]
pub fn calculate_damage(
    attacker: &Stats,
    defender: &Stats,
    kind: DamageKind,
    coefficient: u32,
    armor_penetration: u32,
) -> u32 {
    let coef = i64::from(coefficient);

    // Every term is scaled by 100 so the single division stays exact.
    let numerator = match kind {
        DamageKind::Physical => {
            let kept_armor = PERCENT - i64::from(armor_penetration.min(100));
            i64::from(attacker.phys_atk) * coef - i64::from(defender.armor) * kept_armor
        }
        DamageKind::Magic => {
            i64::from(attacker.mag_atk) * coef - i64::from(defender.resist) * PERCENT
        }
        DamageKind::True => (i64::from(attacker.phys_atk) + i64::from(attacker.mag_atk)) * coef,
    };

    let value = floor_hundredths(numerator).max(i64::from(MIN_DAMAGE));
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Result of one resolved attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackReport {
    /// Attacker.
    pub attacker: EntityId,
    /// Defender.
    pub target: EntityId,
    /// Damage dealt.
    pub damage: u32,
    /// Formula used.
    pub kind: DamageKind,
    /// Whether the hit brought the defender to zero hp.
    pub killed: bool,
}

impl Simulation {
    /// Resolve one directional hit from `attacker` onto `defender`.
    ///
    /// Order: on-hit status, damage, death handling, heat gain. The attacker
    /// ends ACTIONED. Callers validate range and phase beforehand.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::EntityNotFound`] if either unit is missing.
    pub(crate) fn process_attack_resolution(
        &mut self,
        attacker: EntityId,
        defender: EntityId,
    ) -> Result<AttackReport> {
        let (att_stats, caps) = {
            let unit = self
                .entities
                .get(attacker)
                .ok_or(GameError::EntityNotFound(attacker))?;
            (unit.effective_stats(), unit.capabilities)
        };
        let (def_stats, def_is_base) = {
            let unit = self
                .entities
                .get(defender)
                .ok_or(GameError::EntityNotFound(defender))?;
            (unit.effective_stats(), unit.is_base())
        };

        let kind = DamageKind::for_attacker(&att_stats);
        let mut damage = calculate_damage(&att_stats, &def_stats, kind, 100, caps.armor_penetration);
        if def_is_base {
            damage = percent_of(damage, caps.base_damage_percent).max(MIN_DAMAGE);
        }

        if let Some(effect) = caps.on_hit {
            if let Some(target) = self.entities.get_mut(defender) {
                target.add_status_effect(effect);
            }
            self.emit(GameEvent::StatusApplied {
                unit: defender,
                effect,
            });
        }

        let killed = self
            .entities
            .get_mut(defender)
            .is_some_and(|target| target.take_damage(damage));

        tracing::debug!(attacker, defender, damage, ?kind, killed, "Attack resolved");
        self.emit(GameEvent::HitLanded {
            attacker,
            target: defender,
            damage,
            kind,
        });

        if killed {
            self.handle_death(defender);
        }

        self.add_heat(caps.heat_on_hit);

        if let Some(unit) = self.entities.get_mut(attacker) {
            unit.state = LifeState::Actioned;
            unit.move_origin = None;
        }

        Ok(AttackReport {
            attacker,
            target: defender,
            damage,
            kind,
            killed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(phys: u32, mag: u32, armor: u32, resist: u32) -> Stats {
        Stats::new(100, phys, mag, armor, resist, 2, 1)
    }

    #[test]
    fn test_physical_no_armor() {
        let dmg = calculate_damage(&stats(45, 0, 0, 0), &stats(0, 0, 0, 0), DamageKind::Physical, 100, 0);
        assert_eq!(dmg, 45);
    }

    #[test]
    fn test_physical_with_penetration() {
        // 45 - 10 * 0.5 = 40
        let dmg = calculate_damage(&stats(45, 0, 0, 0), &stats(0, 0, 10, 0), DamageKind::Physical, 100, 50);
        assert_eq!(dmg, 40);
        // 45 - 25 * 0.5 = 32.5 -> 32
        let dmg = calculate_damage(&stats(45, 0, 0, 0), &stats(0, 0, 25, 0), DamageKind::Physical, 100, 50);
        assert_eq!(dmg, 32);
    }

    #[test]
    fn test_coefficient_is_exact() {
        // 45 * 1.2 = 54 with no drift below the integer
        let dmg = calculate_damage(&stats(45, 0, 0, 0), &stats(0, 0, 0, 0), DamageKind::Physical, 120, 0);
        assert_eq!(dmg, 54);
    }

    #[test]
    fn test_magic_uses_resist() {
        let dmg = calculate_damage(&stats(0, 30, 0, 0), &stats(0, 0, 99, 10), DamageKind::Magic, 100, 0);
        assert_eq!(dmg, 20);
        let dmg = calculate_damage(&stats(0, 30, 0, 0), &stats(0, 0, 0, 10), DamageKind::Magic, 200, 0);
        assert_eq!(dmg, 50);
    }

    #[test]
    fn test_true_damage_ignores_defense() {
        let dmg = calculate_damage(&stats(10, 5, 0, 0), &stats(0, 0, 90, 90), DamageKind::True, 100, 0);
        assert_eq!(dmg, 15);
    }

    #[test]
    fn test_minimum_damage() {
        let dmg = calculate_damage(&stats(10, 0, 0, 0), &stats(0, 0, 60, 0), DamageKind::Physical, 100, 0);
        assert_eq!(dmg, MIN_DAMAGE);
        let dmg = calculate_damage(&stats(0, 0, 0, 0), &stats(0, 0, 0, 0), DamageKind::Magic, 100, 0);
        assert_eq!(dmg, MIN_DAMAGE);
    }

    #[test]
    fn test_large_stats_do_not_overflow() {
        let dmg = calculate_damage(&stats(30_000_000, 0, 0, 0), &stats(0, 0, 0, 0), DamageKind::Physical, 100, 0);
        assert_eq!(dmg, 30_000_000);
        // 30M * 1.5 - 1M * 0.5 = 44.5M
        let dmg = calculate_damage(
            &stats(30_000_000, 0, 0, 0),
            &stats(0, 0, 1_000_000, 0),
            DamageKind::Physical,
            150,
            50,
        );
        assert_eq!(dmg, 44_500_000);
        let dmg = calculate_damage(&stats(u32::MAX, u32::MAX, 0, 0), &stats(0, 0, 0, 0), DamageKind::True, 200, 0);
        assert_eq!(dmg, u32::MAX);
        let dmg = calculate_damage(&stats(0, 0, 0, 0), &stats(0, 0, 0, u32::MAX), DamageKind::Magic, 100, 0);
        assert_eq!(dmg, MIN_DAMAGE);
    }

    #[test]
    fn test_kind_selection_ties_to_physical() {
        assert_eq!(DamageKind::for_attacker(&stats(10, 10, 0, 0)), DamageKind::Physical);
        assert_eq!(DamageKind::for_attacker(&stats(0, 30, 0, 0)), DamageKind::Magic);
        assert_eq!(DamageKind::for_attacker(&stats(0, 0, 0, 0)), DamageKind::Physical);
    }

    #[test]
    fn test_determinism() {
        let a = calculate_damage(&stats(33, 17, 0, 0), &stats(0, 0, 7, 3), DamageKind::Physical, 130, 25);
        let b = calculate_damage(&stats(33, 17, 0, 0), &stats(0, 0, 7, 3), DamageKind::Physical, 130, 25);
        assert_eq!(a, b);
    }
}
