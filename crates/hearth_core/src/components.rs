//! Combatant model.
//!
//! Components are plain data plus the small amount of behavior that only
//! touches a single combatant: effective stats, status merging, damage and
//! healing. Anything that touches the board or other entities lives on
//! [`Simulation`](crate::simulation::Simulation).

use serde::{Deserialize, Serialize};

use crate::grid::GridPoint;

/// Unique identifier for entities.
pub type EntityId = u64;

/// Maximum accumulated armor-shred magnitude.
pub const ARMOR_SHRED_CAP: u32 = 30;

/// Burn damage per tick when an effect carries no magnitude.
pub const DEFAULT_BURN_DAMAGE: u32 = 15;

// ============================================================================
// Identity
// ============================================================================

/// Which side a combatant fights for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    /// Heroes and the base.
    Player,
    /// Spawned attackers.
    Enemy,
}

impl Faction {
    /// Whether two factions are hostile to each other.
    #[must_use]
    pub fn is_hostile_to(self, other: Self) -> bool {
        self != other
    }
}

/// Unit template identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ArchetypeId {
    /// The immobile base occupying the 2×2 footprint.
    Base,
    /// Tank hero.
    Potato,
    /// Armor-piercing bruiser hero.
    PorkScrap,
    /// Ranged burn caster hero.
    ChiliPepper,
    /// Ranged armor shredder hero.
    Tomato,
    /// Basic enemy.
    Slime,
    /// Heavy enemy with bonus damage against the base.
    Siege,
    /// Fast enemy that hunts the weakest hero.
    Assassin,
}

impl ArchetypeId {
    /// Every archetype, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::Base,
        Self::Potato,
        Self::PorkScrap,
        Self::ChiliPepper,
        Self::Tomato,
        Self::Slime,
        Self::Siege,
        Self::Assassin,
    ];

    /// The four hero archetypes, in roster order.
    pub const HEROES: [Self; 4] = [Self::Potato, Self::PorkScrap, Self::ChiliPepper, Self::Tomato];

    /// Display name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Base => "Base",
            Self::Potato => "Potato",
            Self::PorkScrap => "Pork Scrap",
            Self::ChiliPepper => "Chili Pepper",
            Self::Tomato => "Tomato",
            Self::Slime => "Slime",
            Self::Siege => "Siege",
            Self::Assassin => "Assassin",
        }
    }
}

/// Enemy targeting behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AiTrait {
    /// Walk to the base and hit whatever blocks the way.
    #[default]
    Default,
    /// Same targeting as default; kept distinct for data and display.
    Siege,
    /// Chase the deployed hero with the lowest current hp.
    Hunter,
}

/// Lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifeState {
    /// On the board, may act.
    Idle,
    /// On the board, has moved and may still act.
    Moved,
    /// On the board, finished for this turn.
    Actioned,
    /// Off the board, waiting to be summoned.
    Benched,
    /// Off the board, cooling down after death or sacrifice.
    Dead,
}

impl LifeState {
    /// Whether a combatant in this state stands on the board.
    #[must_use]
    pub const fn is_deployed(self) -> bool {
        matches!(self, Self::Idle | Self::Moved | Self::Actioned)
    }
}

// ============================================================================
// Stats and status effects
// ============================================================================

/// Combat statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Stats {
    /// Maximum hit points.
    pub max_hp: u32,
    /// Current hit points.
    pub hp: u32,
    /// Physical attack.
    pub phys_atk: u32,
    /// Magic attack.
    pub mag_atk: u32,
    /// Physical damage reduction (flat).
    pub armor: u32,
    /// Magic damage reduction (flat).
    pub resist: u32,
    /// Cells per move.
    pub move_range: u32,
    /// Manhattan attack range.
    pub attack_range: u32,
}

impl Stats {
    /// Full-health stat block.
    #[must_use]
    pub const fn new(
        max_hp: u32,
        phys_atk: u32,
        mag_atk: u32,
        armor: u32,
        resist: u32,
        move_range: u32,
        attack_range: u32,
    ) -> Self {
        Self {
            max_hp,
            hp: max_hp,
            phys_atk,
            mag_atk,
            armor,
            resist,
            move_range,
            attack_range,
        }
    }
}

/// Status effect kinds. A combatant holds at most one of each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusKind {
    /// Damage over time, ticked during the environment phase.
    Burn,
    /// Reduces armor by the magnitude; stacks up to [`ARMOR_SHRED_CAP`].
    ArmorShred,
    /// Reduces move range by the magnitude.
    Slow,
    /// Move range becomes zero.
    Stun,
}

/// An active status effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusEffect {
    /// Effect kind.
    pub kind: StatusKind,
    /// Turns remaining.
    pub duration: u32,
    /// Strength (armor removed, move removed, burn damage).
    #[serde(default)]
    pub magnitude: Option<u32>,
}

impl StatusEffect {
    /// Create an effect with a magnitude.
    #[must_use]
    pub const fn new(kind: StatusKind, duration: u32, magnitude: u32) -> Self {
        Self {
            kind,
            duration,
            magnitude: Some(magnitude),
        }
    }

    /// Create an effect without a magnitude.
    #[must_use]
    pub const fn flag(kind: StatusKind, duration: u32) -> Self {
        Self {
            kind,
            duration,
            magnitude: None,
        }
    }

    /// Magnitude, or zero when absent.
    #[must_use]
    pub fn value(&self) -> u32 {
        self.magnitude.unwrap_or(0)
    }
}

// ============================================================================
// Capabilities
// ============================================================================

/// Flavor text shown next to a unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Passive {
    /// Short name.
    pub name: String,
    /// One-line description.
    pub description: String,
}

/// Per-archetype combat modifiers consumed by the combat resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Capabilities {
    /// Armor ignored on normal attacks, in percent.
    #[serde(default)]
    pub armor_penetration: u32,
    /// Damage multiplier against the base, in percent.
    #[serde(default = "default_base_damage")]
    pub base_damage_percent: u32,
    /// Status applied to the defender on every normal attack.
    #[serde(default)]
    pub on_hit: Option<StatusEffect>,
    /// Heat granted whenever this unit lands a normal attack.
    #[serde(default)]
    pub heat_on_hit: u32,
    /// Enemy targeting behavior.
    #[serde(default)]
    pub ai_trait: AiTrait,
}

const fn default_base_damage() -> u32 {
    100
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            armor_penetration: 0,
            base_damage_percent: default_base_damage(),
            on_hit: None,
            heat_on_hit: 0,
            ai_trait: AiTrait::Default,
        }
    }
}

// ============================================================================
// Combatant
// ============================================================================

/// A unit in the entity table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combatant {
    /// Unique identifier.
    pub id: EntityId,
    /// Template this unit was built from.
    pub archetype: ArchetypeId,
    /// Side.
    pub faction: Faction,
    /// Base stats; `hp` here is the live value.
    pub stats: Stats,
    /// Lifecycle state.
    pub state: LifeState,
    /// Board position, `Some` iff deployed.
    pub position: Option<GridPoint>,
    /// Turns until a benched or dead unit may be summoned again.
    pub cooldown: u32,
    /// Active status effects, at most one per kind.
    pub status_effects: Vec<StatusEffect>,
    /// Flavor text.
    pub passive: Option<Passive>,
    /// Combat modifiers.
    pub capabilities: Capabilities,
    /// Where the unit stood before its pending move this turn.
    pub move_origin: Option<GridPoint>,
}

impl Combatant {
    /// Create a benched combatant at full health.
    #[must_use]
    pub fn new(
        id: EntityId,
        archetype: ArchetypeId,
        faction: Faction,
        stats: Stats,
        capabilities: Capabilities,
        passive: Option<Passive>,
    ) -> Self {
        Self {
            id,
            archetype,
            faction,
            stats,
            state: LifeState::Benched,
            position: None,
            cooldown: 0,
            status_effects: Vec::new(),
            passive,
            capabilities,
            move_origin: None,
        }
    }

    /// Whether this is the base.
    #[must_use]
    pub fn is_base(&self) -> bool {
        self.archetype == ArchetypeId::Base
    }

    /// Whether this is a player-controlled hero (player faction, not the base).
    #[must_use]
    pub fn is_hero(&self) -> bool {
        self.faction == Faction::Player && !self.is_base()
    }

    /// Whether the unit has hit points left.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.stats.hp > 0
    }

    /// Whether the unit stands on the board.
    #[must_use]
    pub fn is_deployed(&self) -> bool {
        self.position.is_some() && self.state.is_deployed()
    }

    /// Stats after applying active status effects. Never cached.
    #[must_use]
    pub fn effective_stats(&self) -> Stats {
        let mut eff = self.stats;
        for effect in &self.status_effects {
            match effect.kind {
                StatusKind::ArmorShred => {
                    eff.armor = eff.armor.saturating_sub(effect.value());
                }
                StatusKind::Slow => {
                    eff.move_range = eff.move_range.saturating_sub(effect.value());
                }
                StatusKind::Stun => eff.move_range = 0,
                StatusKind::Burn => {}
            }
        }
        eff
    }

    /// Active effect of a kind.
    #[must_use]
    pub fn status(&self, kind: StatusKind) -> Option<&StatusEffect> {
        self.status_effects.iter().find(|e| e.kind == kind)
    }

    /// Apply a status effect, merging with an existing one of the same kind.
    ///
    /// Durations take the larger of old and new. Armor shred magnitudes sum
    /// up to [`ARMOR_SHRED_CAP`]; other kinds take the new magnitude.
    pub fn add_status_effect(&mut self, effect: StatusEffect) {
        if let Some(existing) = self.status_effects.iter_mut().find(|e| e.kind == effect.kind) {
            existing.duration = existing.duration.max(effect.duration);
            if effect.kind == StatusKind::ArmorShred {
                let stacked = (existing.value() + effect.value()).min(ARMOR_SHRED_CAP);
                existing.magnitude = Some(stacked);
            } else {
                existing.magnitude = effect.magnitude;
            }
        } else {
            let mut fresh = effect;
            if fresh.kind == StatusKind::ArmorShred {
                fresh.magnitude = Some(fresh.value().min(ARMOR_SHRED_CAP));
            }
            self.status_effects.push(fresh);
        }
    }

    /// Decrement every effect's duration and drop the expired ones.
    pub fn tick_status_effects(&mut self) {
        for effect in &mut self.status_effects {
            effect.duration = effect.duration.saturating_sub(1);
        }
        self.status_effects.retain(|e| e.duration > 0);
    }

    /// Apply damage, clamping hp at zero.
    ///
    /// Returns `true` only on the transition to zero, so a caller's death
    /// handling runs exactly once.
    pub fn take_damage(&mut self, amount: u32) -> bool {
        if self.stats.hp == 0 {
            return false;
        }
        self.stats.hp = self.stats.hp.saturating_sub(amount);
        self.stats.hp == 0
    }

    /// Heal up to max hp. Dead units are not healed through this entry point.
    pub fn heal(&mut self, amount: u32) {
        if self.state != LifeState::Dead {
            self.restore_hp(amount);
        }
    }

    /// Heal up to max hp regardless of lifecycle state.
    ///
    /// Used by the environment phase's bench regeneration, which also
    /// applies to dead units at zero hp.
    pub fn restore_hp(&mut self, amount: u32) {
        self.stats.hp = (self.stats.hp + amount).min(self.stats.max_hp);
    }

    /// Transition to dead: off the board, cooling down, effects cleared.
    pub fn handle_death(&mut self, cooldown: u32) {
        self.state = LifeState::Dead;
        self.cooldown = cooldown;
        self.position = None;
        self.move_origin = None;
        self.status_effects.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tomato_target() -> Combatant {
        Combatant::new(
            1,
            ArchetypeId::Siege,
            Faction::Enemy,
            Stats::new(200, 40, 0, 60, 10, 1, 1),
            Capabilities::default(),
            None,
        )
    }

    #[test]
    fn test_armor_shred_stacks_to_cap() {
        let mut unit = tomato_target();
        for _ in 0..5 {
            unit.add_status_effect(StatusEffect::new(StatusKind::ArmorShred, 1, 10));
        }
        assert_eq!(unit.status_effects.len(), 1);
        assert_eq!(unit.status(StatusKind::ArmorShred).unwrap().value(), 30);
        assert_eq!(unit.effective_stats().armor, 30);
    }

    #[test]
    fn test_refresh_keeps_longer_duration() {
        let mut unit = tomato_target();
        unit.add_status_effect(StatusEffect::new(StatusKind::Burn, 3, 30));
        unit.add_status_effect(StatusEffect::new(StatusKind::Burn, 2, 15));
        let burn = unit.status(StatusKind::Burn).unwrap();
        assert_eq!(burn.duration, 3);
        // Non-shred kinds take the newest magnitude
        assert_eq!(burn.value(), 15);
    }

    #[test]
    fn test_stun_and_slow() {
        let mut unit = tomato_target();
        unit.stats.move_range = 3;
        unit.add_status_effect(StatusEffect::new(StatusKind::Slow, 1, 5));
        assert_eq!(unit.effective_stats().move_range, 0);

        let mut other = tomato_target();
        other.stats.move_range = 4;
        other.add_status_effect(StatusEffect::flag(StatusKind::Stun, 1));
        assert_eq!(other.effective_stats().move_range, 0);
        // Base stats untouched
        assert_eq!(other.stats.move_range, 4);
    }

    #[test]
    fn test_take_damage_signals_death_once() {
        let mut unit = tomato_target();
        assert!(!unit.take_damage(150));
        assert!(unit.take_damage(100));
        assert_eq!(unit.stats.hp, 0);
        assert!(!unit.take_damage(10));
    }

    #[test]
    fn test_heal_skips_dead_but_restore_does_not() {
        let mut unit = tomato_target();
        unit.take_damage(500);
        unit.handle_death(2);
        unit.heal(50);
        assert_eq!(unit.stats.hp, 0);
        unit.restore_hp(50);
        assert_eq!(unit.stats.hp, 50);
        unit.restore_hp(1000);
        assert_eq!(unit.stats.hp, 200);
    }

    #[test]
    fn test_handle_death_clears_position() {
        let mut unit = tomato_target();
        unit.state = LifeState::Idle;
        unit.position = Some(GridPoint::new(1, 1));
        unit.add_status_effect(StatusEffect::flag(StatusKind::Stun, 1));
        unit.handle_death(2);
        assert_eq!(unit.state, LifeState::Dead);
        assert_eq!(unit.cooldown, 2);
        assert!(unit.position.is_none());
        assert!(unit.status_effects.is_empty());
    }

    #[test]
    fn test_tick_prunes_expired() {
        let mut unit = tomato_target();
        unit.add_status_effect(StatusEffect::new(StatusKind::Slow, 1, 1));
        unit.add_status_effect(StatusEffect::new(StatusKind::Burn, 2, 15));
        unit.tick_status_effects();
        assert!(unit.status(StatusKind::Slow).is_none());
        assert_eq!(unit.status(StatusKind::Burn).unwrap().duration, 1);
    }

    fn any_effect() -> impl Strategy<Value = StatusEffect> {
        let kind = prop_oneof![
            Just(StatusKind::Burn),
            Just(StatusKind::ArmorShred),
            Just(StatusKind::Slow),
            Just(StatusKind::Stun),
        ];
        (kind, 0u32..5, proptest::option::of(0u32..50)).prop_map(|(kind, duration, magnitude)| {
            StatusEffect {
                kind,
                duration,
                magnitude,
            }
        })
    }

    proptest! {
        #[test]
        fn prop_effects_only_reduce(effects in proptest::collection::vec(any_effect(), 0..20)) {
            let mut unit = tomato_target();
            for effect in effects {
                unit.add_status_effect(effect);
                let eff = unit.effective_stats();
                prop_assert!(eff.armor <= unit.stats.armor);
                prop_assert!(eff.move_range <= unit.stats.move_range);
            }
        }

        #[test]
        fn prop_shred_never_exceeds_cap(effects in proptest::collection::vec(any_effect(), 0..30)) {
            let mut unit = tomato_target();
            for effect in effects {
                unit.add_status_effect(effect);
                if let Some(shred) = unit.status(StatusKind::ArmorShred) {
                    prop_assert!(shred.value() <= ARMOR_SHRED_CAP);
                }
            }
        }

        #[test]
        fn prop_one_effect_per_kind(effects in proptest::collection::vec(any_effect(), 0..30)) {
            let mut unit = tomato_target();
            for effect in effects {
                unit.add_status_effect(effect);
            }
            let mut kinds: Vec<_> = unit.status_effects.iter().map(|e| e.kind as u8).collect();
            let before = kinds.len();
            kinds.sort_unstable();
            kinds.dedup();
            prop_assert_eq!(before, kinds.len());
        }
    }
}
