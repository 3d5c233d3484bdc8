//! Archetype data: stat blocks and combat capabilities per unit template.

use serde::{Deserialize, Serialize};

use crate::components::{
    AiTrait, ArchetypeId, Capabilities, Faction, Passive, Stats, StatusEffect, StatusKind,
};
use crate::error::{GameError, Result};

/// Data-driven unit template.
///
/// # Example RON
///
/// ```ron
/// ArchetypeData(
///     id: Slime,
///     faction: Enemy,
///     stats: Stats(max_hp: 30, hp: 30, phys_atk: 10, mag_atk: 0, armor: 0,
///                  resist: 0, move_range: 2, attack_range: 1),
///     capabilities: Capabilities(ai_trait: Default),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchetypeData {
    /// Template identifier.
    pub id: ArchetypeId,
    /// Side.
    pub faction: Faction,
    /// Base stats; `hp` is reset to `max_hp` on creation.
    pub stats: Stats,
    /// Combat modifiers.
    #[serde(default)]
    pub capabilities: Capabilities,
    /// Flavor text.
    #[serde(default)]
    pub passive: Option<Passive>,
}

impl ArchetypeData {
    /// Stats for a freshly created unit.
    #[must_use]
    pub fn initial_stats(&self) -> Stats {
        Stats {
            hp: self.stats.max_hp,
            ..self.stats
        }
    }
}

/// All unit templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchetypeCatalog {
    /// Templates, one per [`ArchetypeId`].
    pub archetypes: Vec<ArchetypeData>,
}

impl ArchetypeCatalog {
    /// Parse a catalog from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| GameError::DataParseError {
            what: "archetype catalog".into(),
            message: e.to_string(),
        })
    }

    /// Look up a template.
    #[must_use]
    pub fn get(&self, id: ArchetypeId) -> Option<&ArchetypeData> {
        self.archetypes.iter().find(|a| a.id == id)
    }
}

fn passive(name: &str, description: &str) -> Option<Passive> {
    Some(Passive {
        name: name.into(),
        description: description.into(),
    })
}

fn hero(on_hit: Option<StatusEffect>, armor_penetration: u32) -> Capabilities {
    Capabilities {
        armor_penetration,
        on_hit,
        heat_on_hit: 5,
        ..Capabilities::default()
    }
}

fn enemy(ai_trait: AiTrait, base_damage_percent: u32) -> Capabilities {
    Capabilities {
        base_damage_percent,
        ai_trait,
        ..Capabilities::default()
    }
}

impl ArchetypeData {
    /// Built-in template for an archetype.
    #[must_use]
    pub fn builtin(id: ArchetypeId) -> Self {
        let (faction, stats, capabilities, passive) = match id {
            ArchetypeId::Base => (
                Faction::Player,
                Stats::new(100, 10, 0, 0, 0, 0, 2),
                Capabilities {
                    heat_on_hit: 10,
                    ..Capabilities::default()
                },
                None,
            ),
            ArchetypeId::Potato => (
                Faction::Player,
                Stats::new(180, 25, 0, 22, 0, 2, 1),
                hero(Some(StatusEffect::new(StatusKind::Slow, 1, 1)), 0),
                passive("Heavy Blow", "Normal attacks reduce the target's move by 1."),
            ),
            ArchetypeId::PorkScrap => (
                Faction::Player,
                Stats::new(80, 45, 0, 10, 10, 2, 1),
                hero(None, 50),
                passive("Pierce", "Normal attacks ignore 50% of the target's armor."),
            ),
            ArchetypeId::ChiliPepper => (
                Faction::Player,
                Stats::new(40, 0, 30, 0, 15, 4, 2),
                hero(Some(StatusEffect::new(StatusKind::Burn, 2, 15)), 0),
                passive("Ignite", "Normal attacks burn for 15 per turn over 2 turns."),
            ),
            ArchetypeId::Tomato => (
                Faction::Player,
                Stats::new(60, 0, 20, 5, 20, 3, 2),
                hero(Some(StatusEffect::new(StatusKind::ArmorShred, 1, 10)), 0),
                passive("Corrode", "Normal attacks strip 10 armor for 1 turn, up to 3 stacks."),
            ),
            ArchetypeId::Slime => (
                Faction::Enemy,
                Stats::new(30, 10, 0, 0, 0, 2, 1),
                enemy(AiTrait::Default, 100),
                passive("Ooze", "An ordinary slime."),
            ),
            ArchetypeId::Siege => (
                Faction::Enemy,
                Stats::new(200, 40, 0, 60, 10, 1, 1),
                enemy(AiTrait::Siege, 200),
                passive("Battering Ram", "Deals double damage to the base."),
            ),
            ArchetypeId::Assassin => (
                Faction::Enemy,
                Stats::new(60, 35, 0, 10, 50, 4, 1),
                enemy(AiTrait::Hunter, 100),
                passive("Bloodhound", "Hunts the hero with the lowest hp."),
            ),
        };

        Self {
            id,
            faction,
            stats,
            capabilities,
            passive,
        }
    }
}

impl ArchetypeCatalog {
    /// Template for an archetype, falling back to the built-in one when the
    /// catalog does not override it.
    #[must_use]
    pub fn resolve(&self, id: ArchetypeId) -> ArchetypeData {
        self.get(id)
            .cloned()
            .unwrap_or_else(|| ArchetypeData::builtin(id))
    }
}

impl Default for ArchetypeCatalog {
    fn default() -> Self {
        Self {
            archetypes: ArchetypeId::ALL
                .into_iter()
                .map(ArchetypeData::builtin)
                .collect(),
        }
    }
}
