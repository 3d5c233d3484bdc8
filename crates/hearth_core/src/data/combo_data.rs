//! Combo ("recipe") catalog data.
//!
//! Each combo carries an [`EffectScript`], a small tagged variant that the
//! combo resolver interprets generically. Adding a combo is a data change.

use serde::{Deserialize, Serialize};

use crate::combat::DamageKind;
use crate::components::{ArchetypeId, StatusEffect, StatusKind};
use crate::error::{GameError, Result};

/// How a combo picks where its effect lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetMode {
    /// Area anchored on a point within cast range of a participant.
    Footprint,
    /// A single enemy standing on the target point.
    SingleTarget,
    /// Every enemy on the board; no target point.
    Global,
}

impl TargetMode {
    /// Whether triggering needs a target point.
    #[must_use]
    pub const fn needs_target(self) -> bool {
        !matches!(self, Self::Global)
    }
}

/// Area footprint shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AreaShape {
    /// Chebyshev ball: radius 1 is a 3×3 block.
    Square,
    /// Manhattan ball: radius 2 is a 13-cell rhombus.
    Diamond,
}

impl AreaShape {
    /// Distance metric of this shape.
    #[must_use]
    pub fn distance(self, a: crate::grid::GridPoint, b: crate::grid::GridPoint) -> u32 {
        match self {
            Self::Square => a.chebyshev(b),
            Self::Diamond => a.manhattan(b),
        }
    }
}

/// Which offense stat is summed across participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OffenseStat {
    /// Sum of effective physical attack.
    Physical,
    /// Sum of effective magic attack.
    Magic,
}

/// Bespoke effect of a combo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectScript {
    /// Damage every enemy inside a footprint, scaled from the participants'
    /// summed offense stat. Survivors receive `on_survivor`.
    AreaDamage {
        /// Stat summed across participants.
        scaling: OffenseStat,
        /// Damage formula applied per enemy.
        kind: DamageKind,
        /// Coefficient in percent.
        coefficient: u32,
        /// Footprint shape (ignored for global combos).
        shape: AreaShape,
        /// Footprint radius (ignored for global combos).
        radius: u32,
        /// Status forced on enemies that survive.
        on_survivor: Option<StatusEffect>,
    },
    /// Two independent hits on one enemy, physical from one participant and
    /// magic from another, summed into a single damage application.
    DoubleHit {
        /// Archetype whose stats drive the physical hit.
        physical_from: ArchetypeId,
        /// Archetype whose stats drive the magic hit.
        magic_from: ArchetypeId,
        /// Coefficient in percent for both hits.
        coefficient: u32,
        /// Status forced on the enemy if it survives.
        on_survivor: Option<StatusEffect>,
    },
}

/// A combo definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboData {
    /// Unique identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// One-line description.
    #[serde(default)]
    pub description: String,
    /// Required archetype multiset.
    pub ingredients: Vec<ArchetypeId>,
    /// Heat spent on trigger.
    pub heat_cost: u32,
    /// Targeting mode.
    pub target_mode: TargetMode,
    /// Max Manhattan distance from any participant to the target point.
    pub cast_range: u32,
    /// Effect to run.
    pub effect: EffectScript,
}

impl ComboData {
    /// Whether an archetype is one of the ingredients.
    #[must_use]
    pub fn uses(&self, archetype: ArchetypeId) -> bool {
        self.ingredients.contains(&archetype)
    }
}

/// The static combo catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboCatalog {
    /// Combos in display order.
    pub combos: Vec<ComboData>,
}

impl ComboCatalog {
    /// Parse a catalog from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| GameError::DataParseError {
            what: "combo catalog".into(),
            message: e.to_string(),
        })
    }

    /// Look up a combo.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ComboData> {
        self.combos.iter().find(|c| c.id == id)
    }

    /// Iterate combos in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &ComboData> {
        self.combos.iter()
    }
}

impl Default for ComboCatalog {
    fn default() -> Self {
        let combos = vec![
            ComboData {
                id: "potato_stew".into(),
                name: "Potato Stew".into(),
                description: "3x3 physical blast around a participant; survivors are slowed."
                    .into(),
                ingredients: vec![ArchetypeId::Potato, ArchetypeId::PorkScrap],
                heat_cost: 40,
                target_mode: TargetMode::Footprint,
                cast_range: 0,
                effect: EffectScript::AreaDamage {
                    scaling: OffenseStat::Physical,
                    kind: DamageKind::Physical,
                    coefficient: 120,
                    shape: AreaShape::Square,
                    radius: 1,
                    on_survivor: Some(StatusEffect::new(StatusKind::Slow, 1, 1)),
                },
            },
            ComboData {
                id: "chili_pork".into(),
                name: "Chili Pork Stir-fry".into(),
                description: "Physical and magic hits on one enemy; survivors burn heavily."
                    .into(),
                ingredients: vec![ArchetypeId::ChiliPepper, ArchetypeId::PorkScrap],
                heat_cost: 60,
                target_mode: TargetMode::SingleTarget,
                cast_range: 1,
                effect: EffectScript::DoubleHit {
                    physical_from: ArchetypeId::PorkScrap,
                    magic_from: ArchetypeId::ChiliPepper,
                    coefficient: 200,
                    on_survivor: Some(StatusEffect::new(StatusKind::Burn, 3, 30)),
                },
            },
            ComboData {
                id: "tomato_hotpot".into(),
                name: "Tomato Hotpot".into(),
                description: "Magic diamond of radius 2; survivors are pinned in place.".into(),
                ingredients: vec![
                    ArchetypeId::Tomato,
                    ArchetypeId::ChiliPepper,
                    ArchetypeId::Potato,
                ],
                heat_cost: 100,
                target_mode: TargetMode::Footprint,
                cast_range: 2,
                effect: EffectScript::AreaDamage {
                    scaling: OffenseStat::Magic,
                    kind: DamageKind::Magic,
                    coefficient: 50,
                    shape: AreaShape::Diamond,
                    radius: 2,
                    on_survivor: Some(StatusEffect::flag(StatusKind::Stun, 1)),
                },
            },
        ];
        Self { combos }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridPoint;

    #[test]
    fn test_default_catalog() {
        let catalog = ComboCatalog::default();
        assert_eq!(catalog.iter().count(), 3);
        let stew = catalog.get("potato_stew").unwrap();
        assert!(stew.uses(ArchetypeId::Potato));
        assert!(!stew.uses(ArchetypeId::Tomato));
        assert!(catalog.get("missing").is_none());
    }

    #[test]
    fn test_shapes() {
        let center = GridPoint::new(5, 5);
        let corner = GridPoint::new(6, 6);
        assert_eq!(AreaShape::Square.distance(center, corner), 1);
        assert_eq!(AreaShape::Diamond.distance(center, corner), 2);
    }

    #[test]
    fn test_parse_ron_combo() {
        let text = r#"(
            combos: [
                (
                    id: "global_chill",
                    name: "Global Chill",
                    ingredients: [Tomato, Tomato],
                    heat_cost: 10,
                    target_mode: Global,
                    cast_range: 0,
                    effect: AreaDamage(
                        scaling: Magic,
                        kind: Magic,
                        coefficient: 100,
                        shape: Diamond,
                        radius: 0,
                        on_survivor: Some((kind: Slow, duration: 1, magnitude: Some(1))),
                    ),
                ),
            ],
        )"#;
        let catalog = ComboCatalog::from_ron_str(text).unwrap();
        let combo = catalog.get("global_chill").unwrap();
        assert!(!combo.target_mode.needs_target());
        assert_eq!(combo.ingredients.len(), 2);
    }
}
