//! Per-tick world snapshot consumed by the engine
//!
//! The snapshot provider owns data acquisition; the engine treats every
//! field here as a read-only fact for exactly one tick. Nothing in this
//! module is mutated by rule evaluation or effect application.

use serde::{Deserialize, Serialize};

use crate::core::types::Vec2;

/// Classification of the current area, used to gate rule groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AreaClass {
    Town,
    Hideout,
    /// Combat-capable area with no hostile pressure (e.g. a cleared zone)
    Peaceful,
    Map,
}

/// Player vitals as reported by the snapshot provider
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    pub health: f64,
    pub max_health: f64,
    pub mana: f64,
    pub max_mana: f64,
}

impl Vitals {
    pub fn health_fraction(&self) -> f64 {
        if self.max_health > 0.0 {
            self.health / self.max_health
        } else {
            0.0
        }
    }

    pub fn mana_fraction(&self) -> f64 {
        if self.max_mana > 0.0 {
            self.mana / self.max_mana
        } else {
            0.0
        }
    }
}

/// An active buff or debuff on the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Buff {
    pub name: String,
    /// None for permanent auras
    pub remaining_ms: Option<u64>,
    pub charges: u32,
}

/// A nearby entity visible to rules (monsters, allies)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NearbyEntity {
    pub position: Vec2,
    pub distance: f32,
    pub is_hostile: bool,
    /// 0.0 = dead, 1.0 = full
    pub health_fraction: f32,
}

/// Visibility of host UI panels this tick
///
/// Rules read these to avoid acting while the player is interacting with
/// a panel; the gate reads `escape_open`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelVisibility {
    pub escape_open: bool,
    pub inventory_open: bool,
    pub stash_open: bool,
    pub left_panel_open: bool,
    pub right_panel_open: bool,
    pub chat_open: bool,
}

impl PanelVisibility {
    /// True when any blocking panel covers part of the play area
    pub fn any_blocking(&self) -> bool {
        self.inventory_open
            || self.stash_open
            || self.left_panel_open
            || self.right_panel_open
            || self.chat_open
    }
}

/// Immutable facts for one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub window_focused: bool,
    pub area: AreaClass,
    /// None when no player entity exists (loading screens, login)
    pub vitals: Option<Vitals>,
    pub buffs: Vec<Buff>,
    /// Whether the player entity carries the actor component effects need
    pub has_actor: bool,
    pub panels: PanelVisibility,
    pub nearby: Vec<NearbyEntity>,
}

impl Snapshot {
    pub fn has_buff(&self, name: &str) -> bool {
        self.buffs.iter().any(|b| b.name == name)
    }

    pub fn buff(&self, name: &str) -> Option<&Buff> {
        self.buffs.iter().find(|b| b.name == name)
    }

    pub fn hostiles_within(&self, range: f32) -> usize {
        self.nearby
            .iter()
            .filter(|e| e.is_hostile && e.distance <= range)
            .count()
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            window_focused: false,
            area: AreaClass::Town,
            vitals: None,
            buffs: Vec::new(),
            has_actor: false,
            panels: PanelVisibility::default(),
            nearby: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_fraction_handles_zero_max() {
        let vitals = Vitals {
            health: 10.0,
            max_health: 0.0,
            mana: 0.0,
            max_mana: 0.0,
        };
        assert_eq!(vitals.health_fraction(), 0.0);
    }

    #[test]
    fn test_hostiles_within_filters_by_range_and_hostility() {
        let snapshot = Snapshot {
            nearby: vec![
                NearbyEntity {
                    position: Vec2::default(),
                    distance: 10.0,
                    is_hostile: true,
                    health_fraction: 1.0,
                },
                NearbyEntity {
                    position: Vec2::default(),
                    distance: 80.0,
                    is_hostile: true,
                    health_fraction: 1.0,
                },
                NearbyEntity {
                    position: Vec2::default(),
                    distance: 5.0,
                    is_hostile: false,
                    health_fraction: 1.0,
                },
            ],
            ..Snapshot::default()
        };
        assert_eq!(snapshot.hostiles_within(50.0), 1);
    }
}
