use bracket_geometry::prelude::Point;
use specs::prelude::{Component, NullStorage, VecStorage};

use crate::{ai::Brain, data::items::ItemKind};

#[derive(Clone, Debug)]
pub struct Position {
    pub point: Point,
}

impl Component for Position {
    type Storage = VecStorage<Self>;
}

/// Action budget. `energy` is spent in `action_cost` chunks.
#[derive(Clone, Debug, Default)]
pub struct Actor {
    pub energy: i32,
    pub speed: i32,
}

impl Component for Actor {
    type Storage = VecStorage<Self>;
}

impl Component for Brain {
    type Storage = VecStorage<Self>;
}

#[derive(Clone, Debug, PartialEq)]
pub struct Vitals {
    pub hp: i32,
    pub max_hp: i32,
    pub stamina: f32,
    pub max_stamina: f32,
}

impl Component for Vitals {
    type Storage = VecStorage<Self>;
}

impl Vitals {
    pub fn new(max_hp: i32, max_stamina: f32) -> Self {
        Self {
            hp: max_hp,
            max_hp,
            stamina: max_stamina,
            max_stamina,
        }
    }

    pub fn spend_stamina(&mut self, amount: f32) {
        self.stamina = (self.stamina - amount).max(0.0);
    }

    pub fn restore_stamina(&mut self, amount: f32) {
        self.stamina = (self.stamina + amount).min(self.max_stamina);
    }

    pub fn heal(&mut self, amount: i32) {
        self.hp = (self.hp + amount).min(self.max_hp);
    }

    pub fn take_damage(&mut self, amount: i32) {
        self.hp = (self.hp - amount).max(0);
    }

    pub fn is_dead(&self) -> bool {
        self.hp == 0
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Inventory {
    pub slots: Vec<ItemKind>,
    pub capacity: usize,
}

impl Component for Inventory {
    type Storage = VecStorage<Self>;
}

impl Inventory {
    pub fn with_items(capacity: usize, items: &[ItemKind]) -> Self {
        Self {
            slots: items.iter().copied().take(capacity).collect(),
            capacity,
        }
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() >= self.capacity
    }

    /// Returns false when the pack is full.
    pub fn add(&mut self, item: ItemKind) -> bool {
        if self.is_full() {
            return false;
        }
        self.slots.push(item);
        true
    }

    pub fn contains(&self, item: ItemKind) -> bool {
        self.slots.contains(&item)
    }

    pub fn remove_slot(&mut self, slot: usize) -> Option<ItemKind> {
        (slot < self.slots.len()).then(|| self.slots.remove(slot))
    }

    pub fn remove_item(&mut self, item: ItemKind) -> bool {
        match self.slots.iter().position(|held| *held == item) {
            Some(slot) => {
                self.slots.remove(slot);
                true
            }
            None => false,
        }
    }
}

#[derive(Default)]
pub struct PlayerTag;

impl Component for PlayerTag {
    type Storage = NullStorage<Self>;
}

#[derive(Default)]
pub struct AdversaryTag;

impl Component for AdversaryTag {
    type Storage = NullStorage<Self>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vitals_clamp_to_bounds() {
        let mut vitals = Vitals::new(100, 50.0);
        vitals.spend_stamina(80.0);
        assert_eq!(vitals.stamina, 0.0);
        vitals.restore_stamina(70.0);
        assert_eq!(vitals.stamina, 50.0);
        vitals.take_damage(130);
        assert_eq!(vitals.hp, 0);
        assert!(vitals.is_dead());
        vitals.heal(500);
        assert_eq!(vitals.hp, 100);
    }

    #[test]
    fn inventory_refuses_past_capacity() {
        let mut pack = Inventory::with_items(2, &[ItemKind::Compass]);
        assert!(pack.add(ItemKind::CopperKey));
        assert!(!pack.add(ItemKind::SmokeBomb));
        assert!(pack.remove_item(ItemKind::CopperKey));
        assert!(!pack.contains(ItemKind::CopperKey));
        assert_eq!(pack.remove_slot(3), None);
        assert_eq!(pack.remove_slot(0), Some(ItemKind::Compass));
    }
}
