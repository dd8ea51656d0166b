use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    StaminaDrink,
    FirstAidKit,
    SmokeBomb,
    Flashbang,
    CopperKey,
    Compass,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ItemCategory {
    Movement,
    Special,
    Combat,
    Exploration,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ItemEffect {
    RestoreStamina { amount: f32 },
    Heal { amount: i32 },
    WarpAdversary,
    StunAdversary { turns: u32 },
    OpensChests,
    PointToStairs,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ItemTemplate {
    pub kind: ItemKind,
    pub name: &'static str,
    pub category: ItemCategory,
    pub effect: ItemEffect,
}

impl ItemTemplate {
    pub const fn new(
        kind: ItemKind,
        name: &'static str,
        category: ItemCategory,
        effect: ItemEffect,
    ) -> Self {
        Self {
            kind,
            name,
            category,
            effect,
        }
    }

    pub fn usable_in_encounter(&self) -> bool {
        self.category == ItemCategory::Combat
    }
}

impl ItemKind {
    pub const ALL: [ItemKind; 6] = [
        ItemKind::StaminaDrink,
        ItemKind::FirstAidKit,
        ItemKind::SmokeBomb,
        ItemKind::Flashbang,
        ItemKind::CopperKey,
        ItemKind::Compass,
    ];

    pub fn template(self) -> ItemTemplate {
        match self {
            ItemKind::StaminaDrink => ItemTemplate::new(
                self,
                "Stamina Drink",
                ItemCategory::Movement,
                ItemEffect::RestoreStamina { amount: 30.0 },
            ),
            ItemKind::FirstAidKit => ItemTemplate::new(
                self,
                "First Aid Kit",
                ItemCategory::Special,
                ItemEffect::Heal { amount: 50 },
            ),
            ItemKind::SmokeBomb => ItemTemplate::new(
                self,
                "Smoke Bomb",
                ItemCategory::Combat,
                ItemEffect::WarpAdversary,
            ),
            ItemKind::Flashbang => ItemTemplate::new(
                self,
                "Flashbang",
                ItemCategory::Combat,
                ItemEffect::StunAdversary { turns: 20 },
            ),
            ItemKind::CopperKey => ItemTemplate::new(
                self,
                "Copper Key",
                ItemCategory::Special,
                ItemEffect::OpensChests,
            ),
            ItemKind::Compass => ItemTemplate::new(
                self,
                "Compass",
                ItemCategory::Exploration,
                ItemEffect::PointToStairs,
            ),
        }
    }

    pub fn name(self) -> &'static str {
        self.template().name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_round_back_to_their_kind() {
        for kind in ItemKind::ALL {
            assert_eq!(kind.template().kind, kind);
        }
    }

    #[test]
    fn only_smoke_and_flash_are_combat_items() {
        let combat: Vec<ItemKind> = ItemKind::ALL
            .into_iter()
            .filter(|kind| kind.template().usable_in_encounter())
            .collect();
        assert_eq!(combat, vec![ItemKind::SmokeBomb, ItemKind::Flashbang]);
    }

    #[test]
    fn kinds_parse_from_snake_case() {
        #[derive(Deserialize)]
        struct Wrapper {
            items: Vec<ItemKind>,
        }
        let parsed: Wrapper = toml::from_str(r#"items = ["first_aid_kit", "copper_key"]"#)
            .expect("item list parses");
        assert_eq!(parsed.items, vec![ItemKind::FirstAidKit, ItemKind::CopperKey]);
    }
}
