//! Simulation tuning.
//!
//! Everything the host can adjust lives in [`SimConfig`]. It deserializes from
//! TOML with every key optional; a missing section or key falls back to the
//! stock tuning below.

use std::path::Path;

use serde::Deserialize;

use crate::{ai::ModeKind, data::items::ItemKind, error::ConfigError};

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Fixed PRNG seed. `None` seeds from entropy.
    pub seed: Option<u64>,
    pub dungeon: DungeonConfig,
    pub player: PlayerConfig,
    pub ai: AiConfig,
    pub encounter: EncounterConfig,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct DungeonConfig {
    pub width: i32,
    pub height: i32,
    pub floor_ratio_min: f32,
    pub floor_ratio_max: f32,
    pub placement_attempts: u32,
    pub base_traps: u32,
    pub trap_damage: i32,
    pub floor_items: Vec<ItemKind>,
    pub chest_count: u32,
    pub chest_loot: Vec<ItemKind>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub max_hp: i32,
    pub max_stamina: f32,
    pub vision_radius: f32,
    pub inventory_size: usize,
    pub stamina_regen: f32,
    pub descent_stamina_bonus: f32,
    pub starting_items: Vec<ItemKind>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct ModeTuning {
    pub base_speed: i32,
    pub base_duration: u32,
    pub detection_range: i32,
}

impl ModeTuning {
    pub const fn new(base_speed: i32, base_duration: u32, detection_range: i32) -> Self {
        Self {
            base_speed,
            base_duration,
            detection_range,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub search: ModeTuning,
    pub active: ModeTuning,
    pub wander_a: ModeTuning,
    pub wander_b: ModeTuning,
    /// Extra slack past the active detection range before a chase is abandoned.
    pub active_margin: i32,
    /// Wandering steps must land strictly closer than this to the anchor.
    pub tether_radius: i32,
    pub loose_wander_chance: f32,
    pub resume_search_chance: f32,
    /// Energy spent per adversary action; a speed equal to this is one action per turn.
    pub action_cost: i32,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct EncounterConfig {
    pub dodge_cost: f32,
    pub dodge_success_rate: f32,
    pub dodge_failure_damage: i32,
}

impl Default for DungeonConfig {
    fn default() -> Self {
        Self {
            width: 25,
            height: 25,
            floor_ratio_min: 0.35,
            floor_ratio_max: 0.55,
            placement_attempts: 1000,
            base_traps: 3,
            trap_damage: 10,
            floor_items: vec![ItemKind::FirstAidKit, ItemKind::CopperKey],
            chest_count: 1,
            chest_loot: vec![
                ItemKind::StaminaDrink,
                ItemKind::FirstAidKit,
                ItemKind::Flashbang,
            ],
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_hp: 100,
            max_stamina: 50.0,
            vision_radius: 5.0,
            inventory_size: 10,
            stamina_regen: 0.5,
            descent_stamina_bonus: 20.0,
            starting_items: vec![
                ItemKind::StaminaDrink,
                ItemKind::SmokeBomb,
                ItemKind::Compass,
            ],
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            search: ModeTuning::new(8, 40, 6),
            active: ModeTuning::new(12, 15, 10),
            wander_a: ModeTuning::new(5, 10, 0),
            wander_b: ModeTuning::new(5, 30, 6),
            active_margin: 3,
            tether_radius: 8,
            loose_wander_chance: 0.3,
            resume_search_chance: 0.3,
            action_cost: 10,
        }
    }
}

impl Default for EncounterConfig {
    fn default() -> Self {
        Self {
            dodge_cost: 20.0,
            dodge_success_rate: 0.5,
            dodge_failure_damage: 20,
        }
    }
}

impl AiConfig {
    pub fn tuning(&self, mode: ModeKind) -> &ModeTuning {
        match mode {
            ModeKind::Search => &self.search,
            ModeKind::Active => &self.active,
            ModeKind::WanderA => &self.wander_a,
            ModeKind::WanderB => &self.wander_b,
        }
    }
}

// ── Loading ──

impl SimConfig {
    /// Load and validate a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        log::debug!("loaded simulation config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let dungeon = &self.dungeon;
        if dungeon.width < 3 || dungeon.height < 3 {
            return Err(ConfigError::invalid(
                "dungeon size",
                format!(
                    "{}x{} leaves no interior; both sides must be at least 3",
                    dungeon.width, dungeon.height
                ),
            ));
        }
        if !(dungeon.floor_ratio_min > 0.0
            && dungeon.floor_ratio_min <= dungeon.floor_ratio_max
            && dungeon.floor_ratio_max < 1.0)
        {
            return Err(ConfigError::invalid(
                "floor ratio",
                format!(
                    "need 0 < min <= max < 1, got [{}, {}]",
                    dungeon.floor_ratio_min, dungeon.floor_ratio_max
                ),
            ));
        }
        if dungeon.placement_attempts == 0 {
            return Err(ConfigError::invalid(
                "dungeon.placement_attempts",
                "must be positive",
            ));
        }
        if dungeon.chest_count > 0 && dungeon.chest_loot.is_empty() {
            return Err(ConfigError::invalid(
                "dungeon.chest_loot",
                "chests are placed but the loot table is empty",
            ));
        }

        let player = &self.player;
        if player.max_hp <= 0 || player.max_stamina <= 0.0 {
            return Err(ConfigError::invalid(
                "player maxima",
                "max_hp and max_stamina must be positive",
            ));
        }
        if player.vision_radius < 0.0 || player.stamina_regen < 0.0 {
            return Err(ConfigError::invalid(
                "player",
                "vision_radius and stamina_regen cannot be negative",
            ));
        }

        if self.ai.action_cost <= 0 {
            return Err(ConfigError::invalid("ai.action_cost", "must be positive"));
        }
        let probabilities = [
            ("ai.loose_wander_chance", self.ai.loose_wander_chance),
            ("ai.resume_search_chance", self.ai.resume_search_chance),
            (
                "encounter.dodge_success_rate",
                self.encounter.dodge_success_rate,
            ),
        ];
        for (field, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::invalid(
                    field,
                    format!("{value} is not a probability"),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_stock_tuning() {
        let config = SimConfig::from_toml_str("").expect("empty config is valid");
        assert_eq!(config, SimConfig::default());
        assert_eq!(config.dungeon.width, 25);
        assert_eq!(config.ai.active.base_speed, 12);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let text = r#"
            seed = 42

            [dungeon]
            width = 31
            floor_items = ["compass"]

            [ai.active]
            base_speed = 15
            base_duration = 20
            detection_range = 8
        "#;
        let config = SimConfig::from_toml_str(text).expect("partial config parses");
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.dungeon.width, 31);
        assert_eq!(config.dungeon.height, 25);
        assert_eq!(config.dungeon.floor_items, vec![ItemKind::Compass]);
        assert_eq!(config.ai.active, ModeTuning::new(15, 20, 8));
        assert_eq!(config.ai.search, ModeTuning::new(8, 40, 6));
    }

    #[test]
    fn inverted_ratio_range_is_rejected() {
        let text = r#"
            [dungeon]
            floor_ratio_min = 0.6
            floor_ratio_max = 0.4
        "#;
        let err = SimConfig::from_toml_str(text).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "floor ratio", .. }));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = SimConfig::from_toml_str("[dungeon\nwidth = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn out_of_range_probability_is_rejected() {
        let mut config = SimConfig::default();
        config.encounter.dodge_success_rate = 1.5;
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "encounter.dodge_success_rate",
                ..
            }
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = SimConfig::load("/definitely/not/here/shadowdelve.toml").unwrap_err();
        match err {
            ConfigError::Read { path, .. } => {
                assert!(path.ends_with("shadowdelve.toml"));
            }
            other => panic!("expected read error, got {other:?}"),
        }
    }
}
