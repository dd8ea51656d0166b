//! One discrete game turn.
//!
//! Order is fixed: execute the intent, pay its stamina, advance the turn
//! counter, let the adversary spend its budget (checking for capture before
//! its first action and after every action), then regenerate, re-light and
//! re-check proximity. A rejected intent stops at the first step and mutates
//! nothing.

use bracket_geometry::prelude::Point;
use serde::Serialize;

use crate::{
    ai::{ModeKind, manhattan},
    data::items::{ItemEffect, ItemKind},
    ecs::resources::MovementContext,
    error::SessionError,
    map::{CARDINALS, Entity, EntityKind},
    notify::Severity,
    session::{Session, SessionState},
};

pub const MOVE_COST: f32 = 1.0;
pub const INTERACT_COST: f32 = 1.0;
pub const STAIRS_COST: f32 = 0.0;
pub const ITEM_COST: f32 = 1.0;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    /// One orthogonal step.
    Move { dx: i32, dy: i32 },
    /// Act on whatever is underfoot, or wait.
    Interact,
    UseItem { slot: usize },
}

/// Ambient warning: the adversary is within its current detection range.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Proximity {
    Close,
    Danger,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TurnOutcome {
    pub turn: u64,
    pub success: bool,
    pub stamina_cost: f32,
    pub advisory: Option<String>,
    pub encounter: bool,
    pub game_over: bool,
    pub descended: bool,
    pub proximity: Option<Proximity>,
}

impl TurnOutcome {
    fn rejected(turn: u64, reason: String) -> Self {
        Self {
            turn,
            success: false,
            stamina_cost: 0.0,
            advisory: Some(reason),
            encounter: false,
            game_over: false,
            descended: false,
            proximity: None,
        }
    }
}

/// What an accepted intent did, before the adversary gets its say.
struct Action {
    cost: f32,
    advisory: Option<String>,
    descended: bool,
}

impl Action {
    fn costing(cost: f32) -> Self {
        Self {
            cost,
            advisory: None,
            descended: false,
        }
    }

    fn advise(mut self, advisory: impl Into<String>) -> Self {
        self.advisory = Some(advisory.into());
        self
    }
}

enum Executed {
    Done(Action),
    Rejected(String),
}

impl Session {
    pub fn resolve_turn(&mut self, intent: Intent) -> Result<TurnOutcome, SessionError> {
        if self.state != SessionState::Playing {
            return Err(SessionError::NotPlaying(self.state));
        }

        let executed = match intent {
            Intent::Move { dx, dy } => self.execute_move(dx, dy),
            Intent::Interact => self.execute_interact(),
            Intent::UseItem { slot } => self.execute_item(slot),
        };
        let outcome = match executed {
            Executed::Rejected(reason) => {
                log::debug!("turn {}: rejected {intent:?}: {reason}", self.turn);
                self.say(Severity::Warning, reason.clone());
                TurnOutcome::rejected(self.turn, reason)
            }
            Executed::Done(action) => self.finish_turn(action),
        };
        self.flush();
        Ok(outcome)
    }

    fn finish_turn(&mut self, action: Action) -> TurnOutcome {
        self.ecs
            .update_player_vitals(|vitals| vitals.spend_stamina(action.cost));
        self.turn += 1;

        let mut outcome = TurnOutcome {
            turn: self.turn,
            success: true,
            stamina_cost: action.cost,
            advisory: action.advisory,
            encounter: false,
            game_over: false,
            descended: action.descended,
            proximity: None,
        };
        if self.state == SessionState::GameOver {
            outcome.game_over = true;
            return outcome;
        }

        if self.drive_adversary() {
            outcome.encounter = true;
            return outcome;
        }

        let regen = self.config.player.stamina_regen;
        self.ecs
            .update_player_vitals(|vitals| vitals.restore_stamina(regen));
        self.update_visibility();
        outcome.proximity = self.proximity();
        outcome
    }

    /// Runs the adversary's whole budget. Returns true on capture.
    fn drive_adversary(&mut self) -> bool {
        if self.ecs.adversary_point().is_none() {
            return false;
        }
        let player = self.ecs.player_point();
        let context = MovementContext::from_grid(&self.grid, self.floor, player);
        self.ecs.begin_turn(context);

        if self.captured() {
            self.begin_encounter();
            return true;
        }
        while self.ecs.adversary_ready() {
            self.ecs.adversary_act();
            if self.captured() {
                self.begin_encounter();
                return true;
            }
        }
        false
    }

    fn captured(&self) -> bool {
        self.ecs.adversary_point() == Some(self.ecs.player_point())
    }

    fn begin_encounter(&mut self) {
        self.ecs.forfeit_adversary_energy();
        self.state = SessionState::Encounter;
        log::debug!("turn {}: captured", self.turn);
        self.say(Severity::Danger, "The shadow has caught you! How will you get away?");
    }

    fn proximity(&self) -> Option<Proximity> {
        let adversary = self.ecs.adversary()?;
        let dist = manhattan(adversary.point, self.ecs.player_point());
        if dist > adversary.brain.mode.stats().detection_range {
            return None;
        }
        if adversary.brain.kind() == ModeKind::Active {
            Some(Proximity::Danger)
        } else {
            Some(Proximity::Close)
        }
    }

    // ── Intents ──

    fn execute_move(&mut self, dx: i32, dy: i32) -> Executed {
        let delta = Point::new(dx, dy);
        if !CARDINALS.contains(&delta) {
            return Executed::Rejected("You can only step one tile up, down, left or right.".into());
        }
        let target = self.ecs.player_point() + delta;
        if !self.grid.is_walkable(target) {
            return Executed::Rejected("A wall blocks the way.".into());
        }
        if self.ecs.player_vitals().stamina < MOVE_COST {
            return Executed::Rejected("Too exhausted to move.".into());
        }
        self.ecs.set_player_point(target);

        if let Some(Entity::Trap { damage }) = self.grid.entity_at(target).copied() {
            self.grid.take_entity(target);
            self.say(Severity::Danger, format!("You stepped on a trap! ({damage} damage)"));
            self.damage_player(damage);
        }
        Executed::Done(Action::costing(MOVE_COST))
    }

    fn execute_interact(&mut self) -> Executed {
        let here = self.ecs.player_point();
        let Some(entity) = self.grid.entity_at(here).copied() else {
            return Executed::Done(self.wait());
        };
        match entity {
            Entity::Stairs => {
                self.descend();
                Executed::Done(Action {
                    cost: STAIRS_COST,
                    advisory: None,
                    descended: true,
                })
            }
            Entity::Item(item) => {
                let added = self
                    .ecs
                    .update_player_inventory(|pack| pack.add(item))
                    .unwrap_or(false);
                if !added {
                    return Executed::Rejected("Your pack is full.".into());
                }
                self.grid.take_entity(here);
                self.say(Severity::Info, format!("Picked up the {}.", item.name()));
                Executed::Done(Action::costing(INTERACT_COST))
            }
            Entity::Chest { locked, loot } => Executed::Done(self.open_chest(here, locked, loot)),
            Entity::Trap { .. } => Executed::Done(self.wait()),
        }
    }

    fn wait(&mut self) -> Action {
        self.say(Severity::Info, "You hold still and listen.");
        Action::costing(INTERACT_COST)
    }

    fn open_chest(&mut self, here: Point, locked: bool, loot: ItemKind) -> Action {
        if locked {
            let unlocked = self
                .ecs
                .update_player_inventory(|pack| pack.remove_item(ItemKind::CopperKey))
                .unwrap_or(false);
            if !unlocked {
                let advisory = "The chest is locked.";
                self.say(Severity::Warning, advisory);
                return Action::costing(INTERACT_COST).advise(advisory);
            }
            self.say(Severity::System, "You unlock the chest with the copper key!");
        }
        self.grid.take_entity(here);
        let stored = self
            .ecs
            .update_player_inventory(|pack| pack.add(loot))
            .unwrap_or(false);
        if stored {
            self.say(Severity::Info, format!("Found a {}!", loot.name()));
        } else {
            self.grid.set_entity(here, Some(Entity::Item(loot)));
            self.say(
                Severity::Warning,
                format!("A {} spills out, but your pack is full.", loot.name()),
            );
        }
        Action::costing(INTERACT_COST)
    }

    fn execute_item(&mut self, slot: usize) -> Executed {
        let inventory = self.ecs.player_inventory();
        let Some(item) = inventory.slots.get(slot).copied() else {
            return Executed::Rejected("There is nothing in that slot.".into());
        };
        let template = item.template();
        if template.usable_in_encounter() {
            return Executed::Rejected(format!(
                "The {} is only useful once the shadow has caught you.",
                template.name
            ));
        }
        if template.effect == ItemEffect::OpensChests {
            return Executed::Rejected("The key is used automatically at a locked chest.".into());
        }

        self.ecs.update_player_inventory(|pack| pack.remove_slot(slot));
        let advisory = self.apply_item(template.effect);
        log::debug!("turn {}: used {item:?}", self.turn);
        Executed::Done(Action {
            cost: ITEM_COST,
            advisory,
            descended: false,
        })
    }

    /// Out-of-encounter effects. Returns an advisory for the host, if any.
    fn apply_item(&mut self, effect: ItemEffect) -> Option<String> {
        match effect {
            ItemEffect::RestoreStamina { amount } => {
                self.ecs
                    .update_player_vitals(|vitals| vitals.restore_stamina(amount));
                self.say(Severity::System, "Your stamina recovers.");
                None
            }
            ItemEffect::Heal { amount } => {
                self.ecs.update_player_vitals(|vitals| vitals.heal(amount));
                self.say(Severity::System, "Your wounds are patched up.");
                None
            }
            ItemEffect::PointToStairs => {
                let reading = self.compass_reading();
                let severity = if self.grid.find_entity(EntityKind::Stairs).is_some() {
                    Severity::System
                } else {
                    Severity::Warning
                };
                self.say(severity, reading.clone());
                Some(reading)
            }
            ItemEffect::WarpAdversary
            | ItemEffect::StunAdversary { .. }
            | ItemEffect::OpensChests => None,
        }
    }

    fn compass_reading(&self) -> String {
        let Some(stairs) = self.grid.find_entity(EntityKind::Stairs) else {
            return "The compass needle just spins...".into();
        };
        let here = self.ecs.player_point();
        let dx = stairs.x - here.x;
        let dy = stairs.y - here.y;
        if dx == 0 && dy == 0 {
            return "The compass needle points straight down.".into();
        }
        let heading = if dy.abs() > dx.abs() {
            if dy > 0 { "south" } else { "north" }
        } else if dx > 0 {
            "east"
        } else {
            "west"
        };
        format!("The compass points {heading}.")
    }

    fn descend(&mut self) {
        self.floor = self.floor.next();
        let bonus = self.config.player.descent_stamina_bonus;
        self.ecs
            .update_player_vitals(|vitals| vitals.restore_stamina(bonus));
        log::debug!("descending to floor {}", self.floor.get());
        self.say(
            Severity::System,
            format!(
                "Reached basement floor {}. Your stamina recovers a little.",
                self.floor.get()
            ),
        );
        self.setup_floor();
    }

    /// Applies damage; zero hp ends the run.
    pub(crate) fn damage_player(&mut self, amount: i32) {
        let dead = self
            .ecs
            .update_player_vitals(|vitals| {
                vitals.take_damage(amount);
                vitals.is_dead()
            })
            .unwrap_or(false);
        if dead {
            self.state = SessionState::GameOver;
            log::debug!("turn {}: player died", self.turn);
            self.say(Severity::Danger, "Your HP hit zero... The expedition has failed.");
        }
    }
}
