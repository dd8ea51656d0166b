//! Getting away once the shadow has caught up: dodge on a coin flip, or spend
//! a combat item.

use serde::Serialize;

use crate::{
    ai::ModeKind,
    data::items::ItemEffect,
    dice::chance,
    error::SessionError,
    map::Placement,
    notify::Severity,
    session::{Session, SessionState},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EncounterChoice {
    Dodge,
    UseItem { slot: usize },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EncounterOutcome {
    /// False when the choice could not be carried out; the encounter goes on.
    pub resolved: bool,
    pub escaped: bool,
    pub damage_taken: i32,
    pub advisory: Option<String>,
    pub game_over: bool,
}

impl EncounterOutcome {
    fn refused(reason: String) -> Self {
        Self {
            resolved: false,
            escaped: false,
            damage_taken: 0,
            advisory: Some(reason),
            game_over: false,
        }
    }
}

impl Session {
    pub fn resolve_encounter(
        &mut self,
        choice: EncounterChoice,
    ) -> Result<EncounterOutcome, SessionError> {
        if self.state != SessionState::Encounter {
            return Err(SessionError::NoEncounter(self.state));
        }
        let outcome = match choice {
            EncounterChoice::Dodge => self.dodge(),
            EncounterChoice::UseItem { slot } => self.use_combat_item(slot),
        };
        match outcome {
            Ok(mut outcome) => {
                if self.state == SessionState::GameOver {
                    outcome.game_over = true;
                } else {
                    self.state = SessionState::Playing;
                    self.update_visibility();
                }
                self.flush();
                Ok(outcome)
            }
            Err(reason) => {
                self.say(Severity::Warning, reason.clone());
                self.flush();
                Ok(EncounterOutcome::refused(reason))
            }
        }
    }

    fn dodge(&mut self) -> Result<EncounterOutcome, String> {
        let tuning = self.config.encounter.clone();
        if self.ecs.player_vitals().stamina < tuning.dodge_cost {
            return Err("Not enough stamina to dodge!".into());
        }
        self.ecs
            .update_player_vitals(|vitals| vitals.spend_stamina(tuning.dodge_cost));

        let success = self
            .ecs
            .with_rng(|rng| chance(rng, tuning.dodge_success_rate));
        log::debug!("turn {}: dodge {}", self.turn, if success { "landed" } else { "failed" });
        if success {
            self.say(Severity::System, "You twist aside and put some distance between you!");
            self.warp_away();
            Ok(EncounterOutcome {
                resolved: true,
                escaped: true,
                damage_taken: 0,
                advisory: None,
                game_over: false,
            })
        } else {
            self.say(Severity::Danger, "Too slow! The shadow's claws rake you.");
            self.damage_player(tuning.dodge_failure_damage);
            Ok(EncounterOutcome {
                resolved: true,
                escaped: false,
                damage_taken: tuning.dodge_failure_damage,
                advisory: None,
                game_over: false,
            })
        }
    }

    fn use_combat_item(&mut self, slot: usize) -> Result<EncounterOutcome, String> {
        let inventory = self.ecs.player_inventory();
        let Some(item) = inventory.slots.get(slot).copied() else {
            return Err("There is nothing in that slot.".into());
        };
        let template = item.template();
        if !template.usable_in_encounter() {
            return Err(format!("The {} is no use against the shadow.", template.name));
        }
        self.ecs.update_player_inventory(|pack| pack.remove_slot(slot));

        match template.effect {
            ItemEffect::WarpAdversary => {
                self.say(Severity::System, "The smoke swallows you and you slip out of sight!");
                self.warp_away();
            }
            ItemEffect::StunAdversary { turns } => {
                self.say(Severity::System, "The flash stops the shadow in its tracks!");
                let floor = self.floor;
                self.ecs
                    .set_adversary_mode(ModeKind::WanderA, Some(turns), floor, &self.config.ai);
            }
            ItemEffect::RestoreStamina { .. }
            | ItemEffect::Heal { .. }
            | ItemEffect::OpensChests
            | ItemEffect::PointToStairs => {}
        }
        Ok(EncounterOutcome {
            resolved: true,
            escaped: true,
            damage_taken: 0,
            advisory: None,
            game_over: false,
        })
    }

    fn warp_away(&mut self) {
        if self.warp_adversary() == Placement::Exhausted {
            log::warn!("turn {}: no tile to warp the adversary to", self.turn);
        }
    }
}
