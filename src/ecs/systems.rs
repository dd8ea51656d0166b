use bracket_random::prelude::RandomNumberGenerator;
use specs::prelude::*;

use super::{
    components::{Actor, AdversaryTag, Position},
    resources::{MessageLog, MovementContext},
};
use crate::{
    ai::{self, Brain},
    config::AiConfig,
    data::{mode_line, mode_severity},
};

/// Counts every adversary's mode timer down by one turn.
#[derive(Default)]
pub struct ModeTimerSystem;

impl<'a> System<'a> for ModeTimerSystem {
    type SystemData = WriteStorage<'a, Brain>;

    fn run(&mut self, mut brains: Self::SystemData) {
        for brain in (&mut brains).join() {
            brain.tick();
        }
    }
}

/// Funds this turn's actions: `action_budget` actions worth of energy.
#[derive(Default)]
pub struct EnergySystem;

impl<'a> System<'a> for EnergySystem {
    type SystemData = (
        WriteStorage<'a, Actor>,
        ReadStorage<'a, AdversaryTag>,
        ReadExpect<'a, AiConfig>,
        WriteExpect<'a, RandomNumberGenerator>,
    );

    fn run(&mut self, (mut actors, tags, tuning, mut rng): Self::SystemData) {
        for (actor, _) in (&mut actors, &tags).join() {
            let actions = ai::action_budget(actor.speed, tuning.action_cost, &mut rng);
            actor.energy = actor.energy.saturating_add(actions * tuning.action_cost);
        }
    }
}

/// One adversary action: pay for it, re-read the transition table, move.
/// Run once per action so the caller can check for capture in between.
#[derive(Default)]
pub struct AdversarySystem;

impl<'a> System<'a> for AdversarySystem {
    type SystemData = (
        WriteStorage<'a, Position>,
        WriteStorage<'a, Actor>,
        WriteStorage<'a, Brain>,
        ReadStorage<'a, AdversaryTag>,
        ReadExpect<'a, MovementContext>,
        ReadExpect<'a, AiConfig>,
        WriteExpect<'a, RandomNumberGenerator>,
        WriteExpect<'a, MessageLog>,
    );

    fn run(
        &mut self,
        (mut positions, mut actors, mut brains, tags, movement, tuning, mut rng, mut messages): Self::SystemData,
    ) {
        for (pos, actor, brain, _) in (&mut positions, &mut actors, &mut brains, &tags).join() {
            if actor.energy < tuning.action_cost {
                continue;
            }
            actor.energy -= tuning.action_cost;

            let dist = ai::manhattan(pos.point, movement.player_point);
            if let Some(entered) =
                brain.update_mode(dist, movement.floor, &tuning, pos.point, &mut rng)
            {
                actor.speed = brain.mode.stats().speed;
                log::debug!("adversary entered {entered:?} at distance {dist}");
                messages.push(mode_severity(entered), mode_line(entered).message);
            }

            let next = ai::next_position(brain, pos.point, &tuning, &movement, &mut rng);
            log::trace!(
                "adversary {:?} steps {},{} -> {},{}",
                brain.kind(),
                pos.point.x,
                pos.point.y,
                next.x,
                next.y
            );
            pos.point = next;
        }
    }
}
