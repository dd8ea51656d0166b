pub mod components;
pub mod resources;
pub mod systems;

use bracket_geometry::prelude::Point;
use bracket_random::prelude::RandomNumberGenerator;
use specs::prelude::{
    Builder, Dispatcher, DispatcherBuilder, Entity, RunNow, World as SpecsWorld, WorldExt,
};

use crate::{
    ai::{Brain, ModeKind},
    config::{AiConfig, SimConfig},
    data::{mode_line, mode_severity},
    map::{AdversarySpawn, FloorIndex},
    notify::Severity,
};

use self::{
    components::{Actor, AdversaryTag, Inventory, PlayerTag, Position, Vitals},
    resources::{MessageLog, MovementContext},
    systems::{AdversarySystem, EnergySystem, ModeTimerSystem},
};

/// Read-only view of the adversary's full state.
#[derive(Clone, Debug, PartialEq)]
pub struct AdversarySnapshot {
    pub point: Point,
    pub brain: Brain,
    pub speed: i32,
    pub energy: i32,
}

pub struct EcsWorld {
    specs_world: SpecsWorld,
    turn_start: Dispatcher<'static, 'static>,
    player: Entity,
    adversary: Option<Entity>,
}

impl EcsWorld {
    pub fn new(config: &SimConfig, rng: RandomNumberGenerator) -> Self {
        let mut specs_world = SpecsWorld::new();
        Self::register_components(&mut specs_world);
        specs_world.insert(rng);
        specs_world.insert(MessageLog::default());
        specs_world.insert(MovementContext::empty());
        specs_world.insert(config.ai.clone());
        let player = Self::spawn_player(&mut specs_world, config);
        let turn_start = DispatcherBuilder::new()
            .with(ModeTimerSystem, "mode_timer", &[])
            .with(EnergySystem, "energy", &["mode_timer"])
            .build();

        Self {
            specs_world,
            turn_start,
            player,
            adversary: None,
        }
    }

    fn register_components(world: &mut SpecsWorld) {
        world.register::<Position>();
        world.register::<Actor>();
        world.register::<Brain>();
        world.register::<Vitals>();
        world.register::<Inventory>();
        world.register::<PlayerTag>();
        world.register::<AdversaryTag>();
    }

    fn spawn_player(world: &mut SpecsWorld, config: &SimConfig) -> Entity {
        world
            .create_entity()
            .with(Position {
                point: Point::new(0, 0),
            })
            .with(Vitals::new(config.player.max_hp, config.player.max_stamina))
            .with(Inventory::with_items(
                config.player.inventory_size,
                &config.player.starting_items,
            ))
            .with(PlayerTag)
            .build()
    }

    /// Puts the player back to full health with the starting pack.
    pub fn reset_player(&mut self, config: &SimConfig) {
        {
            let mut vitals = self.specs_world.write_component::<Vitals>();
            if let Some(player) = vitals.get_mut(self.player) {
                *player = Vitals::new(config.player.max_hp, config.player.max_stamina);
            }
        }
        let mut inventories = self.specs_world.write_component::<Inventory>();
        if let Some(pack) = inventories.get_mut(self.player) {
            *pack = Inventory::with_items(
                config.player.inventory_size,
                &config.player.starting_items,
            );
        }
    }

    /// Replaces any previous adversary. Emits the opening mode line.
    pub fn spawn_adversary(&mut self, spawn: AdversarySpawn) {
        if let Some(previous) = self.adversary.take() {
            if let Err(err) = self.specs_world.delete_entity(previous) {
                log::debug!("previous adversary already gone: {err:?}");
            }
            self.specs_world.maintain();
        }
        let kind = spawn.brain.kind();
        let speed = spawn.brain.mode.stats().speed;
        let entity = self
            .specs_world
            .create_entity()
            .with(Position { point: spawn.point })
            .with(Actor { energy: 0, speed })
            .with(spawn.brain)
            .with(AdversaryTag)
            .build();
        self.adversary = Some(entity);
        self.push_message(mode_severity(kind), mode_line(kind).message);
    }

    /// Turn prelude: ticks mode timers and grants this turn's energy.
    pub fn begin_turn(&mut self, context: MovementContext) {
        self.specs_world.insert(context);
        self.turn_start.dispatch(&self.specs_world);
        self.specs_world.maintain();
    }

    pub fn adversary_ready(&self) -> bool {
        let Some(adversary) = self.adversary else {
            return false;
        };
        let cost = self.specs_world.read_resource::<AiConfig>().action_cost;
        self.specs_world
            .read_component::<Actor>()
            .get(adversary)
            .is_some_and(|actor| actor.energy >= cost)
    }

    pub fn adversary_act(&mut self) {
        AdversarySystem.run_now(&self.specs_world);
        self.specs_world.maintain();
    }

    /// Drops whatever budget is left, e.g. after a capture cuts the turn short.
    pub fn forfeit_adversary_energy(&mut self) {
        let Some(adversary) = self.adversary else {
            return;
        };
        let mut actors = self.specs_world.write_component::<Actor>();
        if let Some(actor) = actors.get_mut(adversary) {
            actor.energy = 0;
        }
    }

    pub fn adversary(&self) -> Option<AdversarySnapshot> {
        let adversary = self.adversary?;
        let positions = self.specs_world.read_component::<Position>();
        let brains = self.specs_world.read_component::<Brain>();
        let actors = self.specs_world.read_component::<Actor>();
        let actor = actors.get(adversary)?;
        Some(AdversarySnapshot {
            point: positions.get(adversary)?.point,
            brain: brains.get(adversary)?.clone(),
            speed: actor.speed,
            energy: actor.energy,
        })
    }

    pub fn adversary_point(&self) -> Option<Point> {
        let adversary = self.adversary?;
        self.specs_world
            .read_component::<Position>()
            .get(adversary)
            .map(|pos| pos.point)
    }

    /// Relocates the adversary and re-anchors its wandering there.
    pub fn move_adversary(&mut self, point: Point) {
        let Some(adversary) = self.adversary else {
            return;
        };
        {
            let mut positions = self.specs_world.write_component::<Position>();
            if let Some(pos) = positions.get_mut(adversary) {
                pos.point = point;
            }
        }
        let mut brains = self.specs_world.write_component::<Brain>();
        if let Some(brain) = brains.get_mut(adversary) {
            brain.wander_anchor = point;
        }
    }

    /// Returns whether the mode changed.
    pub fn set_adversary_mode(
        &mut self,
        kind: ModeKind,
        duration_override: Option<u32>,
        floor: FloorIndex,
        ai: &AiConfig,
    ) -> bool {
        let Some(adversary) = self.adversary else {
            return false;
        };
        let here = self.adversary_point().unwrap_or(Point::new(0, 0));
        let changed = {
            let mut brains = self.specs_world.write_component::<Brain>();
            let mut actors = self.specs_world.write_component::<Actor>();
            match (brains.get_mut(adversary), actors.get_mut(adversary)) {
                (Some(brain), Some(actor)) => {
                    let changed = brain.set_mode(kind, duration_override, floor, ai, here);
                    actor.speed = brain.mode.stats().speed;
                    changed
                }
                _ => false,
            }
        };
        if changed {
            self.push_message(mode_severity(kind), mode_line(kind).message);
        }
        changed
    }

    pub fn player_point(&self) -> Point {
        self.specs_world
            .read_component::<Position>()
            .get(self.player)
            .map(|pos| pos.point)
            .unwrap_or(Point::new(0, 0))
    }

    pub fn set_player_point(&mut self, point: Point) {
        let mut positions = self.specs_world.write_component::<Position>();
        if let Some(pos) = positions.get_mut(self.player) {
            pos.point = point;
        }
    }

    pub fn player_vitals(&self) -> Vitals {
        self.specs_world
            .read_component::<Vitals>()
            .get(self.player)
            .cloned()
            .unwrap_or_else(|| Vitals::new(0, 0.0))
    }

    pub fn update_player_vitals<R>(&mut self, f: impl FnOnce(&mut Vitals) -> R) -> Option<R> {
        let mut vitals = self.specs_world.write_component::<Vitals>();
        vitals.get_mut(self.player).map(f)
    }

    pub fn player_inventory(&self) -> Inventory {
        self.specs_world
            .read_component::<Inventory>()
            .get(self.player)
            .cloned()
            .unwrap_or_default()
    }

    pub fn update_player_inventory<R>(
        &mut self,
        f: impl FnOnce(&mut Inventory) -> R,
    ) -> Option<R> {
        let mut inventories = self.specs_world.write_component::<Inventory>();
        inventories.get_mut(self.player).map(f)
    }

    pub fn with_rng<R>(&mut self, f: impl FnOnce(&mut RandomNumberGenerator) -> R) -> R {
        let mut rng = self.specs_world.write_resource::<RandomNumberGenerator>();
        f(&mut *rng)
    }

    pub fn push_message<S: Into<String>>(&mut self, severity: Severity, entry: S) {
        self.specs_world
            .write_resource::<MessageLog>()
            .push(severity, entry);
    }

    pub fn drain_messages(&mut self) -> Vec<(Severity, String)> {
        self.specs_world.write_resource::<MessageLog>().drain()
    }
}

#[cfg(test)]
mod tests {
    use specs::prelude::Join;

    use super::*;

    fn spawn_at(ecs: &mut EcsWorld, config: &SimConfig, point: Point, kind: ModeKind) {
        let brain = Brain::new(kind, FloorIndex::FIRST, &config.ai, point);
        ecs.spawn_adversary(AdversarySpawn { point, brain });
    }

    #[test]
    fn respawning_replaces_the_previous_adversary() {
        let config = SimConfig::default();
        let mut ecs = EcsWorld::new(&config, RandomNumberGenerator::seeded(3));
        spawn_at(&mut ecs, &config, Point::new(2, 2), ModeKind::Search);
        spawn_at(&mut ecs, &config, Point::new(5, 4), ModeKind::Active);

        let tags = ecs.specs_world.read_storage::<AdversaryTag>();
        assert_eq!((&tags).join().count(), 1);
        drop(tags);

        let adversary = ecs.adversary().expect("spawned");
        assert_eq!(adversary.point, Point::new(5, 4));
        assert_eq!(adversary.brain.kind(), ModeKind::Active);
        assert_eq!(ecs.drain_messages().len(), 2);
    }

    #[test]
    fn respawning_after_the_entity_was_deleted_still_spawns() {
        let config = SimConfig::default();
        let mut ecs = EcsWorld::new(&config, RandomNumberGenerator::seeded(3));
        spawn_at(&mut ecs, &config, Point::new(2, 2), ModeKind::Search);
        if let Some(stale) = ecs.adversary {
            ecs.specs_world.delete_entity(stale).expect("live entity");
            ecs.specs_world.maintain();
        }

        spawn_at(&mut ecs, &config, Point::new(3, 3), ModeKind::WanderB);
        let adversary = ecs.adversary().expect("spawned");
        assert_eq!(adversary.point, Point::new(3, 3));
        assert_eq!(adversary.brain.kind(), ModeKind::WanderB);
    }
}
