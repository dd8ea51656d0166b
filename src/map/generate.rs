//! Drunkard's-walk floor generation.
//!
//! The walk starts at the centre and wanders in the 3x3 neighbourhood, never
//! touching the outer ring, turning walls to floor until the floor's ratio of
//! the grid area has been carved. Entities and the adversary are then dropped
//! onto reachable empty floor by rejection sampling.

use bracket_geometry::prelude::Point;
use bracket_random::prelude::RandomNumberGenerator;

use super::{Entity, FloorIndex, Grid, Placement};
use crate::{
    ai::{Brain, ModeKind},
    config::{DungeonConfig, SimConfig},
    dice::unit_roll,
};

/// Hard stop for the walk, in steps per grid cell.
const WALK_STEPS_PER_CELL: usize = 400;

/// Where the adversary starts and the brain it starts with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdversarySpawn {
    pub point: Point,
    pub brain: Brain,
}

#[derive(Clone, Debug)]
pub struct Floor {
    pub index: FloorIndex,
    pub grid: Grid,
    pub adversary: AdversarySpawn,
    /// Fraction of the grid area the walk aimed to carve.
    pub ratio: f32,
}

pub fn generate_floor(
    index: FloorIndex,
    config: &SimConfig,
    rng: &mut RandomNumberGenerator,
) -> Floor {
    let dungeon = &config.dungeon;
    let mut grid = Grid::new(dungeon.width, dungeon.height);

    let ratio = roll_ratio(dungeon, rng);
    let target = carve_target(&grid, ratio);
    let carved = carve_walk(&mut grid, target, rng);
    grid.compute_reachability();
    log::debug!(
        "floor {}: ratio {ratio:.3}, carved {carved}/{target}, {} floor tiles, {} reachable",
        index.get(),
        grid.floor_count(),
        grid.reachable_count()
    );

    populate(&mut grid, index, dungeon, rng);

    let point = match grid.sample_vacant(rng, dungeon.placement_attempts, |_| true) {
        Placement::Found(point) => point,
        Placement::Exhausted => {
            log::warn!(
                "floor {}: no empty tile for the adversary, spawning at the start tile",
                index.get()
            );
            grid.start()
        }
    };
    let brain = Brain::new(ModeKind::Search, index, &config.ai, point);

    Floor {
        index,
        grid,
        adversary: AdversarySpawn { point, brain },
        ratio,
    }
}

fn roll_ratio(dungeon: &DungeonConfig, rng: &mut RandomNumberGenerator) -> f32 {
    let span = dungeon.floor_ratio_max - dungeon.floor_ratio_min;
    dungeon.floor_ratio_min + unit_roll(rng) * span
}

/// Floor tiles wanted in total, start tile included. Capped so the interior
/// can always hold them, and never below the start tile itself.
fn carve_target(grid: &Grid, ratio: f32) -> usize {
    let wanted = (grid.area() as f32 * ratio).floor() as usize;
    let interior = ((grid.width() - 2).max(0) * (grid.height() - 2).max(0)) as usize;
    wanted.min(interior).max(1)
}

/// Returns the number of floor tiles carved, start tile included.
fn carve_walk(grid: &mut Grid, target: usize, rng: &mut RandomNumberGenerator) -> usize {
    let width = grid.width();
    let height = grid.height();
    let mut cursor = grid.start();
    let mut converted = usize::from(grid.carve(cursor));

    let step_cap = grid.area() * WALK_STEPS_PER_CELL;
    let mut steps = 0;
    while converted < target {
        if steps >= step_cap {
            log::warn!("walk hit its step cap after carving {converted}/{target}");
            break;
        }
        steps += 1;

        let next = Point::new(cursor.x + rng.range(-1, 2), cursor.y + rng.range(-1, 2));
        if next.x <= 0 || next.x >= width - 1 || next.y <= 0 || next.y >= height - 1 {
            continue;
        }
        cursor = next;
        if grid.carve(cursor) {
            converted += 1;
        }
    }
    converted
}

fn populate(
    grid: &mut Grid,
    index: FloorIndex,
    dungeon: &DungeonConfig,
    rng: &mut RandomNumberGenerator,
) {
    let attempts = dungeon.placement_attempts;
    place(grid, rng, attempts, Entity::Stairs, 1);

    for item in &dungeon.floor_items {
        place(grid, rng, attempts, Entity::Item(*item), 1);
    }

    let traps = dungeon.base_traps + index.get() / 2;
    let armed = place(
        grid,
        rng,
        attempts,
        Entity::Trap {
            damage: dungeon.trap_damage,
        },
        traps,
    );
    log::debug!("floor {}: armed {armed}/{traps} traps", index.get());

    for _ in 0..dungeon.chest_count {
        if dungeon.chest_loot.is_empty() {
            break;
        }
        let loot = dungeon.chest_loot[rng.range(0, dungeon.chest_loot.len())];
        place(grid, rng, attempts, Entity::Chest { locked: true, loot }, 1);
    }
}

/// Drops `count` copies of `entity`. Exhausted draws skip that copy.
fn place(
    grid: &mut Grid,
    rng: &mut RandomNumberGenerator,
    attempts: u32,
    entity: Entity,
    count: u32,
) -> u32 {
    let mut placed = 0;
    for _ in 0..count {
        match grid.sample_vacant(rng, attempts, |_| true) {
            Placement::Found(point) => {
                grid.set_entity(point, Some(entity));
                placed += 1;
            }
            Placement::Exhausted => {
                log::debug!("no room left for {entity:?}; skipping");
            }
        }
    }
    placed
}
