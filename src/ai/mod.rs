//! The shadow's behaviour: a four-mode state machine plus the movement
//! heuristic each mode drives. Nothing here owns the adversary; the ECS
//! systems feed it a [`MovementContext`] snapshot and apply the results.

use bracket_geometry::prelude::Point;
use bracket_random::prelude::RandomNumberGenerator;
use serde::Serialize;

use crate::{config::AiConfig, dice::chance, ecs::resources::MovementContext, map::FloorIndex};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeKind {
    Search,
    Active,
    WanderA,
    WanderB,
}

impl ModeKind {
    pub fn is_wander(self) -> bool {
        matches!(self, ModeKind::WanderA | ModeKind::WanderB)
    }
}

/// Per-mode numbers after floor scaling.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ModeStats {
    pub speed: i32,
    pub duration: u32,
    pub detection_range: i32,
}

impl ModeStats {
    pub fn scaled(kind: ModeKind, floor: FloorIndex, ai: &AiConfig) -> Self {
        let tuning = ai.tuning(kind);
        Self {
            speed: tuning.base_speed + (floor.get() / 2) as i32,
            duration: tuning.base_duration + floor.get() * 2,
            detection_range: tuning.detection_range,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    Search(ModeStats),
    Active(ModeStats),
    WanderA(ModeStats),
    WanderB(ModeStats),
}

impl Mode {
    pub fn new(kind: ModeKind, floor: FloorIndex, ai: &AiConfig) -> Self {
        let stats = ModeStats::scaled(kind, floor, ai);
        match kind {
            ModeKind::Search => Mode::Search(stats),
            ModeKind::Active => Mode::Active(stats),
            ModeKind::WanderA => Mode::WanderA(stats),
            ModeKind::WanderB => Mode::WanderB(stats),
        }
    }

    pub fn kind(&self) -> ModeKind {
        match self {
            Mode::Search(_) => ModeKind::Search,
            Mode::Active(_) => ModeKind::Active,
            Mode::WanderA(_) => ModeKind::WanderA,
            Mode::WanderB(_) => ModeKind::WanderB,
        }
    }

    pub fn stats(&self) -> &ModeStats {
        match self {
            Mode::Search(stats)
            | Mode::Active(stats)
            | Mode::WanderA(stats)
            | Mode::WanderB(stats) => stats,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    Hold,
    Enter(ModeKind),
    /// `wander_b` ran out and stays put with a fresh timer.
    Rewind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Brain {
    pub mode: Mode,
    pub mode_timer: u32,
    pub wander_anchor: Point,
}

impl Brain {
    pub fn new(kind: ModeKind, floor: FloorIndex, ai: &AiConfig, here: Point) -> Self {
        let mode = Mode::new(kind, floor, ai);
        Self {
            mode,
            mode_timer: mode.stats().duration,
            wander_anchor: here,
        }
    }

    pub fn kind(&self) -> ModeKind {
        self.mode.kind()
    }

    /// Switches mode. Re-entering the current mode is a no-op and returns false.
    pub fn set_mode(
        &mut self,
        kind: ModeKind,
        duration_override: Option<u32>,
        floor: FloorIndex,
        ai: &AiConfig,
        here: Point,
    ) -> bool {
        if self.mode.kind() == kind {
            return false;
        }
        self.mode = Mode::new(kind, floor, ai);
        self.mode_timer = duration_override.unwrap_or(self.mode.stats().duration);
        if kind.is_wander() {
            self.wander_anchor = here;
        }
        true
    }

    /// One turn passes. Saturates at zero.
    pub fn tick(&mut self) {
        self.mode_timer = self.mode_timer.saturating_sub(1);
    }

    pub fn expired(&self) -> bool {
        self.mode_timer == 0
    }

    pub fn evaluate(&self, dist: i32, ai: &AiConfig, rng: &mut RandomNumberGenerator) -> Transition {
        let search_range = ai.search.detection_range;
        match self.mode {
            Mode::Search(stats) if dist <= stats.detection_range => {
                Transition::Enter(ModeKind::Active)
            }
            Mode::Search(_) if self.expired() => Transition::Enter(ModeKind::WanderB),
            Mode::Active(stats)
                if dist > stats.detection_range + ai.active_margin || self.expired() =>
            {
                Transition::Enter(ModeKind::WanderA)
            }
            Mode::WanderA(_) if self.expired() => Transition::Enter(ModeKind::WanderB),
            Mode::WanderB(_) if dist <= search_range => Transition::Enter(ModeKind::Active),
            Mode::WanderB(_) if self.expired() => {
                if chance(rng, ai.resume_search_chance) {
                    Transition::Enter(ModeKind::Search)
                } else {
                    Transition::Rewind
                }
            }
            _ => Transition::Hold,
        }
    }

    /// Evaluates and applies the transition table. Returns the mode entered,
    /// if the mode actually changed.
    pub fn update_mode(
        &mut self,
        dist: i32,
        floor: FloorIndex,
        ai: &AiConfig,
        here: Point,
        rng: &mut RandomNumberGenerator,
    ) -> Option<ModeKind> {
        match self.evaluate(dist, ai, rng) {
            Transition::Hold => None,
            Transition::Rewind => {
                self.mode_timer = self.mode.stats().duration;
                None
            }
            Transition::Enter(kind) => self.set_mode(kind, None, floor, ai, here).then_some(kind),
        }
    }
}

pub fn manhattan(a: Point, b: Point) -> i32 {
    (a.x - b.x).abs() + (a.y - b.y).abs()
}

/// Number of actions a `speed` buys in one player turn: the whole multiples
/// of `action_cost`, plus one more with probability `remainder / action_cost`.
pub fn action_budget(speed: i32, action_cost: i32, rng: &mut RandomNumberGenerator) -> i32 {
    if action_cost <= 0 {
        return 0;
    }
    let speed = speed.max(0);
    let whole = speed / action_cost;
    let remainder = speed % action_cost;
    let extra = if remainder > 0 && rng.range(0, action_cost) < remainder {
        1
    } else {
        0
    };
    whole + extra
}

/// Greedy pursuit. When both axes differ and the diagonal is open, one axis is
/// picked at random; otherwise the x step wins, then the y step. A blocked
/// axis is simply not taken.
pub fn step_towards(
    from: Point,
    to: Point,
    ctx: &MovementContext,
    rng: &mut RandomNumberGenerator,
) -> Point {
    let dx = (to.x - from.x).signum();
    let dy = (to.y - from.y).signum();
    let horizontal = Point::new(from.x + dx, from.y);
    let vertical = Point::new(from.x, from.y + dy);

    if dx != 0 && dy != 0 && ctx.is_walkable(Point::new(from.x + dx, from.y + dy)) {
        let order = if rng.range(0, 2) == 0 {
            [horizontal, vertical]
        } else {
            [vertical, horizontal]
        };
        if let Some(step) = order.into_iter().find(|step| ctx.is_walkable(*step)) {
            return step;
        }
    }
    if dx != 0 && ctx.is_walkable(horizontal) {
        return horizontal;
    }
    if dy != 0 && ctx.is_walkable(vertical) {
        return vertical;
    }
    from
}

/// Random step in the 3x3 neighbourhood, kept only if walkable and strictly
/// inside the tether around `anchor`.
pub fn step_wandering(
    from: Point,
    anchor: Point,
    tether: i32,
    ctx: &MovementContext,
    rng: &mut RandomNumberGenerator,
) -> Point {
    let target = Point::new(from.x + rng.range(-1, 2), from.y + rng.range(-1, 2));
    if ctx.is_walkable(target) && manhattan(target, anchor) < tether {
        target
    } else {
        from
    }
}

pub fn step_loosely_towards(
    from: Point,
    to: Point,
    anchor: Point,
    ai: &AiConfig,
    ctx: &MovementContext,
    rng: &mut RandomNumberGenerator,
) -> Point {
    if chance(rng, ai.loose_wander_chance) {
        step_wandering(from, anchor, ai.tether_radius, ctx, rng)
    } else {
        step_towards(from, to, ctx, rng)
    }
}

/// Where the current mode moves the adversary this action.
pub fn next_position(
    brain: &Brain,
    from: Point,
    ai: &AiConfig,
    ctx: &MovementContext,
    rng: &mut RandomNumberGenerator,
) -> Point {
    let target = ctx.player_point;
    match brain.mode {
        Mode::Active(_) => step_towards(from, target, ctx, rng),
        Mode::Search(_) => step_loosely_towards(from, target, brain.wander_anchor, ai, ctx, rng),
        Mode::WanderA(_) | Mode::WanderB(_) => {
            step_wandering(from, brain.wander_anchor, ai.tether_radius, ctx, rng)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Grid;

    fn open_room(player: Point) -> MovementContext {
        let grid = Grid::from_rows(&[
            "###########",
            "#.........#",
            "#.........#",
            "#.........#",
            "#.........#",
            "#.........#",
            "###########",
        ]);
        MovementContext::from_grid(&grid, FloorIndex::FIRST, player)
    }

    fn brain(kind: ModeKind) -> Brain {
        Brain::new(kind, FloorIndex::FIRST, &AiConfig::default(), Point::new(5, 3))
    }

    #[test]
    fn deeper_floors_are_faster_and_longer() {
        let ai = AiConfig::default();
        for kind in [
            ModeKind::Search,
            ModeKind::Active,
            ModeKind::WanderA,
            ModeKind::WanderB,
        ] {
            let shallow = ModeStats::scaled(kind, FloorIndex(1), &ai);
            let deep = ModeStats::scaled(kind, FloorIndex(5), &ai);
            assert!(deep.speed > shallow.speed, "{kind:?} speed");
            assert!(deep.duration > shallow.duration, "{kind:?} duration");
        }
        let active = ModeStats::scaled(ModeKind::Active, FloorIndex(5), &ai);
        assert_eq!(active.speed, 12 + 2);
        assert_eq!(active.duration, 15 + 10);
    }

    #[test]
    fn reentering_a_mode_keeps_its_timer() {
        let ai = AiConfig::default();
        let mut brain = brain(ModeKind::Search);
        brain.tick();
        let before = brain.mode_timer;
        assert!(!brain.set_mode(ModeKind::Search, Some(3), FloorIndex::FIRST, &ai, Point::new(1, 1)));
        assert_eq!(brain.mode_timer, before);
    }

    #[test]
    fn override_and_anchor_apply_on_wander_entry() {
        let ai = AiConfig::default();
        let mut brain = brain(ModeKind::Active);
        let here = Point::new(2, 4);
        assert!(brain.set_mode(ModeKind::WanderA, Some(20), FloorIndex::FIRST, &ai, here));
        assert_eq!(brain.mode_timer, 20);
        assert_eq!(brain.wander_anchor, here);

        assert!(brain.set_mode(ModeKind::Active, None, FloorIndex::FIRST, &ai, Point::new(7, 7)));
        assert_eq!(brain.mode_timer, 15 + 2);
        assert_eq!(brain.wander_anchor, here);
    }

    #[test]
    fn timer_never_underflows() {
        let mut brain = brain(ModeKind::WanderA);
        for _ in 0..100 {
            brain.tick();
        }
        assert_eq!(brain.mode_timer, 0);
        assert!(brain.expired());
    }

    #[test]
    fn transition_table() {
        let ai = AiConfig::default();
        let mut rng = RandomNumberGenerator::seeded(5);

        let search = brain(ModeKind::Search);
        assert_eq!(search.evaluate(6, &ai, &mut rng), Transition::Enter(ModeKind::Active));
        assert_eq!(search.evaluate(7, &ai, &mut rng), Transition::Hold);
        let mut expired_search = search.clone();
        expired_search.mode_timer = 0;
        assert_eq!(
            expired_search.evaluate(20, &ai, &mut rng),
            Transition::Enter(ModeKind::WanderB)
        );

        let active = brain(ModeKind::Active);
        assert_eq!(active.evaluate(13, &ai, &mut rng), Transition::Hold);
        assert_eq!(active.evaluate(14, &ai, &mut rng), Transition::Enter(ModeKind::WanderA));
        let mut expired_active = active.clone();
        expired_active.mode_timer = 0;
        assert_eq!(
            expired_active.evaluate(0, &ai, &mut rng),
            Transition::Enter(ModeKind::WanderA)
        );

        let mut wander_a = brain(ModeKind::WanderA);
        assert_eq!(wander_a.evaluate(0, &ai, &mut rng), Transition::Hold);
        wander_a.mode_timer = 0;
        assert_eq!(wander_a.evaluate(0, &ai, &mut rng), Transition::Enter(ModeKind::WanderB));

        let wander_b = brain(ModeKind::WanderB);
        assert_eq!(wander_b.evaluate(6, &ai, &mut rng), Transition::Enter(ModeKind::Active));
        assert_eq!(wander_b.evaluate(7, &ai, &mut rng), Transition::Hold);
    }

    #[test]
    fn expired_wander_b_either_resumes_search_or_rewinds() {
        let mut ai = AiConfig::default();
        let mut rng = RandomNumberGenerator::seeded(9);
        let mut wander_b = brain(ModeKind::WanderB);
        wander_b.mode_timer = 0;

        ai.resume_search_chance = 1.0;
        assert_eq!(wander_b.evaluate(20, &ai, &mut rng), Transition::Enter(ModeKind::Search));

        ai.resume_search_chance = 0.0;
        assert_eq!(wander_b.evaluate(20, &ai, &mut rng), Transition::Rewind);
        let changed = wander_b.update_mode(20, FloorIndex::FIRST, &ai, Point::new(5, 3), &mut rng);
        assert_eq!(changed, None);
        assert_eq!(wander_b.kind(), ModeKind::WanderB);
        assert_eq!(wander_b.mode_timer, 30 + 2);
    }

    #[test]
    fn budget_matches_speed() {
        let mut rng = RandomNumberGenerator::seeded(1);
        for _ in 0..100 {
            assert_eq!(action_budget(10, 10, &mut rng), 1);
            assert_eq!(action_budget(20, 10, &mut rng), 2);
            assert_eq!(action_budget(0, 10, &mut rng), 0);
            let fractional = action_budget(15, 10, &mut rng);
            assert!(fractional == 1 || fractional == 2);
            let slow = action_budget(5, 10, &mut rng);
            assert!(slow == 0 || slow == 1);
        }
    }

    #[test]
    fn budget_fraction_is_roughly_proportional() {
        let mut rng = RandomNumberGenerator::seeded(77);
        let extra: i32 = (0..2000).map(|_| action_budget(12, 10, &mut rng) - 1).sum();
        // 20% expected; generous band.
        assert!((250..=550).contains(&extra), "extra actions: {extra}");
    }

    #[test]
    fn greedy_step_closes_distance() {
        let player = Point::new(8, 1);
        let ctx = open_room(player);
        let mut rng = RandomNumberGenerator::seeded(2);
        let from = Point::new(2, 4);
        let next = step_towards(from, player, &ctx, &mut rng);
        assert_eq!(manhattan(next, player), manhattan(from, player) - 1);

        let along_row = step_towards(Point::new(2, 1), player, &ctx, &mut rng);
        assert_eq!(along_row, Point::new(3, 1));
    }

    #[test]
    fn greedy_step_never_walks_into_walls() {
        let grid = Grid::from_rows(&[
            "#######",
            "#.#...#",
            "#.#...#",
            "#.....#",
            "#######",
        ]);
        let player = Point::new(4, 1);
        let ctx = MovementContext::from_grid(&grid, FloorIndex::FIRST, player);
        let mut rng = RandomNumberGenerator::seeded(4);
        // x is blocked by the wall column, y toward the player is open.
        for _ in 0..20 {
            let next = step_towards(Point::new(1, 2), player, &ctx, &mut rng);
            assert_eq!(next, Point::new(1, 1));
        }
        // Both axes blocked: stay put.
        let cornered = step_towards(Point::new(1, 1), Point::new(4, 0), &ctx, &mut rng);
        assert_eq!(cornered, Point::new(1, 1));
    }

    #[test]
    fn wandering_respects_the_tether() {
        let ctx = open_room(Point::new(1, 1));
        let mut rng = RandomNumberGenerator::seeded(8);
        let anchor = Point::new(5, 3);
        let mut here = anchor;
        for _ in 0..500 {
            here = step_wandering(here, anchor, 2, &ctx, &mut rng);
            assert!(manhattan(here, anchor) < 2);
            assert!(ctx.is_walkable(here));
        }
    }

    #[test]
    fn each_mode_dispatches_its_heuristic() {
        let ai = AiConfig::default();
        let player = Point::new(9, 3);
        let ctx = open_room(player);
        let mut rng = RandomNumberGenerator::seeded(12);
        let from = Point::new(5, 3);

        let active = brain(ModeKind::Active);
        assert_eq!(next_position(&active, from, &ai, &ctx, &mut rng), Point::new(6, 3));

        let mut anchored = brain(ModeKind::WanderA);
        anchored.wander_anchor = from;
        let mut tight = ai.clone();
        tight.tether_radius = 1;
        for _ in 0..50 {
            assert_eq!(next_position(&anchored, from, &tight, &ctx, &mut rng), from);
        }
    }
}
