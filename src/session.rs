//! The session object: owns the floor, the ECS world holding both actors, the
//! shared PRNG and the notification sink. Turn and encounter resolution live in
//! [`crate::turn`] and [`crate::encounter`] as further `impl Session` blocks.

use bracket_geometry::prelude::Point;
use bracket_random::prelude::RandomNumberGenerator;
use serde::Serialize;

use crate::{
    ai::{Brain, ModeKind},
    config::SimConfig,
    ecs::{
        AdversarySnapshot, EcsWorld,
        components::{Inventory, Vitals},
    },
    map::{AdversarySpawn, EntityKind, FloorIndex, Grid, Placement, Tile, generate_floor},
    notify::{Notification, NotificationSink, Severity},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Loading,
    Playing,
    Encounter,
    GameOver,
}

pub struct Session {
    pub(crate) config: SimConfig,
    pub(crate) state: SessionState,
    pub(crate) floor: FloorIndex,
    pub(crate) turn: u64,
    pub(crate) grid: Grid,
    pub(crate) ecs: EcsWorld,
    sink: Box<dyn NotificationSink>,
}

impl Session {
    /// A session waiting in `loading`. Call [`Session::start`] to generate the
    /// first floor.
    pub fn new<S>(config: SimConfig, sink: S) -> Self
    where
        S: NotificationSink + 'static,
    {
        let rng = match config.seed {
            Some(seed) => RandomNumberGenerator::seeded(seed),
            None => RandomNumberGenerator::new(),
        };
        let ecs = EcsWorld::new(&config, rng);
        let grid = Grid::new(config.dungeon.width, config.dungeon.height);
        Self {
            config,
            state: SessionState::Loading,
            floor: FloorIndex::FIRST,
            turn: 0,
            grid,
            ecs,
            sink: Box::new(sink),
        }
    }

    /// Wraps a hand-built grid in a session that is already `playing`, with
    /// the player on the grid's start tile and no adversary yet.
    pub fn with_grid<S>(config: SimConfig, grid: Grid, floor: FloorIndex, sink: S) -> Self
    where
        S: NotificationSink + 'static,
    {
        let mut session = Session::new(config, sink);
        session.floor = floor;
        session.grid = grid;
        let start = session.grid.start();
        session.ecs.set_player_point(start);
        session.update_visibility();
        session.state = SessionState::Playing;
        session
    }

    /// Starts (or restarts) a run on floor 1 with a fresh player.
    pub fn start(&mut self) {
        self.state = SessionState::Loading;
        self.floor = FloorIndex::FIRST;
        self.turn = 0;
        self.ecs.reset_player(&self.config);
        self.setup_floor();
        self.state = SessionState::Playing;
        let floor = self.floor.get();
        self.say(Severity::System, format!("Basement floor {floor}."));
        self.flush();
    }

    /// Generates the current floor and drops both actors onto it.
    pub(crate) fn setup_floor(&mut self) {
        let floor = self.floor;
        let generated = self
            .ecs
            .with_rng(|rng| generate_floor(floor, &self.config, rng));
        self.grid = generated.grid;
        let spawn = generated.adversary.point;
        self.ecs.spawn_adversary(generated.adversary);

        let attempts = self.config.dungeon.placement_attempts;
        let grid = &self.grid;
        let placement = self
            .ecs
            .with_rng(|rng| grid.sample_vacant(rng, attempts, |point| point != spawn));
        let start = match placement {
            Placement::Found(point) => point,
            Placement::Exhausted => {
                log::warn!(
                    "floor {}: no empty tile for the player, using the start tile",
                    floor.get()
                );
                self.grid.start()
            }
        };
        self.ecs.set_player_point(start);
        self.update_visibility();
        log::debug!(
            "floor {} ready: player at {},{}, adversary at {},{}",
            floor.get(),
            start.x,
            start.y,
            spawn.x,
            spawn.y
        );
    }

    // ── Notifications ──

    /// Queues a message; it reaches the sink on the next flush.
    pub(crate) fn say<S: Into<String>>(&mut self, severity: Severity, message: S) {
        self.ecs.push_message(severity, message);
    }

    pub(crate) fn flush(&mut self) {
        for (severity, message) in self.ecs.drain_messages() {
            self.sink.notify(&Notification {
                turn: self.turn,
                severity,
                message,
            });
        }
    }

    // ── Queries ──

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn floor(&self) -> FloorIndex {
        self.floor
    }

    pub fn turn(&self) -> u64 {
        self.turn
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn get_tile(&self, x: i32, y: i32) -> Option<&Tile> {
        self.grid.get_tile(x, y)
    }

    pub fn is_walkable(&self, x: i32, y: i32) -> bool {
        self.grid.is_walkable_xy(x, y)
    }

    pub fn find_entity(&self, kind: EntityKind) -> Option<Point> {
        self.grid.find_entity(kind)
    }

    pub fn player_point(&self) -> Point {
        self.ecs.player_point()
    }

    pub fn player_vitals(&self) -> Vitals {
        self.ecs.player_vitals()
    }

    pub fn player_inventory(&self) -> Inventory {
        self.ecs.player_inventory()
    }

    pub fn adversary(&self) -> Option<AdversarySnapshot> {
        self.ecs.adversary()
    }

    // ── Host controls ──

    /// Recomputes visible/discovered around the player.
    pub fn update_visibility(&mut self) {
        let origin = self.ecs.player_point();
        self.grid
            .update_visibility(origin, self.config.player.vision_radius);
    }

    /// Teleports the adversary to a freshly sampled empty tile away from the
    /// player. On exhaustion it stays where it is.
    pub fn warp_adversary(&mut self) -> Placement {
        if self.ecs.adversary_point().is_none() {
            return Placement::Exhausted;
        }
        let player = self.ecs.player_point();
        let attempts = self.config.dungeon.placement_attempts;
        let grid = &self.grid;
        let placement = self
            .ecs
            .with_rng(|rng| grid.sample_vacant(rng, attempts, |point| point != player));
        match placement {
            Placement::Found(point) => {
                log::debug!("adversary warped to {},{}", point.x, point.y);
                self.ecs.move_adversary(point);
            }
            Placement::Exhausted => log::debug!("warp found no empty tile; adversary stays"),
        }
        placement
    }

    /// Forces a mode. Returns whether it changed.
    pub fn set_adversary_mode(&mut self, kind: ModeKind, duration_override: Option<u32>) -> bool {
        let changed = self
            .ecs
            .set_adversary_mode(kind, duration_override, self.floor, &self.config.ai);
        self.flush();
        changed
    }

    pub fn place_player(&mut self, point: Point) {
        self.ecs.set_player_point(point);
        self.update_visibility();
    }

    /// Spawns (or replaces) the adversary at `point` in mode `kind`.
    pub fn place_adversary(&mut self, point: Point, kind: ModeKind) {
        let brain = Brain::new(kind, self.floor, &self.config.ai, point);
        self.ecs.spawn_adversary(AdversarySpawn { point, brain });
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::notify::NullSink;

    fn seeded(seed: u64) -> SimConfig {
        SimConfig {
            seed: Some(seed),
            ..SimConfig::default()
        }
    }

    #[test]
    fn start_moves_from_loading_to_playing() {
        let mut session = Session::new(seeded(21), NullSink);
        assert_eq!(session.state(), SessionState::Loading);
        session.start();
        assert_eq!(session.state(), SessionState::Playing);
        assert_eq!(session.floor(), FloorIndex::FIRST);
        assert_eq!(session.turn(), 0);

        let player = session.player_point();
        let adversary = session.adversary().expect("spawned");
        assert_ne!(player, adversary.point);
        assert!(session.is_walkable(player.x, player.y));
        assert!(session.grid().is_reachable(player));
        assert!(session.get_tile(player.x, player.y).is_some_and(Tile::visible));
        assert_eq!(adversary.brain.kind(), ModeKind::Search);
    }

    #[test]
    fn seeded_sessions_generate_the_same_floor() {
        let mut first = Session::new(seeded(99), NullSink);
        let mut second = Session::new(seeded(99), NullSink);
        first.start();
        second.start();
        assert_eq!(first.grid().tiles(), second.grid().tiles());
        assert_eq!(first.player_point(), second.player_point());
    }

    #[test]
    fn start_announces_the_floor_and_the_adversary() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let captured = Rc::clone(&log);
        let mut session = Session::new(seeded(4), move |note: &Notification| {
            captured.borrow_mut().push(note.clone());
        });
        session.start();

        let log = log.borrow();
        assert!(log.iter().any(|note| note.severity == Severity::System));
        assert!(log.iter().any(|note| note.severity == Severity::Warning
            && note.message.contains("feeling out")));
        assert!(log.iter().all(|note| note.turn == 0));
    }

    #[test]
    fn warp_lands_on_empty_floor_away_from_the_player() {
        let mut session = Session::new(seeded(8), NullSink);
        session.start();
        for _ in 0..50 {
            let placement = session.warp_adversary();
            let point = placement.point().expect("room to warp");
            assert!(session.grid().is_vacant(point));
            assert_ne!(point, session.player_point());
            assert_eq!(session.adversary().map(|a| a.point), Some(point));
            assert_eq!(session.adversary().map(|a| a.brain.wander_anchor), Some(point));
        }
    }

    #[test]
    fn forced_mode_change_reports_only_real_changes() {
        let grid = Grid::from_rows(&["#######", "#.....#", "#######"]);
        let mut session = Session::with_grid(seeded(1), grid, FloorIndex::FIRST, NullSink);
        assert!(!session.set_adversary_mode(ModeKind::Active, None));

        session.place_adversary(Point::new(1, 1), ModeKind::Search);
        assert!(session.set_adversary_mode(ModeKind::WanderA, Some(20)));
        assert!(!session.set_adversary_mode(ModeKind::WanderA, Some(5)));
        let adversary = session.adversary().expect("placed");
        assert_eq!(adversary.brain.mode_timer, 20);
        assert_eq!(adversary.speed, 5);
    }
}
