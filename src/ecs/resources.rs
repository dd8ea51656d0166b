use bracket_geometry::prelude::Point;

use crate::{
    map::{FloorIndex, Grid},
    notify::Severity,
};

/// Walkability snapshot the adversary systems steer by. The grid's terrain is
/// fixed for the life of a floor and the player does not move while the
/// adversary acts, so one snapshot serves a whole turn.
#[derive(Clone, Debug)]
pub struct MovementContext {
    pub floor: FloorIndex,
    pub player_point: Point,
    pub width: i32,
    pub height: i32,
    walkable: Vec<bool>,
}

impl MovementContext {
    pub fn from_grid(grid: &Grid, floor: FloorIndex, player_point: Point) -> Self {
        let walkable = grid
            .tiles()
            .iter()
            .map(|tile| tile.is_floor())
            .collect::<Vec<bool>>();

        Self {
            floor,
            player_point,
            width: grid.width(),
            height: grid.height(),
            walkable,
        }
    }

    pub fn empty() -> Self {
        Self {
            floor: FloorIndex::FIRST,
            player_point: Point::new(0, 0),
            width: 0,
            height: 0,
            walkable: Vec::new(),
        }
    }

    pub fn is_walkable(&self, point: Point) -> bool {
        if !self.in_bounds(point) {
            return false;
        }
        let idx = (point.y * self.width + point.x) as usize;
        self.walkable.get(idx).copied().unwrap_or(false)
    }

    pub fn in_bounds(&self, point: Point) -> bool {
        point.x >= 0 && point.x < self.width && point.y >= 0 && point.y < self.height
    }
}

#[derive(Default)]
pub struct MessageLog {
    pub entries: Vec<(Severity, String)>,
}

impl MessageLog {
    pub fn push<S: Into<String>>(&mut self, severity: Severity, entry: S) {
        self.entries.push((severity, entry.into()));
    }

    pub fn drain(&mut self) -> Vec<(Severity, String)> {
        std::mem::take(&mut self.entries)
    }
}
