pub mod generate;

use bracket_geometry::prelude::Point;
use bracket_pathfinding::prelude::{Algorithm2D, BaseMap, DijkstraMap, DistanceAlg};
use bracket_random::prelude::RandomNumberGenerator;
use smallvec::SmallVec;

use crate::data::items::ItemKind;

pub use generate::{AdversarySpawn, Floor, generate_floor};

pub const CARDINALS: [Point; 4] = [
    Point { x: 1, y: 0 },
    Point { x: -1, y: 0 },
    Point { x: 0, y: 1 },
    Point { x: 0, y: -1 },
];

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FloorIndex(pub u32);

impl FloorIndex {
    pub const FIRST: FloorIndex = FloorIndex(1);

    pub fn next(self) -> Self {
        FloorIndex(self.0 + 1)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for FloorIndex {
    fn default() -> Self {
        FloorIndex::FIRST
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TileKind {
    Floor,
    Wall,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Stairs,
    Item,
    Trap,
    Chest,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Entity {
    Stairs,
    Item(ItemKind),
    Trap { damage: i32 },
    Chest { locked: bool, loot: ItemKind },
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Stairs => EntityKind::Stairs,
            Entity::Item(_) => EntityKind::Item,
            Entity::Trap { .. } => EntityKind::Trap,
            Entity::Chest { .. } => EntityKind::Chest,
        }
    }
}

/// One grid cell. The terrain kind is fixed once the floor is generated and
/// `discovered` only ever flips from false to true.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tile {
    kind: TileKind,
    visible: bool,
    discovered: bool,
    entity: Option<Entity>,
}

impl Default for Tile {
    fn default() -> Self {
        Tile::wall()
    }
}

impl Tile {
    pub fn wall() -> Self {
        Self {
            kind: TileKind::Wall,
            visible: false,
            discovered: false,
            entity: None,
        }
    }

    pub fn floor() -> Self {
        Self {
            kind: TileKind::Floor,
            ..Tile::wall()
        }
    }

    pub fn kind(&self) -> TileKind {
        self.kind
    }

    pub fn is_floor(&self) -> bool {
        self.kind == TileKind::Floor
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn discovered(&self) -> bool {
        self.discovered
    }

    pub fn entity(&self) -> Option<&Entity> {
        self.entity.as_ref()
    }

    fn observe(&mut self, in_view: bool) {
        self.visible = in_view;
        if in_view {
            self.discovered = true;
        }
    }
}

/// Outcome of a rejection-sampled search for an empty floor tile.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Placement {
    Found(Point),
    Exhausted,
}

impl Placement {
    pub fn point(self) -> Option<Point> {
        match self {
            Placement::Found(point) => Some(point),
            Placement::Exhausted => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Grid {
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
    start: Point,
    reachable: Vec<bool>,
}

impl Grid {
    /// Solid rock, with the generation start at the centre.
    pub fn new(width: i32, height: i32) -> Self {
        let size = (width.max(0) * height.max(0)) as usize;
        Self {
            width,
            height,
            tiles: vec![Tile::wall(); size],
            start: Point::new(width / 2, height / 2),
            reachable: vec![false; size],
        }
    }

    /// Builds a grid from ASCII rows: `#` wall, `.` floor, `>` stairs, `^` trap,
    /// `+` first aid kit, `k` copper key, `c` locked chest. Anything else is wall.
    pub fn from_rows(rows: &[&str]) -> Self {
        let height = rows.len() as i32;
        let width = rows.iter().map(|row| row.chars().count()).max().unwrap_or(0) as i32;
        let mut grid = Grid::new(width, height);
        for (y, row) in rows.iter().enumerate() {
            for (x, glyph) in row.chars().enumerate() {
                let point = Point::new(x as i32, y as i32);
                let entity = match glyph {
                    '.' => None,
                    '>' => Some(Entity::Stairs),
                    '^' => Some(Entity::Trap { damage: 10 }),
                    '+' => Some(Entity::Item(ItemKind::FirstAidKit)),
                    'k' => Some(Entity::Item(ItemKind::CopperKey)),
                    'c' => Some(Entity::Chest {
                        locked: true,
                        loot: ItemKind::StaminaDrink,
                    }),
                    _ => continue,
                };
                grid.carve(point);
                grid.set_entity(point, entity);
            }
        }
        if !grid.tile(grid.start).is_some_and(Tile::is_floor) {
            if let Some(first) = grid.floor_points().first() {
                grid.start = *first;
            }
        }
        grid.compute_reachability();
        grid
    }

    fn idx(&self, point: Point) -> Option<usize> {
        if self.in_bounds(point) {
            Some((point.y * self.width + point.x) as usize)
        } else {
            None
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn area(&self) -> usize {
        self.tiles.len()
    }

    pub fn start(&self) -> Point {
        self.start
    }

    pub fn in_bounds(&self, point: Point) -> bool {
        point.x >= 0 && point.x < self.width && point.y >= 0 && point.y < self.height
    }

    pub fn tile(&self, point: Point) -> Option<&Tile> {
        self.idx(point).map(|idx| &self.tiles[idx])
    }

    pub fn get_tile(&self, x: i32, y: i32) -> Option<&Tile> {
        self.tile(Point::new(x, y))
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Out-of-bounds cells are never walkable.
    pub fn is_walkable(&self, point: Point) -> bool {
        self.tile(point).is_some_and(Tile::is_floor)
    }

    pub fn is_walkable_xy(&self, x: i32, y: i32) -> bool {
        self.is_walkable(Point::new(x, y))
    }

    /// Floor with nothing on it.
    pub fn is_vacant(&self, point: Point) -> bool {
        self.tile(point)
            .is_some_and(|tile| tile.is_floor() && tile.entity.is_none())
    }

    pub fn is_reachable(&self, point: Point) -> bool {
        self.idx(point)
            .and_then(|idx| self.reachable.get(idx).copied())
            .unwrap_or(false)
    }

    pub fn entity_at(&self, point: Point) -> Option<&Entity> {
        self.tile(point).and_then(Tile::entity)
    }

    /// First entity of `kind` in row-major order.
    pub fn find_entity(&self, kind: EntityKind) -> Option<Point> {
        self.tiles
            .iter()
            .position(|tile| tile.entity.is_some_and(|entity| entity.kind() == kind))
            .map(|idx| self.index_to_point2d(idx))
    }

    pub fn count_entities(&self, kind: EntityKind) -> usize {
        self.tiles
            .iter()
            .filter(|tile| tile.entity.is_some_and(|entity| entity.kind() == kind))
            .count()
    }

    pub fn floor_count(&self) -> usize {
        self.tiles.iter().filter(|tile| tile.is_floor()).count()
    }

    pub fn floor_points(&self) -> Vec<Point> {
        let mut points = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                let point = Point::new(x, y);
                if self.is_walkable(point) {
                    points.push(point);
                }
            }
        }
        points
    }

    /// Converts a wall to floor. Returns whether anything changed.
    pub(crate) fn carve(&mut self, point: Point) -> bool {
        match self.idx(point) {
            Some(idx) if self.tiles[idx].kind == TileKind::Wall => {
                self.tiles[idx].kind = TileKind::Floor;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn set_entity(&mut self, point: Point, entity: Option<Entity>) {
        if let Some(idx) = self.idx(point) {
            self.tiles[idx].entity = entity;
        }
    }

    pub(crate) fn take_entity(&mut self, point: Point) -> Option<Entity> {
        self.idx(point)
            .and_then(|idx| self.tiles[idx].entity.take())
    }

    /// Flood fills four-way from the start tile. Anything the fill cannot
    /// reach is excluded from placement.
    pub(crate) fn compute_reachability(&mut self) {
        if !self.is_walkable(self.start) {
            self.reachable = vec![false; self.tiles.len()];
            return;
        }
        let start = self.point2d_to_index(self.start);
        let depth = self.tiles.len() as f32;
        let flood = DijkstraMap::new(self.width, self.height, &[start], &*self, depth);
        self.reachable = flood
            .map
            .iter()
            .map(|distance| *distance < f32::MAX)
            .collect();
    }

    pub fn reachable_count(&self) -> usize {
        self.reachable.iter().filter(|reachable| **reachable).count()
    }

    /// Rejection sampling: uniformly random cells, accepting reachable vacant
    /// floor that also passes `accept`. Gives up after `attempts` draws.
    pub fn sample_vacant<F>(
        &self,
        rng: &mut RandomNumberGenerator,
        attempts: u32,
        mut accept: F,
    ) -> Placement
    where
        F: FnMut(Point) -> bool,
    {
        if self.width <= 0 || self.height <= 0 {
            return Placement::Exhausted;
        }
        for _ in 0..attempts {
            let point = Point::new(rng.range(0, self.width), rng.range(0, self.height));
            if self.is_vacant(point) && self.is_reachable(point) && accept(point) {
                return Placement::Found(point);
            }
        }
        Placement::Exhausted
    }

    /// Marks every tile within `radius` (Euclidean) of `origin` visible and
    /// discovered; everything else becomes not visible.
    pub fn update_visibility(&mut self, origin: Point, radius: f32) {
        let width = self.width;
        for (idx, tile) in self.tiles.iter_mut().enumerate() {
            let point = Point::new(idx as i32 % width, idx as i32 / width);
            let distance = DistanceAlg::Pythagoras.distance2d(origin, point);
            tile.observe(distance <= radius);
        }
    }
}

/// Free-standing form used by hosts for initial floor setup.
pub fn update_visibility(grid: &mut Grid, origin: Point, radius: f32) {
    grid.update_visibility(origin, radius);
}

impl BaseMap for Grid {
    fn is_opaque(&self, idx: usize) -> bool {
        self.tiles.get(idx).is_none_or(|tile| !tile.is_floor())
    }

    fn get_available_exits(&self, idx: usize) -> SmallVec<[(usize, f32); 10]> {
        let mut exits = SmallVec::new();
        let point = self.index_to_point2d(idx);
        for dir in CARDINALS {
            let dest = point + dir;
            if self.is_walkable(dest) {
                exits.push((self.point2d_to_index(dest), 1.0));
            }
        }
        exits
    }

    fn get_pathing_distance(&self, idx1: usize, idx2: usize) -> f32 {
        let p1 = self.index_to_point2d(idx1);
        let p2 = self.index_to_point2d(idx2);
        DistanceAlg::Pythagoras.distance2d(p1, p2)
    }
}

impl Algorithm2D for Grid {
    fn dimensions(&self) -> Point {
        Point::new(self.width, self.height)
    }

    fn in_bounds(&self, point: Point) -> bool {
        Grid::in_bounds(self, point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room() -> Grid {
        Grid::from_rows(&[
            "#########",
            "#.......#",
            "#...>...#",
            "#.......#",
            "#########",
        ])
    }

    #[test]
    fn queries_respect_bounds() {
        let grid = room();
        assert!(grid.get_tile(-1, 0).is_none());
        assert!(grid.get_tile(9, 0).is_none());
        assert!(!grid.is_walkable_xy(-1, 2));
        assert!(!grid.is_walkable_xy(0, 2));
        assert!(grid.is_walkable_xy(1, 2));
        assert_eq!(grid.find_entity(EntityKind::Stairs), Some(Point::new(4, 2)));
        assert_eq!(grid.find_entity(EntityKind::Chest), None);
    }

    #[test]
    fn carve_only_converts_walls() {
        let mut grid = Grid::new(5, 5);
        assert!(grid.carve(Point::new(2, 2)));
        assert!(!grid.carve(Point::new(2, 2)));
        assert!(!grid.carve(Point::new(9, 9)));
        assert_eq!(grid.floor_count(), 1);
    }

    #[test]
    fn visibility_is_euclidean_and_discovery_sticks() {
        let mut grid = Grid::from_rows(&[
            "###########",
            "#.........#",
            "#.........#",
            "#.........#",
            "###########",
        ]);
        grid.update_visibility(Point::new(1, 1), 2.0);
        assert!(grid.get_tile(3, 1).is_some_and(Tile::visible));
        assert!(grid.get_tile(2, 2).is_some_and(Tile::visible));
        // sqrt(8) > 2
        assert!(!grid.get_tile(3, 3).is_some_and(Tile::visible));
        assert!(!grid.get_tile(9, 1).is_some_and(Tile::discovered));

        grid.update_visibility(Point::new(9, 3), 1.0);
        let first = grid.get_tile(1, 1).expect("in bounds");
        assert!(!first.visible());
        assert!(first.discovered());
        assert!(grid.get_tile(9, 3).is_some_and(Tile::visible));
    }

    #[test]
    fn reachability_excludes_sealed_pockets() {
        let grid = Grid::from_rows(&[
            "#######",
            "#...#.#",
            "#...#.#",
            "#######",
        ]);
        assert!(grid.is_reachable(grid.start()));
        assert!(grid.is_reachable(Point::new(1, 1)));
        assert!(!grid.is_reachable(Point::new(5, 1)));
        assert_eq!(grid.reachable_count(), 6);
    }

    #[test]
    fn diagonal_only_contact_is_not_reachable() {
        let grid = Grid::from_rows(&[
            "#####",
            "#.###",
            "##.##",
            "#####",
        ]);
        // Centre (2, 2) is the start; (1, 1) only touches it diagonally.
        assert_eq!(grid.start(), Point::new(2, 2));
        assert!(!grid.is_reachable(Point::new(1, 1)));
    }

    #[test]
    fn sampler_skips_occupied_and_gives_up() {
        let grid = Grid::from_rows(&[
            "#####",
            "#>.^#",
            "#####",
        ]);
        let mut rng = RandomNumberGenerator::seeded(3);
        for _ in 0..50 {
            let placement = grid.sample_vacant(&mut rng, 1000, |_| true);
            assert_eq!(placement, Placement::Found(Point::new(2, 1)));
        }
        let blocked = grid.sample_vacant(&mut rng, 1000, |point| point != Point::new(2, 1));
        assert_eq!(blocked, Placement::Exhausted);
    }
}
