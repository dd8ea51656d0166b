//! Simulation core for a turn-based dungeon crawl with a single pursuing
//! shadow: floor generation, fog of war, the shadow's mode machine and the
//! turn loop that reconciles the two actors' speeds.

pub mod ai;
pub mod config;
pub mod data;
pub mod dice;
pub mod ecs;
pub mod encounter;
pub mod error;
pub mod map;
pub mod notify;
pub mod script;
pub mod session;
pub mod turn;

pub use ai::{Brain, Mode, ModeKind, ModeStats};
pub use config::SimConfig;
pub use encounter::{EncounterChoice, EncounterOutcome};
pub use error::{ConfigError, SessionError};
pub use map::{
    Entity, EntityKind, Floor, FloorIndex, Grid, Placement, Tile, generate_floor, update_visibility,
};
pub use notify::{Notification, NotificationSink, NullSink, Severity};
pub use session::{Session, SessionState};
pub use turn::{Intent, Proximity, TurnOutcome};
