//! Game Logic Module
//!
//! Local simulation of the tile world.
//!
//! ## Module Structure
//!
//! - `map`: Tile grid and coordinates
//! - `interact`: Doors and hiding spots
//! - `actor`: Players, hunters and their capabilities
//! - `registry`: Insertion-ordered actor store
//! - `collision`: Tile solidity and actor blocking queries
//! - `motion`: Axis-separated movement resolution
//! - `capture`: Hunter capture, carry and release
//! - `input`: Keyboard input frames
//! - `clock`: Fixed and variable step scheduling
//! - `state`: Session-owned world view
//! - `tick`: Per-step simulation driver
//! - `events`: Typed events and outbound action requests

pub mod map;
pub mod interact;
pub mod actor;
pub mod registry;
pub mod collision;
pub mod motion;
pub mod capture;
pub mod input;
pub mod clock;
pub mod state;
pub mod tick;
pub mod events;

// Re-export key types
pub use actor::{Actor, ActorId, ActorKind, Movable, Collidable, Carriable};
pub use clock::{SimulationClock, StepMode};
pub use events::{ActionRequest, SimEvent};
pub use input::InputFrame;
pub use interact::{Door, HidingSpot, InteractableRegistry};
pub use map::{TileCoord, TileKind, TileMap, MapError, TILE_SIZE};
pub use motion::{resolve_move, MoveOutcome, AxisBlock};
pub use registry::EntityRegistry;
pub use state::GameState;
pub use tick::{tick, TickConfig, TickResult};
