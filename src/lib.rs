//! # Hide-and-Seek Simulation Core
//!
//! Client-side world simulation and state sync for a multiplayer
//! hide-and-seek game on a tile grid.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    HIDESEEK SIM                              │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Geometry and hashing primitives           │
//! │  ├── vec2.rs     - 2D pixel-space vector                     │
//! │  ├── aabb.rs     - Axis-aligned rectangles                   │
//! │  └── hash.rs     - World state digest                        │
//! │                                                              │
//! │  game/           - Local simulation                          │
//! │  ├── map.rs      - Tile grid and coordinates                 │
//! │  ├── interact.rs - Doors and hiding spots                    │
//! │  ├── actor.rs    - Players and hunters                       │
//! │  ├── motion.rs   - Axis-separated collision resolution       │
//! │  ├── capture.rs  - Capture, carry and release                │
//! │  └── tick.rs     - Per-step driver                           │
//! │                                                              │
//! │  network/        - Server sync                               │
//! │  ├── protocol.rs - JSON message types                        │
//! │  ├── sync.rs     - Snapshot reconciliation                   │
//! │  ├── transport.rs- WebSocket and channel links               │
//! │  └── session.rs  - Client session and frame driver           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Authority
//!
//! The server owns doors, remote positions, hunters and the roster. The
//! client predicts only its own movement, hiding and light, and sends
//! requests for everything else.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod network;
pub mod config;

// Re-export commonly used types
pub use core::vec2::Vec2;
pub use core::aabb::Rect;
pub use config::{ClientConfig, ConfigError};
pub use game::{Actor, ActorId, ActorKind, GameState, InputFrame, SimEvent, TileCoord, TileMap};
pub use network::{ClientSession, Transport};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
