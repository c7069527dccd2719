//! Core geometric and hashing primitives.
//!
//! Everything above this module works in pixel space with `f64` coordinates.

pub mod vec2;
pub mod aabb;
pub mod hash;

// Re-export core types
pub use vec2::Vec2;
pub use aabb::Rect;
pub use hash::{StateHash, StateHasher};
