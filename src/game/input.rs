//! Input Capture and Normalization
//!
//! Keyboard state for one frame, packed into flag bits, plus the 8-way
//! direction it maps to.

use serde::{Serialize, Deserialize};
use crate::core::vec2::Vec2;

// =============================================================================
// FLAGS
// =============================================================================

/// Move up (negative Y)
pub const FLAG_UP: u8 = 1 << 0;
/// Move down (positive Y)
pub const FLAG_DOWN: u8 = 1 << 1;
/// Move left (negative X)
pub const FLAG_LEFT: u8 = 1 << 2;
/// Move right (positive X)
pub const FLAG_RIGHT: u8 = 1 << 3;
/// Interact pressed this frame (hide or operate a door)
pub const FLAG_INTERACT: u8 = 1 << 4;
/// Light toggle pressed this frame
pub const FLAG_TOGGLE_LIGHT: u8 = 1 << 5;

/// Flags that fire once per key press rather than while held.
pub const EDGE_FLAGS: u8 = FLAG_INTERACT | FLAG_TOGGLE_LIGHT;

// =============================================================================
// INPUT FRAME
// =============================================================================

/// Input state for a single frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFrame {
    /// Packed key flags:
    /// - Bits 0-3: up, down, left, right (held)
    /// - Bit 4: interact (pressed this frame)
    /// - Bit 5: toggle light (pressed this frame)
    pub flags: u8,
}

impl InputFrame {
    /// No keys.
    pub const IDLE: Self = Self { flags: 0 };

    /// Create from raw flags.
    #[inline]
    pub const fn new(flags: u8) -> Self {
        Self { flags }
    }

    /// Create from held direction keys.
    pub fn with_keys(up: bool, down: bool, left: bool, right: bool) -> Self {
        let mut flags = 0;
        if up { flags |= FLAG_UP; }
        if down { flags |= FLAG_DOWN; }
        if left { flags |= FLAG_LEFT; }
        if right { flags |= FLAG_RIGHT; }
        Self { flags }
    }

    /// Same frame with extra flags set.
    #[inline]
    pub const fn with(self, flags: u8) -> Self {
        Self { flags: self.flags | flags }
    }

    /// Check a flag.
    #[inline]
    pub const fn has(self, flag: u8) -> bool {
        self.flags & flag != 0
    }

    /// Interact pressed.
    #[inline]
    pub const fn interact(self) -> bool {
        self.has(FLAG_INTERACT)
    }

    /// Light toggle pressed.
    #[inline]
    pub const fn toggle_light(self) -> bool {
        self.has(FLAG_TOGGLE_LIGHT)
    }

    /// Held keys only; used for catch-up steps so presses fire once.
    #[inline]
    pub const fn held_only(self) -> Self {
        Self { flags: self.flags & !EDGE_FLAGS }
    }

    /// Raw 8-way direction: each component is -1, 0 or 1.
    /// Opposite keys cancel.
    pub fn raw_direction(self) -> Vec2 {
        let axis = |neg: u8, pos: u8| -> f64 {
            (self.has(pos) as i8 - self.has(neg) as i8) as f64
        };
        Vec2::new(axis(FLAG_LEFT, FLAG_RIGHT), axis(FLAG_UP, FLAG_DOWN))
    }

    /// Unit-or-zero direction. Diagonals are scaled so their speed equals
    /// axial speed.
    pub fn direction(self) -> Vec2 {
        self.raw_direction().normalize_or_zero()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axial_direction() {
        assert_eq!(InputFrame::with_keys(false, false, false, true).direction(), Vec2::new(1.0, 0.0));
        assert_eq!(InputFrame::with_keys(true, false, false, false).direction(), Vec2::new(0.0, -1.0));
    }

    #[test]
    fn test_diagonal_is_unit() {
        let d = InputFrame::with_keys(false, true, true, false).direction();
        assert!((d.length() - 1.0).abs() < 1e-12);
        assert!(d.x < 0.0 && d.y > 0.0);
    }

    #[test]
    fn test_opposites_cancel() {
        assert!(InputFrame::with_keys(true, true, true, true).direction().is_zero());
        assert!(InputFrame::IDLE.direction().is_zero());
    }

    #[test]
    fn test_edge_flags() {
        let frame = InputFrame::with_keys(false, false, false, true).with(FLAG_INTERACT | FLAG_TOGGLE_LIGHT);
        assert!(frame.interact() && frame.toggle_light());
        let held = frame.held_only();
        assert!(!held.interact() && !held.toggle_light());
        assert!(held.has(FLAG_RIGHT));
    }
}
