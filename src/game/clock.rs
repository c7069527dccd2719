//! Simulation Clock
//!
//! Turns wall-clock frame deltas into simulation steps. The per-step logic is
//! the same in both modes; only the step sizes differ. Simulated time is
//! tracked by the world state as steps run, not here.

use serde::{Serialize, Deserialize};
use tracing::debug;

/// How frame time becomes simulation steps.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum StepMode {
    /// One step per frame with the frame's own delta, clamped.
    Variable {
        /// Largest delta a single step may take, in seconds
        max_dt: f64,
    },
    /// Constant-size steps from an accumulator.
    Fixed {
        /// Step size, in seconds
        step: f64,
        /// Steps allowed per frame before the backlog is dropped
        max_steps: u32,
    },
}

impl Default for StepMode {
    fn default() -> Self {
        StepMode::Variable { max_dt: 0.1 }
    }
}

/// Steps to run for one frame. All steps share one `dt`.
#[derive(Clone, Debug, PartialEq)]
pub struct Steps {
    /// Delta for each step, in seconds
    pub dt: f64,
    /// Number of steps
    pub count: u32,
}

impl Iterator for Steps {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        self.count -= 1;
        Some(self.dt)
    }
}

/// Frame-to-step converter.
#[derive(Clone, Debug)]
pub struct SimulationClock {
    mode: StepMode,
    accumulator: f64,
}

impl SimulationClock {
    /// Create a clock.
    pub fn new(mode: StepMode) -> Self {
        Self { mode, accumulator: 0.0 }
    }

    /// Step mode.
    pub fn mode(&self) -> StepMode {
        self.mode
    }

    /// Feed one frame's wall-clock delta. Negative or non-finite deltas count
    /// as zero.
    pub fn advance(&mut self, frame_dt: f64) -> Steps {
        let frame_dt = if frame_dt.is_finite() { frame_dt.max(0.0) } else { 0.0 };

        match self.mode {
            StepMode::Variable { max_dt } => {
                let dt = frame_dt.min(max_dt);
                Steps { dt, count: (dt > 0.0) as u32 }
            }
            StepMode::Fixed { step, .. } if step <= 0.0 || !step.is_finite() => {
                Steps { dt: 0.0, count: 0 }
            }
            StepMode::Fixed { step, max_steps } => {
                self.accumulator += frame_dt;
                let mut count = 0;
                while self.accumulator >= step && count < max_steps {
                    self.accumulator -= step;
                    count += 1;
                }
                if self.accumulator >= step {
                    debug!(backlog = self.accumulator, "Dropping simulation backlog");
                    self.accumulator %= step;
                }
                Steps { dt: step, count }
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_clamps() {
        let mut clock = SimulationClock::new(StepMode::Variable { max_dt: 0.1 });
        assert_eq!(clock.advance(0.016), Steps { dt: 0.016, count: 1 });
        assert_eq!(clock.advance(2.0), Steps { dt: 0.1, count: 1 });
        assert_eq!(clock.advance(0.0).count, 0);
        assert_eq!(clock.advance(-1.0).count, 0);
        assert_eq!(clock.advance(f64::NAN).count, 0);
    }

    #[test]
    fn test_fixed_accumulates() {
        let mut clock = SimulationClock::new(StepMode::Fixed { step: 0.25, max_steps: 5 });
        assert_eq!(clock.advance(0.1).count, 0);
        assert_eq!(clock.advance(0.2).count, 1);
        assert_eq!(clock.advance(0.5), Steps { dt: 0.25, count: 2 });
    }

    #[test]
    fn test_fixed_drops_backlog() {
        let mut clock = SimulationClock::new(StepMode::Fixed { step: 0.25, max_steps: 2 });
        assert_eq!(clock.advance(10.0).count, 2);
        assert_eq!(clock.advance(0.0).count, 0);
    }

    #[test]
    fn test_steps_iterate() {
        let dts: Vec<f64> = Steps { dt: 0.5, count: 3 }.collect();
        assert_eq!(dts, vec![0.5, 0.5, 0.5]);
    }
}
