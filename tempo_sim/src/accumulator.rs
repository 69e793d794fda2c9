//! Fixed timestep accumulator.
//!
//! Wall-clock time is banked every frame and drained in whole fixed steps.
//! The number of steps actually run per frame is capped; steps beyond the cap
//! are dropped, not carried over, so a long hitch (debugger pause, window
//! drag) costs at most `max_steps_per_frame` steps and simulated time falls
//! behind wall time instead of spiralling into catch-up.

use serde::{Deserialize, Serialize};

/// How many fixed steps a frame owes and how many it will run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepPlan {
    /// Whole steps extracted from the accumulator this frame.
    pub steps_due: u64,
    /// `min(steps_due, max_steps_per_frame)`.
    pub steps_to_run: u32,
}

impl StepPlan {
    /// Steps whose time was consumed but which will never run.
    pub fn discarded(&self) -> u64 {
        self.steps_due - u64::from(self.steps_to_run)
    }
}

/// Accumulator state for a fixed-rate simulation.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    accumulator: f64,
    fixed_step: f64,
    max_steps_per_frame: u32,
    fraction: f32,
}

impl FixedTimestep {
    /// Creates an empty accumulator.
    ///
    /// # Panics
    /// If `fixed_step` is not a positive finite number.
    pub fn new(fixed_step: f64, max_steps_per_frame: u32) -> Self {
        assert!(
            fixed_step.is_finite() && fixed_step > 0.0,
            "fixed step must be positive, got {fixed_step}"
        );
        Self {
            accumulator: 0.0,
            fixed_step,
            max_steps_per_frame,
            fraction: 0.0,
        }
    }

    /// Creates an accumulator stepping at `hz`.
    pub fn from_rate(hz: u32, max_steps_per_frame: u32) -> Self {
        Self::new(1.0 / f64::from(hz.max(1)), max_steps_per_frame)
    }

    /// Banks `elapsed` seconds and extracts whole steps.
    ///
    /// Negative or non-finite input counts as no time passing.
    pub fn advance(&mut self, elapsed: f64) -> StepPlan {
        let elapsed = if elapsed.is_finite() && elapsed > 0.0 {
            elapsed
        } else {
            0.0
        };
        self.accumulator += elapsed;

        let mut steps = (self.accumulator / self.fixed_step).floor();
        if steps > 0.0 {
            self.accumulator -= steps * self.fixed_step;
        }
        // Division and subtraction round independently; settle the edge.
        if self.accumulator >= self.fixed_step {
            self.accumulator -= self.fixed_step;
            steps += 1.0;
        }
        if !(0.0..self.fixed_step).contains(&self.accumulator) {
            self.accumulator = 0.0;
        }

        let ratio = (self.accumulator / self.fixed_step) as f32;
        self.fraction = ratio.clamp(0.0, 1.0 - f32::EPSILON);

        let steps_due = steps as u64;
        let steps_to_run = steps_due.min(u64::from(self.max_steps_per_frame)) as u32;
        StepPlan {
            steps_due,
            steps_to_run,
        }
    }

    /// Leftover fraction of a step, in $[0,1)$.
    pub fn interpolation_fraction(&self) -> f32 {
        self.fraction
    }

    /// Unconsumed time in seconds, in $[0, \text{fixed\_step})$.
    pub fn accumulated(&self) -> f64 {
        self.accumulator
    }

    pub fn fixed_step(&self) -> f64 {
        self.fixed_step
    }

    pub fn max_steps_per_frame(&self) -> u32 {
        self.max_steps_per_frame
    }

    /// Drops any banked time.
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
        self.fraction = 0.0;
    }
}
