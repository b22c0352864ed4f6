use serde::{Deserialize, Serialize};

use crate::error::{Result, SndError};

/// A point in Euclidean 2d-space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point(pub f64, pub f64);

impl Point {
    pub fn x(&self) -> f64 {
        self.0
    }

    pub fn y(&self) -> f64 {
        self.1
    }

    pub fn is_finite(&self) -> bool {
        self.0.is_finite() && self.1.is_finite()
    }
}

/// The type used for distance
pub type Distance = f64;

/// Euclidean distance between two locations
pub fn distance(a: Point, b: Point) -> Distance {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

/// The number of discrete time steps needed to fly from `a` to `b`, i.e.
/// `ceil(distance(a, b) / speed / resolution)`.
pub fn flight_duration(a: Point, b: Point, speed: f64, resolution: f64) -> Result<usize> {
    if !(speed.is_finite() && speed > 0.0) {
        return Err(SndError::invalid("speed", format!("must be positive, got {speed}")));
    }
    if !(resolution.is_finite() && resolution > 0.0) {
        return Err(SndError::invalid(
            "resolution",
            format!("must be positive, got {resolution}"),
        ));
    }

    // anything longer than the longest horizon can never be flown
    Ok(ceil_steps(distance(a, b) / speed / resolution).unwrap_or(MAX_STEPS + 1))
}

/// The longest horizon, in time steps, a network can be built for
pub const MAX_STEPS: usize = 1_000_000;

/// Relative error below which a quotient is taken to be the integer it is next to
const FLOAT_NOISE: f64 = 1e-9;

/// Rounds a non-negative number of steps up. Quotients that only miss an integer by
/// floating point noise are snapped to it, so 2.4 / 0.1 gives 24 steps and not 25,
/// while 1.000001 still gives 2. `None` if the result is not finite or above `MAX_STEPS`.
fn ceil_steps(steps: f64) -> Option<usize> {
    if !steps.is_finite() {
        return None;
    }
    let rounded = steps.round();
    let steps = if (steps - rounded).abs() <= FLOAT_NOISE * rounded.max(1.0) {
        rounded
    } else {
        steps.ceil()
    };
    if steps > MAX_STEPS as f64 {
        None
    } else {
        Some(steps as usize)
    }
}

/// The index of the last time step, `H = ceil(horizon / resolution)`.
pub fn horizon_steps(horizon: f64, resolution: f64) -> Result<usize> {
    if !(horizon.is_finite() && horizon > 0.0) {
        return Err(SndError::invalid(
            "horizon",
            format!("must be positive, got {horizon}"),
        ));
    }
    if !(resolution.is_finite() && resolution > 0.0) {
        return Err(SndError::invalid(
            "resolution",
            format!("must be positive, got {resolution}"),
        ));
    }

    ceil_steps(horizon / resolution).ok_or_else(|| {
        SndError::invalid(
            "horizon",
            format!("{horizon} / {resolution} is more than {MAX_STEPS} time steps"),
        )
    })
}
