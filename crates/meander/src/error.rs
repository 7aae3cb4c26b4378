//! Input validation errors reported at the simulation API boundary.

use thiserror::Error;

/// Rejected input to `add_channel` / `add_point_constraint`.
///
/// Rejection leaves the simulation unchanged.
#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("channel needs at least 4 points, got {0}")]
    TooFewPoints(usize),

    #[error("point ({0}, {1}) lies outside the simulation domain")]
    PointOutsideDomain(f64, f64),

    #[error("channel width must be positive, got {0}")]
    NonPositiveWidth(f64),

    #[error("constraint radius must be positive, got {0}")]
    NonPositiveRadius(f64),
}
