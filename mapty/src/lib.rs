//! Core workout tracking library for Mapty: records, form validation,
//! persistence, and the tracker that ties them together.

use std::fmt;

use thiserror::Error;

pub mod config;
pub mod form;
pub mod render;
pub mod store;
pub mod tracker;
pub mod workout;

pub use config::TrackerConfig;
pub use form::{parse_number, WorkoutForm, WorkoutInput};
pub use render::{Detail, PopupSpec, WorkoutCard};
#[cfg(not(target_arch = "wasm32"))]
pub use store::FileStorage;
pub use store::{MemoryStorage, Storage, WorkoutStore};
pub use tracker::{Journal, Tracker};
pub use workout::{Coords, Discipline, Metrics, Workout};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MaptyError {
    #[error("{0}")]
    InvalidField(Field),
    #[error("unknown workout type: {0}")]
    UnknownDiscipline(String),
    #[error("no map location selected for the new workout")]
    NoPendingLocation,
    #[error("storage failure: {0}")]
    Storage(String),
    #[error("stored workouts could not be decoded: {0}")]
    Decode(String),
}

/// Form fields subject to validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Distance,
    Duration,
    Cadence,
    ElevationGain,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Distance => f.write_str("Distance must be a positive number"),
            Field::Duration => f.write_str("Duration must be a positive number"),
            Field::Cadence => f.write_str("Cadence must be a positive number"),
            Field::ElevationGain => f.write_str("Elevation gain must be a number"),
        }
    }
}

/// Rounds to one decimal place the way JavaScript's `toFixed(1)` does: the
/// exact binary value decides, so `0.15` (stored as `0.1499…`) becomes `0.1`,
/// while a true tie such as `0.25` rounds away from zero.
pub fn round1(value: f64) -> f64 {
    let scaled = value * 10.0;
    let exact = value.mul_add(10.0, -scaled) == 0.0;
    if exact && scaled.fract().abs() == 0.5 {
        return scaled.round() / 10.0;
    }
    // `{:.1}` rounds the exact binary expansion; only exact ties differ.
    format!("{value:.1}").parse().unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round1() {
        assert_eq!(round1(6.0), 6.0);
        assert_eq!(round1(6.04), 6.0);
        assert_eq!(round1(6.06), 6.1);
        assert_eq!(round1(7.5), 7.5);
    }

    #[test]
    fn test_round1_follows_binary_value() {
        assert_eq!(round1(0.15), 0.1);
        assert_eq!(round1(1.005), 1.0);
        assert_eq!(round1(0.25), 0.3);
        assert_eq!(round1(0.75), 0.8);
        assert_eq!(round1(-0.25), -0.3);
        assert_eq!(round1(16.666_666_666_666_668), 16.7);
        assert!(round1(f64::NAN).is_nan());
    }

    #[test]
    fn test_invalid_field_message_names_field() {
        let err = MaptyError::InvalidField(Field::Cadence);
        assert_eq!(err.to_string(), "Cadence must be a positive number");
        let err = MaptyError::InvalidField(Field::ElevationGain);
        assert!(err.to_string().starts_with("Elevation gain"));
    }
}
