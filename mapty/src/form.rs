use serde::{Deserialize, Serialize};

use crate::workout::Discipline;
use crate::{Field, MaptyError};

/// Raw text as typed into the entry form.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkoutForm {
    pub discipline: Discipline,
    pub distance: String,
    pub duration: String,
    pub cadence: String,
    pub elevation: String,
}

/// Validated numbers, ready to become a `Workout`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum WorkoutInput {
    Running {
        distance: f64,
        duration: f64,
        cadence: f64,
    },
    Cycling {
        distance: f64,
        duration: f64,
        elevation_gain: f64,
    },
}

impl WorkoutForm {
    pub fn validate(&self) -> Result<WorkoutInput, MaptyError> {
        let distance = positive(&self.distance, Field::Distance)?;
        let duration = positive(&self.duration, Field::Duration)?;
        match self.discipline {
            Discipline::Running => Ok(WorkoutInput::Running {
                distance,
                duration,
                cadence: positive(&self.cadence, Field::Cadence)?,
            }),
            Discipline::Cycling => Ok(WorkoutInput::Cycling {
                distance,
                duration,
                elevation_gain: finite(&self.elevation, Field::ElevationGain)?,
            }),
        }
    }

    pub fn clear(&mut self) {
        self.distance.clear();
        self.duration.clear();
        self.cadence.clear();
        self.elevation.clear();
    }
}

/// Number coercion as a browser applies it to an input's text: surrounding
/// whitespace is ignored, empty text is zero, anything else unparsable is NaN.
pub fn parse_number(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    // Rust accepts "inf"/"nan" spellings; those fail the finiteness checks anyway.
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

fn finite(raw: &str, field: Field) -> Result<f64, MaptyError> {
    let value = parse_number(raw);
    if value.is_finite() {
        Ok(value)
    } else {
        Err(MaptyError::InvalidField(field))
    }
}

fn positive(raw: &str, field: Field) -> Result<f64, MaptyError> {
    let value = finite(raw, field)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(MaptyError::InvalidField(field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(discipline: Discipline, d: &str, t: &str, c: &str, e: &str) -> WorkoutForm {
        WorkoutForm {
            discipline,
            distance: d.into(),
            duration: t.into(),
            cadence: c.into(),
            elevation: e.into(),
        }
    }

    #[test]
    fn running_requires_positive_cadence() {
        let ok = form(Discipline::Running, "5", "30", "150", "").validate();
        assert_eq!(
            ok,
            Ok(WorkoutInput::Running {
                distance: 5.0,
                duration: 30.0,
                cadence: 150.0
            })
        );
        let err = form(Discipline::Running, "5", "30", "0", "").validate();
        assert_eq!(err, Err(MaptyError::InvalidField(Field::Cadence)));
        let err = form(Discipline::Running, "5", "30", "-10", "").validate();
        assert_eq!(err, Err(MaptyError::InvalidField(Field::Cadence)));
    }

    #[test]
    fn cycling_elevation_may_be_zero_or_negative() {
        for elev in ["0", "-5", "", "  12.5 "] {
            let res = form(Discipline::Cycling, "20", "60", "", elev).validate();
            assert!(res.is_ok(), "elevation {elev:?} should be accepted");
        }
        let err = form(Discipline::Cycling, "20", "60", "", "abc").validate();
        assert_eq!(err, Err(MaptyError::InvalidField(Field::ElevationGain)));
    }

    #[test]
    fn zero_distance_rejected() {
        let err = form(Discipline::Running, "0", "30", "150", "").validate();
        assert_eq!(err, Err(MaptyError::InvalidField(Field::Distance)));
    }

    #[test]
    fn non_finite_rejected() {
        let err = form(Discipline::Cycling, "5", "inf", "", "0").validate();
        assert_eq!(err, Err(MaptyError::InvalidField(Field::Duration)));
        let err = form(Discipline::Running, "NaN", "30", "150", "").validate();
        assert_eq!(err, Err(MaptyError::InvalidField(Field::Distance)));
    }

    #[test]
    fn cadence_ignored_for_cycling() {
        let res = form(Discipline::Cycling, "10", "30", "garbage", "3").validate();
        assert!(res.is_ok());
    }

    #[test]
    fn parse_number_coercion() {
        assert_eq!(parse_number(""), 0.0);
        assert_eq!(parse_number("   "), 0.0);
        assert_eq!(parse_number(" 4.5 "), 4.5);
        assert!(parse_number("5km").is_nan());
    }

    #[test]
    fn clear_resets_text_but_not_discipline() {
        let mut f = form(Discipline::Cycling, "1", "2", "3", "4");
        f.clear();
        assert_eq!(f.discipline, Discipline::Cycling);
        assert!(f.distance.is_empty() && f.elevation.is_empty());
    }
}
