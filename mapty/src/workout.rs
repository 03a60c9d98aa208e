use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::form::WorkoutInput;
use crate::{round1, MaptyError};

const ID_DIGITS: usize = 10;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Discipline {
    #[default]
    Running,
    Cycling,
}

impl Discipline {
    pub fn as_str(&self) -> &'static str {
        match self {
            Discipline::Running => "running",
            Discipline::Cycling => "cycling",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Discipline::Running => "Running",
            Discipline::Cycling => "Cycling",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Discipline::Running => "🏃",
            Discipline::Cycling => "🚴‍♀️",
        }
    }
}

impl fmt::Display for Discipline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Discipline {
    type Err = MaptyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "running" => Ok(Discipline::Running),
            "cycling" => Ok(Discipline::Cycling),
            other => Err(MaptyError::UnknownDiscipline(other.to_string())),
        }
    }
}

/// Latitude/longitude pair, stored as `[lat, lng]`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coords {
    pub lat: f64,
    pub lng: f64,
}

impl Coords {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl From<[f64; 2]> for Coords {
    fn from([lat, lng]: [f64; 2]) -> Self {
        Self { lat, lng }
    }
}

impl From<Coords> for [f64; 2] {
    fn from(c: Coords) -> Self {
        [c.lat, c.lng]
    }
}

/// Discipline-specific fields. The `type` tag selects the variant when a
/// stored record is decoded.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Metrics {
    Running {
        cadence: f64,
        #[serde(deserialize_with = "lenient_f64")]
        pace: f64,
    },
    Cycling {
        #[serde(rename = "elevationGain")]
        elevation_gain: f64,
        #[serde(deserialize_with = "lenient_f64")]
        speed: f64,
    },
}

impl Metrics {
    pub fn discipline(&self) -> Discipline {
        match self {
            Metrics::Running { .. } => Discipline::Running,
            Metrics::Cycling { .. } => Discipline::Cycling,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Workout {
    #[serde(flatten)]
    pub metrics: Metrics,
    pub id: String,
    pub date: DateTime<Utc>,
    pub distance: f64,
    pub duration: f64,
    pub coords: Coords,
    pub description: String,
    #[serde(rename = "glicks", default)]
    pub interactions: u32,
}

impl Workout {
    /// Builds a record from validated input. `created` supplies both the id
    /// and the local calendar day used in the description.
    pub fn new<Tz>(input: WorkoutInput, coords: Coords, created: DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let (distance, duration, metrics) = match input {
            WorkoutInput::Running {
                distance,
                duration,
                cadence,
            } => (
                distance,
                duration,
                Metrics::Running {
                    cadence,
                    pace: pace(distance, duration),
                },
            ),
            WorkoutInput::Cycling {
                distance,
                duration,
                elevation_gain,
            } => (
                distance,
                duration,
                Metrics::Cycling {
                    elevation_gain,
                    speed: speed(distance, duration),
                },
            ),
        };
        let description = describe(metrics.discipline(), &created);
        Self {
            id: id_from_millis(created.timestamp_millis()),
            date: created.with_timezone(&Utc),
            distance,
            duration,
            coords,
            description,
            interactions: 0,
            metrics,
        }
    }

    pub fn discipline(&self) -> Discipline {
        self.metrics.discipline()
    }

    pub fn record_interaction(&mut self) {
        self.interactions += 1;
    }
}

/// Minutes per kilometer, one decimal.
pub fn pace(distance: f64, duration: f64) -> f64 {
    round1(duration / distance)
}

/// Kilometers per hour, one decimal.
pub fn speed(distance: f64, duration: f64) -> f64 {
    round1(distance / (duration / 60.0))
}

/// "Running on October 14"
pub fn describe<Tz>(discipline: Discipline, date: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    format!("{} on {}", discipline.label(), date.format("%B %d"))
}

fn id_from_millis(millis: i64) -> String {
    let digits = millis.to_string();
    let start = digits.len().saturating_sub(ID_DIGITS);
    digits[start..].to_string()
}

// Records written by the original script stored pace/speed as fixed-point text.
fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrText {
        Num(f64),
        Text(String),
    }

    match NumOrText::deserialize(deserializer)? {
        NumOrText::Num(v) => Ok(v),
        NumOrText::Text(s) => s.trim().parse::<f64>().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 4, 9, 30, 0).unwrap()
    }

    #[test]
    fn running_pace_and_description() {
        let w = Workout::new(
            WorkoutInput::Running {
                distance: 5.0,
                duration: 30.0,
                cadence: 150.0,
            },
            Coords::new(53.9, 27.56),
            at(),
        );
        assert_eq!(
            w.metrics,
            Metrics::Running {
                cadence: 150.0,
                pace: 6.0
            }
        );
        assert_eq!(w.description, "Running on October 04");
        assert_eq!(w.interactions, 0);
    }

    #[test]
    fn cycling_negative_elevation() {
        let w = Workout::new(
            WorkoutInput::Cycling {
                distance: 20.0,
                duration: 60.0,
                elevation_gain: -5.0,
            },
            Coords::new(0.0, 0.0),
            at(),
        );
        assert_eq!(
            w.metrics,
            Metrics::Cycling {
                elevation_gain: -5.0,
                speed: 20.0
            }
        );
        assert_eq!(w.description, "Cycling on October 04");
    }

    #[test]
    fn id_is_last_ten_digits_of_millis() {
        let w = Workout::new(
            WorkoutInput::Running {
                distance: 1.0,
                duration: 1.0,
                cadence: 1.0,
            },
            Coords::new(0.0, 0.0),
            at(),
        );
        let millis = at().timestamp_millis().to_string();
        assert_eq!(w.id.len(), 10);
        assert!(millis.ends_with(&w.id));
        assert_eq!(id_from_millis(42), "42");
    }

    #[test]
    fn stored_layout_uses_flat_tagged_fields() {
        let w = Workout::new(
            WorkoutInput::Cycling {
                distance: 12.5,
                duration: 45.0,
                elevation_gain: 120.0,
            },
            Coords::new(53.23, 27.53),
            at(),
        );
        let json = serde_json::to_value(&w).unwrap();
        assert_eq!(json["type"], "cycling");
        assert_eq!(json["elevationGain"], 120.0);
        assert_eq!(json["speed"], 16.7);
        assert_eq!(json["coords"], serde_json::json!([53.23, 27.53]));
        assert_eq!(json["glicks"], 0);
        assert!(json.get("cadence").is_none());
    }

    #[test]
    fn decodes_legacy_text_metrics() {
        let raw = r#"{
            "date": "2024-05-02T10:15:00.000Z",
            "id": "4644900000",
            "glicks": 0,
            "distance": 5,
            "duration": 30,
            "coords": [53.9, 27.56],
            "dateFormat": "May 02",
            "type": "running",
            "cadence": 150,
            "pace": "6.0",
            "description": "Running on May 02"
        }"#;
        let w: Workout = serde_json::from_str(raw).unwrap();
        assert_eq!(w.discipline(), Discipline::Running);
        assert_eq!(
            w.metrics,
            Metrics::Running {
                cadence: 150.0,
                pace: 6.0
            }
        );
        assert_eq!(w.distance, 5.0);
        assert_eq!(w.coords, Coords::new(53.9, 27.56));
    }

    #[test]
    fn discipline_from_select_value() {
        assert_eq!(Discipline::default(), Discipline::Running);
        assert_eq!("cycling".parse::<Discipline>().unwrap(), Discipline::Cycling);
        assert_eq!(" Running ".parse::<Discipline>().unwrap(), Discipline::Running);
        assert!(matches!(
            "swimming".parse::<Discipline>(),
            Err(MaptyError::UnknownDiscipline(_))
        ));
    }

    #[test]
    fn record_interaction_counts() {
        let mut w = Workout::new(
            WorkoutInput::Running {
                distance: 3.0,
                duration: 20.0,
                cadence: 170.0,
            },
            Coords::new(0.0, 0.0),
            at(),
        );
        w.record_interaction();
        w.record_interaction();
        assert_eq!(w.interactions, 2);
    }
}
