//! View models for list items and marker popups. Both front ends render
//! from these so the layout stays identical.

use std::fmt;

use serde::Serialize;

use crate::config::TrackerConfig;
use crate::workout::{Metrics, Workout};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Detail {
    pub icon: &'static str,
    pub value: String,
    pub unit: &'static str,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WorkoutCard {
    pub class: String,
    pub id: String,
    pub title: String,
    pub details: [Detail; 4],
}

impl WorkoutCard {
    pub fn from_workout(workout: &Workout) -> Self {
        let discipline = workout.discipline();
        let (metric, secondary) = match &workout.metrics {
            Metrics::Running { cadence, pace } => (
                Detail {
                    icon: "⚡️",
                    value: format!("{pace:.1}"),
                    unit: "min/km",
                },
                Detail {
                    icon: "🦶🏼",
                    value: cadence.to_string(),
                    unit: "spm",
                },
            ),
            Metrics::Cycling {
                elevation_gain,
                speed,
            } => (
                Detail {
                    icon: "⚡️",
                    value: format!("{speed:.1}"),
                    unit: "km/h",
                },
                Detail {
                    icon: "⛰",
                    value: elevation_gain.to_string(),
                    unit: "m",
                },
            ),
        };
        Self {
            class: format!("workout workout--{discipline}"),
            id: workout.id.clone(),
            title: workout.description.clone(),
            details: [
                Detail {
                    icon: discipline.icon(),
                    value: workout.distance.to_string(),
                    unit: "km",
                },
                Detail {
                    icon: "⏱",
                    value: workout.duration.to_string(),
                    unit: "min",
                },
                metric,
                secondary,
            ],
        }
    }
}

impl fmt::Display for WorkoutCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.id, self.title)?;
        for d in &self.details {
            write!(f, "  {} {} {}", d.icon, d.value, d.unit)?;
        }
        Ok(())
    }
}

/// Options and content for one marker popup, in Leaflet's option names.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopupSpec {
    #[serde(skip)]
    pub content: String,
    pub class_name: String,
    pub max_width: u32,
    pub min_width: u32,
    pub auto_close: bool,
    pub close_on_click: bool,
}

impl PopupSpec {
    pub fn for_workout(workout: &Workout, config: &TrackerConfig) -> Self {
        let discipline = workout.discipline();
        Self {
            content: format!("{} {}", discipline.icon(), workout.description),
            class_name: format!("{discipline}-popup"),
            max_width: config.popup_max_width,
            min_width: config.popup_min_width,
            auto_close: false,
            close_on_click: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::form::WorkoutInput;
    use crate::workout::Coords;

    fn running() -> Workout {
        Workout::new(
            WorkoutInput::Running {
                distance: 5.0,
                duration: 30.0,
                cadence: 150.0,
            },
            Coords::new(1.0, 2.0),
            Utc.with_ymd_and_hms(2026, 10, 14, 7, 0, 0).unwrap(),
        )
    }

    #[test]
    fn running_card_layout() {
        let card = WorkoutCard::from_workout(&running());
        assert_eq!(card.class, "workout workout--running");
        assert_eq!(card.title, "Running on October 14");
        assert_eq!(card.details[0].icon, "🏃");
        assert_eq!(card.details[0].value, "5");
        assert_eq!(card.details[2].value, "6.0");
        assert_eq!(card.details[2].unit, "min/km");
        assert_eq!(card.details[3].value, "150");
        assert_eq!(card.details[3].unit, "spm");
    }

    #[test]
    fn cycling_card_uses_speed_and_elevation() {
        let w = Workout::new(
            WorkoutInput::Cycling {
                distance: 20.0,
                duration: 60.0,
                elevation_gain: -5.0,
            },
            Coords::new(1.0, 2.0),
            Utc.with_ymd_and_hms(2026, 10, 14, 7, 0, 0).unwrap(),
        );
        let card = WorkoutCard::from_workout(&w);
        assert_eq!(card.details[0].icon, "🚴‍♀️");
        assert_eq!(card.details[2].value, "20.0");
        assert_eq!(card.details[2].unit, "km/h");
        assert_eq!(card.details[3].icon, "⛰");
        assert_eq!(card.details[3].value, "-5");
        assert_eq!(card.details[3].unit, "m");
    }

    #[test]
    fn popup_options() {
        let popup = PopupSpec::for_workout(&running(), &TrackerConfig::default());
        assert_eq!(popup.content, "🏃 Running on October 14");
        let json = serde_json::to_value(&popup).unwrap();
        assert_eq!(json["className"], "running-popup");
        assert_eq!(json["autoClose"], false);
        assert_eq!(json["closeOnClick"], false);
        assert_eq!(json["maxWidth"], 250);
        assert!(json.get("content").is_none());
    }
}
