use std::fmt;

use chrono::{DateTime, Local, TimeZone};
use tracing::{debug, warn};

use crate::config::TrackerConfig;
use crate::form::WorkoutForm;
use crate::store::{Storage, WorkoutStore};
use crate::workout::{Coords, Workout};
use crate::MaptyError;

/// Append-only list of the session's workouts.
#[derive(Clone, Debug, Default)]
pub struct Journal {
    workouts: Vec<Workout>,
}

impl Journal {
    pub fn new(workouts: Vec<Workout>) -> Self {
        Self { workouts }
    }

    pub fn push(&mut self, workout: Workout) -> &Workout {
        self.workouts.push(workout);
        &self.workouts[self.workouts.len() - 1]
    }

    pub fn find(&self, id: &str) -> Option<&Workout> {
        self.workouts.iter().find(|w| w.id == id)
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut Workout> {
        self.workouts.iter_mut().find(|w| w.id == id)
    }

    pub fn as_slice(&self) -> &[Workout] {
        &self.workouts
    }

    pub fn len(&self) -> usize {
        self.workouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workouts.is_empty()
    }
}

/// Owns the workout list, its persistence, and the location picked for the
/// next entry.
pub struct Tracker<S> {
    store: WorkoutStore<S>,
    journal: Journal,
    pending: Option<Coords>,
}

impl<S: Storage> Tracker<S> {
    pub fn new(storage: S, config: &TrackerConfig) -> Self {
        Self {
            store: WorkoutStore::new(storage, config.storage_key.clone()),
            journal: Journal::default(),
            pending: None,
        }
    }

    /// Replaces the in-memory list with whatever the store holds. Stored
    /// entries that cannot be decoded stay in the slot across later saves.
    pub fn restore(&mut self) -> &[Workout] {
        self.journal = Journal::new(self.store.restore());
        debug!(count = self.journal.len(), "restored workouts");
        self.journal.as_slice()
    }

    pub fn begin_entry(&mut self, coords: Coords) {
        self.pending = Some(coords);
    }

    pub fn pending(&self) -> Option<Coords> {
        self.pending
    }

    pub fn submit(&mut self, form: &WorkoutForm) -> Result<&Workout, MaptyError> {
        self.submit_at(form, Local::now())
    }

    /// Validates, appends, and persists. Nothing is committed unless every
    /// field passes; a persist failure after commit is only logged.
    pub fn submit_at<Tz>(
        &mut self,
        form: &WorkoutForm,
        now: DateTime<Tz>,
    ) -> Result<&Workout, MaptyError>
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let input = form.validate()?;
        let coords = self.pending.ok_or(MaptyError::NoPendingLocation)?;
        self.pending = None;

        self.journal.push(Workout::new(input, coords, now));
        if let Err(e) = self.persist() {
            warn!(error = %e, "failed to persist workouts");
        }
        let workout = &self.journal.as_slice()[self.journal.len() - 1];
        debug!(id = %workout.id, kind = %workout.discipline(), "committed workout");
        Ok(workout)
    }

    /// Coordinates of the workout with `id`, counting the lookup as an
    /// interaction. Unknown ids yield `None`.
    pub fn locate(&mut self, id: &str) -> Option<Coords> {
        let workout = self.journal.find_mut(id)?;
        workout.record_interaction();
        Some(workout.coords)
    }

    /// Writes the current list, including interaction counts, to the store.
    pub fn persist(&mut self) -> Result<(), MaptyError> {
        self.store.save(self.journal.as_slice())
    }

    pub fn workouts(&self) -> &[Workout] {
        self.journal.as_slice()
    }

    pub fn store(&self) -> &WorkoutStore<S> {
        &self.store
    }

    /// Drops the persisted list. The in-memory list stays until the session
    /// is restarted.
    pub fn reset(&mut self) -> Result<(), MaptyError> {
        self.store.clear()
    }
}
