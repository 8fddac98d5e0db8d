use alloc::collections::BTreeMap;
use std::collections::HashMap;

use chrono::NaiveDate;
use itertools::Itertools as _;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::RosterError;
use crate::models::{Assignment, AssignmentChange, CandidateId, ShiftId};
use crate::window::Window;

type Key = (CandidateId, NaiveDate);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Slot {
    Assigned(ShiftId),
    Unassigned,
}

impl Slot {
    #[must_use]
    pub const fn shift(&self) -> Option<&ShiftId> {
        match self {
            Self::Assigned(shift_id) => Some(shift_id),
            Self::Unassigned => None,
        }
    }

    #[must_use]
    pub const fn is_assigned(&self) -> bool {
        matches!(self, Self::Assigned(_))
    }
}

/// (candidate, date) -> shift for one window. The map key keeps at most one shift per cell.
///
/// `baseline` is what the server last told us, `entries` is what is shown.
#[derive(Debug, Clone)]
pub struct AssignmentGrid {
    window: Window,
    entries: BTreeMap<Key, ShiftId>,
    baseline: BTreeMap<Key, ShiftId>,
}

impl AssignmentGrid {
    #[must_use]
    pub const fn new(window: Window) -> Self {
        Self {
            window,
            entries: BTreeMap::new(),
            baseline: BTreeMap::new(),
        }
    }

    #[must_use]
    pub const fn window(&self) -> &Window {
        &self.window
    }

    /// `None` clears the cell, `Some` overwrites whatever was there. Returns the previous shift.
    pub fn assign(
        &mut self,
        candidate_id: &CandidateId,
        date: NaiveDate,
        shift_id: Option<ShiftId>,
    ) -> Result<Option<ShiftId>, RosterError> {
        self.check_in_window(candidate_id, date)?;
        let key = (candidate_id.clone(), date);
        let previous = match shift_id {
            Some(shift_id) => self.entries.insert(key, shift_id),
            None => self.entries.remove(&key),
        };
        Ok(previous)
    }

    #[must_use]
    pub fn get(&self, candidate_id: &CandidateId, date: NaiveDate) -> Slot {
        self.entries
            .get(&(candidate_id.clone(), date))
            .map_or(Slot::Unassigned, |shift_id| Slot::Assigned(shift_id.clone()))
    }

    pub fn check_in_window(
        &self,
        candidate_id: &CandidateId,
        date: NaiveDate,
    ) -> Result<(), RosterError> {
        if self.window.contains(date) {
            Ok(())
        } else {
            Err(RosterError::OutOfRangeAssignment {
                candidate_id: candidate_id.clone(),
                date,
                window_start: self.window.start(),
                window_end: self.window.end(),
            })
        }
    }

    /// Drops everything (including unsaved edits) and loads a fetched window.
    /// Returns how many assignments were loaded.
    pub fn replace_window(
        &mut self,
        window: Window,
        assignments: impl IntoIterator<Item = Assignment>,
    ) -> usize {
        self.window = window;
        self.entries.clear();
        for assignment in assignments {
            if !window.contains(assignment.date) {
                warn!(
                    "ignoring assignment of {} on {} outside of {}..={}",
                    assignment.candidate_id,
                    assignment.date,
                    window.start(),
                    window.end()
                );
                continue;
            }
            let key = (assignment.candidate_id, assignment.date);
            if let Some(replaced) = self.entries.insert(key.clone(), assignment.shift_id) {
                debug!("duplicate assignment for {} on {}, dropping {replaced}", key.0, key.1);
            }
        }
        self.baseline.clone_from(&self.entries);
        self.entries.len()
    }

    /// Local edits that differ from the loaded state, ordered by date then candidate.
    #[must_use]
    pub fn pending_changes(&self) -> Vec<AssignmentChange> {
        self.entries
            .keys()
            .chain(self.baseline.keys())
            .unique()
            .filter(|key| self.entries.get(*key) != self.baseline.get(*key))
            .map(|key| AssignmentChange {
                candidate_id: key.0.clone(),
                date: key.1,
                shift_id: self.entries.get(key).cloned(),
            })
            .sorted_by(|left, right| {
                (left.date, &left.candidate_id).cmp(&(right.date, &right.candidate_id))
            })
            .collect()
    }

    #[must_use]
    pub fn has_pending_changes(&self) -> bool {
        self.entries != self.baseline
    }

    /// The pending changes were persisted, they become the new loaded state.
    pub fn mark_saved(&mut self) {
        self.baseline.clone_from(&self.entries);
    }

    pub fn discard_changes(&mut self) {
        self.entries.clone_from(&self.baseline);
    }

    pub fn assignments(&self) -> impl Iterator<Item = Assignment> + '_ {
        self.entries
            .iter()
            .map(|((candidate_id, date), shift_id)| Assignment {
                candidate_id: candidate_id.clone(),
                date: *date,
                shift_id: shift_id.clone(),
            })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One slot per date of the window.
    #[must_use]
    pub fn row(&self, candidate_id: &CandidateId) -> Vec<Slot> {
        self.window
            .dates()
            .map(|date| self.get(candidate_id, date))
            .collect()
    }

    /// How often each shift is used in the window.
    #[must_use]
    pub fn usage(&self) -> HashMap<&ShiftId, usize> {
        self.entries.values().counts()
    }

    /// Candidates that have at least one assignment in the window but are not in `known`.
    pub fn strangers<'a>(
        &'a self,
        known: &'a [CandidateId],
    ) -> impl Iterator<Item = &'a CandidateId> + 'a {
        self.entries
            .keys()
            .map(|(candidate_id, _)| candidate_id)
            .dedup()
            .filter(move |candidate_id| !known.contains(*candidate_id))
    }
}
