use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::RosterError;
use crate::grid::{AssignmentGrid, Slot};
use crate::models::{CandidateId, ShiftId};

/// What is carried while dragging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "from")]
pub enum DragPayload {
    #[serde(rename_all = "camelCase")]
    Pool { shift_id: ShiftId },
    #[serde(rename_all = "camelCase")]
    Cell {
        candidate_id: CandidateId,
        date: NaiveDate,
        shift_id: ShiftId,
    },
}

impl DragPayload {
    #[must_use]
    pub const fn shift_id(&self) -> &ShiftId {
        match self {
            Self::Pool { shift_id } | Self::Cell { shift_id, .. } => shift_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "to")]
pub enum DropTarget {
    #[serde(rename_all = "camelCase")]
    Cell {
        candidate_id: CandidateId,
        date: NaiveDate,
    },
    Pool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentChanged {
    pub candidate_id: CandidateId,
    pub date: NaiveDate,
    pub previous: Option<ShiftId>,
    pub current: Option<ShiftId>,
}

/// Applies a drop to the grid. Either every resulting change is applied or none.
pub fn apply_drop(
    grid: &mut AssignmentGrid,
    payload: DragPayload,
    target: DropTarget,
) -> Result<Vec<AssignmentChanged>, RosterError> {
    match (payload, target) {
        (DragPayload::Pool { .. }, DropTarget::Pool) => Ok(Vec::new()),
        (DragPayload::Pool { shift_id }, DropTarget::Cell { candidate_id, date }) => {
            Ok(vec![set(grid, candidate_id, date, Some(shift_id))?])
        }
        (
            DragPayload::Cell {
                candidate_id,
                date,
                shift_id,
            },
            DropTarget::Pool,
        ) => {
            check_source(grid, &candidate_id, date, shift_id)?;
            Ok(vec![set(grid, candidate_id, date, None)?])
        }
        (
            DragPayload::Cell {
                candidate_id: from_candidate,
                date: from_date,
                shift_id,
            },
            DropTarget::Cell { candidate_id, date },
        ) => {
            if from_candidate == candidate_id && from_date == date {
                return Ok(Vec::new());
            }
            grid.check_in_window(&candidate_id, date)?;
            let shift_id = check_source(grid, &from_candidate, from_date, shift_id)?;
            Ok(vec![
                set(grid, from_candidate, from_date, None)?,
                set(grid, candidate_id, date, Some(shift_id))?,
            ])
        }
    }
}

/// The dragged cell must still hold the dragged shift.
fn check_source(
    grid: &AssignmentGrid,
    candidate_id: &CandidateId,
    date: NaiveDate,
    shift_id: ShiftId,
) -> Result<ShiftId, RosterError> {
    grid.check_in_window(candidate_id, date)?;
    match grid.get(candidate_id, date) {
        Slot::Assigned(held) if held == shift_id => Ok(shift_id),
        slot => Err(RosterError::StaleDrag {
            candidate_id: candidate_id.clone(),
            date,
            expected: shift_id,
            found: slot.shift().cloned(),
        }),
    }
}

fn set(
    grid: &mut AssignmentGrid,
    candidate_id: CandidateId,
    date: NaiveDate,
    shift_id: Option<ShiftId>,
) -> Result<AssignmentChanged, RosterError> {
    let previous = grid.assign(&candidate_id, date, shift_id.clone())?;
    Ok(AssignmentChanged {
        candidate_id,
        date,
        previous,
        current: shift_id,
    })
}
