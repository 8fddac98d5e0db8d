use chrono::NaiveDate;

use crate::models::{CandidateId, ShiftId};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RosterError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(
        "cannot assign {candidate_id} on {date}, only {window_start} to {window_end} is visible"
    )]
    OutOfRangeAssignment {
        candidate_id: CandidateId,
        date: NaiveDate,
        window_start: NaiveDate,
        window_end: NaiveDate,
    },
    #[error("{candidate_id} on {date} no longer holds {expected}")]
    StaleDrag {
        candidate_id: CandidateId,
        date: NaiveDate,
        expected: ShiftId,
        found: Option<ShiftId>,
    },
    #[error("unknown shift {0}")]
    UnknownShift(ShiftId),
    #[error("unknown candidate {0}")]
    UnknownCandidate(CandidateId),
}
