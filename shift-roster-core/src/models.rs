// these come from the staffing back end, identifiers are cuids there

use core::fmt::{self, Display};

use chrono::{Duration, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

macro_rules! identifier {
    ($($name:ident),* $(,)?) => {
        $(
            #[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(pub String);

            impl $name {
                pub fn new(value: impl Into<String>) -> Self {
                    Self(value.into())
                }

                #[must_use]
                pub fn as_str(&self) -> &str {
                    &self.0
                }
            }

            impl Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }

            impl From<&str> for $name {
                fn from(value: &str) -> Self {
                    Self(value.to_owned())
                }
            }
        )*
    };
}

identifier!(ProjectId, LocationId, ConsultantId, ShiftGroupId, ShiftId, CandidateId);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub locations: Vec<Location>,
    #[serde(default)]
    pub consultants: Vec<Consultant>,
    #[serde(default)]
    pub shift_groups: Vec<ShiftGroup>,
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl Project {
    pub fn shift(&self, id: &ShiftId) -> Option<&Shift> {
        self.shift_pool().find(|shift| &shift.id == id)
    }

    pub fn candidate(&self, id: &CandidateId) -> Option<&Candidate> {
        self.candidates.iter().find(|candidate| &candidate.id == id)
    }

    /// Every shift definition of every group, in group order.
    pub fn shift_pool(&self) -> impl Iterator<Item = &Shift> {
        self.shift_groups.iter().flat_map(|group| group.shifts.iter())
    }

    pub fn consultants_with_role(&self, role: ConsultantRole) -> impl Iterator<Item = &Consultant> {
        self.consultants
            .iter()
            .filter(move |consultant| consultant.role == role)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsultantRole {
    Admin,
    Consultant,
    Viewer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consultant {
    pub id: ConsultantId,
    pub name: String,
    pub role: ConsultantRole,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftGroup {
    pub id: ShiftGroupId,
    pub name: String,
    #[serde(default)]
    pub shifts: Vec<Shift>,
}

/// A shift is a time of day on a weekday and only gets a calendar date once assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    pub id: ShiftId,
    pub day: Weekday,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl Shift {
    /// Shifts ending at or before their start run past midnight.
    #[must_use]
    pub fn duration(&self) -> Duration {
        let duration = self.end_time - self.start_time;
        if duration <= Duration::zero() {
            duration + Duration::days(1)
        } else {
            duration
        }
    }

    #[must_use]
    pub fn label(&self) -> String {
        format!(
            "{} {}-{}",
            self.day,
            self.start_time.format("%H:%M"),
            self.end_time.format("%H:%M")
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub candidate_id: CandidateId,
    pub date: NaiveDate,
    pub shift_id: ShiftId,
}

/// A local edit that still has to be persisted. `shift_id: None` clears the cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentChange {
    pub candidate_id: CandidateId,
    pub date: NaiveDate,
    pub shift_id: Option<ShiftId>,
}
