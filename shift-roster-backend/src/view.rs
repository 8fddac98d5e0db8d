use core::fmt::{self, Display};

use chrono::NaiveDate;
use itertools::Itertools as _;
use serde::Serialize;
use shift_roster_core::models::{CandidateId, ConsultantRole, ShiftId};

use crate::controller::{FetchState, RosterController};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "state")]
pub enum Status {
    Idle,
    Loading,
    Ready,
    /// The grid below is the last known state, not the requested window.
    Failed { message: String, retry: bool },
    /// Saved while reloading, the grid may miss changes made by others.
    Outdated { retry: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    pub date: NaiveDate,
    pub shift_id: Option<ShiftId>,
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    pub candidate_id: CandidateId,
    pub name: String,
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolEntry {
    pub shift_id: ShiftId,
    pub group: String,
    pub label: String,
    /// Length in minutes, shifts past midnight included.
    pub minutes: i64,
    /// Where the shift falls in the shown window.
    pub first_date: NaiveDate,
    /// How often the shift is used in the shown window.
    pub used: usize,
}

/// Everything the roster page shows: one row per candidate, one column per date and the shift pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterView {
    pub project: String,
    /// Names of the project admins, they answer roster questions.
    pub admins: Vec<String>,
    pub offset: i32,
    pub requested_start: NaiveDate,
    pub requested_end: NaiveDate,
    pub dates: Vec<NaiveDate>,
    pub rows: Vec<Row>,
    pub pool: Vec<PoolEntry>,
    pub status: Status,
    pub authoritative: bool,
    pub pending_changes: usize,
}

impl RosterView {
    pub(crate) fn build(controller: &RosterController) -> Self {
        let project = controller.project();
        let grid = controller.grid();
        let requested = controller.visible_window();

        let label = |shift_id: &ShiftId| {
            project
                .shift(shift_id)
                .map_or_else(|| shift_id.to_string(), |shift| shift.label())
        };

        let known: Vec<CandidateId> = project
            .candidates
            .iter()
            .map(|candidate| candidate.id.clone())
            .collect();
        let rows = project
            .candidates
            .iter()
            .map(|candidate| (candidate.id.clone(), candidate.name.clone()))
            .chain(
                grid.strangers(&known)
                    .map(|candidate_id| (candidate_id.clone(), candidate_id.to_string())),
            )
            .map(|(candidate_id, name)| Row {
                cells: grid
                    .window()
                    .dates()
                    .zip(grid.row(&candidate_id))
                    .map(|(date, slot)| Cell {
                        date,
                        label: slot.shift().map(&label),
                        shift_id: slot.shift().cloned(),
                    })
                    .collect(),
                candidate_id,
                name,
            })
            .collect();

        let usage = grid.usage();
        let pool = project
            .shift_groups
            .iter()
            .flat_map(|group| {
                group.shifts.iter().map(|shift| PoolEntry {
                    shift_id: shift.id.clone(),
                    group: group.name.clone(),
                    label: shift.label(),
                    minutes: shift.duration().num_minutes(),
                    first_date: grid.window().first(shift.day),
                    used: usage.get(&shift.id).copied().unwrap_or_default(),
                })
            })
            .collect();

        let status = match controller.state() {
            FetchState::Idle => Status::Idle,
            FetchState::Loading { .. } => Status::Loading,
            FetchState::Ready => Status::Ready,
            FetchState::Failed { message, .. } => Status::Failed {
                message: message.clone(),
                retry: controller.can_retry(),
            },
            FetchState::Outdated { .. } => Status::Outdated {
                retry: controller.can_retry(),
            },
        };

        Self {
            project: project.name.clone(),
            admins: project
                .consultants_with_role(ConsultantRole::Admin)
                .map(|consultant| consultant.name.clone())
                .collect(),
            offset: requested.offset(),
            requested_start: requested.start(),
            requested_end: requested.end(),
            dates: grid.window().dates().collect(),
            rows,
            pool,
            status,
            authoritative: controller.is_authoritative(),
            pending_changes: grid.pending_changes().len(),
        }
    }
}

impl Display for RosterView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} {} - {} (offset {})",
            self.project,
            self.requested_start,
            self.requested_end,
            self.offset
        )?;
        if !self.admins.is_empty() {
            writeln!(f, "admins: {}", self.admins.join(", "))?;
        }
        match &self.status {
            Status::Idle => writeln!(f, "not loaded yet")?,
            Status::Loading => writeln!(f, "loading...")?,
            Status::Ready => {}
            Status::Failed { message, retry } => {
                writeln!(f, "loading failed: {message}")?;
                if *retry {
                    writeln!(f, "[retry]")?;
                }
            }
            Status::Outdated { retry } => {
                writeln!(f, "saved while reloading, the grid may be outdated")?;
                if *retry {
                    writeln!(f, "[retry]")?;
                }
            }
        }
        if !self.authoritative && !self.dates.is_empty() {
            writeln!(
                f,
                "showing last known state for {} - {}",
                self.dates[0],
                self.dates[self.dates.len() - 1]
            )?;
        }
        if self.pending_changes > 0 {
            writeln!(f, "{} unsaved changes", self.pending_changes)?;
        }

        let width = self
            .rows
            .iter()
            .map(|row| row.name.chars().count())
            .max()
            .unwrap_or(0)
            .max("candidate".len());
        writeln!(
            f,
            "{:width$} | {}",
            "candidate",
            self.dates
                .iter()
                .map(|date| format!("{:<15}", date.format("%a %d.%m")))
                .join(" | ")
        )?;
        for row in &self.rows {
            writeln!(
                f,
                "{:width$} | {}",
                row.name,
                row.cells
                    .iter()
                    .map(|cell| format!("{:<15}", cell.label.as_deref().unwrap_or("-")))
                    .join(" | ")
            )?;
        }
        writeln!(f, "unassigned shifts:")?;
        for entry in &self.pool {
            writeln!(
                f,
                "  {} / {} ({}h{:02}, first {}, used {}x)",
                entry.group,
                entry.label,
                entry.minutes / 60,
                entry.minutes % 60,
                entry.first_date.format("%a %d.%m"),
                entry.used
            )?;
        }
        Ok(())
    }
}
