use std::sync::Arc;

use chrono::NaiveDate;
use shift_roster_client::error::ClientError;
use shift_roster_client::{RosterSink, RosterSource};
use shift_roster_core::drag::{apply_drop, AssignmentChanged, DragPayload, DropTarget};
use shift_roster_core::models::{Assignment, CandidateId, Project, ShiftId};
use shift_roster_core::{AssignmentGrid, RosterError, Window};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::view::RosterView;

/// Handle of one issued fetch. Only the most recently issued ticket may change the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    sequence: u64,
    window: Window,
}

impl FetchTicket {
    #[must_use]
    pub const fn window(&self) -> &Window {
        &self.window
    }
}

#[derive(Debug)]
pub struct FetchResponse {
    pub ticket: FetchTicket,
    pub result: Result<Vec<Assignment>, ClientError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchState {
    Idle,
    Loading { ticket: FetchTicket },
    Ready,
    Failed { window: Window, message: String },
    /// Changes were saved while a refresh of `window` was in flight, that refresh was dropped.
    Outdated { window: Window },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied { loaded: usize },
    Failed,
    /// A newer fetch was issued in the meantime, the response was dropped.
    Stale,
}

/// State of the roster page of one project.
///
/// The project is passed in explicitly, there is no global "current project".
#[derive(Debug)]
pub struct RosterController {
    project: Project,
    visible: Window,
    grid: AssignmentGrid,
    state: FetchState,
    latest: u64,
}

impl RosterController {
    pub fn new(project: Project, offset: i32) -> Result<Self, RosterError> {
        let visible = Window::for_project(&project, offset)?;
        Ok(Self {
            project,
            visible,
            grid: AssignmentGrid::new(visible),
            state: FetchState::Idle,
            latest: 0,
        })
    }

    /// Uses `fallback` when the project has no start date of its own.
    pub fn with_fallback_start(
        mut project: Project,
        fallback: Option<NaiveDate>,
        offset: i32,
    ) -> Result<Self, RosterError> {
        if project.start_date.is_none() {
            project.start_date = fallback;
        }
        Self::new(project, offset)
    }

    #[must_use]
    pub const fn project(&self) -> &Project {
        &self.project
    }

    #[must_use]
    pub const fn visible_window(&self) -> &Window {
        &self.visible
    }

    #[must_use]
    pub const fn grid(&self) -> &AssignmentGrid {
        &self.grid
    }

    #[must_use]
    pub const fn state(&self) -> &FetchState {
        &self.state
    }

    /// The grid shows the visible window and the last fetch for it succeeded.
    #[must_use]
    pub fn is_authoritative(&self) -> bool {
        self.state == FetchState::Ready && self.grid.window() == &self.visible
    }

    /// Issues a fetch for the visible window, invalidating every outstanding one.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.latest += 1;
        let ticket = FetchTicket {
            sequence: self.latest,
            window: self.visible,
        };
        debug!(
            "fetch #{} for {}..={}",
            ticket.sequence,
            ticket.window.start(),
            ticket.window.end()
        );
        self.state = FetchState::Loading { ticket };
        ticket
    }

    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<Assignment>, ClientError>,
    ) -> FetchOutcome {
        if ticket.sequence != self.latest {
            debug!(
                "dropping response of fetch #{}, #{} is the latest",
                ticket.sequence, self.latest
            );
            return FetchOutcome::Stale;
        }
        match result {
            Ok(assignments) => {
                if self.grid.has_pending_changes() {
                    warn!(
                        "discarding {} unsaved changes",
                        self.grid.pending_changes().len()
                    );
                }
                let loaded = self.grid.replace_window(ticket.window, assignments);
                info!(
                    "loaded {loaded} assignments for {}..={}",
                    ticket.window.start(),
                    ticket.window.end()
                );
                self.state = FetchState::Ready;
                FetchOutcome::Applied { loaded }
            }
            Err(error) => {
                warn!("fetch #{} failed: {error}", ticket.sequence);
                self.state = FetchState::Failed {
                    window: ticket.window,
                    message: error.to_string(),
                };
                FetchOutcome::Failed
            }
        }
    }

    fn move_window(&mut self, delta: i32) -> Result<(), RosterError> {
        self.visible = self.visible.moved(delta)?;
        Ok(())
    }

    /// Moves the visible window by `delta` fortnights and issues a fetch for it.
    pub fn navigate(&mut self, delta: i32) -> Result<FetchTicket, RosterError> {
        self.move_window(delta)?;
        Ok(self.begin_fetch())
    }

    pub fn navigate_in_background<S>(
        &mut self,
        delta: i32,
        source: Arc<S>,
        responses: mpsc::UnboundedSender<FetchResponse>,
    ) -> Result<FetchTicket, RosterError>
    where
        S: RosterSource + Send + Sync + 'static,
    {
        self.move_window(delta)?;
        Ok(self.spawn_fetch(source, responses))
    }

    /// A failed or outdated fetch of the visible window can be issued again.
    #[must_use]
    pub fn can_retry(&self) -> bool {
        matches!(
            &self.state,
            FetchState::Failed { window, .. } | FetchState::Outdated { window }
                if *window == self.visible
        )
    }

    pub fn retry(&mut self) -> Option<FetchTicket> {
        self.can_retry().then(|| self.begin_fetch())
    }

    /// Fetch in the background, the response is delivered through `responses`.
    pub fn spawn_fetch<S>(
        &mut self,
        source: Arc<S>,
        responses: mpsc::UnboundedSender<FetchResponse>,
    ) -> FetchTicket
    where
        S: RosterSource + Send + Sync + 'static,
    {
        let ticket = self.begin_fetch();
        tokio::spawn(async move {
            let result = source.fetch_roster(&ticket.window).await;
            if responses.send(FetchResponse { ticket, result }).is_err() {
                debug!("roster page closed before fetch #{} finished", ticket.sequence);
            }
        });
        ticket
    }

    pub fn apply_response(&mut self, response: FetchResponse) -> FetchOutcome {
        self.complete_fetch(response.ticket, response.result)
    }

    /// Fetches the visible window and waits for it.
    pub async fn load(&mut self, source: &impl RosterSource) -> Result<usize, AppError> {
        let ticket = self.begin_fetch();
        let result = source.fetch_roster(&ticket.window).await;
        match self.complete_fetch(ticket, result) {
            FetchOutcome::Applied { loaded } => Ok(loaded),
            FetchOutcome::Failed | FetchOutcome::Stale => Err(self.fetch_failed()),
        }
    }

    fn fetch_failed(&self) -> AppError {
        match &self.state {
            FetchState::Failed { message, .. } => AppError::FetchFailed(message.clone()),
            _ => AppError::FetchFailed("response was superseded".to_owned()),
        }
    }

    pub fn assign(
        &mut self,
        candidate_id: &CandidateId,
        date: NaiveDate,
        shift_id: Option<ShiftId>,
    ) -> Result<Option<ShiftId>, RosterError> {
        self.check_candidate(candidate_id)?;
        if let Some(shift_id) = &shift_id {
            self.check_shift(shift_id)?;
        }
        self.check_visible(candidate_id, date)?;
        self.grid.assign(candidate_id, date, shift_id)
    }

    pub fn drop_on(
        &mut self,
        payload: DragPayload,
        target: DropTarget,
    ) -> Result<Vec<AssignmentChanged>, RosterError> {
        self.check_shift(payload.shift_id())?;
        if let DragPayload::Cell {
            candidate_id, date, ..
        } = &payload
        {
            self.check_visible(candidate_id, *date)?;
        }
        if let DropTarget::Cell { candidate_id, date } = &target {
            self.check_candidate(candidate_id)?;
            self.check_visible(candidate_id, *date)?;
        }
        apply_drop(&mut self.grid, payload, target)
    }

    /// Persists the pending changes. Returns how many were sent.
    pub async fn save(&mut self, sink: &impl RosterSink) -> Result<usize, AppError> {
        let changes = self.grid.pending_changes();
        if changes.is_empty() {
            return Ok(0);
        }
        sink.save_roster(&changes).await?;
        self.grid.mark_saved();
        info!("saved {} roster changes", changes.len());
        if let FetchState::Loading { ticket } = self.state {
            if ticket.window == *self.grid.window() {
                // the in-flight snapshot predates the save
                self.latest += 1;
                debug!("fetch #{} outdated by save", ticket.sequence);
                self.state = FetchState::Outdated {
                    window: ticket.window,
                };
            }
        }
        Ok(changes.len())
    }

    pub fn discard_changes(&mut self) {
        self.grid.discard_changes();
    }

    #[must_use]
    pub fn view(&self) -> RosterView {
        RosterView::build(self)
    }

    fn check_candidate(&self, candidate_id: &CandidateId) -> Result<(), RosterError> {
        self.project
            .candidate(candidate_id)
            .map(|_| ())
            .ok_or_else(|| RosterError::UnknownCandidate(candidate_id.clone()))
    }

    fn check_shift(&self, shift_id: &ShiftId) -> Result<(), RosterError> {
        self.project
            .shift(shift_id)
            .map(|_| ())
            .ok_or_else(|| RosterError::UnknownShift(shift_id.clone()))
    }

    fn check_visible(&self, candidate_id: &CandidateId, date: NaiveDate) -> Result<(), RosterError> {
        if self.visible.contains(date) {
            Ok(())
        } else {
            Err(RosterError::OutOfRangeAssignment {
                candidate_id: candidate_id.clone(),
                date,
                window_start: self.visible.start(),
                window_end: self.visible.end(),
            })
        }
    }
}
