// cargo test -p shift-roster-backend --test controller
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{NaiveDate, NaiveTime, Weekday};
use shift_roster_backend::view::Status;
use shift_roster_backend::{AppError, FetchOutcome, FetchState, RosterController};
use shift_roster_client::error::ClientError;
use shift_roster_client::{RosterSink, RosterSource};
use shift_roster_core::drag::{DragPayload, DropTarget};
use shift_roster_core::models::{
    Assignment, AssignmentChange, Candidate, CandidateId, Consultant, ConsultantId,
    ConsultantRole, Project, ProjectId, Shift, ShiftGroup, ShiftGroupId, ShiftId,
};
use shift_roster_core::{RosterError, Slot, Window};
use tokio::sync::mpsc;

fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, month, day).unwrap()
}

fn time(hour: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, 0, 0).unwrap()
}

fn project() -> Project {
    Project {
        id: ProjectId::from("p1"),
        name: "Warehouse".to_owned(),
        start_date: Some(date(1, 10)),
        end_date: Some(date(3, 31)),
        locations: Vec::new(),
        consultants: vec![
            Consultant {
                id: ConsultantId::from("k1"),
                name: "Dana".to_owned(),
                role: ConsultantRole::Admin,
            },
            Consultant {
                id: ConsultantId::from("k2"),
                name: "Eli".to_owned(),
                role: ConsultantRole::Viewer,
            },
        ],
        shift_groups: vec![ShiftGroup {
            id: ShiftGroupId::from("g1"),
            name: "Default".to_owned(),
            shifts: vec![
                Shift {
                    id: ShiftId::from("S1"),
                    day: Weekday::Mon,
                    start_time: time(8),
                    end_time: time(16),
                },
                Shift {
                    id: ShiftId::from("S2"),
                    day: Weekday::Tue,
                    start_time: time(22),
                    end_time: time(6),
                },
            ],
        }],
        candidates: vec![
            Candidate {
                id: CandidateId::from("C1"),
                name: "Ann".to_owned(),
            },
            Candidate {
                id: CandidateId::from("C2"),
                name: "Bo".to_owned(),
            },
        ],
    }
}

fn assignment(candidate: &str, date: NaiveDate, shift: &str) -> Assignment {
    Assignment {
        candidate_id: CandidateId::from(candidate),
        date,
        shift_id: ShiftId::from(shift),
    }
}

#[derive(Default)]
struct FakeSource {
    assignments: Vec<Assignment>,
    delays: HashMap<NaiveDate, Duration>,
    fail: AtomicBool,
}

impl RosterSource for FakeSource {
    async fn fetch_roster(&self, window: &Window) -> Result<Vec<Assignment>, ClientError> {
        if let Some(delay) = self.delays.get(&window.start()) {
            tokio::time::sleep(*delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(ClientError::Status {
                status: 503,
                body: "unavailable".to_owned(),
            });
        }
        Ok(self
            .assignments
            .iter()
            .filter(|assignment| window.contains(assignment.date))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
struct FakeSink {
    saved: Mutex<Vec<Vec<AssignmentChange>>>,
    fail: AtomicBool,
}

impl RosterSink for FakeSink {
    async fn save_roster(&self, changes: &[AssignmentChange]) -> Result<(), ClientError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ClientError::Status {
                status: 500,
                body: "nope".to_owned(),
            });
        }
        self.saved.lock().unwrap().push(changes.to_vec());
        Ok(())
    }
}

fn source() -> FakeSource {
    FakeSource {
        assignments: vec![
            assignment("C1", date(1, 8), "S1"),
            assignment("C2", date(1, 9), "S2"),
            assignment("C1", date(1, 22), "S1"),
        ],
        ..FakeSource::default()
    }
}

#[tokio::test]
async fn load_fills_grid_and_view() {
    let mut controller = RosterController::new(project(), 0).unwrap();
    assert_eq!(controller.view().status, Status::Idle);

    assert_eq!(controller.load(&source()).await.unwrap(), 2);
    assert!(controller.is_authoritative());

    let view = controller.view();
    assert_eq!(view.requested_start, date(1, 8));
    assert_eq!(view.requested_end, date(1, 21));
    assert_eq!(view.dates.len(), 14);
    assert_eq!(view.rows.len(), 2);
    assert_eq!(view.rows[0].name, "Ann");
    assert_eq!(view.rows[0].cells[0].shift_id, Some(ShiftId::from("S1")));
    assert_eq!(view.rows[0].cells[0].label.as_deref(), Some("Mon 08:00-16:00"));
    assert_eq!(view.rows[1].cells[1].shift_id, Some(ShiftId::from("S2")));
    assert_eq!(view.rows[1].cells[0].shift_id, None);
    assert_eq!(view.pool.len(), 2);
    assert_eq!(view.pool[0].used, 1);
    assert_eq!(view.pool[0].minutes, 8 * 60);
    assert_eq!(view.pool[0].first_date, date(1, 8));
    // 22:00-06:00 runs past midnight
    assert_eq!(view.pool[1].minutes, 8 * 60);
    assert_eq!(view.pool[1].first_date, date(1, 9));
    assert_eq!(view.admins, vec!["Dana".to_owned()]);
    assert_eq!(view.status, Status::Ready);
    let text = view.to_string();
    assert!(text.contains("Ann"));
    assert!(text.contains("admins: Dana"));
    assert!(text.contains("(8h00, first Tue 09.01, used 1x)"));
}

#[tokio::test]
async fn assignments_of_unknown_candidates_get_their_own_row() {
    let source = FakeSource {
        assignments: vec![assignment("C9", date(1, 10), "S1")],
        ..FakeSource::default()
    };
    let mut controller = RosterController::new(project(), 0).unwrap();
    controller.load(&source).await.unwrap();

    let view = controller.view();
    assert_eq!(view.rows.len(), 3);
    assert_eq!(view.rows[2].name, "C9");
    assert_eq!(view.rows[2].cells[2].shift_id, Some(ShiftId::from("S1")));
}

#[test]
fn only_latest_response_is_applied() {
    let mut controller = RosterController::new(project(), 0).unwrap();
    let first = controller.navigate(1).unwrap();
    let second = controller.navigate(1).unwrap();
    assert_eq!(second.window().start(), date(2, 5));

    assert_eq!(
        controller.complete_fetch(second, Ok(vec![assignment("C1", date(2, 5), "S1")])),
        FetchOutcome::Applied { loaded: 1 }
    );
    assert_eq!(
        controller.complete_fetch(first, Ok(vec![assignment("C2", date(1, 22), "S2")])),
        FetchOutcome::Stale
    );
    assert_eq!(controller.grid().window(), second.window());
    assert_eq!(controller.grid().len(), 1);
    assert!(controller.is_authoritative());
}

#[test]
fn stale_failure_does_not_mark_failed() {
    let mut controller = RosterController::new(project(), 0).unwrap();
    let first = controller.begin_fetch();
    let second = controller.navigate(-1).unwrap();
    assert_eq!(
        controller.complete_fetch(
            first,
            Err(ClientError::Status {
                status: 502,
                body: String::new(),
            })
        ),
        FetchOutcome::Stale
    );
    assert_eq!(controller.state(), &FetchState::Loading { ticket: second });
}

#[tokio::test(start_paused = true)]
async fn slow_response_of_abandoned_window_is_dropped() {
    let mut source = source();
    // the first fortnight after the start answers late
    source.delays.insert(date(1, 22), Duration::from_millis(500));
    let source = Arc::new(source);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut controller = RosterController::new(project(), 0).unwrap();
    let slow = controller
        .navigate_in_background(1, Arc::clone(&source), tx.clone())
        .unwrap();
    let fast = controller
        .navigate_in_background(-1, Arc::clone(&source), tx)
        .unwrap();

    let response = rx.recv().await.unwrap();
    assert_eq!(response.ticket, fast);
    assert_eq!(
        controller.apply_response(response),
        FetchOutcome::Applied { loaded: 2 }
    );

    let response = rx.recv().await.unwrap();
    assert_eq!(response.ticket, slow);
    assert_eq!(controller.apply_response(response), FetchOutcome::Stale);

    assert_eq!(controller.grid().window().start(), date(1, 8));
    assert_eq!(
        controller.grid().get(&CandidateId::from("C1"), date(1, 8)),
        Slot::Assigned(ShiftId::from("S1"))
    );
    assert_eq!(
        controller.grid().get(&CandidateId::from("C1"), date(1, 22)),
        Slot::Unassigned
    );
}

#[tokio::test]
async fn failed_fetch_keeps_last_state_and_offers_retry() {
    let source = source();
    let mut controller = RosterController::new(project(), 0).unwrap();
    controller.load(&source).await.unwrap();
    assert_eq!(controller.retry(), None);

    source.fail.store(true, Ordering::SeqCst);
    let ticket = controller.navigate(1).unwrap();
    let result = source.fetch_roster(ticket.window()).await;
    assert_eq!(controller.complete_fetch(ticket, result), FetchOutcome::Failed);

    // last known state is kept but not passed off as the requested window
    assert_eq!(controller.grid().window().start(), date(1, 8));
    assert_eq!(controller.grid().len(), 2);
    assert!(!controller.is_authoritative());
    let view = controller.view();
    assert!(matches!(view.status, Status::Failed { retry: true, .. }));
    assert!(!view.authoritative);
    assert_eq!(view.requested_start, date(1, 22));
    assert_eq!(view.dates[0], date(1, 8));
    let text = view.to_string();
    assert!(text.contains("[retry]"));
    assert!(text.contains("last known state"));

    assert!(controller.can_retry());

    assert!(matches!(
        controller.load(&source).await,
        Err(AppError::FetchFailed(_))
    ));

    source.fail.store(false, Ordering::SeqCst);
    let ticket = controller.retry().unwrap();
    assert_eq!(ticket.window().start(), date(1, 22));
    let result = source.fetch_roster(ticket.window()).await;
    assert_eq!(
        controller.complete_fetch(ticket, result),
        FetchOutcome::Applied { loaded: 1 }
    );
    assert!(controller.is_authoritative());
}

#[tokio::test]
async fn assign_checks_project_and_window() {
    let mut controller = RosterController::new(project(), 0).unwrap();
    controller.load(&source()).await.unwrap();
    let c1 = CandidateId::from("C1");

    assert_eq!(
        controller.assign(&c1, date(1, 10), Some(ShiftId::from("S9"))),
        Err(RosterError::UnknownShift(ShiftId::from("S9")))
    );
    assert_eq!(
        controller.assign(&CandidateId::from("C9"), date(1, 10), None),
        Err(RosterError::UnknownCandidate(CandidateId::from("C9")))
    );
    assert!(matches!(
        controller.assign(&c1, date(1, 22), Some(ShiftId::from("S1"))),
        Err(RosterError::OutOfRangeAssignment { .. })
    ));

    // while the next fortnight is loading the old grid must not take its dates
    controller.navigate(1).unwrap();
    assert!(matches!(
        controller.assign(&c1, date(1, 22), Some(ShiftId::from("S1"))),
        Err(RosterError::OutOfRangeAssignment { .. })
    ));
    assert!(matches!(
        controller.assign(&c1, date(1, 8), None),
        Err(RosterError::OutOfRangeAssignment { .. })
    ));
}

#[tokio::test]
async fn drag_and_save() {
    let mut controller = RosterController::new(project(), 0).unwrap();
    controller.load(&source()).await.unwrap();

    let events = controller
        .drop_on(
            DragPayload::Cell {
                candidate_id: CandidateId::from("C1"),
                date: date(1, 8),
                shift_id: ShiftId::from("S1"),
            },
            DropTarget::Cell {
                candidate_id: CandidateId::from("C2"),
                date: date(1, 15),
            },
        )
        .unwrap();
    assert_eq!(events.len(), 2);
    controller
        .drop_on(
            DragPayload::Pool {
                shift_id: ShiftId::from("S2"),
            },
            DropTarget::Cell {
                candidate_id: CandidateId::from("C1"),
                date: date(1, 16),
            },
        )
        .unwrap();
    assert!(matches!(
        controller.drop_on(
            DragPayload::Pool {
                shift_id: ShiftId::from("S1"),
            },
            DropTarget::Cell {
                candidate_id: CandidateId::from("C7"),
                date: date(1, 16),
            },
        ),
        Err(RosterError::UnknownCandidate(_))
    ));
    assert_eq!(controller.view().pending_changes, 3);

    let sink = FakeSink::default();
    sink.fail.store(true, Ordering::SeqCst);
    assert!(matches!(
        controller.save(&sink).await,
        Err(AppError::Client(ClientError::Status { status: 500, .. }))
    ));
    assert_eq!(controller.grid().pending_changes().len(), 3);

    sink.fail.store(false, Ordering::SeqCst);
    assert_eq!(controller.save(&sink).await.unwrap(), 3);
    assert_eq!(controller.save(&sink).await.unwrap(), 0);

    let saved = sink.saved.lock().unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(
        saved[0],
        vec![
            AssignmentChange {
                candidate_id: CandidateId::from("C1"),
                date: date(1, 8),
                shift_id: None,
            },
            AssignmentChange {
                candidate_id: CandidateId::from("C2"),
                date: date(1, 15),
                shift_id: Some(ShiftId::from("S1")),
            },
            AssignmentChange {
                candidate_id: CandidateId::from("C1"),
                date: date(1, 16),
                shift_id: Some(ShiftId::from("S2")),
            },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn save_outdates_refresh_in_flight() {
    let mut source = source();
    source.delays.insert(date(1, 8), Duration::from_millis(500));
    let source = Arc::new(source);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut controller = RosterController::new(project(), 0).unwrap();
    controller.load(source.as_ref()).await.unwrap();
    let refresh = controller.spawn_fetch(Arc::clone(&source), tx);

    let c2 = CandidateId::from("C2");
    controller
        .assign(&c2, date(1, 12), Some(ShiftId::from("S1")))
        .unwrap();
    let sink = FakeSink::default();
    assert_eq!(controller.save(&sink).await.unwrap(), 1);
    assert_eq!(
        controller.state(),
        &FetchState::Outdated {
            window: *refresh.window()
        }
    );

    let response = rx.recv().await.unwrap();
    assert_eq!(response.ticket, refresh);
    assert_eq!(controller.apply_response(response), FetchOutcome::Stale);
    assert_eq!(
        controller.grid().get(&c2, date(1, 12)),
        Slot::Assigned(ShiftId::from("S1"))
    );
    assert!(!controller.is_authoritative());
    let view = controller.view();
    assert_eq!(view.status, Status::Outdated { retry: true });
    assert!(view.to_string().contains("[retry]"));

    let ticket = controller.retry().unwrap();
    assert_eq!(ticket.window(), refresh.window());
}

#[test]
fn start_date_is_required() {
    let mut without_start = project();
    without_start.start_date = None;
    assert!(matches!(
        RosterController::new(without_start.clone(), 0),
        Err(RosterError::InvalidInput(_))
    ));
    let controller =
        RosterController::with_fallback_start(without_start, Some(date(1, 24)), 0).unwrap();
    assert_eq!(controller.visible_window().start(), date(1, 22));

    let controller =
        RosterController::with_fallback_start(project(), Some(date(6, 1)), 0).unwrap();
    assert_eq!(controller.visible_window().start(), date(1, 8));
}
