pub mod controller;
pub mod error;
pub mod telemetry;
pub mod view;

pub use controller::{FetchOutcome, FetchResponse, FetchState, FetchTicket, RosterController};
pub use error::AppError;
pub use view::RosterView;
