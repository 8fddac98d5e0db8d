extern crate alloc;

pub mod drag;
pub mod error;
pub mod grid;
pub mod models;
pub mod navigation;
pub mod window;

pub use error::RosterError;
pub use grid::{AssignmentGrid, Slot};
pub use window::{parse_start_date, Window};
