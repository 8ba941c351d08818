mod subsystem;
pub use subsystem::{Subsystem, SubsystemError};

pub mod pending;
pub mod tracker;
pub mod updates;

pub use pending::PendingDeletes;
pub use tracker::{Tracker, TrackerState};
pub use updates::BoardUpdates;
