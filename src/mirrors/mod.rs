mod classify;
mod coordinator;
mod request;

pub use classify::{classify, LogKind, LogRecord};
pub use coordinator::{
    RefreshSettings, RunState, UpdateCoordinator, SPAWN_FAILURE_CODE, WAIT_FAILURE_CODE,
};
pub use request::{
    Protocol, RunRejected, SortKey, UpdateRequest, MAX_MIRRORS_RANGE, TIMEOUT_RANGE,
};
