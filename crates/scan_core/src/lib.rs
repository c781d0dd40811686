//! Scan-session logic: size conversion, the phase-mirroring session
//! reducer, device role coordination and the SDK command dispatcher.

pub mod controller;
pub mod dispatcher;
pub mod error;
pub mod role;
pub mod session;
pub mod units;

pub use controller::ScanController;
pub use dispatcher::Dispatcher;
pub use error::ScanError;
pub use role::{RoleCoordinator, RoleOutcome, RoleSwitchFailure};
pub use session::{
    plan_action, reduce, ActionKind, Effect, Notice, SessionEvent, SessionState, Transition,
    UserAction,
};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
