use shared::domain::ScanPhase;
use thiserror::Error;

use crate::session::ActionKind;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("{action} is not available while {phase}")]
    ActionNotAllowed { action: ActionKind, phase: ScanPhase },
    #[error("host {0} has not been discovered")]
    UnknownHost(String),
}
