use thiserror::Error;

/// Any rejected call into the scanning engine. Transient and permanent
/// causes are not distinguished; the engine's failure modes are opaque.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{command} failed: {message}")]
pub struct SdkCallFailure {
    pub command: &'static str,
    pub message: String,
}

impl SdkCallFailure {
    pub fn new(command: &'static str, message: impl Into<String>) -> Self {
        Self {
            command,
            message: message.into(),
        }
    }
}
