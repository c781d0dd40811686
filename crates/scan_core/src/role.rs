//! Device role negotiation for paired mirror/scanner setups.
//!
//! All initialization goes through [`RoleCoordinator`] so that at most one
//! engine session is active: a live session is always torn down before the
//! next one starts, and callers are serialized on a single lock.

use shared::{
    domain::{DeviceRole, ScannerType, StreamingFlags},
    error::SdkCallFailure,
    protocol::{SdkCommand, SdkReply},
};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;

use crate::dispatcher::Dispatcher;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleOutcome {
    pub role: DeviceRole,
    pub flags: StreamingFlags,
    /// Mirror devices publish their own address for pairing.
    pub local_address: Option<String>,
    /// Scanner devices list the peers they can reach.
    pub discovered_hosts: Option<Vec<String>>,
}

/// A role switch that stopped partway. Records how far the engine got so
/// the session can describe what is actually configured.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("switching to {role} role failed: {cause}")]
pub struct RoleSwitchFailure {
    pub role: DeviceRole,
    /// The previous session was uninitialized before the failure.
    pub torn_down: bool,
    /// Flags the engine now holds; `None` when only some were pushed.
    pub flags: Option<StreamingFlags>,
    #[source]
    pub cause: SdkCallFailure,
}

pub struct RoleCoordinator {
    dispatcher: Dispatcher,
    active: Mutex<Option<ScannerType>>,
}

impl RoleCoordinator {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            active: Mutex::new(None),
        }
    }

    pub async fn active_scanner(&self) -> Option<ScannerType> {
        *self.active.lock().await
    }

    /// Initializes `scanner_type` unless that exact session is already live.
    pub async fn ensure_initialized(&self, scanner_type: ScannerType) -> Result<(), SdkCallFailure> {
        let mut active = self.active.lock().await;
        if *active == Some(scanner_type) {
            return Ok(());
        }
        self.reinitialize(&mut active, scanner_type).await
    }

    pub async fn uninitialize(&self) -> Result<(), SdkCallFailure> {
        let mut active = self.active.lock().await;
        self.teardown(&mut active).await
    }

    pub async fn apply_role(&self, role: DeviceRole) -> Result<RoleOutcome, RoleSwitchFailure> {
        let mut active = self.active.lock().await;
        let failed = |torn_down, flags, cause| RoleSwitchFailure {
            role,
            torn_down,
            flags,
            cause,
        };
        if let Err(cause) = self.teardown(&mut active).await {
            return Err(failed(false, None, cause));
        }

        let flags = StreamingFlags::for_role(role);
        for (flag, enabled) in flags.entries() {
            if let Err(cause) = self
                .dispatcher
                .dispatch(SdkCommand::SetStreamingFlag { flag, enabled })
                .await
            {
                return Err(failed(true, None, cause));
            }
        }
        if let Err(cause) = self.reinitialize(&mut active, role.scanner_type()).await {
            return Err(failed(true, Some(flags), cause));
        }

        // Pairing details are best effort; the role itself is already applied.
        let mut outcome = RoleOutcome {
            role,
            flags,
            local_address: None,
            discovered_hosts: None,
        };
        match role {
            DeviceRole::Mirror => {
                if let Some(SdkReply::Address(address)) = self
                    .dispatcher
                    .dispatch_logged(SdkCommand::GetIpAddress)
                    .await
                {
                    outcome.local_address = Some(address);
                }
            }
            DeviceRole::Scanner => {
                if let Some(SdkReply::Hosts(hosts)) = self
                    .dispatcher
                    .dispatch_logged(SdkCommand::GetDiscoveredHosts)
                    .await
                {
                    outcome.discovered_hosts = Some(hosts);
                }
            }
        }

        info!(role = %role, scanner_type = %role.scanner_type(), "applied device role");
        Ok(outcome)
    }

    async fn reinitialize(
        &self,
        active: &mut Option<ScannerType>,
        scanner_type: ScannerType,
    ) -> Result<(), SdkCallFailure> {
        self.teardown(active).await?;
        self.dispatcher
            .dispatch(SdkCommand::InitializeScanner(scanner_type))
            .await?;
        *active = Some(scanner_type);
        Ok(())
    }

    async fn teardown(&self, active: &mut Option<ScannerType>) -> Result<(), SdkCallFailure> {
        if active.is_some() {
            self.dispatcher
                .dispatch(SdkCommand::UninitializeScanner)
                .await?;
            *active = None;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/role_tests.rs"]
mod tests;
