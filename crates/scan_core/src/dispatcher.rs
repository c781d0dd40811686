//! Uniform wrapper around engine calls: await, and on rejection log a
//! warning instead of propagating. Nothing is retried.

use std::sync::Arc;

use scan_sdk::ScanningSdk;
use shared::{
    domain::StreamingFlag,
    error::SdkCallFailure,
    protocol::{SdkCommand, SdkEvent, SdkReply},
};
use tokio::sync::broadcast;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct Dispatcher {
    sdk: Arc<dyn ScanningSdk>,
}

impl Dispatcher {
    pub fn new(sdk: Arc<dyn ScanningSdk>) -> Self {
        Self { sdk }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SdkEvent> {
        self.sdk.subscribe_events()
    }

    pub async fn dispatch(&self, command: SdkCommand) -> Result<SdkReply, SdkCallFailure> {
        let name = command.name();
        let sdk = &self.sdk;
        let result = match command {
            SdkCommand::InitializeScanner(scanner_type) => sdk
                .initialize_scanner(scanner_type)
                .await
                .map(|()| SdkReply::Done),
            SdkCommand::UninitializeScanner => {
                sdk.uninitialize_scanner().await.map(|()| SdkReply::Done)
            }
            SdkCommand::StartPreview => sdk.start_preview().await.map(|()| SdkReply::Done),
            SdkCommand::StartScan => sdk.start_scan().await.map(|()| SdkReply::Done),
            SdkCommand::StopScan => sdk.stop_scan().await.map(|()| SdkReply::Done),
            SdkCommand::GenerateMesh => sdk.generate_mesh().await.map(|()| SdkReply::Done),
            SdkCommand::SaveScan(path) => sdk.save_scan(&path).await.map(|()| SdkReply::Done),
            SdkCommand::GetV2ScanningEnabled => {
                sdk.get_v2_scanning_enabled().await.map(SdkReply::Flag)
            }
            SdkCommand::ToggleV2Scanning(enabled) => sdk
                .toggle_v2_scanning(enabled)
                .await
                .map(|()| SdkReply::Done),
            SdkCommand::SetSize(size) => sdk.set_size(size).await.map(|()| SdkReply::Done),
            SdkCommand::GetIpAddress => sdk.get_ip_address().await.map(SdkReply::Address),
            SdkCommand::GetDiscoveredHosts => {
                sdk.get_discovered_hosts().await.map(SdkReply::Hosts)
            }
            SdkCommand::SetServerHost(host) => {
                sdk.set_server_host(&host).await.map(|()| SdkReply::Done)
            }
            SdkCommand::SetStreamingFlag { flag, enabled } => {
                let outcome = match flag {
                    StreamingFlag::SendRenderedStream => {
                        sdk.set_send_rendered_stream(enabled).await
                    }
                    StreamingFlag::ReceiveRenderedStream => {
                        sdk.set_receive_rendered_stream(enabled).await
                    }
                    StreamingFlag::SendNetworkCommands => {
                        sdk.set_send_network_commands(enabled).await
                    }
                    StreamingFlag::ReceiveNetworkCommands => {
                        sdk.set_receive_network_commands(enabled).await
                    }
                };
                outcome.map(|()| SdkReply::Done)
            }
        };

        match result {
            Ok(reply) => {
                debug!(command = name, "sdk command completed");
                Ok(reply)
            }
            Err(err) => Err(SdkCallFailure::new(name, format!("{err:#}"))),
        }
    }

    /// Dispatches and swallows a rejection after logging it.
    pub async fn dispatch_logged(&self, command: SdkCommand) -> Option<SdkReply> {
        match self.dispatch(command).await {
            Ok(reply) => Some(reply),
            Err(err) => {
                log_failure(&err);
                None
            }
        }
    }
}

pub(crate) fn log_failure(err: &SdkCallFailure) {
    warn!(command = err.command, error = %err.message, "sdk command failed");
}

#[cfg(test)]
#[path = "tests/dispatcher_tests.rs"]
mod tests;
