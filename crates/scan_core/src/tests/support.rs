use std::{
    collections::HashSet,
    path::Path,
    sync::Mutex,
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use scan_sdk::{ScanningSdk, EVENT_CHANNEL_CAPACITY};
use shared::{
    domain::{ScannerType, StreamingFlag},
    protocol::{SdkCommand, SdkEvent},
};
use tokio::sync::broadcast;

/// Fake engine that records every command and never emits on its own.
pub struct RecordingSdk {
    calls: Mutex<Vec<SdkCommand>>,
    failing: Mutex<HashSet<&'static str>>,
    v2_enabled: Mutex<bool>,
    address: String,
    hosts: Mutex<Vec<String>>,
    events: broadcast::Sender<SdkEvent>,
}

impl RecordingSdk {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            calls: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
            v2_enabled: Mutex::new(false),
            address: "192.168.1.20".to_string(),
            hosts: Mutex::new(Vec::new()),
            events,
        }
    }

    pub fn with_v2_enabled(self, enabled: bool) -> Self {
        *self.v2_enabled.lock().expect("v2 lock") = enabled;
        self
    }

    pub fn with_hosts(self, hosts: Vec<String>) -> Self {
        *self.hosts.lock().expect("hosts lock") = hosts;
        self
    }

    pub fn fail(&self, command: &'static str) {
        self.failing.lock().expect("failing lock").insert(command);
    }

    pub fn recover(&self, command: &'static str) {
        self.failing.lock().expect("failing lock").remove(command);
    }

    pub fn calls(&self) -> Vec<SdkCommand> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn call_names(&self) -> Vec<&'static str> {
        self.calls().iter().map(SdkCommand::name).collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().expect("calls lock").clear();
    }

    pub fn emit(&self, event: SdkEvent) {
        let _ = self.events.send(event);
    }

    fn record(&self, command: SdkCommand) -> Result<()> {
        let name = command.name();
        self.calls.lock().expect("calls lock").push(command);
        if self.failing.lock().expect("failing lock").contains(name) {
            return Err(anyhow!("{name} rejected"));
        }
        Ok(())
    }
}

#[async_trait]
impl ScanningSdk for RecordingSdk {
    async fn initialize_scanner(&self, scanner_type: ScannerType) -> Result<()> {
        self.record(SdkCommand::InitializeScanner(scanner_type))
    }

    async fn uninitialize_scanner(&self) -> Result<()> {
        self.record(SdkCommand::UninitializeScanner)
    }

    async fn start_preview(&self) -> Result<()> {
        self.record(SdkCommand::StartPreview)
    }

    async fn start_scan(&self) -> Result<()> {
        self.record(SdkCommand::StartScan)
    }

    async fn stop_scan(&self) -> Result<()> {
        self.record(SdkCommand::StopScan)
    }

    async fn generate_mesh(&self) -> Result<()> {
        self.record(SdkCommand::GenerateMesh)
    }

    async fn save_scan(&self, path: &Path) -> Result<()> {
        self.record(SdkCommand::SaveScan(path.to_path_buf()))
    }

    async fn get_v2_scanning_enabled(&self) -> Result<bool> {
        self.record(SdkCommand::GetV2ScanningEnabled)?;
        Ok(*self.v2_enabled.lock().expect("v2 lock"))
    }

    async fn toggle_v2_scanning(&self, enabled: bool) -> Result<()> {
        self.record(SdkCommand::ToggleV2Scanning(enabled))?;
        *self.v2_enabled.lock().expect("v2 lock") = enabled;
        Ok(())
    }

    async fn set_size(&self, size: f64) -> Result<()> {
        self.record(SdkCommand::SetSize(size))
    }

    async fn get_ip_address(&self) -> Result<String> {
        self.record(SdkCommand::GetIpAddress)?;
        Ok(self.address.clone())
    }

    async fn get_discovered_hosts(&self) -> Result<Vec<String>> {
        self.record(SdkCommand::GetDiscoveredHosts)?;
        Ok(self.hosts.lock().expect("hosts lock").clone())
    }

    async fn set_server_host(&self, host: &str) -> Result<()> {
        self.record(SdkCommand::SetServerHost(host.to_string()))
    }

    async fn set_send_rendered_stream(&self, enabled: bool) -> Result<()> {
        self.record(SdkCommand::SetStreamingFlag {
            flag: StreamingFlag::SendRenderedStream,
            enabled,
        })
    }

    async fn set_receive_rendered_stream(&self, enabled: bool) -> Result<()> {
        self.record(SdkCommand::SetStreamingFlag {
            flag: StreamingFlag::ReceiveRenderedStream,
            enabled,
        })
    }

    async fn set_send_network_commands(&self, enabled: bool) -> Result<()> {
        self.record(SdkCommand::SetStreamingFlag {
            flag: StreamingFlag::SendNetworkCommands,
            enabled,
        })
    }

    async fn set_receive_network_commands(&self, enabled: bool) -> Result<()> {
        self.record(SdkCommand::SetStreamingFlag {
            flag: StreamingFlag::ReceiveNetworkCommands,
            enabled,
        })
    }

    fn subscribe_events(&self) -> broadcast::Receiver<SdkEvent> {
        self.events.subscribe()
    }
}
