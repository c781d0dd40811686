//! In-process engine that reproduces the scanning SDK's event sequencing
//! without any capture hardware.

use std::path::Path;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use shared::{
    domain::{ScanPhase, ScannerType, StreamingFlag},
    protocol::SdkEvent,
};
use tokio::sync::{broadcast, Mutex};
use tracing::debug;

use crate::{ScanningSdk, EVENT_CHANNEL_CAPACITY};

const DEFAULT_LOCAL_ADDRESS: &str = "127.0.0.1";
const EMPTY_MESH_PLY: &str =
    "ply\nformat ascii 1.0\nelement vertex 0\nelement face 0\nproperty list uchar int vertex_indices\nend_header\n";

struct SimulatedState {
    phase: ScanPhase,
    scanner_type: Option<ScannerType>,
    v2_enabled: bool,
    size: f64,
    mesh_ready: bool,
    local_address: String,
    hosts: Vec<String>,
    server_host: Option<String>,
    flags: [(StreamingFlag, bool); 4],
}

pub struct SimulatedScanner {
    state: Mutex<SimulatedState>,
    events: broadcast::Sender<SdkEvent>,
}

impl SimulatedScanner {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: Mutex::new(SimulatedState {
                phase: ScanPhase::Uninitialized,
                scanner_type: None,
                v2_enabled: true,
                size: 1.0,
                mesh_ready: false,
                local_address: DEFAULT_LOCAL_ADDRESS.to_string(),
                hosts: Vec::new(),
                server_host: None,
                flags: StreamingFlag::ALL.map(|flag| (flag, false)),
            }),
            events,
        }
    }

    pub fn with_v2_enabled(mut self, enabled: bool) -> Self {
        self.state.get_mut().v2_enabled = enabled;
        self
    }

    pub fn with_local_address(mut self, address: impl Into<String>) -> Self {
        self.state.get_mut().local_address = address.into();
        self
    }

    pub fn with_peer_hosts(mut self, hosts: Vec<String>) -> Self {
        self.state.get_mut().hosts = hosts;
        self
    }

    /// Signals that the preview surface has been laid out.
    pub fn visualizer_ready(&self) {
        self.emit(SdkEvent::VisualizerReady);
    }

    /// Replaces the set of reachable peers and announces it.
    pub async fn announce_hosts(&self, hosts: Vec<String>) {
        self.state.lock().await.hosts = hosts.clone();
        self.emit(SdkEvent::HostDiscovered(hosts));
    }

    pub async fn phase(&self) -> ScanPhase {
        self.state.lock().await.phase
    }

    pub async fn size(&self) -> f64 {
        self.state.lock().await.size
    }

    pub async fn scanner_type(&self) -> Option<ScannerType> {
        self.state.lock().await.scanner_type
    }

    pub async fn server_host(&self) -> Option<String> {
        self.state.lock().await.server_host.clone()
    }

    pub async fn streaming_flag(&self, flag: StreamingFlag) -> bool {
        self.state
            .lock()
            .await
            .flags
            .iter()
            .find(|(candidate, _)| *candidate == flag)
            .map(|(_, enabled)| *enabled)
            .unwrap_or(false)
    }

    fn emit(&self, event: SdkEvent) {
        debug!(event = event.name(), "simulated engine event");
        let _ = self.events.send(event);
    }

    async fn set_flag(&self, flag: StreamingFlag, enabled: bool) -> Result<()> {
        let mut state = self.state.lock().await;
        if let Some(entry) = state.flags.iter_mut().find(|(candidate, _)| *candidate == flag) {
            entry.1 = enabled;
        }
        Ok(())
    }
}

impl Default for SimulatedScanner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScanningSdk for SimulatedScanner {
    async fn initialize_scanner(&self, scanner_type: ScannerType) -> Result<()> {
        {
            let mut state = self.state.lock().await;
            if state.phase.is_initialized() {
                bail!("scanner already initialized as {:?}", state.scanner_type);
            }
            state.phase = ScanPhase::Initialized;
            state.scanner_type = Some(scanner_type);
        }
        self.emit(SdkEvent::ScanStateChanged(ScanPhase::Initialized));
        self.emit(SdkEvent::ScannerReady);
        Ok(())
    }

    async fn uninitialize_scanner(&self) -> Result<()> {
        {
            let mut state = self.state.lock().await;
            state.phase = ScanPhase::Uninitialized;
            state.scanner_type = None;
            state.mesh_ready = false;
        }
        self.emit(SdkEvent::ScanStateChanged(ScanPhase::Uninitialized));
        Ok(())
    }

    async fn start_preview(&self) -> Result<()> {
        {
            let mut state = self.state.lock().await;
            if !state.phase.is_initialized() {
                bail!("scanner is not initialized");
            }
            if state.phase == ScanPhase::Scanning {
                bail!("cannot restart preview while scanning");
            }
            state.phase = ScanPhase::Previewing;
            state.mesh_ready = false;
        }
        self.emit(SdkEvent::PreviewStart);
        self.emit(SdkEvent::ScanStateChanged(ScanPhase::Previewing));
        Ok(())
    }

    async fn start_scan(&self) -> Result<()> {
        {
            let mut state = self.state.lock().await;
            if !matches!(state.phase, ScanPhase::Initialized | ScanPhase::Previewing) {
                bail!("cannot start scan while {}", state.phase);
            }
            state.phase = ScanPhase::Scanning;
        }
        self.emit(SdkEvent::ScannerStart);
        self.emit(SdkEvent::ScanStateChanged(ScanPhase::Scanning));
        Ok(())
    }

    async fn stop_scan(&self) -> Result<()> {
        {
            let mut state = self.state.lock().await;
            if state.phase != ScanPhase::Scanning {
                bail!("no scan in progress");
            }
            state.phase = ScanPhase::Viewing;
        }
        self.emit(SdkEvent::ScannerStop);
        self.emit(SdkEvent::ScanStateChanged(ScanPhase::Viewing));
        Ok(())
    }

    async fn generate_mesh(&self) -> Result<()> {
        {
            let mut state = self.state.lock().await;
            if state.phase != ScanPhase::Viewing {
                bail!("nothing to reconstruct while {}", state.phase);
            }
            state.mesh_ready = true;
        }
        self.emit(SdkEvent::GenerateMesh);
        Ok(())
    }

    async fn save_scan(&self, path: &Path) -> Result<()> {
        if !self.state.lock().await.mesh_ready {
            bail!("no mesh has been generated");
        }
        tokio::fs::write(path, EMPTY_MESH_PLY)
            .await
            .with_context(|| format!("failed to write mesh to '{}'", path.display()))?;
        self.emit(SdkEvent::SaveMesh);
        Ok(())
    }

    async fn get_v2_scanning_enabled(&self) -> Result<bool> {
        Ok(self.state.lock().await.v2_enabled)
    }

    async fn toggle_v2_scanning(&self, enabled: bool) -> Result<()> {
        self.state.lock().await.v2_enabled = enabled;
        Ok(())
    }

    async fn set_size(&self, size: f64) -> Result<()> {
        if !size.is_finite() || size <= 0.0 {
            bail!("invalid scan size {size}");
        }
        self.state.lock().await.size = size;
        Ok(())
    }

    async fn get_ip_address(&self) -> Result<String> {
        Ok(self.state.lock().await.local_address.clone())
    }

    async fn get_discovered_hosts(&self) -> Result<Vec<String>> {
        Ok(self.state.lock().await.hosts.clone())
    }

    async fn set_server_host(&self, host: &str) -> Result<()> {
        self.state.lock().await.server_host = Some(host.to_string());
        Ok(())
    }

    async fn set_send_rendered_stream(&self, enabled: bool) -> Result<()> {
        self.set_flag(StreamingFlag::SendRenderedStream, enabled).await
    }

    async fn set_receive_rendered_stream(&self, enabled: bool) -> Result<()> {
        self.set_flag(StreamingFlag::ReceiveRenderedStream, enabled)
            .await
    }

    async fn set_send_network_commands(&self, enabled: bool) -> Result<()> {
        self.set_flag(StreamingFlag::SendNetworkCommands, enabled).await
    }

    async fn set_receive_network_commands(&self, enabled: bool) -> Result<()> {
        self.set_flag(StreamingFlag::ReceiveNetworkCommands, enabled)
            .await
    }

    fn subscribe_events(&self) -> broadcast::Receiver<SdkEvent> {
        self.events.subscribe()
    }
}
