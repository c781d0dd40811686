use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::{ScanPhase, ScannerType, StreamingFlag};

/// Notifications emitted by the scanning engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum SdkEvent {
    ScanStateChanged(ScanPhase),
    VisualizerReady,
    ScannerReady,
    PreviewStart,
    ScannerStart,
    ScannerStop,
    GenerateMesh,
    SaveMesh,
    HostDiscovered(Vec<String>),
}

impl SdkEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ScanStateChanged(_) => "scan_state_changed",
            Self::VisualizerReady => "visualizer_ready",
            Self::ScannerReady => "scanner_ready",
            Self::PreviewStart => "preview_start",
            Self::ScannerStart => "scanner_start",
            Self::ScannerStop => "scanner_stop",
            Self::GenerateMesh => "generate_mesh",
            Self::SaveMesh => "save_mesh",
            Self::HostDiscovered(_) => "host_discovered",
        }
    }
}

/// Imperative operations issued to the scanning engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum SdkCommand {
    InitializeScanner(ScannerType),
    UninitializeScanner,
    StartPreview,
    StartScan,
    StopScan,
    GenerateMesh,
    SaveScan(PathBuf),
    GetV2ScanningEnabled,
    ToggleV2Scanning(bool),
    SetSize(f64),
    GetIpAddress,
    GetDiscoveredHosts,
    SetServerHost(String),
    SetStreamingFlag { flag: StreamingFlag, enabled: bool },
}

impl SdkCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::InitializeScanner(_) => "initialize_scanner",
            Self::UninitializeScanner => "uninitialize_scanner",
            Self::StartPreview => "start_preview",
            Self::StartScan => "start_scan",
            Self::StopScan => "stop_scan",
            Self::GenerateMesh => "generate_mesh",
            Self::SaveScan(_) => "save_scan",
            Self::GetV2ScanningEnabled => "get_v2_scanning_enabled",
            Self::ToggleV2Scanning(_) => "toggle_v2_scanning",
            Self::SetSize(_) => "set_size",
            Self::GetIpAddress => "get_ip_address",
            Self::GetDiscoveredHosts => "get_discovered_hosts",
            Self::SetServerHost(_) => "set_server_host",
            Self::SetStreamingFlag { flag, .. } => flag.as_str(),
        }
    }
}

/// What a completed command handed back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum SdkReply {
    Done,
    Flag(bool),
    Address(String),
    Hosts(Vec<String>),
}
