use std::path::Path;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{domain::ScannerType, protocol::SdkEvent};
use tokio::sync::broadcast;

mod simulated;
pub use simulated::SimulatedScanner;

pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Imperative surface of the external scanning engine.
///
/// Every operation may suspend; completion only means the engine accepted
/// the request. State changes are reported separately through
/// [`ScanningSdk::subscribe_events`].
#[async_trait]
pub trait ScanningSdk: Send + Sync {
    async fn initialize_scanner(&self, scanner_type: ScannerType) -> Result<()>;
    async fn uninitialize_scanner(&self) -> Result<()>;
    async fn start_preview(&self) -> Result<()>;
    async fn start_scan(&self) -> Result<()>;
    async fn stop_scan(&self) -> Result<()>;
    async fn generate_mesh(&self) -> Result<()>;
    async fn save_scan(&self, path: &Path) -> Result<()>;
    async fn get_v2_scanning_enabled(&self) -> Result<bool>;
    async fn toggle_v2_scanning(&self, enabled: bool) -> Result<()>;
    async fn set_size(&self, size: f64) -> Result<()>;
    async fn get_ip_address(&self) -> Result<String>;
    async fn get_discovered_hosts(&self) -> Result<Vec<String>>;
    async fn set_server_host(&self, host: &str) -> Result<()>;
    async fn set_send_rendered_stream(&self, enabled: bool) -> Result<()>;
    async fn set_receive_rendered_stream(&self, enabled: bool) -> Result<()>;
    async fn set_send_network_commands(&self, enabled: bool) -> Result<()>;
    async fn set_receive_network_commands(&self, enabled: bool) -> Result<()>;
    fn subscribe_events(&self) -> broadcast::Receiver<SdkEvent>;
}

/// Stand-in used when no engine is linked into the build.
pub struct MissingScanningSdk {
    events: broadcast::Sender<SdkEvent>,
}

impl MissingScanningSdk {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { events }
    }
}

impl Default for MissingScanningSdk {
    fn default() -> Self {
        Self::new()
    }
}

fn unavailable<T>() -> Result<T> {
    Err(anyhow!("scanning engine is unavailable"))
}

#[async_trait]
impl ScanningSdk for MissingScanningSdk {
    async fn initialize_scanner(&self, _scanner_type: ScannerType) -> Result<()> {
        unavailable()
    }

    async fn uninitialize_scanner(&self) -> Result<()> {
        unavailable()
    }

    async fn start_preview(&self) -> Result<()> {
        unavailable()
    }

    async fn start_scan(&self) -> Result<()> {
        unavailable()
    }

    async fn stop_scan(&self) -> Result<()> {
        unavailable()
    }

    async fn generate_mesh(&self) -> Result<()> {
        unavailable()
    }

    async fn save_scan(&self, _path: &Path) -> Result<()> {
        unavailable()
    }

    async fn get_v2_scanning_enabled(&self) -> Result<bool> {
        unavailable()
    }

    async fn toggle_v2_scanning(&self, _enabled: bool) -> Result<()> {
        unavailable()
    }

    async fn set_size(&self, _size: f64) -> Result<()> {
        unavailable()
    }

    async fn get_ip_address(&self) -> Result<String> {
        unavailable()
    }

    async fn get_discovered_hosts(&self) -> Result<Vec<String>> {
        unavailable()
    }

    async fn set_server_host(&self, _host: &str) -> Result<()> {
        unavailable()
    }

    async fn set_send_rendered_stream(&self, _enabled: bool) -> Result<()> {
        unavailable()
    }

    async fn set_receive_rendered_stream(&self, _enabled: bool) -> Result<()> {
        unavailable()
    }

    async fn set_send_network_commands(&self, _enabled: bool) -> Result<()> {
        unavailable()
    }

    async fn set_receive_network_commands(&self, _enabled: bool) -> Result<()> {
        unavailable()
    }

    fn subscribe_events(&self) -> broadcast::Receiver<SdkEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
