use super::*;
use shared::domain::{ScanPhase, StreamingFlag};

fn drain(rx: &mut broadcast::Receiver<SdkEvent>) -> Vec<SdkEvent> {
    let mut seen = Vec::new();
    while let Ok(event) = rx.try_recv() {
        seen.push(event);
    }
    seen
}

#[tokio::test]
async fn missing_sdk_rejects_every_call() {
    let sdk = MissingScanningSdk::new();
    assert!(sdk.initialize_scanner(ScannerType::TrueDepth).await.is_err());
    assert!(sdk.start_preview().await.is_err());
    assert!(sdk.get_v2_scanning_enabled().await.is_err());
    assert!(sdk.set_size(1.0).await.is_err());
}

#[tokio::test]
async fn simulated_scanner_walks_a_full_scan_cycle() {
    let dir = tempfile::tempdir().expect("tempdir");
    let sdk = SimulatedScanner::new();
    let mut rx = sdk.subscribe_events();

    sdk.visualizer_ready();
    sdk.initialize_scanner(ScannerType::TrueDepth)
        .await
        .expect("init");
    sdk.start_preview().await.expect("preview");
    sdk.start_scan().await.expect("scan");
    sdk.stop_scan().await.expect("stop");
    sdk.generate_mesh().await.expect("mesh");
    let path = dir.path().join("scan.ply");
    sdk.save_scan(&path).await.expect("save");

    assert!(path.exists());
    assert_eq!(sdk.phase().await, ScanPhase::Viewing);

    let names: Vec<&str> = drain(&mut rx).iter().map(SdkEvent::name).collect();
    assert_eq!(
        names,
        vec![
            "visualizer_ready",
            "scan_state_changed",
            "scanner_ready",
            "preview_start",
            "scan_state_changed",
            "scanner_start",
            "scan_state_changed",
            "scanner_stop",
            "scan_state_changed",
            "generate_mesh",
            "save_mesh",
        ]
    );
}

#[tokio::test]
async fn simulated_scanner_refuses_overlapping_initialization() {
    let sdk = SimulatedScanner::new();
    sdk.initialize_scanner(ScannerType::Network)
        .await
        .expect("first init");
    assert!(sdk.initialize_scanner(ScannerType::TrueDepth).await.is_err());

    sdk.uninitialize_scanner().await.expect("uninit");
    sdk.initialize_scanner(ScannerType::TrueDepth)
        .await
        .expect("reinit");
    assert_eq!(sdk.scanner_type().await, Some(ScannerType::TrueDepth));
}

#[tokio::test]
async fn simulated_scanner_rejects_save_without_mesh() {
    let dir = tempfile::tempdir().expect("tempdir");
    let sdk = SimulatedScanner::new();
    sdk.initialize_scanner(ScannerType::TrueDepth)
        .await
        .expect("init");
    assert!(sdk.save_scan(&dir.path().join("scan.ply")).await.is_err());
}

#[tokio::test]
async fn announced_hosts_replace_previous_list() {
    let sdk = SimulatedScanner::new().with_peer_hosts(vec!["10.0.0.2".into()]);
    let mut rx = sdk.subscribe_events();
    sdk.announce_hosts(vec!["10.0.0.9".into()]).await;

    assert_eq!(
        sdk.get_discovered_hosts().await.expect("hosts"),
        vec!["10.0.0.9".to_string()]
    );
    assert_eq!(
        drain(&mut rx),
        vec![SdkEvent::HostDiscovered(vec!["10.0.0.9".into()])]
    );
}

#[tokio::test]
async fn streaming_flags_are_tracked_per_setter() {
    let sdk = SimulatedScanner::new();
    sdk.set_receive_network_commands(true).await.expect("flag");
    assert!(sdk.streaming_flag(StreamingFlag::ReceiveNetworkCommands).await);
    assert!(!sdk.streaming_flag(StreamingFlag::SendNetworkCommands).await);
}

#[tokio::test]
async fn server_host_is_kept_until_replaced() {
    let sdk = SimulatedScanner::new();
    assert_eq!(sdk.server_host().await, None);

    sdk.set_server_host("10.0.0.2").await.expect("host");
    sdk.set_server_host("10.0.0.5").await.expect("host");
    assert_eq!(sdk.server_host().await.as_deref(), Some("10.0.0.5"));
}
