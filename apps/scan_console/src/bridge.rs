//! Bridge between the stdin UI thread and the backend worker that owns the
//! tokio runtime, the simulated engine and the scan controller.

use std::{sync::Arc, thread};

use crossbeam_channel::{Receiver, Sender, TrySendError};
use mesh_storage::MeshDirectory;
use scan_core::{Notice, ScanController, SessionState, UserAction};
use scan_sdk::SimulatedScanner;
use serde_json::json;
use tokio::sync::{mpsc, watch};
use tracing::{error, info};

use crate::config::{parse_host_list, parse_role, Settings};

const ACTION_QUEUE_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Action(UserAction),
    AnnounceHosts(Vec<String>),
    ListSaved,
    Quit,
}

impl ConsoleCommand {
    fn name(&self) -> &'static str {
        match self {
            Self::Action(action) => action.kind().as_str(),
            Self::AnnounceHosts(_) => "announce_hosts",
            Self::ListSaved => "list_saved",
            Self::Quit => "quit",
        }
    }
}

pub const HELP: &str = "commands: start | stop | save | new | size <0.2-4.0> | v2 | role <mirror|scanner> | host <addr> | uninit | announce <a,b,..> | saved | quit";

pub fn parse_command(line: &str) -> Result<ConsoleCommand, String> {
    let mut parts = line.trim().splitn(2, char::is_whitespace);
    let verb = parts.next().unwrap_or_default().to_ascii_lowercase();
    let arg = parts.next().map(str::trim).unwrap_or_default();

    let command = match verb.as_str() {
        "start" => ConsoleCommand::Action(UserAction::StartScan),
        "stop" => ConsoleCommand::Action(UserAction::StopScan),
        "save" => ConsoleCommand::Action(UserAction::SaveScan),
        "new" => ConsoleCommand::Action(UserAction::NewScan),
        "v2" => ConsoleCommand::Action(UserAction::ToggleV2),
        "uninit" => ConsoleCommand::Action(UserAction::Reinitialize),
        "size" => {
            let value = arg
                .parse::<f64>()
                .map_err(|_| format!("invalid size '{arg}'"))?;
            ConsoleCommand::Action(UserAction::SetSize(value))
        }
        "role" => {
            let role = parse_role(arg).map_err(|err| err.to_string())?;
            ConsoleCommand::Action(UserAction::ApplyRole(role))
        }
        "host" if !arg.is_empty() => {
            ConsoleCommand::Action(UserAction::SelectHost(arg.to_string()))
        }
        "announce" => ConsoleCommand::AnnounceHosts(parse_host_list(arg)),
        "saved" => ConsoleCommand::ListSaved,
        "quit" | "exit" => ConsoleCommand::Quit,
        _ => return Err(format!("unrecognized command '{}'; {HELP}", line.trim())),
    };
    Ok(command)
}

pub fn dispatch_console_command(
    cmd_tx: &Sender<ConsoleCommand>,
    cmd: ConsoleCommand,
    status: &mut String,
) {
    let cmd_name = cmd.name();
    match cmd_tx.try_send(cmd) {
        Ok(()) => tracing::debug!(command = cmd_name, "queued console->backend command"),
        Err(TrySendError::Full(_)) => {
            *status = "Console command queue is full; please retry".to_string();
        }
        Err(TrySendError::Disconnected(_)) => {
            *status = "Backend worker disconnected (possible startup failure); restart the console"
                .to_string();
        }
    }
}

/// User-facing view of a session snapshot.
pub fn render_state(state: &SessionState) -> serde_json::Value {
    json!({
        "phase": state.phase,
        "size": state.size_label(),
        "v2_scanning": state.v2_mode,
        "role": state.role,
        "allowed": state.allowed_actions(),
        "local_address": state.local_address,
        "hosts": state.discovered_hosts,
        "selected_host": state.selected_host,
    })
}

pub fn launch(settings: Settings, cmd_rx: Receiver<ConsoleCommand>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                error!("failed to build backend runtime: {err}");
                return;
            }
        };
        runtime.block_on(run_backend(settings, cmd_rx));
    })
}

async fn run_backend(settings: Settings, cmd_rx: Receiver<ConsoleCommand>) {
    let sdk = Arc::new(
        SimulatedScanner::new()
            .with_v2_enabled(settings.v2_scanning)
            .with_local_address(settings.local_address.clone())
            .with_peer_hosts(settings.peer_hosts.clone()),
    );
    let store = MeshDirectory::new(settings.output_dir.clone(), settings.file_naming);
    let mut controller = ScanController::new(sdk.clone(), Arc::new(store.clone()));
    let events = controller.sdk_events();
    let snapshots = controller.subscribe();
    controller.mount().await;

    let printer = tokio::spawn(print_snapshots(snapshots));
    let (actions_tx, actions_rx) = mpsc::channel(ACTION_QUEUE_CAPACITY);
    let session = tokio::spawn(controller.run(events, actions_rx));

    if let Some(role) = settings.role {
        send_action(&actions_tx, UserAction::ApplyRole(role)).await;
    }
    sdk.visualizer_ready();
    info!(output_dir = %store.root().display(), "backend worker ready");

    while let Ok(cmd) = cmd_rx.recv() {
        match cmd {
            ConsoleCommand::Action(action) => send_action(&actions_tx, action).await,
            ConsoleCommand::AnnounceHosts(hosts) => sdk.announce_hosts(hosts).await,
            ConsoleCommand::ListSaved => match store.list_saved().await {
                Ok(saved) => {
                    for mesh in saved {
                        println!("{} {}", mesh.saved_at.to_rfc3339(), mesh.path.display());
                    }
                }
                Err(err) => error!("failed to list saved meshes: {err:#}"),
            },
            ConsoleCommand::Quit => break,
        }
    }

    drop(actions_tx);
    match session.await {
        Ok(state) => info!(phase = %state.phase, "scan session ended"),
        Err(err) => error!("scan session task failed: {err}"),
    }
    printer.abort();
}

async fn send_action(actions_tx: &mpsc::Sender<UserAction>, action: UserAction) {
    if actions_tx.send(action).await.is_err() {
        error!("scan controller stopped accepting actions");
    }
}

async fn print_snapshots(mut snapshots: watch::Receiver<SessionState>) {
    let mut last_view = serde_json::Value::Null;
    let mut last_notice = None;
    while snapshots.changed().await.is_ok() {
        let state = snapshots.borrow_and_update().clone();

        if state.notice != last_notice {
            match &state.notice {
                Some(Notice::Saved(path)) => {
                    println!("Saved scan: saved to {}", path.display())
                }
                Some(Notice::SaveFailed(reason)) => {
                    println!("Save failed: {reason}")
                }
                None => {}
            }
            last_notice = state.notice.clone();
        }

        let view = render_state(&state);
        if view != last_view {
            println!("{view}");
            last_view = view;
        }
    }
}

#[cfg(test)]
#[path = "tests/bridge_tests.rs"]
mod tests;
