//! Session state, the event reducer, and user-action planning.
//!
//! The phase is never asserted locally: the reducer only records what the
//! engine reports and schedules the follow-up effects a given event calls
//! for. Effects are plain values; executing them is the controller's job.

use std::{fmt, path::PathBuf};

use serde::Serialize;
use shared::{
    domain::{DeviceRole, ScanPhase, ScannerType, StreamingFlags},
    protocol::SdkEvent,
};

use crate::{
    error::ScanError,
    units::{clamp_slider, display_value, effective_size, format_size, DEFAULT_SCAN_SIZE},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum Notice {
    Saved(PathBuf),
    SaveFailed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionState {
    pub phase: ScanPhase,
    /// `None` until the engine has been asked.
    pub v2_mode: Option<bool>,
    pub scan_size: f64,
    pub role: Option<DeviceRole>,
    pub streaming: Option<StreamingFlags>,
    pub local_address: Option<String>,
    pub discovered_hosts: Vec<String>,
    pub selected_host: Option<String>,
    pub mesh_pending: bool,
    pub notice: Option<Notice>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            phase: ScanPhase::Uninitialized,
            v2_mode: None,
            scan_size: DEFAULT_SCAN_SIZE,
            role: None,
            streaming: None,
            local_address: None,
            discovered_hosts: Vec::new(),
            selected_host: None,
            mesh_pending: false,
            notice: None,
        }
    }
}

impl SessionState {
    pub fn scanner_type(&self) -> ScannerType {
        self.role
            .map(DeviceRole::scanner_type)
            .unwrap_or_default()
    }

    pub fn effective_size(&self) -> f64 {
        effective_size(self.scan_size, self.v2_mode)
    }

    pub fn size_label(&self) -> String {
        format_size(self.scan_size, self.v2_mode)
    }

    pub fn allows(&self, action: ActionKind) -> bool {
        match action {
            ActionKind::StartScan => {
                matches!(self.phase, ScanPhase::Initialized | ScanPhase::Previewing)
            }
            ActionKind::StopScan => self.phase == ScanPhase::Scanning,
            ActionKind::SaveScan | ActionKind::NewScan => self.phase == ScanPhase::Viewing,
            ActionKind::SetSize
            | ActionKind::ToggleV2
            | ActionKind::ApplyRole
            | ActionKind::SelectHost
            | ActionKind::Reinitialize => true,
        }
    }

    pub fn allowed_actions(&self) -> Vec<ActionKind> {
        ActionKind::ALL
            .into_iter()
            .filter(|action| self.allows(*action))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    StartScan,
    StopScan,
    SaveScan,
    NewScan,
    SetSize,
    ToggleV2,
    ApplyRole,
    SelectHost,
    Reinitialize,
}

impl ActionKind {
    pub const ALL: [ActionKind; 9] = [
        ActionKind::StartScan,
        ActionKind::StopScan,
        ActionKind::SaveScan,
        ActionKind::NewScan,
        ActionKind::SetSize,
        ActionKind::ToggleV2,
        ActionKind::ApplyRole,
        ActionKind::SelectHost,
        ActionKind::Reinitialize,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::StartScan => "start_scan",
            Self::StopScan => "stop_scan",
            Self::SaveScan => "save_scan",
            Self::NewScan => "new_scan",
            Self::SetSize => "set_size",
            Self::ToggleV2 => "toggle_v2",
            Self::ApplyRole => "apply_role",
            Self::SelectHost => "select_host",
            Self::Reinitialize => "reinitialize",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UserAction {
    StartScan,
    StopScan,
    SaveScan,
    NewScan,
    SetSize(f64),
    ToggleV2,
    ApplyRole(DeviceRole),
    SelectHost(String),
    /// Tears the engine session down and brings it back up for the
    /// current role.
    Reinitialize,
}

impl UserAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::StartScan => ActionKind::StartScan,
            Self::StopScan => ActionKind::StopScan,
            Self::SaveScan => ActionKind::SaveScan,
            Self::NewScan => ActionKind::NewScan,
            Self::SetSize(_) => ActionKind::SetSize,
            Self::ToggleV2 => ActionKind::ToggleV2,
            Self::ApplyRole(_) => ActionKind::ApplyRole,
            Self::SelectHost(_) => ActionKind::SelectHost,
            Self::Reinitialize => ActionKind::Reinitialize,
        }
    }
}

/// Inputs to the reducer: engine notifications plus the results of
/// effects that completed locally.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Sdk(SdkEvent),
    V2ModeLoaded(bool),
    /// Slider value to show; applied whether or not the engine accepted it.
    SizeApplied(f64),
    RoleApplied {
        role: DeviceRole,
        flags: StreamingFlags,
    },
    /// A role switch stopped partway; see `RoleSwitchFailure`.
    RoleApplyFailed {
        torn_down: bool,
        flags: Option<StreamingFlags>,
    },
    LocalAddressLoaded(String),
    HostsLoaded(Vec<String>),
    HostSelected(String),
    MeshGenerationFailed,
    SaveCompleted(PathBuf),
    SaveFailed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    LoadV2Mode,
    SetupPreview(ScannerType),
    StartScan,
    StopScan,
    GenerateMesh,
    RestartPreview,
    SaveScan,
    PushSize { raw: f64, effective: f64 },
    ToggleV2,
    ApplyRole(DeviceRole),
    SetServerHost(String),
    Reinitialize(ScannerType),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: SessionState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn settle(state: SessionState) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }

    fn with(state: SessionState, effect: Effect) -> Self {
        Self {
            state,
            effects: vec![effect],
        }
    }
}

pub fn reduce(state: &SessionState, event: &SessionEvent) -> Transition {
    let mut next = state.clone();

    match event {
        SessionEvent::Sdk(sdk_event) => return reduce_sdk_event(next, sdk_event),
        SessionEvent::V2ModeLoaded(enabled) => next.v2_mode = Some(*enabled),
        SessionEvent::SizeApplied(raw) => next.scan_size = display_value(*raw),
        SessionEvent::RoleApplied { role, flags } => {
            next.role = Some(*role);
            next.streaming = Some(*flags);
            next.local_address = None;
            next.discovered_hosts.clear();
            next.selected_host = None;
        }
        // Nothing changed on the engine unless the old session was torn down.
        SessionEvent::RoleApplyFailed { torn_down, flags } if *torn_down => {
            next.role = None;
            next.streaming = *flags;
            next.local_address = None;
            next.discovered_hosts.clear();
            next.selected_host = None;
        }
        SessionEvent::RoleApplyFailed { .. } => {}
        SessionEvent::LocalAddressLoaded(address) => next.local_address = Some(address.clone()),
        SessionEvent::HostsLoaded(hosts) => replace_hosts(&mut next, hosts),
        SessionEvent::HostSelected(host) => next.selected_host = Some(host.clone()),
        SessionEvent::MeshGenerationFailed => next.mesh_pending = false,
        SessionEvent::SaveCompleted(path) => next.notice = Some(Notice::Saved(path.clone())),
        SessionEvent::SaveFailed(reason) => {
            next.notice = Some(Notice::SaveFailed(reason.clone()))
        }
    }

    Transition::settle(next)
}

fn reduce_sdk_event(mut next: SessionState, event: &SdkEvent) -> Transition {
    match event {
        SdkEvent::ScanStateChanged(phase) => {
            next.phase = *phase;
            if matches!(phase, ScanPhase::Uninitialized | ScanPhase::Previewing) {
                next.mesh_pending = false;
            }
            Transition::settle(next)
        }
        SdkEvent::VisualizerReady => {
            let scanner_type = next.scanner_type();
            Transition::with(next, Effect::SetupPreview(scanner_type))
        }
        // The engine may report VIEWING before or after its stop notification.
        SdkEvent::ScannerStop
            if matches!(next.phase, ScanPhase::Scanning | ScanPhase::Viewing)
                && !next.mesh_pending =>
        {
            next.mesh_pending = true;
            Transition::with(next, Effect::GenerateMesh)
        }
        SdkEvent::GenerateMesh => {
            next.mesh_pending = false;
            Transition::settle(next)
        }
        // Any initialized phase, SCANNING included: a completed save always
        // returns the user to a live preview.
        SdkEvent::SaveMesh if next.phase.is_initialized() => {
            Transition::with(next, Effect::RestartPreview)
        }
        SdkEvent::HostDiscovered(hosts) => {
            replace_hosts(&mut next, hosts);
            Transition::settle(next)
        }
        SdkEvent::ScannerStop
        | SdkEvent::SaveMesh
        | SdkEvent::ScannerReady
        | SdkEvent::PreviewStart
        | SdkEvent::ScannerStart => Transition::settle(next),
    }
}

fn replace_hosts(state: &mut SessionState, hosts: &[String]) {
    state.discovered_hosts = hosts.to_vec();
    if state
        .selected_host
        .as_ref()
        .is_some_and(|selected| !hosts.contains(selected))
    {
        state.selected_host = None;
    }
}

/// Validates a user action against the current phase and returns the
/// effects it should trigger.
pub fn plan_action(state: &SessionState, action: &UserAction) -> Result<Vec<Effect>, ScanError> {
    let kind = action.kind();
    if !state.allows(kind) {
        return Err(ScanError::ActionNotAllowed {
            action: kind,
            phase: state.phase,
        });
    }

    let effect = match action {
        UserAction::StartScan => Effect::StartScan,
        UserAction::StopScan => Effect::StopScan,
        UserAction::SaveScan => Effect::SaveScan,
        UserAction::NewScan => Effect::RestartPreview,
        UserAction::SetSize(raw) => {
            let raw = clamp_slider(*raw);
            Effect::PushSize {
                raw,
                effective: effective_size(raw, state.v2_mode),
            }
        }
        UserAction::ToggleV2 => Effect::ToggleV2,
        UserAction::ApplyRole(role) => Effect::ApplyRole(*role),
        UserAction::SelectHost(host) => {
            if !state.discovered_hosts.contains(host) {
                return Err(ScanError::UnknownHost(host.clone()));
            }
            Effect::SetServerHost(host.clone())
        }
        UserAction::Reinitialize => Effect::Reinitialize(state.scanner_type()),
    };

    Ok(vec![effect])
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
