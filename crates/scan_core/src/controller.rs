use std::{collections::VecDeque, sync::Arc};

use chrono::Utc;
use mesh_storage::MeshStore;
use scan_sdk::ScanningSdk;
use shared::{
    domain::ScannerType,
    protocol::{SdkCommand, SdkEvent, SdkReply},
};
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, info, warn};

use crate::{
    dispatcher::{log_failure, Dispatcher},
    error::ScanError,
    role::RoleCoordinator,
    session::{plan_action, reduce, Effect, SessionEvent, SessionState, Transition, UserAction},
    units::effective_size,
};

/// Owns the session state for one scanning screen and executes the effects
/// the reducer schedules.
pub struct ScanController {
    dispatcher: Dispatcher,
    roles: RoleCoordinator,
    store: Arc<dyn MeshStore>,
    state: SessionState,
    snapshots: watch::Sender<SessionState>,
}

impl ScanController {
    pub fn new(sdk: Arc<dyn ScanningSdk>, store: Arc<dyn MeshStore>) -> Self {
        let dispatcher = Dispatcher::new(sdk);
        let state = SessionState::default();
        let (snapshots, _) = watch::channel(state.clone());
        Self {
            roles: RoleCoordinator::new(dispatcher.clone()),
            dispatcher,
            store,
            state,
            snapshots,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.snapshots.subscribe()
    }

    pub fn sdk_events(&self) -> broadcast::Receiver<SdkEvent> {
        self.dispatcher.subscribe_events()
    }

    pub fn roles(&self) -> &RoleCoordinator {
        &self.roles
    }

    /// Learns the engine's scanning mode and pushes the current size in
    /// the matching unit.
    pub async fn mount(&mut self) {
        self.run_effects(vec![Effect::LoadV2Mode]).await;
        let size = self.state.scan_size;
        if let Err(err) = self.perform(UserAction::SetSize(size)).await {
            warn!(error = %err, "initial size rejected");
        }
    }

    pub async fn perform(&mut self, action: UserAction) -> Result<(), ScanError> {
        let effects = plan_action(&self.state, &action)?;
        debug!(action = %action.kind(), "performing user action");
        self.run_effects(effects).await;
        Ok(())
    }

    /// Reduces `event` and everything its effects report back, in order.
    pub async fn handle_event(&mut self, event: SessionEvent) {
        let mut queue = VecDeque::from([event]);
        while let Some(event) = queue.pop_front() {
            let Transition { state, effects } = reduce(&self.state, &event);
            self.commit(state);
            for effect in effects {
                queue.extend(self.execute(effect).await);
            }
        }
    }

    /// Processes engine events and user actions until the action channel
    /// closes, then hands back the final state. Engine teardown is left to
    /// whoever owns the engine.
    pub async fn run(
        mut self,
        mut events: broadcast::Receiver<SdkEvent>,
        mut actions: mpsc::Receiver<UserAction>,
    ) -> SessionState {
        let mut events_open = true;
        loop {
            tokio::select! {
                biased;
                event = events.recv(), if events_open => match event {
                    Ok(event) => {
                        info!(event = event.name(), "sdk event");
                        self.handle_event(SessionEvent::Sdk(event)).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "sdk event stream lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("sdk event stream closed");
                        events_open = false;
                    }
                },
                action = actions.recv() => match action {
                    Some(action) => {
                        if let Err(err) = self.perform(action).await {
                            warn!(error = %err, "user action rejected");
                        }
                    }
                    None => break,
                },
            }
        }
        self.state
    }

    async fn run_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            let events = self.execute(effect).await;
            for event in events {
                self.handle_event(event).await;
            }
        }
    }

    fn commit(&mut self, state: SessionState) {
        if state.phase != self.state.phase {
            info!(from = %self.state.phase, to = %state.phase, "scan phase changed");
        }
        self.state = state;
        self.snapshots.send_replace(self.state.clone());
    }

    async fn execute(&self, effect: Effect) -> Vec<SessionEvent> {
        match effect {
            Effect::LoadV2Mode => match self
                .dispatcher
                .dispatch_logged(SdkCommand::GetV2ScanningEnabled)
                .await
            {
                Some(SdkReply::Flag(enabled)) => vec![SessionEvent::V2ModeLoaded(enabled)],
                _ => Vec::new(),
            },
            Effect::SetupPreview(scanner_type) => {
                match self.roles.ensure_initialized(scanner_type).await {
                    Ok(()) => {
                        self.dispatcher
                            .dispatch_logged(SdkCommand::StartPreview)
                            .await;
                    }
                    Err(err) => log_failure(&err),
                }
                Vec::new()
            }
            Effect::StartScan => self.fire(SdkCommand::StartScan).await,
            Effect::StopScan => self.fire(SdkCommand::StopScan).await,
            Effect::RestartPreview => self.fire(SdkCommand::StartPreview).await,
            Effect::GenerateMesh => {
                match self.dispatcher.dispatch_logged(SdkCommand::GenerateMesh).await {
                    Some(_) => Vec::new(),
                    None => vec![SessionEvent::MeshGenerationFailed],
                }
            }
            Effect::SaveScan => vec![self.save().await],
            Effect::PushSize { raw, effective } => {
                self.dispatcher
                    .dispatch_logged(SdkCommand::SetSize(effective))
                    .await;
                vec![SessionEvent::SizeApplied(raw)]
            }
            Effect::ToggleV2 => self.toggle_v2().await,
            Effect::ApplyRole(role) => {
                let outcome = match self.roles.apply_role(role).await {
                    Ok(outcome) => outcome,
                    Err(failure) => {
                        log_failure(&failure.cause);
                        warn!(
                            role = %failure.role,
                            torn_down = failure.torn_down,
                            "role switch incomplete"
                        );
                        return vec![SessionEvent::RoleApplyFailed {
                            torn_down: failure.torn_down,
                            flags: failure.flags,
                        }];
                    }
                };
                self.dispatcher
                    .dispatch_logged(SdkCommand::StartPreview)
                    .await;

                let mut events = vec![SessionEvent::RoleApplied {
                    role: outcome.role,
                    flags: outcome.flags,
                }];
                if let Some(address) = outcome.local_address {
                    events.push(SessionEvent::LocalAddressLoaded(address));
                }
                if let Some(hosts) = outcome.discovered_hosts {
                    events.push(SessionEvent::HostsLoaded(hosts));
                }
                events
            }
            Effect::SetServerHost(host) => {
                match self
                    .dispatcher
                    .dispatch_logged(SdkCommand::SetServerHost(host.clone()))
                    .await
                {
                    Some(_) => vec![SessionEvent::HostSelected(host)],
                    None => Vec::new(),
                }
            }
            Effect::Reinitialize(scanner_type) => self.reinitialize(scanner_type).await,
        }
    }

    async fn reinitialize(&self, scanner_type: ScannerType) -> Vec<SessionEvent> {
        let restarted = match self.roles.uninitialize().await {
            Ok(()) => self.roles.ensure_initialized(scanner_type).await,
            Err(err) => Err(err),
        };
        match restarted {
            Ok(()) => {
                info!(scanner_type = %scanner_type, "reinitialized scanner");
                self.fire(SdkCommand::StartPreview).await
            }
            Err(err) => {
                log_failure(&err);
                Vec::new()
            }
        }
    }

    async fn fire(&self, command: SdkCommand) -> Vec<SessionEvent> {
        self.dispatcher.dispatch_logged(command).await;
        Vec::new()
    }

    async fn toggle_v2(&self) -> Vec<SessionEvent> {
        let Some(SdkReply::Flag(current)) = self
            .dispatcher
            .dispatch_logged(SdkCommand::GetV2ScanningEnabled)
            .await
        else {
            return Vec::new();
        };
        let enabled = !current;
        if self
            .dispatcher
            .dispatch_logged(SdkCommand::ToggleV2Scanning(enabled))
            .await
            .is_none()
        {
            return Vec::new();
        }

        let raw = self.state.scan_size;
        self.dispatcher
            .dispatch_logged(SdkCommand::SetSize(effective_size(raw, Some(enabled))))
            .await;
        vec![
            SessionEvent::V2ModeLoaded(enabled),
            SessionEvent::SizeApplied(raw),
        ]
    }

    async fn save(&self) -> SessionEvent {
        let path = match self.store.prepare_save_path(Utc::now()).await {
            Ok(path) => path,
            Err(err) => {
                let reason = format!("{err:#}");
                warn!(error = %reason, "failed to prepare mesh directory");
                return SessionEvent::SaveFailed(reason);
            }
        };

        match self
            .dispatcher
            .dispatch(SdkCommand::SaveScan(path.clone()))
            .await
        {
            Ok(_) => {
                info!(path = %path.display(), "saved scan");
                SessionEvent::SaveCompleted(path)
            }
            Err(err) => {
                log_failure(&err);
                SessionEvent::SaveFailed(err.to_string())
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
