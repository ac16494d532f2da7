use super::input::InputFlags;
use super::sync::{ClientSync, ClientTickReport, HostSync, HostTickReport};
use crate::config::LanConfig;
use crate::discovery::{DiscoveryMessage, HostLobby, JoinEvent, JoinLobby, Outgoing};
use crate::error::LanError;
use crate::net::{Address, DatagramSocket, FramedEndpoint, Incoming};
use crate::snapshot::Snapshot;

#[derive(Debug)]
pub enum Phase {
    Idle,
    Hosting(HostLobby),
    Joining(JoinLobby),
    Hosted { lobby: HostLobby, sync: HostSync },
    Joined(ClientSync),
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Hosting(_) => "hosting",
            Phase::Joining(_) => "joining",
            Phase::Hosted { .. } => "hosted",
            Phase::Joined(_) => "joined",
        }
    }
}

/// Coarse view of a node for menus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Idle,
    Waiting,
    InSession,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeEvent {
    CandidateFound(Address),
    Paired { remote: Address },
}

fn send_discovery<S: DatagramSocket>(endpoint: &mut FramedEndpoint<S>, out: Outgoing) {
    log::debug!("Sending {} to {}", out.message, out.to);
    if let Err(e) = endpoint.send_raw(out.to, out.message.as_bytes()) {
        log::warn!("Failed to send {} to {}: {}", out.message, out.to, e);
    }
}

/// One game instance on the LAN: a shared socket plus whichever side of the
/// handshake or session it is currently playing.
#[derive(Debug)]
pub struct LanNode<S> {
    endpoint: FramedEndpoint<S>,
    config: LanConfig,
    phase: Phase,
}

impl<S: DatagramSocket> LanNode<S> {
    pub fn new(socket: S, config: LanConfig) -> Self {
        Self {
            endpoint: FramedEndpoint::new(socket),
            config,
            phase: Phase::Idle,
        }
    }

    pub fn config(&self) -> &LanConfig {
        &self.config
    }

    pub fn endpoint(&self) -> &FramedEndpoint<S> {
        &self.endpoint
    }

    pub fn local_addr(&self) -> Address {
        self.endpoint.local_addr()
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn link_state(&self) -> LinkState {
        match self.phase {
            Phase::Idle => LinkState::Idle,
            Phase::Hosting(_) | Phase::Joining(_) => LinkState::Waiting,
            Phase::Hosted { .. } | Phase::Joined(_) => LinkState::InSession,
        }
    }

    pub fn remote(&self) -> Option<Address> {
        match &self.phase {
            Phase::Hosted { sync, .. } => Some(sync.client()),
            Phase::Joined(sync) => Some(sync.host()),
            _ => None,
        }
    }

    pub fn candidates(&self) -> &[Address] {
        match &self.phase {
            Phase::Joining(lobby) => lobby.candidates(),
            _ => &[],
        }
    }

    pub fn selected(&self) -> Option<usize> {
        match &self.phase {
            Phase::Joining(lobby) => Some(lobby.selected()),
            _ => None,
        }
    }

    /// The client's read-only copy of the host state.
    pub fn mirror(&self) -> Option<&Snapshot> {
        match &self.phase {
            Phase::Joined(sync) => Some(sync.mirror()),
            _ => None,
        }
    }

    pub fn start_hosting(&mut self) -> Result<(), LanError> {
        if !matches!(self.phase, Phase::Idle) {
            return Err(LanError::NotIdle);
        }

        let mut lobby = HostLobby::new();
        lobby.open();
        log::info!("Hosting on {}", self.local_addr());
        self.phase = Phase::Hosting(lobby);
        Ok(())
    }

    pub fn start_joining(&mut self) -> Result<(), LanError> {
        if !matches!(self.phase, Phase::Idle) {
            return Err(LanError::NotIdle);
        }

        let mut lobby = JoinLobby::new(self.config.broadcast, self.config.max_candidates);
        let out = lobby.discover()?;
        send_discovery(&mut self.endpoint, out);
        self.phase = Phase::Joining(lobby);
        Ok(())
    }

    /// Re-broadcasts `DISCOVER` with a fresh candidate list.
    pub fn refresh(&mut self) -> Result<(), LanError> {
        let lobby = self.join_lobby()?;
        let out = lobby.discover()?;
        send_discovery(&mut self.endpoint, out);
        Ok(())
    }

    pub fn select_next(&mut self) -> Result<(), LanError> {
        self.join_lobby()?.select_next();
        Ok(())
    }

    pub fn select_prev(&mut self) -> Result<(), LanError> {
        self.join_lobby()?.select_prev();
        Ok(())
    }

    /// Sends `JOIN_REQUEST` to candidate `index`. Calling again re-sends.
    pub fn request_join(&mut self, index: usize) -> Result<(), LanError> {
        let out = self.join_lobby()?.request_join(index)?;
        send_discovery(&mut self.endpoint, out);
        Ok(())
    }

    pub fn request_selected(&mut self) -> Result<(), LanError> {
        let out = self.join_lobby()?.request_selected()?;
        send_discovery(&mut self.endpoint, out);
        Ok(())
    }

    fn join_lobby(&mut self) -> Result<&mut JoinLobby, LanError> {
        match &mut self.phase {
            Phase::Joining(lobby) => Ok(lobby),
            _ => Err(LanError::WrongPhase {
                expected: "joining",
            }),
        }
    }

    /// Drains the socket and runs discovery. Gameplay packets that arrive
    /// before pairing completes are dropped.
    pub fn pump_lobby(&mut self) -> Result<Vec<NodeEvent>, LanError> {
        let idle_timeout = self.config.idle_timeout;
        let mut events = Vec::new();

        for datagram in self.endpoint.drain()? {
            let Incoming::Raw { from, payload } = datagram else {
                continue;
            };
            let Some(message) = DiscoveryMessage::parse(&payload) else {
                log::trace!("Ignoring {} byte datagram from {}", payload.len(), from);
                continue;
            };

            let next = match &mut self.phase {
                Phase::Hosting(lobby) => {
                    if let Some(out) = lobby.handle(from, message) {
                        send_discovery(&mut self.endpoint, out);
                    }
                    lobby.client().map(|client| Phase::Hosted {
                        sync: HostSync::new(client, idle_timeout),
                        lobby: std::mem::take(lobby),
                    })
                }
                Phase::Hosted { lobby, .. } => {
                    if let Some(out) = lobby.handle(from, message) {
                        send_discovery(&mut self.endpoint, out);
                    }
                    None
                }
                Phase::Joining(lobby) => match lobby.handle(from, message) {
                    Some(JoinEvent::CandidateFound(host)) => {
                        log::info!("Found game at {}", host);
                        events.push(NodeEvent::CandidateFound(host));
                        None
                    }
                    Some(JoinEvent::Accepted(host)) => {
                        Some(Phase::Joined(ClientSync::new(host, idle_timeout)))
                    }
                    None => None,
                },
                Phase::Idle | Phase::Joined(_) => None,
            };

            if let Some(next) = next {
                self.phase = next;
                if let Some(remote) = self.remote() {
                    log::info!("Session with {} established", remote);
                    events.push(NodeEvent::Paired { remote });
                }
            }
        }

        Ok(events)
    }

    /// Publishes `snapshot`, then collects the client's input. Late
    /// `JOIN_REQUEST` repeats from the paired client are answered here.
    pub fn host_tick(&mut self, snapshot: &Snapshot) -> Result<HostTickReport, LanError> {
        let Phase::Hosted { lobby, sync } = &mut self.phase else {
            return Err(LanError::WrongPhase { expected: "hosted" });
        };

        let result = sync.tick(&mut self.endpoint, snapshot, |endpoint, from, payload| {
            if let Some(out) =
                DiscoveryMessage::parse(payload).and_then(|message| lobby.handle(from, message))
            {
                send_discovery(endpoint, out);
            }
        });
        if result.is_err() {
            self.drop_session();
        }
        result
    }

    pub fn client_tick(&mut self, input: InputFlags) -> Result<ClientTickReport, LanError> {
        let Phase::Joined(sync) = &mut self.phase else {
            return Err(LanError::WrongPhase { expected: "joined" });
        };

        let result = sync.tick(&mut self.endpoint, input);
        if result.is_err() {
            self.drop_session();
        }
        result
    }

    /// Ends whatever the node is doing and goes back to `Idle`.
    pub fn leave(&mut self) {
        if !matches!(self.phase, Phase::Idle) {
            log::info!("Leaving {} phase", self.phase.name());
        }
        self.drop_session();
    }

    /// Frees the remote's peer record so a later session can take the slot.
    fn drop_session(&mut self) {
        if let Some(remote) = self.remote() {
            self.endpoint.peers_mut().remove(&remote);
        }
        self.phase = Phase::Idle;
    }
}
