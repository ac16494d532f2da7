//! Broadcast handshake that pairs one joining peer with one hosting peer.
//!
//! Both sides are plain state machines: they are fed `(sender, message)`
//! pairs and hand back what should go on the wire. The node driver owns the
//! socket.

mod message;

pub use message::DiscoveryMessage;

use crate::error::LanError;
use crate::net::Address;

pub const MAX_AVAILABLE_GAMES: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outgoing {
    pub to: Address,
    pub message: DiscoveryMessage,
}

impl Outgoing {
    pub fn new(to: Address, message: DiscoveryMessage) -> Self {
        Self { to, message }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostState {
    Idle,
    WaitingForJoin,
    InSession { client: Address },
}

#[derive(Debug)]
pub struct HostLobby {
    state: HostState,
}

impl Default for HostLobby {
    fn default() -> Self {
        Self::new()
    }
}

impl HostLobby {
    pub fn new() -> Self {
        Self {
            state: HostState::Idle,
        }
    }

    pub fn state(&self) -> HostState {
        self.state
    }

    pub fn client(&self) -> Option<Address> {
        match self.state {
            HostState::InSession { client } => Some(client),
            _ => None,
        }
    }

    /// Starts advertising. Only valid from `Idle`.
    pub fn open(&mut self) -> bool {
        if self.state == HostState::Idle {
            self.state = HostState::WaitingForJoin;
            true
        } else {
            false
        }
    }

    pub fn close(&mut self) {
        self.state = HostState::Idle;
    }

    pub fn handle(&mut self, from: Address, message: DiscoveryMessage) -> Option<Outgoing> {
        match (self.state, message) {
            (HostState::WaitingForJoin, DiscoveryMessage::Discover) => {
                Some(Outgoing::new(from, DiscoveryMessage::Available))
            }
            (HostState::WaitingForJoin, DiscoveryMessage::JoinRequest) => {
                log::info!("Accepting join request from {}", from);
                self.state = HostState::InSession { client: from };
                Some(Outgoing::new(from, DiscoveryMessage::JoinAccept))
            }
            // Our accept may have been lost; the paired client gets it again.
            (HostState::InSession { client }, DiscoveryMessage::JoinRequest) if client == from => {
                Some(Outgoing::new(from, DiscoveryMessage::JoinAccept))
            }
            (HostState::InSession { client }, DiscoveryMessage::JoinRequest) => {
                log::debug!("Ignoring join request from {}: already paired with {}", from, client);
                None
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinState {
    Idle,
    Discovering,
    RequestedJoin { host: Address },
    InSession { host: Address },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinEvent {
    CandidateFound(Address),
    Accepted(Address),
}

#[derive(Debug)]
pub struct JoinLobby {
    state: JoinState,
    broadcast: Address,
    max_candidates: usize,
    candidates: Vec<Address>,
    selected: usize,
}

impl JoinLobby {
    pub fn new(broadcast: Address, max_candidates: usize) -> Self {
        Self {
            state: JoinState::Idle,
            broadcast,
            max_candidates,
            candidates: Vec::with_capacity(max_candidates),
            selected: 0,
        }
    }

    pub fn state(&self) -> JoinState {
        self.state
    }

    pub fn candidates(&self) -> &[Address] {
        &self.candidates
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_candidate(&self) -> Option<Address> {
        self.candidates.get(self.selected).copied()
    }

    pub fn host(&self) -> Option<Address> {
        match self.state {
            JoinState::InSession { host } => Some(host),
            _ => None,
        }
    }

    /// (Re)broadcasts `DISCOVER` with an empty candidate list. Also used to
    /// abandon an unanswered join request.
    pub fn discover(&mut self) -> Result<Outgoing, LanError> {
        if matches!(self.state, JoinState::InSession { .. }) {
            return Err(LanError::WrongPhase {
                expected: "discovering",
            });
        }

        self.state = JoinState::Discovering;
        self.candidates.clear();
        self.selected = 0;
        Ok(Outgoing::new(self.broadcast, DiscoveryMessage::Discover))
    }

    pub fn select_next(&mut self) {
        if !self.candidates.is_empty() {
            self.selected = (self.selected + 1) % self.candidates.len();
        }
    }

    pub fn select_prev(&mut self) {
        if !self.candidates.is_empty() {
            self.selected = (self.selected + self.candidates.len() - 1) % self.candidates.len();
        }
    }

    pub fn request_join(&mut self, index: usize) -> Result<Outgoing, LanError> {
        if !matches!(
            self.state,
            JoinState::Discovering | JoinState::RequestedJoin { .. }
        ) {
            return Err(LanError::WrongPhase {
                expected: "discovering",
            });
        }

        let host = *self
            .candidates
            .get(index)
            .ok_or(LanError::NoCandidate { index })?;

        self.selected = index;
        self.state = JoinState::RequestedJoin { host };
        Ok(Outgoing::new(host, DiscoveryMessage::JoinRequest))
    }

    pub fn request_selected(&mut self) -> Result<Outgoing, LanError> {
        self.request_join(self.selected)
    }

    pub fn handle(&mut self, from: Address, message: DiscoveryMessage) -> Option<JoinEvent> {
        match (self.state, message) {
            (JoinState::Discovering, DiscoveryMessage::Available) => {
                if self.candidates.contains(&from) {
                    return None;
                }
                if self.candidates.len() >= self.max_candidates {
                    log::debug!("Candidate list full, ignoring host {}", from);
                    return None;
                }
                self.candidates.push(from);
                Some(JoinEvent::CandidateFound(from))
            }
            (JoinState::RequestedJoin { host }, DiscoveryMessage::JoinAccept) if host == from => {
                self.state = JoinState::InSession { host };
                Some(JoinEvent::Accepted(host))
            }
            _ => None,
        }
    }

    pub fn reset(&mut self) {
        self.state = JoinState::Idle;
        self.candidates.clear();
        self.selected = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PORT: u16 = 5000;

    fn addr(last: u8) -> Address {
        Address::new(192, 168, 0, last, PORT)
    }

    #[test]
    fn idle_host_stays_quiet() {
        let mut host = HostLobby::new();
        assert_eq!(host.handle(addr(2), DiscoveryMessage::Discover), None);
        assert_eq!(host.handle(addr(2), DiscoveryMessage::JoinRequest), None);
        assert_eq!(host.state(), HostState::Idle);
    }

    #[test]
    fn waiting_host_answers_discovery() {
        let mut host = HostLobby::new();
        assert!(host.open());
        assert!(!host.open());

        assert_eq!(
            host.handle(addr(2), DiscoveryMessage::Discover),
            Some(Outgoing::new(addr(2), DiscoveryMessage::Available))
        );
        assert_eq!(host.state(), HostState::WaitingForJoin);
    }

    #[test]
    fn host_accepts_exactly_one_joiner() {
        let mut host = HostLobby::new();
        host.open();

        let replies: Vec<Outgoing> = [
            (addr(2), DiscoveryMessage::JoinRequest),
            (addr(3), DiscoveryMessage::JoinRequest),
            (addr(3), DiscoveryMessage::Discover),
        ]
        .into_iter()
        .filter_map(|(from, message)| host.handle(from, message))
        .collect();

        assert_eq!(
            replies,
            vec![Outgoing::new(addr(2), DiscoveryMessage::JoinAccept)]
        );
        assert_eq!(host.state(), HostState::InSession { client: addr(2) });
        assert_eq!(host.client(), Some(addr(2)));
    }

    #[test]
    fn paired_client_can_repeat_its_request() {
        let mut host = HostLobby::new();
        host.open();
        host.handle(addr(2), DiscoveryMessage::JoinRequest);

        assert_eq!(
            host.handle(addr(2), DiscoveryMessage::JoinRequest),
            Some(Outgoing::new(addr(2), DiscoveryMessage::JoinAccept))
        );
        assert_eq!(host.state(), HostState::InSession { client: addr(2) });
    }

    #[test]
    fn unexpected_tokens_are_ignored() {
        let mut host = HostLobby::new();
        host.open();
        assert_eq!(host.handle(addr(2), DiscoveryMessage::Available), None);
        assert_eq!(host.handle(addr(2), DiscoveryMessage::JoinAccept), None);
        assert_eq!(host.state(), HostState::WaitingForJoin);

        let mut join = JoinLobby::new(Address::broadcast(PORT), MAX_AVAILABLE_GAMES);
        assert_eq!(join.handle(addr(1), DiscoveryMessage::Available), None);
        join.discover().unwrap();
        assert_eq!(join.handle(addr(1), DiscoveryMessage::JoinAccept), None);
        assert_eq!(join.handle(addr(1), DiscoveryMessage::Discover), None);
        assert_eq!(join.state(), JoinState::Discovering);
    }

    #[test]
    fn client_collects_distinct_candidates() {
        let mut join = JoinLobby::new(Address::broadcast(PORT), MAX_AVAILABLE_GAMES);
        let out = join.discover().unwrap();
        assert_eq!(out.to, Address::broadcast(PORT));
        assert_eq!(out.message, DiscoveryMessage::Discover);

        join.handle(addr(1), DiscoveryMessage::Available);
        join.handle(addr(2), DiscoveryMessage::Available);
        join.handle(addr(1), DiscoveryMessage::Available);

        assert_eq!(join.candidates(), &[addr(1), addr(2)]);
    }

    #[test]
    fn candidate_list_is_capped() {
        let mut join = JoinLobby::new(Address::broadcast(PORT), MAX_AVAILABLE_GAMES);
        join.discover().unwrap();
        for last in 1..=6 {
            join.handle(addr(last), DiscoveryMessage::Available);
        }
        assert_eq!(join.candidates().len(), MAX_AVAILABLE_GAMES);
    }

    #[test]
    fn refresh_clears_candidates() {
        let mut join = JoinLobby::new(Address::broadcast(PORT), MAX_AVAILABLE_GAMES);
        join.discover().unwrap();
        join.handle(addr(1), DiscoveryMessage::Available);
        join.select_next();

        join.discover().unwrap();
        assert!(join.candidates().is_empty());
        assert_eq!(join.selected(), 0);
    }

    #[test]
    fn selection_wraps() {
        let mut join = JoinLobby::new(Address::broadcast(PORT), MAX_AVAILABLE_GAMES);
        join.discover().unwrap();
        for last in 1..=3 {
            join.handle(addr(last), DiscoveryMessage::Available);
        }

        join.select_prev();
        assert_eq!(join.selected_candidate(), Some(addr(3)));
        join.select_next();
        join.select_next();
        assert_eq!(join.selected_candidate(), Some(addr(2)));
    }

    #[test]
    fn join_needs_a_candidate() {
        let mut join = JoinLobby::new(Address::broadcast(PORT), MAX_AVAILABLE_GAMES);
        assert!(matches!(
            join.request_join(0),
            Err(LanError::WrongPhase { .. })
        ));

        join.discover().unwrap();
        assert!(matches!(
            join.request_join(0),
            Err(LanError::NoCandidate { index: 0 })
        ));
    }

    #[test]
    fn accept_only_from_requested_host() {
        let mut join = JoinLobby::new(Address::broadcast(PORT), MAX_AVAILABLE_GAMES);
        join.discover().unwrap();
        join.handle(addr(1), DiscoveryMessage::Available);
        join.handle(addr(2), DiscoveryMessage::Available);

        let out = join.request_join(1).unwrap();
        assert_eq!(out, Outgoing::new(addr(2), DiscoveryMessage::JoinRequest));
        assert_eq!(join.state(), JoinState::RequestedJoin { host: addr(2) });

        assert_eq!(join.handle(addr(1), DiscoveryMessage::JoinAccept), None);
        assert_eq!(
            join.handle(addr(2), DiscoveryMessage::JoinAccept),
            Some(JoinEvent::Accepted(addr(2)))
        );
        assert_eq!(join.host(), Some(addr(2)));
        assert!(join.discover().is_err());
    }

    #[test]
    fn full_handshake_between_state_machines() {
        let host_addr = addr(10);
        let client_addr = addr(20);
        let mut host = HostLobby::new();
        let mut join = JoinLobby::new(Address::broadcast(PORT), MAX_AVAILABLE_GAMES);
        host.open();

        let discover = join.discover().unwrap();
        let available = host.handle(client_addr, discover.message).unwrap();
        assert_eq!(available.to, client_addr);
        join.handle(host_addr, available.message);

        let request = join.request_selected().unwrap();
        assert_eq!(request.to, host_addr);
        let accept = host.handle(client_addr, request.message).unwrap();
        join.handle(host_addr, accept.message);

        assert_eq!(host.client(), Some(client_addr));
        assert_eq!(join.host(), Some(host_addr));
    }
}
