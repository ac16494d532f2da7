use std::time::{Duration, Instant};

use super::input::{INPUT_SIZE, InputFlags};
use crate::error::LanError;
use crate::net::{Address, Connection, DatagramSocket, FramedEndpoint, Incoming};
use crate::snapshot::{self, SNAPSHOT_SIZE, Snapshot};

/// One established pairing: who is on the other end and since when.
#[derive(Debug, Clone)]
pub struct Session {
    remote: Address,
    started: Instant,
    idle_timeout: Duration,
}

impl Session {
    pub fn new(remote: Address, idle_timeout: Duration) -> Self {
        Self {
            remote,
            started: Instant::now(),
            idle_timeout,
        }
    }

    pub fn remote(&self) -> Address {
        self.remote
    }

    /// True once the remote has been silent for longer than the idle timeout.
    /// Silence is counted from session start until the first packet arrives.
    pub fn is_timed_out<S: DatagramSocket>(
        &self,
        endpoint: &FramedEndpoint<S>,
        now: Instant,
    ) -> bool {
        match endpoint.peers().get(&self.remote) {
            Some(connection) => connection.is_silent_since(self.started, now, self.idle_timeout),
            None => now.saturating_duration_since(self.started) > self.idle_timeout,
        }
    }

    pub(crate) fn check_alive<S: DatagramSocket>(
        &self,
        endpoint: &FramedEndpoint<S>,
        now: Instant,
    ) -> Result<(), LanError> {
        if self.is_timed_out(endpoint, now) {
            log::warn!(
                "No traffic from {} for {:?}, dropping session",
                self.remote,
                self.idle_timeout
            );
            return Err(LanError::PeerTimedOut {
                remote: self.remote,
            });
        }
        Ok(())
    }
}

/// Gameplay datagrams from the session remote plus everything that was not
/// gameplay traffic, split out of one drain.
#[derive(Debug, Default)]
pub(crate) struct Sorted {
    pub frames: Vec<Vec<u8>>,
    pub raw: Vec<(Address, Vec<u8>)>,
}

pub(crate) fn sort_incoming(remote: Address, incoming: Vec<Incoming>) -> Sorted {
    let mut sorted = Sorted::default();
    for datagram in incoming {
        match datagram {
            Incoming::Framed { from, payload, .. } if from == remote => {
                sorted.frames.push(payload)
            }
            Incoming::Framed { from, .. } => {
                log::trace!("Ignoring framed packet from {}: not our peer", from);
            }
            Incoming::Raw { from, payload } => sorted.raw.push((from, payload)),
        }
    }
    sorted
}

fn send_or_warn<S: DatagramSocket>(
    endpoint: &mut FramedEndpoint<S>,
    outbound: &mut Connection,
    payload: &[u8],
    what: &str,
) -> bool {
    match endpoint.send_framed(outbound, payload) {
        Ok(_) => true,
        Err(e) => {
            log::warn!("Failed to send {} to {}: {}", what, outbound.remote(), e);
            false
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HostTickReport {
    /// Controls fed into the next simulation step.
    pub input: InputFlags,
    pub samples_received: usize,
    pub snapshot_sent: bool,
}

/// Host half of the gameplay loop: publish state, collect the client's
/// controls.
#[derive(Debug)]
pub struct HostSync {
    session: Session,
    outbound: Connection,
    input: InputFlags,
    snapshots_sent: u64,
}

impl HostSync {
    pub fn new(client: Address, idle_timeout: Duration) -> Self {
        Self {
            session: Session::new(client, idle_timeout),
            outbound: Connection::new(client),
            input: InputFlags::empty(),
            snapshots_sent: 0,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn client(&self) -> Address {
        self.session.remote
    }

    /// Sequence state of the snapshot stream.
    pub fn outbound(&self) -> &Connection {
        &self.outbound
    }

    /// Latest client controls; kept across ticks with no new sample.
    pub fn input(&self) -> InputFlags {
        self.input
    }

    pub fn snapshots_sent(&self) -> u64 {
        self.snapshots_sent
    }

    /// Fire-and-forget. Failures are logged and reported as `false`.
    pub fn publish<S: DatagramSocket>(
        &mut self,
        endpoint: &mut FramedEndpoint<S>,
        snapshot: &Snapshot,
    ) -> bool {
        let bytes = snapshot::encode(snapshot);
        let sent = send_or_warn(endpoint, &mut self.outbound, &bytes, "snapshot");
        if sent {
            self.snapshots_sent += 1;
        }
        sent
    }

    /// Takes the last input sample among `frames`. Returns how many
    /// samples were seen.
    pub fn absorb(&mut self, frames: &[Vec<u8>]) -> usize {
        let mut samples = 0;
        for frame in frames {
            match frame.len() {
                INPUT_SIZE => {
                    if let Ok(input) = InputFlags::from_bytes(frame) {
                        self.input = input;
                        samples += 1;
                    }
                }
                len => log::debug!("Dropping {} byte gameplay packet on host", len),
            }
        }
        samples
    }

    /// Publish, drain, absorb. Datagrams that are not gameplay traffic go to
    /// `on_raw` so the caller can keep answering discovery.
    pub fn tick<S, F>(
        &mut self,
        endpoint: &mut FramedEndpoint<S>,
        snapshot: &Snapshot,
        mut on_raw: F,
    ) -> Result<HostTickReport, LanError>
    where
        S: DatagramSocket,
        F: FnMut(&mut FramedEndpoint<S>, Address, &[u8]),
    {
        let snapshot_sent = self.publish(endpoint, snapshot);
        let sorted = sort_incoming(self.session.remote, endpoint.drain()?);
        for (from, payload) in &sorted.raw {
            on_raw(endpoint, *from, payload);
        }
        let samples_received = self.absorb(&sorted.frames);
        self.session.check_alive(endpoint, Instant::now())?;

        Ok(HostTickReport {
            input: self.input,
            samples_received,
            snapshot_sent,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClientTickReport {
    pub applied: usize,
    pub stale: usize,
    pub input_sent: bool,
    /// Tick of the mirror after this call.
    pub tick: Option<f64>,
}

/// Client half of the gameplay loop: mirror the host's state, send controls.
#[derive(Debug)]
pub struct ClientSync {
    session: Session,
    outbound: Connection,
    mirror: Snapshot,
    staging: Snapshot,
    last_applied_tick: Option<f64>,
}

impl ClientSync {
    pub fn new(host: Address, idle_timeout: Duration) -> Self {
        Self {
            session: Session::new(host, idle_timeout),
            outbound: Connection::new(host),
            mirror: Snapshot::default(),
            staging: Snapshot::default(),
            last_applied_tick: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn host(&self) -> Address {
        self.session.remote
    }

    /// Sequence state of the input stream.
    pub fn outbound(&self) -> &Connection {
        &self.outbound
    }

    pub fn mirror(&self) -> &Snapshot {
        &self.mirror
    }

    pub fn last_applied_tick(&self) -> Option<f64> {
        self.last_applied_tick
    }

    /// Only finite ticks order; a NaN or infinite tick would stall the
    /// mirror forever once applied.
    fn is_newer(&self, tick: f64) -> bool {
        tick.is_finite() && self.last_applied_tick.is_none_or(|last| tick > last)
    }

    /// Replaces the mirror if `snapshot` is strictly newer.
    pub fn apply(&mut self, snapshot: Snapshot) -> bool {
        if !self.is_newer(snapshot.tick) {
            return false;
        }
        self.last_applied_tick = Some(snapshot.tick);
        self.mirror = snapshot;
        true
    }

    /// Decodes an encoded record and applies it if strictly newer.
    pub fn apply_bytes(&mut self, bytes: &[u8]) -> Result<bool, LanError> {
        snapshot::decode_into(bytes, &mut self.staging)?;
        if !self.is_newer(self.staging.tick) {
            return Ok(false);
        }
        self.last_applied_tick = Some(self.staging.tick);
        std::mem::swap(&mut self.mirror, &mut self.staging);
        Ok(true)
    }

    /// Applies every snapshot in `frames`, each compared on its own.
    pub fn absorb(&mut self, frames: &[Vec<u8>]) -> (usize, usize) {
        let mut applied = 0;
        let mut stale = 0;
        for frame in frames {
            if frame.len() != SNAPSHOT_SIZE {
                log::debug!("Dropping {} byte gameplay packet on client", frame.len());
                continue;
            }
            match self.apply_bytes(frame) {
                Ok(true) => applied += 1,
                Ok(false) => stale += 1,
                Err(e) => log::debug!("Dropping snapshot: {}", e),
            }
        }
        (applied, stale)
    }

    pub fn send_input<S: DatagramSocket>(
        &mut self,
        endpoint: &mut FramedEndpoint<S>,
        input: InputFlags,
    ) -> bool {
        send_or_warn(endpoint, &mut self.outbound, &input.to_bytes(), "input")
    }

    /// Drain, apply, send controls. A joined client has no discovery duties,
    /// so non-gameplay datagrams are dropped here.
    pub fn tick<S: DatagramSocket>(
        &mut self,
        endpoint: &mut FramedEndpoint<S>,
        input: InputFlags,
    ) -> Result<ClientTickReport, LanError> {
        let sorted = sort_incoming(self.session.remote, endpoint.drain()?);
        for (from, payload) in &sorted.raw {
            log::trace!("Ignoring {} byte datagram from {} in session", payload.len(), from);
        }
        let (applied, stale) = self.absorb(&sorted.frames);
        let input_sent = self.send_input(endpoint, input);
        self.session.check_alive(endpoint, Instant::now())?;

        Ok(ClientTickReport {
            applied,
            stale,
            input_sent,
            tick: self.last_applied_tick,
        })
    }
}
