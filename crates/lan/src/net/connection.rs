use std::time::{Duration, Instant};

use super::address::Address;
use super::protocol::{Frame, MAX_PEERS, decode_frame, encode_frame};
use super::transport::DatagramSocket;
use crate::error::{FrameRejection, TransportError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketStamp {
    pub sequence: u32,
    pub at: Instant,
}

/// Bookkeeping for one remote endpoint of the framed protocol.
#[derive(Debug)]
pub struct Connection {
    remote: Address,
    last_sent: Option<PacketStamp>,
    last_received: Option<PacketStamp>,
}

impl Connection {
    pub fn new(remote: Address) -> Self {
        Self {
            remote,
            last_sent: None,
            last_received: None,
        }
    }

    pub fn remote(&self) -> Address {
        self.remote
    }

    pub fn last_received(&self) -> Option<PacketStamp> {
        self.last_received
    }

    /// Sequence number of the last successful send, 0 before the first one.
    pub fn last_sent_sequence(&self) -> u32 {
        self.last_sent.map_or(0, |stamp| stamp.sequence)
    }

    /// Frames and sends `payload`. The sequence counter only advances when
    /// the socket accepted the whole datagram.
    pub fn send<S>(&mut self, socket: &mut S, payload: &[u8]) -> Result<u32, TransportError>
    where
        S: DatagramSocket + ?Sized,
    {
        let sequence = self.last_sent_sequence().wrapping_add(1);
        let bytes = encode_frame(sequence, payload);

        socket.send_to(self.remote, &bytes)?;

        self.last_sent = Some(PacketStamp {
            sequence,
            at: Instant::now(),
        });
        Ok(sequence)
    }

    pub fn record_received(&mut self, sequence: u32, at: Instant) {
        self.last_received = Some(PacketStamp { sequence, at });
    }

    pub fn is_silent_since(&self, since: Instant, now: Instant, timeout: Duration) -> bool {
        let last_heard = self.last_received.map_or(since, |stamp| stamp.at.max(since));
        now.saturating_duration_since(last_heard) > timeout
    }
}

/// Fixed-capacity table of every peer that has sent us a framed packet.
/// Only receiving adds records; outbound traffic keeps its own `Connection`.
#[derive(Debug)]
pub struct PeerTable {
    peers: Vec<Connection>,
    capacity: usize,
}

impl Default for PeerTable {
    fn default() -> Self {
        Self::new(MAX_PEERS)
    }
}

impl PeerTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            peers: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.peers.len() >= self.capacity
    }

    pub fn get(&self, addr: &Address) -> Option<&Connection> {
        self.peers.iter().find(|peer| peer.remote == *addr)
    }

    pub fn get_mut(&mut self, addr: &Address) -> Option<&mut Connection> {
        self.peers.iter_mut().find(|peer| peer.remote == *addr)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Connection> {
        self.peers.iter()
    }

    /// Returns the record for `remote`, creating it if there is room.
    fn connect(&mut self, remote: Address) -> Result<&mut Connection, FrameRejection> {
        let index = match self.peers.iter().position(|peer| peer.remote == remote) {
            Some(index) => index,
            None => {
                if self.is_full() {
                    log::warn!("Too many peers, dropping {}", remote);
                    return Err(FrameRejection::PeerTableFull { addr: remote });
                }
                self.peers.push(Connection::new(remote));
                self.peers.len() - 1
            }
        };

        Ok(&mut self.peers[index])
    }

    /// Frees the record for `addr` so the slot can go to another peer.
    pub fn remove(&mut self, addr: &Address) -> Option<Connection> {
        let index = self.peers.iter().position(|peer| peer.remote == *addr)?;
        Some(self.peers.swap_remove(index))
    }

    /// Validates a received buffer and records it against its sender.
    /// Foreign or short buffers never touch the table.
    pub fn accept<'a>(
        &mut self,
        from: Address,
        bytes: &'a [u8],
        now: Instant,
    ) -> Result<Frame<'a>, FrameRejection> {
        let frame = decode_frame(bytes)?;
        self.connect(from)?.record_received(frame.sequence, now);
        Ok(frame)
    }
}
