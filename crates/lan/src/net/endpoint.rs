use std::time::Instant;

use super::address::Address;
use super::connection::{Connection, PeerTable};
use super::protocol::FRAME_HEADER_LEN;
use super::transport::DatagramSocket;
use crate::error::{FrameRejection, TransportError};

/// A datagram off the shared port, split by payload shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    /// Carried our protocol tag; `payload` has the header stripped.
    Framed {
        from: Address,
        sequence: u32,
        payload: Vec<u8>,
    },
    /// Anything else, e.g. discovery tokens or unrelated LAN traffic.
    Raw { from: Address, payload: Vec<u8> },
}

impl Incoming {
    pub fn from(&self) -> Address {
        match self {
            Incoming::Framed { from, .. } | Incoming::Raw { from, .. } => *from,
        }
    }
}

/// Socket plus the framing layer's peer table.
#[derive(Debug)]
pub struct FramedEndpoint<S> {
    socket: S,
    peers: PeerTable,
}

impl<S: DatagramSocket> FramedEndpoint<S> {
    pub fn new(socket: S) -> Self {
        Self {
            socket,
            peers: PeerTable::default(),
        }
    }

    pub fn local_addr(&self) -> Address {
        self.socket.local_addr()
    }

    pub fn socket(&self) -> &S {
        &self.socket
    }

    pub fn peers(&self) -> &PeerTable {
        &self.peers
    }

    pub fn peers_mut(&mut self) -> &mut PeerTable {
        &mut self.peers
    }

    /// Sends `payload` framed with the next sequence number of `connection`.
    /// The peer table is not consulted, so a full table never blocks sends.
    pub fn send_framed(
        &mut self,
        connection: &mut Connection,
        payload: &[u8],
    ) -> Result<u32, TransportError> {
        connection.send(&mut self.socket, payload)
    }

    /// Sends `payload` as the whole datagram, without framing.
    pub fn send_raw(&mut self, remote: Address, payload: &[u8]) -> Result<usize, TransportError> {
        self.socket.send_to(remote, payload)
    }

    pub fn poll(&mut self) -> Result<Option<Incoming>, TransportError> {
        loop {
            let Some(datagram) = self.socket.try_recv()? else {
                return Ok(None);
            };

            let sequence = match self
                .peers
                .accept(datagram.from, &datagram.payload, Instant::now())
            {
                Ok(frame) => Some(frame.sequence),
                Err(FrameRejection::PeerTableFull { .. }) => continue,
                Err(_) => None,
            };

            let mut payload = datagram.payload;
            return Ok(Some(match sequence {
                Some(sequence) => Incoming::Framed {
                    from: datagram.from,
                    sequence,
                    payload: payload.split_off(FRAME_HEADER_LEN),
                },
                None => Incoming::Raw {
                    from: datagram.from,
                    payload,
                },
            }));
        }
    }

    pub fn drain(&mut self) -> Result<Vec<Incoming>, TransportError> {
        let mut incoming = Vec::new();
        while let Some(next) = self.poll()? {
            incoming.push(next);
        }
        Ok(incoming)
    }
}
