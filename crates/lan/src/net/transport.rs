use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};

use super::address::Address;
use super::stats::NetworkStats;
use crate::error::TransportError;

/// Large enough for a framed snapshot record.
pub const RECV_BUFFER_SIZE: usize = 16 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    pub from: Address,
    pub payload: Vec<u8>,
}

/// Unreliable, connectionless, non-blocking datagram socket.
pub trait DatagramSocket {
    fn local_addr(&self) -> Address;

    /// Best-effort send. A short write is an error; nothing is retried.
    fn send_to(&mut self, addr: Address, bytes: &[u8]) -> Result<usize, TransportError>;

    /// Returns `Ok(None)` immediately when nothing is pending.
    fn try_recv(&mut self) -> Result<Option<Datagram>, TransportError>;

    fn stats(&self) -> &NetworkStats;

    /// Collects every datagram buffered since the last poll.
    fn drain(&mut self) -> Result<Vec<Datagram>, TransportError> {
        let mut datagrams = Vec::new();
        while let Some(datagram) = self.try_recv()? {
            datagrams.push(datagram);
        }
        Ok(datagrams)
    }
}

pub struct UdpEndpoint {
    socket: UdpSocket,
    local_addr: Address,
    stats: NetworkStats,
    recv_buffer: Box<[u8; RECV_BUFFER_SIZE]>,
}

impl UdpEndpoint {
    /// Binds `0.0.0.0:port`.
    pub fn open(port: u16) -> Result<Self, TransportError> {
        Self::bind(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port))
    }

    pub fn bind(addr: SocketAddrV4) -> Result<Self, TransportError> {
        let port = addr.port();
        let bind_err = |source| TransportError::Bind { port, source };

        let socket = UdpSocket::bind(addr).map_err(bind_err)?;
        socket.set_nonblocking(true).map_err(bind_err)?;
        socket.set_broadcast(true).map_err(bind_err)?;

        let local_addr = match socket.local_addr().map_err(bind_err)? {
            SocketAddr::V4(v4) => Address::from(v4),
            SocketAddr::V6(_) => {
                return Err(bind_err(io::Error::new(
                    io::ErrorKind::AddrNotAvailable,
                    "bound to a non-IPv4 address",
                )));
            }
        };

        log::debug!("Datagram socket bound on {}", local_addr);

        Ok(Self {
            socket,
            local_addr,
            stats: NetworkStats::default(),
            recv_buffer: Box::new([0u8; RECV_BUFFER_SIZE]),
        })
    }
}

impl DatagramSocket for UdpEndpoint {
    fn local_addr(&self) -> Address {
        self.local_addr
    }

    fn send_to(&mut self, addr: Address, bytes: &[u8]) -> Result<usize, TransportError> {
        let sent = match self.socket.send_to(bytes, SocketAddr::from(addr)) {
            Ok(sent) => sent,
            Err(source) => {
                self.stats.record_send_failure();
                return Err(TransportError::Send { addr, source });
            }
        };

        if sent != bytes.len() {
            self.stats.record_send_failure();
            return Err(TransportError::PartialSend {
                addr,
                sent,
                expected: bytes.len(),
            });
        }

        self.stats.record_sent(sent);
        Ok(sent)
    }

    fn try_recv(&mut self) -> Result<Option<Datagram>, TransportError> {
        loop {
            match self.socket.recv_from(&mut self.recv_buffer[..]) {
                Ok((size, SocketAddr::V4(from))) => {
                    self.stats.record_received(size);
                    return Ok(Some(Datagram {
                        from: Address::from(from),
                        payload: self.recv_buffer[..size].to_vec(),
                    }));
                }
                Ok((_, from)) => {
                    log::trace!("Skipping datagram from non-IPv4 sender {}", from);
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(None),
                // ICMP port-unreachable from an earlier send surfaces here on some platforms.
                Err(ref e) if e.kind() == io::ErrorKind::ConnectionReset => continue,
                Err(e) => return Err(TransportError::Receive(e)),
            }
        }
    }

    fn stats(&self) -> &NetworkStats {
        &self.stats
    }
}
