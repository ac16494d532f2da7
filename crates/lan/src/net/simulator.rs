use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::rc::Rc;

use super::address::Address;
use super::stats::NetworkStats;
use super::transport::{Datagram, DatagramSocket};
use crate::error::TransportError;

#[derive(Debug, Default)]
struct NetworkState {
    // Bind order, so broadcast delivery is deterministic.
    inboxes: Vec<(Address, VecDeque<Datagram>)>,
    drop_next: HashMap<Address, usize>,
    fail_sends: HashMap<Address, usize>,
}

impl NetworkState {
    fn inbox_mut(&mut self, addr: &Address) -> Option<&mut VecDeque<Datagram>> {
        self.inboxes
            .iter_mut()
            .find(|(bound, _)| bound == addr)
            .map(|(_, inbox)| inbox)
    }

    fn deliver(&mut self, from: Address, to: Address, bytes: &[u8]) {
        if let Some(remaining) = self.drop_next.get_mut(&to) {
            if *remaining > 0 {
                *remaining -= 1;
                log::trace!("Simulated loss of datagram {} -> {}", from, to);
                return;
            }
        }

        if let Some(inbox) = self.inbox_mut(&to) {
            inbox.push_back(Datagram {
                from,
                payload: bytes.to_vec(),
            });
        }
    }
}

/// In-process datagram network. Single-threaded, deterministic, and lossy
/// only when told to be.
#[derive(Debug, Clone, Default)]
pub struct MemoryNetwork {
    state: Rc<RefCell<NetworkState>>,
}

impl MemoryNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&self, addr: Address) -> MemorySocket {
        let mut state = self.state.borrow_mut();
        if state.inbox_mut(&addr).is_none() {
            state.inboxes.push((addr, VecDeque::new()));
        }

        MemorySocket {
            network: self.clone(),
            addr,
            stats: NetworkStats::default(),
        }
    }

    /// Silently loses the next `count` datagrams addressed to `to`.
    pub fn drop_next(&self, to: Address, count: usize) {
        self.state.borrow_mut().drop_next.insert(to, count);
    }

    /// Makes the next `count` sends from `from` fail at the socket.
    pub fn fail_sends_from(&self, from: Address, count: usize) {
        self.state.borrow_mut().fail_sends.insert(from, count);
    }

    /// Reverses the delivery order of everything queued for `addr`.
    pub fn reverse_inbox(&self, addr: Address) {
        if let Some(inbox) = self.state.borrow_mut().inbox_mut(&addr) {
            inbox.make_contiguous().reverse();
        }
    }

    /// Puts a raw datagram on the wire as if `from` had sent it.
    pub fn inject(&self, from: Address, to: Address, bytes: &[u8]) {
        self.state.borrow_mut().deliver(from, to, bytes);
    }

    /// Removes and returns everything queued for `addr` without going
    /// through a socket.
    pub fn take_pending(&self, addr: Address) -> Vec<Datagram> {
        self.state
            .borrow_mut()
            .inbox_mut(&addr)
            .map(|inbox| inbox.drain(..).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug)]
pub struct MemorySocket {
    network: MemoryNetwork,
    addr: Address,
    stats: NetworkStats,
}

impl DatagramSocket for MemorySocket {
    fn local_addr(&self) -> Address {
        self.addr
    }

    fn send_to(&mut self, addr: Address, bytes: &[u8]) -> Result<usize, TransportError> {
        let mut state = self.network.state.borrow_mut();

        if let Some(remaining) = state.fail_sends.get_mut(&self.addr) {
            if *remaining > 0 {
                *remaining -= 1;
                self.stats.record_send_failure();
                return Err(TransportError::Send {
                    addr,
                    source: io::Error::other("simulated send failure"),
                });
            }
        }

        if addr.is_broadcast() {
            let targets: Vec<Address> = state
                .inboxes
                .iter()
                .map(|(bound, _)| *bound)
                .filter(|bound| bound.port() == addr.port() && *bound != self.addr)
                .collect();
            for target in targets {
                state.deliver(self.addr, target, bytes);
            }
        } else {
            state.deliver(self.addr, addr, bytes);
        }

        self.stats.record_sent(bytes.len());
        Ok(bytes.len())
    }

    fn try_recv(&mut self) -> Result<Option<Datagram>, TransportError> {
        let datagram = self
            .network
            .state
            .borrow_mut()
            .inbox_mut(&self.addr)
            .and_then(|inbox| inbox.pop_front());

        if let Some(ref datagram) = datagram {
            self.stats.record_received(datagram.payload.len());
        }
        Ok(datagram)
    }

    fn stats(&self) -> &NetworkStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unicast_reaches_only_the_target() {
        let network = MemoryNetwork::new();
        let mut a = network.bind(Address::new(10, 0, 0, 1, 5000));
        let mut b = network.bind(Address::new(10, 0, 0, 2, 5000));
        let mut c = network.bind(Address::new(10, 0, 0, 3, 5000));

        a.send_to(b.local_addr(), b"ping").unwrap();

        let received = b.drain().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].from, a.local_addr());
        assert!(c.try_recv().unwrap().is_none());
    }

    #[test]
    fn broadcast_reaches_every_socket_on_the_port() {
        let network = MemoryNetwork::new();
        let mut a = network.bind(Address::new(10, 0, 0, 1, 5000));
        let mut b = network.bind(Address::new(10, 0, 0, 2, 5000));
        let mut c = network.bind(Address::new(10, 0, 0, 3, 6000));

        a.send_to(Address::broadcast(5000), b"hello").unwrap();

        assert_eq!(b.drain().unwrap().len(), 1);
        assert!(a.drain().unwrap().is_empty());
        assert!(c.drain().unwrap().is_empty());
    }

    #[test]
    fn scripted_loss_and_reorder() {
        let network = MemoryNetwork::new();
        let mut a = network.bind(Address::new(10, 0, 0, 1, 5000));
        let mut b = network.bind(Address::new(10, 0, 0, 2, 5000));

        network.drop_next(b.local_addr(), 1);
        for byte in 0..4u8 {
            a.send_to(b.local_addr(), &[byte]).unwrap();
        }
        network.reverse_inbox(b.local_addr());

        let order: Vec<u8> = b.drain().unwrap().iter().map(|d| d.payload[0]).collect();
        assert_eq!(order, vec![3, 2, 1]);
    }
}
