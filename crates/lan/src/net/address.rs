use std::fmt;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use serde::{Deserialize, Serialize};

/// IPv4 host plus port. Two addresses are equal only if both parts match.
/// Serialized in dotted form, e.g. `"192.168.1.10:5000"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "SocketAddrV4", into = "SocketAddrV4")]
pub struct Address {
    host: u32,
    port: u16,
}

impl Address {
    pub const BROADCAST: [u8; 4] = [255, 255, 255, 255];

    pub const fn new(a: u8, b: u8, c: u8, d: u8, port: u16) -> Self {
        Self {
            host: u32::from_be_bytes([a, b, c, d]),
            port,
        }
    }

    pub const fn from_parts(host: u32, port: u16) -> Self {
        Self { host, port }
    }

    pub const fn broadcast(port: u16) -> Self {
        let [a, b, c, d] = Self::BROADCAST;
        Self::new(a, b, c, d, port)
    }

    pub const fn localhost(port: u16) -> Self {
        Self::new(127, 0, 0, 1, port)
    }

    pub fn host(&self) -> u32 {
        self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn octets(&self) -> [u8; 4] {
        self.host.to_be_bytes()
    }

    pub fn is_broadcast(&self) -> bool {
        self.octets() == Self::BROADCAST
    }

    pub fn with_port(self, port: u16) -> Self {
        Self { port, ..self }
    }
}

impl From<SocketAddrV4> for Address {
    fn from(addr: SocketAddrV4) -> Self {
        Self::from_parts(u32::from(*addr.ip()), addr.port())
    }
}

impl From<Address> for SocketAddrV4 {
    fn from(addr: Address) -> Self {
        SocketAddrV4::new(Ipv4Addr::from(addr.host), addr.port)
    }
}

impl From<Address> for SocketAddr {
    fn from(addr: Address) -> Self {
        SocketAddr::V4(addr.into())
    }
}

impl TryFrom<SocketAddr> for Address {
    type Error = SocketAddr;

    fn try_from(addr: SocketAddr) -> Result<Self, Self::Error> {
        match addr {
            SocketAddr::V4(v4) => Ok(v4.into()),
            SocketAddr::V6(_) => Err(addr),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.octets();
        write!(f, "{}.{}.{}.{}:{}", a, b, c, d, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_structural() {
        let a = Address::new(192, 168, 1, 10, 5000);
        let b = Address::new(192, 168, 1, 10, 5000);

        assert_eq!(a, a);
        assert_eq!(a, b);
        assert_eq!(b, a);
        assert_ne!(a, a.with_port(5001));
        assert_ne!(a, Address::new(192, 168, 1, 11, 5000));
    }

    #[test]
    fn prints_dotted_quad() {
        let addr = Address::new(10, 0, 0, 7, 5000);
        assert_eq!(addr.to_string(), "10.0.0.7:5000");
        assert_eq!(Address::broadcast(5000).to_string(), "255.255.255.255:5000");
    }

    #[test]
    fn socket_addr_conversion() {
        let socket: SocketAddr = "172.16.4.2:6000".parse().unwrap();
        let addr = Address::try_from(socket).unwrap();

        assert_eq!(addr.octets(), [172, 16, 4, 2]);
        assert_eq!(addr.port(), 6000);
        assert_eq!(SocketAddr::from(addr), socket);

        let v6: SocketAddr = "[::1]:6000".parse().unwrap();
        assert!(Address::try_from(v6).is_err());
    }
}
