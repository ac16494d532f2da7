pub mod config;
pub mod discovery;
pub mod error;
pub mod net;
pub mod session;
pub mod snapshot;

pub use config::{DEFAULT_IDLE_TIMEOUT, LanConfig};
pub use discovery::{
    DiscoveryMessage, HostLobby, HostState, JoinEvent, JoinLobby, JoinState, MAX_AVAILABLE_GAMES,
    Outgoing,
};
pub use error::{CodecError, FrameRejection, LanError, TransportError};
pub use net::{
    Address, Connection, DEFAULT_PORT, DEFAULT_TICK_RATE, Datagram, DatagramSocket,
    FramedEndpoint, Incoming, MAX_PEERS, MemoryNetwork, MemorySocket, NetworkStats, PeerTable,
    UdpEndpoint,
};
pub use session::{
    ClientSync, ClientTickReport, HostSync, HostTickReport, INPUT_SIZE, InputFlags, LanNode,
    LinkState, NodeEvent, Phase, Session, TickClock,
};
pub use snapshot::{SNAPSHOT_SIZE, Snapshot};
