mod address;
mod connection;
mod endpoint;
mod protocol;
pub mod simulator;
mod stats;
mod transport;

pub use address::Address;
pub use connection::{Connection, PacketStamp, PeerTable};
pub use endpoint::{FramedEndpoint, Incoming};
pub use protocol::{
    DEFAULT_PORT, DEFAULT_TICK_RATE, FRAME_HEADER_LEN, Frame, MAX_PEERS, PROTOCOL_TAG,
    decode_frame, encode_frame,
};
pub use simulator::{MemoryNetwork, MemorySocket};
pub use stats::NetworkStats;
pub use transport::{Datagram, DatagramSocket, RECV_BUFFER_SIZE, UdpEndpoint};
