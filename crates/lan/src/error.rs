use std::io;

use crate::net::Address;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to bind datagram socket on port {port}: {source}")]
    Bind { port: u16, source: io::Error },
    #[error("failed to send datagram to {addr}: {source}")]
    Send { addr: Address, source: io::Error },
    #[error("partial send to {addr}: {sent} of {expected} bytes")]
    PartialSend {
        addr: Address,
        sent: usize,
        expected: usize,
    },
    #[error("failed to receive datagram: {0}")]
    Receive(io::Error),
}

/// Why a datagram was not taken as a framed protocol packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FrameRejection {
    #[error("datagram too short for a frame header ({len} bytes)")]
    TooShort { len: usize },
    #[error("foreign protocol tag {tag:#010x}")]
    ForeignTag { tag: u32 },
    #[error("peer table full, dropping {addr}")]
    PeerTableFull { addr: Address },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("snapshot record has {actual} bytes, expected {expected}")]
    Length { expected: usize, actual: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum LanError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Frame(#[from] FrameRejection),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("node is not idle")]
    NotIdle,
    #[error("no discovered host at index {index}")]
    NoCandidate { index: usize },
    #[error("operation needs the {expected} phase")]
    WrongPhase { expected: &'static str },
    #[error("no traffic from {remote} within the idle timeout")]
    PeerTimedOut { remote: Address },
}
