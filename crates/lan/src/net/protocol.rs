use bytes::{Buf, BufMut};

use crate::error::FrameRejection;

pub const PROTOCOL_TAG: u32 = u32::from_be_bytes(*b"bc40");
pub const FRAME_HEADER_LEN: usize = 8;
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_TICK_RATE: u32 = 60;
pub const MAX_PEERS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    pub sequence: u32,
    pub payload: &'a [u8],
}

pub fn encode_frame(sequence: u32, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(FRAME_HEADER_LEN + payload.len());
    buf.put_u32(PROTOCOL_TAG);
    buf.put_u32(sequence);
    buf.put_slice(payload);
    buf
}

pub fn decode_frame(bytes: &[u8]) -> Result<Frame<'_>, FrameRejection> {
    if bytes.len() < FRAME_HEADER_LEN {
        return Err(FrameRejection::TooShort { len: bytes.len() });
    }

    let mut buf = bytes;
    let tag = buf.get_u32();
    if tag != PROTOCOL_TAG {
        return Err(FrameRejection::ForeignTag { tag });
    }

    Ok(Frame {
        sequence: buf.get_u32(),
        payload: buf,
    })
}
