use crate::error::CodecError;

/// Wire length of an input sample: one byte per control.
pub const INPUT_SIZE: usize = 6;

bitflags::bitflags! {
    /// Controls held on one client frame.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct InputFlags: u8 {
        const RIGHT = 0b0000_0001;
        const LEFT = 0b0000_0010;
        const UP = 0b0000_0100;
        const DOWN = 0b0000_1000;
        const FIRE = 0b0001_0000;
        const CONFIRM = 0b0010_0000;
    }
}

impl Default for InputFlags {
    fn default() -> Self {
        InputFlags::empty()
    }
}

/// Wire order of the controls.
const WIRE_ORDER: [InputFlags; INPUT_SIZE] = [
    InputFlags::RIGHT,
    InputFlags::LEFT,
    InputFlags::UP,
    InputFlags::DOWN,
    InputFlags::FIRE,
    InputFlags::CONFIRM,
];

impl InputFlags {
    pub fn to_bytes(self) -> [u8; INPUT_SIZE] {
        WIRE_ORDER.map(|flag| u8::from(self.contains(flag)))
    }

    /// Any non-zero byte marks the control as held.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let bytes: &[u8; INPUT_SIZE] = bytes.try_into().map_err(|_| CodecError::Length {
            expected: INPUT_SIZE,
            actual: bytes.len(),
        })?;

        Ok(WIRE_ORDER
            .iter()
            .zip(bytes)
            .filter(|(_, byte)| **byte != 0)
            .fold(InputFlags::empty(), |flags, (flag, _)| flags | *flag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_follow_wire_order() {
        let input = InputFlags::LEFT | InputFlags::FIRE;
        assert_eq!(input.to_bytes(), [0, 1, 0, 0, 1, 0]);
        assert_eq!(InputFlags::from_bytes(&input.to_bytes()).unwrap(), input);
    }

    #[test]
    fn any_nonzero_byte_is_held() {
        let input = InputFlags::from_bytes(&[0xFF, 0, 7, 0, 0, 1]).unwrap();
        assert_eq!(
            input,
            InputFlags::RIGHT | InputFlags::UP | InputFlags::CONFIRM
        );
    }

    #[test]
    fn wrong_length_is_rejected() {
        assert_eq!(
            InputFlags::from_bytes(&[1, 0, 0]),
            Err(CodecError::Length {
                expected: INPUT_SIZE,
                actual: 3,
            })
        );
        assert!(InputFlags::from_bytes(&[0; 7]).is_err());
    }
}
