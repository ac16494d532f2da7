use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiscoveryMessage {
    Discover,
    Available,
    JoinRequest,
    JoinAccept,
}

impl DiscoveryMessage {
    pub const ALL: [DiscoveryMessage; 4] = [
        DiscoveryMessage::Discover,
        DiscoveryMessage::Available,
        DiscoveryMessage::JoinRequest,
        DiscoveryMessage::JoinAccept,
    ];

    pub fn token(self) -> &'static str {
        match self {
            DiscoveryMessage::Discover => "DISCOVER",
            DiscoveryMessage::Available => "AVAILABLE",
            DiscoveryMessage::JoinRequest => "JOIN_REQUEST",
            DiscoveryMessage::JoinAccept => "JOIN_ACCEPT",
        }
    }

    pub fn as_bytes(self) -> &'static [u8] {
        self.token().as_bytes()
    }

    /// Exact, case-sensitive match. Trailing NULs are tolerated since C
    /// peers tend to send the terminator along.
    pub fn parse(payload: &[u8]) -> Option<Self> {
        let end = payload
            .iter()
            .rposition(|&b| b != 0)
            .map_or(0, |last| last + 1);
        let token = &payload[..end];

        Self::ALL
            .into_iter()
            .find(|message| message.as_bytes() == token)
    }
}

impl fmt::Display for DiscoveryMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_parse_back() {
        for message in DiscoveryMessage::ALL {
            assert_eq!(DiscoveryMessage::parse(message.as_bytes()), Some(message));
        }
    }

    #[test]
    fn nul_terminated_tokens_are_accepted() {
        assert_eq!(
            DiscoveryMessage::parse(b"JOIN_ACCEPT\0"),
            Some(DiscoveryMessage::JoinAccept)
        );
    }

    #[test]
    fn near_misses_are_ignored() {
        assert_eq!(DiscoveryMessage::parse(b"discover"), None);
        assert_eq!(DiscoveryMessage::parse(b"DISCOVERY"), None);
        assert_eq!(DiscoveryMessage::parse(b" AVAILABLE"), None);
        assert_eq!(DiscoveryMessage::parse(b""), None);
        assert_eq!(DiscoveryMessage::parse(b"\0\0"), None);
    }
}
