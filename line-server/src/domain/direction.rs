//! Travel direction for a line.

use serde::{Deserialize, Serialize};

/// Direction of travel along a line.
///
/// The canonical payload and the upstream provider both use single-letter
/// codes: `G` for outbound, `D` for inbound. These are the only two
/// direction codes that exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "G")]
    Outbound,
    #[serde(rename = "D")]
    Inbound,
}

impl Direction {
    /// All directions, in payload order.
    pub const ALL: [Direction; 2] = [Direction::Outbound, Direction::Inbound];

    /// The single-letter wire code.
    pub fn code(&self) -> &'static str {
        match self {
            Direction::Outbound => "G",
            Direction::Inbound => "D",
        }
    }

    /// Parse a wire code (case-insensitive).
    pub fn parse(code: &str) -> Option<Self> {
        if code.eq_ignore_ascii_case("G") {
            Some(Direction::Outbound)
        } else if code.eq_ignore_ascii_case("D") {
            Some(Direction::Inbound)
        } else {
            None
        }
    }

    /// The other direction.
    pub fn opposite(&self) -> Self {
        match self {
            Direction::Outbound => Direction::Inbound,
            Direction::Inbound => Direction::Outbound,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_codes() {
        assert_eq!(Direction::parse("G"), Some(Direction::Outbound));
        assert_eq!(Direction::parse("g"), Some(Direction::Outbound));
        assert_eq!(Direction::parse("D"), Some(Direction::Inbound));
        assert_eq!(Direction::parse("X"), None);
        assert_eq!(Direction::parse(""), None);
    }

    #[test]
    fn opposite() {
        assert_eq!(Direction::Outbound.opposite(), Direction::Inbound);
        assert_eq!(Direction::Inbound.opposite(), Direction::Outbound);
    }
}
