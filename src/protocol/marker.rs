//! Reserved marker bytes of the LCD stream.
//!
//! The device shares one UART between its console text and the mirrored LCD
//! writes. Two byte values are reserved to mark control sequences; a control
//! sequence is always a *pair* of markers, so a single marker followed by any
//! other byte is ordinary pixel data.

pub const START: u8 = 0x5B; // '['
pub const STOP: u8 = 0x5D; // ']'

/// Classification of a single stream byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteClass {
    Start,
    Stop,
    Data,
}

/// A reserved marker held while the decoder waits for its pairing byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Start,
    Stop,
}

impl Marker {
    /// The wire value of this marker.
    pub fn byte(self) -> u8 {
        match self {
            Marker::Start => START,
            Marker::Stop => STOP,
        }
    }
}

pub fn classify(b: u8) -> ByteClass {
    match b {
        START => ByteClass::Start,
        STOP => ByteClass::Stop,
        _ => ByteClass::Data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_brackets_are_reserved() {
        assert_eq!(classify(b'['), ByteClass::Start);
        assert_eq!(classify(b']'), ByteClass::Stop);
        let reserved = (0u8..=255)
            .filter(|b| classify(*b) != ByteClass::Data)
            .count();
        assert_eq!(reserved, 2);
    }

    #[test]
    fn marker_round_trips_to_wire_value() {
        assert_eq!(Marker::Start.byte(), START);
        assert_eq!(Marker::Stop.byte(), STOP);
    }
}
