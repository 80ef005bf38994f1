//! Incremental decoder for the marker-escaped LCD stream.
//!
//! Control sequences on the wire:
//!
//! | bytes          | event                                   |
//! |----------------|-----------------------------------------|
//! | `[ [ x y w h`  | [`Event::RegionStart`]                  |
//! | `] ]`          | [`Event::RegionEnd`]                    |
//! | `] [`          | [`Event::Grab`]                         |
//! | `[ ]`          | [`Event::NewFrame`]                     |
//!
//! Any marker not followed by a second marker is literal pixel data. The
//! decoder keeps at most one marker of lookahead and can be fed arbitrary
//! chunks; the four region parameter bytes may arrive split across reads.

use super::marker::{classify, ByteClass, Marker};

/// Decoded stream event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A literal byte destined for the framebuffer (or device console text
    /// when no region is open).
    Data(u8),
    /// Open a write window of `w` x `h` cells at (`x`, `y`).
    RegionStart { x: u8, y: u8, w: u8, h: u8 },
    /// Close the current write window.
    RegionEnd,
    /// The device asked for a snapshot of the current screen.
    Grab,
    /// The device is about to clear the screen.
    NewFrame,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum State {
    #[default]
    Idle,
    Pending(Marker),
    Params { buf: [u8; 4], len: usize },
}

/// Events produced by a single decode step. Holds at most two events, which
/// is the most one byte can release (a held marker plus the byte itself).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Emitted {
    events: [Option<Event>; 2],
    next: usize,
}

impl Emitted {
    fn none() -> Self {
        Self::default()
    }

    fn one(ev: Event) -> Self {
        Self {
            events: [Some(ev), None],
            next: 0,
        }
    }

    fn two(first: Event, second: Event) -> Self {
        Self {
            events: [Some(first), Some(second)],
            next: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.events[self.next..].iter().all(Option::is_none)
    }
}

impl Iterator for Emitted {
    type Item = Event;

    fn next(&mut self) -> Option<Event> {
        while self.next < self.events.len() {
            let ev = self.events[self.next].take();
            self.next += 1;
            if ev.is_some() {
                return ev;
            }
        }
        None
    }
}

#[derive(Debug, Default)]
pub struct StreamDecoder {
    state: State,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self { state: State::Idle }
    }

    /// Marker currently waiting for its pairing byte, if any.
    pub fn pending(&self) -> Option<Marker> {
        match self.state {
            State::Pending(m) => Some(m),
            _ => None,
        }
    }

    /// True while the four region parameter bytes are still being collected.
    pub fn in_region_header(&self) -> bool {
        matches!(self.state, State::Params { .. })
    }

    /// Drop any held marker or partial region header.
    pub fn reset(&mut self) {
        self.state = State::Idle;
    }

    /// Consume one byte.
    pub fn step(&mut self, b: u8) -> Emitted {
        match self.state {
            State::Params { mut buf, len } => {
                buf[len] = b;
                if len + 1 == buf.len() {
                    self.state = State::Idle;
                    Emitted::one(Event::RegionStart {
                        x: buf[0],
                        y: buf[1],
                        w: buf[2],
                        h: buf[3],
                    })
                } else {
                    self.state = State::Params { buf, len: len + 1 };
                    Emitted::none()
                }
            }
            State::Idle => match classify(b) {
                ByteClass::Start => {
                    self.state = State::Pending(Marker::Start);
                    Emitted::none()
                }
                ByteClass::Stop => {
                    self.state = State::Pending(Marker::Stop);
                    Emitted::none()
                }
                ByteClass::Data => Emitted::one(Event::Data(b)),
            },
            State::Pending(held) => {
                self.state = State::Idle;
                match (held, classify(b)) {
                    (Marker::Start, ByteClass::Start) => {
                        self.state = State::Params {
                            buf: [0; 4],
                            len: 0,
                        };
                        Emitted::none()
                    }
                    (Marker::Stop, ByteClass::Stop) => Emitted::one(Event::RegionEnd),
                    (Marker::Stop, ByteClass::Start) => Emitted::one(Event::Grab),
                    (Marker::Start, ByteClass::Stop) => Emitted::one(Event::NewFrame),
                    // Unpaired marker: it was pixel data after all.
                    (_, ByteClass::Data) => {
                        Emitted::two(Event::Data(held.byte()), Event::Data(b))
                    }
                }
            }
        }
    }

    /// Push bytes, returning every event they complete.
    pub fn push(&mut self, data: &[u8]) -> Vec<Event> {
        let mut events = Vec::with_capacity(data.len());
        for &b in data {
            events.extend(self.step(b));
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::marker::{START, STOP};

    #[test]
    fn plain_bytes_pass_through() {
        let mut dec = StreamDecoder::new();
        assert_eq!(
            dec.push(&[0x01, 0xFF, 0x00]),
            vec![Event::Data(0x01), Event::Data(0xFF), Event::Data(0x00)]
        );
    }

    #[test]
    fn marker_pairs_become_control_events() {
        let mut dec = StreamDecoder::new();
        let events = dec.push(&[STOP, STOP, STOP, START, START, STOP]);
        assert_eq!(events, vec![Event::RegionEnd, Event::Grab, Event::NewFrame]);
        assert!(dec.pending().is_none());
    }

    #[test]
    fn region_start_reads_four_parameter_bytes() {
        let mut dec = StreamDecoder::new();
        let events = dec.push(&[START, START, 2, 3, 4, 2, 0x11]);
        assert_eq!(
            events,
            vec![
                Event::RegionStart {
                    x: 2,
                    y: 3,
                    w: 4,
                    h: 2
                },
                Event::Data(0x11)
            ]
        );
    }

    #[test]
    fn region_parameters_are_not_classified() {
        // Marker-valued coordinates must not be taken as control bytes.
        let mut dec = StreamDecoder::new();
        let events = dec.push(&[START, START, START, STOP, STOP, START]);
        assert_eq!(
            events,
            vec![Event::RegionStart {
                x: START,
                y: STOP,
                w: STOP,
                h: START
            }]
        );
        assert!(dec.pending().is_none());
    }

    #[test]
    fn region_header_survives_chunk_boundaries() {
        let mut dec = StreamDecoder::new();
        assert!(dec.push(&[START]).is_empty());
        assert_eq!(dec.pending(), Some(Marker::Start));
        assert!(dec.push(&[START, 10]).is_empty());
        assert!(dec.in_region_header());
        assert!(dec.push(&[20, 30]).is_empty());
        assert_eq!(
            dec.push(&[40]),
            vec![Event::RegionStart {
                x: 10,
                y: 20,
                w: 30,
                h: 40
            }]
        );
        assert!(!dec.in_region_header());
    }

    #[test]
    fn unpaired_marker_is_literal_data_in_order() {
        let mut dec = StreamDecoder::new();
        assert_eq!(
            dec.push(&[START, 0x07]),
            vec![Event::Data(START), Event::Data(0x07)]
        );
        assert_eq!(
            dec.push(&[STOP, 0x42]),
            vec![Event::Data(STOP), Event::Data(0x42)]
        );
    }

    #[test]
    fn step_emits_at_most_two_events() {
        let mut dec = StreamDecoder::new();
        assert!(dec.step(STOP).is_empty());
        let emitted: Vec<_> = dec.step(0x33).collect();
        assert_eq!(emitted, vec![Event::Data(STOP), Event::Data(0x33)]);
    }

    #[test]
    fn reset_discards_held_marker() {
        let mut dec = StreamDecoder::new();
        dec.push(&[START]);
        dec.reset();
        assert_eq!(dec.push(&[0x05]), vec![Event::Data(0x05)]);
    }
}
