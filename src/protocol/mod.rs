//! # LCD Stream Protocol
//!
//! When the firmware is built with its screen grabber enabled, every block the
//! LCD driver writes to controller RAM is mirrored on the UART, bracketed by
//! marker pairs that describe the window being written:
//!
//! ```text
//! [[ x y w h <w*h triplet bytes> ]]     one windowed write
//! []                                    screen about to be cleared
//! ][                                    grab request (hot key on the device)
//! ```
//!
//! Everything outside a window is ordinary console text from the device.
//!
//! - [`marker`] classifies bytes as reserved markers or data
//! - [`decoder`] turns the byte stream into [`Event`]s

pub mod decoder;
pub mod marker;

pub use decoder::{Emitted, Event, StreamDecoder};
pub use marker::{classify, ByteClass, Marker};
