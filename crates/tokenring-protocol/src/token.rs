//! The circulating token.
//!
//! There is exactly one token per ring. It is created empty at the origin,
//! loaded with a message, and mutated in place by whichever participant
//! holds the turn until the process ends.

use std::fmt;

use tokenring_topology::{Position, RingSize};

use crate::codec::PAYLOAD_CAPACITY;

/// Message body carried by the token.
///
/// Holds at most [`PAYLOAD_CAPACITY`] bytes of UTF-8 and never contains a
/// NUL byte (NUL is the wire padding).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "String", into = "String"))]
pub struct Payload(String);

impl Payload {
    pub fn empty() -> Self {
        Self(String::new())
    }

    /// Build a payload, truncating deterministically.
    ///
    /// The text is cut at its first NUL byte, then to at most
    /// [`PAYLOAD_CAPACITY`] bytes on a character boundary. The flag reports
    /// whether anything was dropped.
    pub fn truncating(text: &str) -> (Self, bool) {
        let mut end = text.find('\0').unwrap_or(text.len());
        if end > PAYLOAD_CAPACITY {
            end = PAYLOAD_CAPACITY;
            while !text.is_char_boundary(end) {
                end -= 1;
            }
        }
        (Self(text[..end].to_owned()), end < text.len())
    }

    /// Build a payload, silently truncating. See [`Payload::truncating`].
    pub fn new(text: &str) -> Self {
        Self::truncating(text).0
    }

    /// Wrap text already validated by the decoder.
    pub(crate) fn from_wire(text: String) -> Self {
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for Payload {
    /// Truncates like [`Payload::truncating`].
    fn from(text: String) -> Self {
        Self::new(&text)
    }
}

impl From<Payload> for String {
    fn from(payload: Payload) -> String {
        payload.0
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The single mutable record passed around the ring.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Token {
    /// Position that currently has the right to act on the token.
    pub turn: u32,
    /// Intended recipient; `None` means the token is empty.
    pub destination: Option<Position>,
    /// Message body, meaningful only while `destination` is set.
    pub payload: Payload,
}

impl Token {
    /// An empty token held by the origin.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the token carries no pending message.
    pub fn is_empty(&self) -> bool {
        self.destination.is_none()
    }

    /// The position whose turn it is.
    pub fn holder(&self) -> Position {
        Position::new(self.turn)
    }

    /// Put a message on the token.
    pub fn load(&mut self, destination: Option<Position>, payload: Payload) {
        self.destination = destination;
        self.payload = payload;
    }

    /// Clear destination and payload, returning the delivered payload.
    pub fn drain(&mut self) -> Payload {
        self.destination = None;
        std::mem::take(&mut self.payload)
    }

    /// Pass the turn to the next position, wrapping to 0 after the last.
    pub fn advance(&mut self, size: RingSize) {
        self.turn = size.successor(self.holder()).value();
    }
}
