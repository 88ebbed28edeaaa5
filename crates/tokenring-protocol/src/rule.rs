//! Turn and destination rule, applied once per token reception.
//!
//! The holder checks that the turn is its own, delivers and drains the token
//! if it is the addressee, and otherwise lets it pass unchanged. Advancing
//! the turn is part of forwarding, see [`Token::advance`].

use tokenring_topology::Position;

use crate::error::ProtocolViolation;
use crate::token::{Payload, Token};

/// What the holder did with the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handling {
    /// The token was addressed to the holder; this is the delivered payload.
    Delivered(Payload),
    /// Not addressed to the holder (or empty); passed through unchanged.
    PassedThrough,
}

/// Act on a received token as participant `me`.
///
/// A token whose turn is not `me` means a second owner exists somewhere
/// upstream; that is reported, never skipped.
pub fn apply_turn(token: &mut Token, me: Position) -> Result<Handling, ProtocolViolation> {
    if token.holder() != me {
        return Err(ProtocolViolation::WrongTurn {
            turn: token.turn,
            position: me,
        });
    }

    if token.destination == Some(me) {
        Ok(Handling::Delivered(token.drain()))
    } else {
        Ok(Handling::PassedThrough)
    }
}
