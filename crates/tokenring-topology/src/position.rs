//! Ring positions and ring sizes.
//!
//! Positions are static identities assigned once, in creation order. All
//! neighbor arithmetic is modulo the ring size, so the successor of the last
//! position is the origin and the predecessor of the origin is the last.

use std::fmt;

use crate::error::{Error, Result};
use crate::{DEFAULT_RING_SIZE, MAX_RING_SIZE, MIN_RING_SIZE};

/// Logical position of a participant in the ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position(pub u32);

impl Position {
    /// The root participant, which injects the token.
    pub const ORIGIN: Self = Self(0);

    /// Create from a raw index.
    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Get the raw position value.
    #[inline]
    pub const fn value(&self) -> u32 {
        self.0
    }

    /// Index into per-position tables (fabric slots, participant lists).
    #[inline]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn is_origin(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Number of participants in a ring, always within
/// [`MIN_RING_SIZE`]..=[`MAX_RING_SIZE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u32", into = "u32"))]
pub struct RingSize(u32);

impl RingSize {
    pub const DEFAULT: Self = Self(DEFAULT_RING_SIZE);

    /// Validate a ring size.
    pub fn new(size: u32) -> Result<Self> {
        if (MIN_RING_SIZE..=MAX_RING_SIZE).contains(&size) {
            Ok(Self(size))
        } else {
            Err(Error::InvalidSize {
                size,
                min: MIN_RING_SIZE,
                max: MAX_RING_SIZE,
            })
        }
    }

    #[inline]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Number of participants as a length.
    #[inline]
    pub const fn len(&self) -> usize {
        self.0 as usize
    }

    /// Whether `position` names a participant of this ring.
    #[inline]
    pub const fn contains(&self, position: Position) -> bool {
        position.0 < self.0
    }

    /// Next position in the ring; the last position wraps to the origin.
    #[inline]
    pub const fn successor(&self, position: Position) -> Position {
        Position((position.0 % self.0 + 1) % self.0)
    }

    /// Previous position in the ring; the origin wraps to the last position.
    #[inline]
    pub const fn predecessor(&self, position: Position) -> Position {
        Position((position.0 % self.0 + self.0 - 1) % self.0)
    }

    /// The last position, whose successor is the origin.
    #[inline]
    pub const fn last(&self) -> Position {
        Position(self.0 - 1)
    }

    /// All positions in creation order.
    pub fn positions(&self) -> impl Iterator<Item = Position> {
        (0..self.0).map(Position)
    }
}

impl Default for RingSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u32> for RingSize {
    type Error = Error;

    fn try_from(size: u32) -> Result<Self> {
        Self::new(size)
    }
}

impl From<RingSize> for u32 {
    fn from(size: RingSize) -> u32 {
        size.0
    }
}

impl fmt::Display for RingSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rejects_out_of_range_sizes() {
        assert!(RingSize::new(0).is_err());
        assert!(RingSize::new(1).is_err());
        assert!(RingSize::new(MAX_RING_SIZE + 1).is_err());
        assert!(RingSize::new(2).is_ok());
        assert!(RingSize::new(MAX_RING_SIZE).is_ok());
    }

    #[test]
    fn last_position_wraps_to_origin() {
        let size = RingSize::new(3).unwrap();
        assert_eq!(size.successor(Position(2)), Position::ORIGIN);
        assert_eq!(size.predecessor(Position::ORIGIN), Position(2));
        assert_eq!(size.last(), Position(2));
    }

    #[test]
    fn positions_in_creation_order() {
        let size = RingSize::new(4).unwrap();
        let positions: Vec<_> = size.positions().map(|p| p.value()).collect();
        assert_eq!(positions, vec![0, 1, 2, 3]);
    }

    proptest! {
        #[test]
        fn full_cycle_returns_home(n in MIN_RING_SIZE..=MAX_RING_SIZE, start in 0u32..MAX_RING_SIZE) {
            let size = RingSize::new(n).unwrap();
            let start = Position(start % n);
            let mut p = start;
            for _ in 0..n {
                p = size.successor(p);
            }
            prop_assert_eq!(p, start);
        }

        #[test]
        fn predecessor_inverts_successor(n in MIN_RING_SIZE..=MAX_RING_SIZE, raw in 0u32..MAX_RING_SIZE) {
            let size = RingSize::new(n).unwrap();
            let p = Position(raw % n);
            prop_assert_eq!(size.predecessor(size.successor(p)), p);
            prop_assert!(size.contains(size.successor(p)));
        }

        #[test]
        fn cycle_visits_every_position_once(n in MIN_RING_SIZE..=MAX_RING_SIZE) {
            let size = RingSize::new(n).unwrap();
            let mut seen = vec![false; size.len()];
            let mut p = Position::ORIGIN;
            for _ in 0..n {
                prop_assert!(!seen[p.index()]);
                seen[p.index()] = true;
                p = size.successor(p);
            }
            prop_assert!(seen.into_iter().all(|s| s));
        }
    }
}
