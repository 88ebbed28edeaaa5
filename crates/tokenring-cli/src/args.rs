//! Command line arguments.

use tokenring_topology::{RingSize, MAX_RING_SIZE, MIN_RING_SIZE};
use tracing::{info, warn};

/// Parse an integer the way C's `atoi` does, saturating instead of overflowing.
///
/// Leading whitespace is skipped, one optional sign is accepted, then digits
/// are consumed until the first non-digit. Text with no leading digits is 0.
pub fn lenient_int(text: &str) -> i64 {
    let text = text.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let magnitude = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, b| {
            acc.saturating_mul(10).saturating_add(i64::from(b - b'0'))
        });

    if negative {
        -magnitude
    } else {
        magnitude
    }
}

/// Ring size from the first positional argument.
///
/// Missing or unusable values fall back to the default size with a warning;
/// they never fail the program.
pub fn parse_ring_size(arg: Option<&str>) -> RingSize {
    let requested = arg.map(lenient_int);
    let size = requested
        .and_then(|n| u32::try_from(n).ok())
        .and_then(|n| RingSize::new(n).ok());

    match size {
        Some(size) => {
            info!(size = size.get(), "Network size {}, initializing", size);
            size
        }
        None => {
            warn!(
                requested = ?requested,
                min = MIN_RING_SIZE,
                max = MAX_RING_SIZE,
                "Size incorrectly defined, initializing network size to {}",
                RingSize::DEFAULT
            );
            RingSize::DEFAULT
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atoi_semantics() {
        assert_eq!(lenient_int("5"), 5);
        assert_eq!(lenient_int("  42abc"), 42);
        assert_eq!(lenient_int("+7"), 7);
        assert_eq!(lenient_int("-3\n"), -3);
        assert_eq!(lenient_int("abc"), 0);
        assert_eq!(lenient_int(""), 0);
        assert_eq!(lenient_int("-"), 0);
        assert_eq!(lenient_int("4 5"), 4);
    }

    #[test]
    fn huge_values_saturate() {
        assert_eq!(lenient_int("99999999999999999999999"), i64::MAX);
        assert_eq!(lenient_int("-99999999999999999999999"), -i64::MAX);
    }

    #[test]
    fn valid_sizes_are_kept() {
        assert_eq!(parse_ring_size(Some("2")).get(), 2);
        assert_eq!(parse_ring_size(Some("5")).get(), 5);
        assert_eq!(parse_ring_size(Some("100")).get(), 100);
        assert_eq!(parse_ring_size(Some("7 participants")).get(), 7);
    }

    #[test]
    fn unusable_sizes_fall_back_to_default() {
        for arg in [None, Some(""), Some("abc"), Some("1"), Some("0"), Some("-4"), Some("101")] {
            assert_eq!(parse_ring_size(arg), RingSize::DEFAULT, "arg {arg:?}");
        }
        assert_eq!(RingSize::DEFAULT.get(), 3);
    }
}
