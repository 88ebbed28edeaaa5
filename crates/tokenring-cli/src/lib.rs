//! Console collaborators for the `tokenring` binary.
//!
//! - [`args`]: lenient parsing of the positional ring size
//! - [`console`]: the interactive `ReadUserToken()` source

pub mod args;
pub mod console;

pub use args::{lenient_int, parse_ring_size};
pub use console::ConsoleSource;
