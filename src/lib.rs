//! Solana Up or Down: library exports for the binary and for testing

pub mod core;
pub mod inference;
pub mod oneshot;
pub mod tui;

#[cfg(test)]
pub mod test_support;
