//! lazysheet - the demonstration sheet and its command-line plumbing.

pub mod config;
pub mod error;
pub mod powers;
