//! Core types and constants for the anchor tracker

pub mod types;
pub mod constants;

pub use types::*;
pub use constants::*;
