//! Core types for Compass.

pub mod message;
pub mod tool;

pub use message::*;
pub use tool::*;
