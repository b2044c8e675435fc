//! Live reload wire protocol.

pub mod message;
