//! Live progress channel

pub mod channel;
pub mod lifecycle;
