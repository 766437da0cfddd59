pub mod actions;
pub mod client;
pub mod serve;
pub mod statuses;
pub mod targets;
