pub mod event;
pub mod log_entry;
pub mod notice;
pub mod serve;
pub mod status;
pub mod target;
