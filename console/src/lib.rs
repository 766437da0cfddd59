//! Hugodeck Library
//!
//! Core modules for the Hugo multi-server deployment console.

pub mod app;
pub mod deploy;
pub mod errors;
pub mod filesys;
pub mod http;
pub mod journal;
pub mod logs;
pub mod models;
pub mod push;
pub mod render;
pub mod server;
pub mod storage;
pub mod sync;
pub mod utils;
pub mod workers;
