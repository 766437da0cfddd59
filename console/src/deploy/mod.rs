//! Deployment module

pub mod action;
pub mod dispatcher;
pub mod gate;
