//! KycFlow CLI - operator front end
//!
//! This crate provides the `kycflow` binary and the command handlers it
//! dispatches to.

pub mod commands;
pub mod context;

pub use context::AppContext;
