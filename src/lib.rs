// ABOUTME: Library root for deckhand - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod deploy;
pub mod diagnostics;
pub mod discovery;
pub mod error;
pub mod fingerprint;
pub mod hooks;
pub mod output;
pub mod publish;
pub mod registry;
pub mod report;
pub mod state;
pub mod types;
pub mod validate;
