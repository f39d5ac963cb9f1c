// ABOUTME: Command module aggregator for the deckhand CLI.
// ABOUTME: Re-exports deploy, publish, and configure command handlers.

mod configure;
mod deploy;
mod publish;

pub use configure::configure;
pub use deploy::deploy;
pub use publish::publish;
