// ABOUTME: Command module aggregator for the stagehand CLI.
// ABOUTME: Re-exports deploy and status command handlers.

mod deploy;
mod status;

pub use deploy::{RunOptions, deploy};
pub use status::status;
