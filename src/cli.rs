// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Args, Parser, Subcommand};
use stagehand::deploy::Stage;

#[derive(Parser)]
#[command(name = "stagehand")]
#[command(about = "Upload, close, release and drop staged artifact repositories")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print the final result
    #[arg(long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Print JSON lines instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new stagehand.yml configuration file
    Init {
        /// Coordinate group for the template artifact
        #[arg(long)]
        group_id: Option<String>,

        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// Upload artifacts and move the staging repository through its stages
    Deploy {
        /// Deployer name (defined in config)
        name: String,

        /// First stage to run
        #[arg(long, value_enum)]
        start_stage: Option<Stage>,

        /// Last stage to run
        #[arg(long, value_enum)]
        end_stage: Option<Stage>,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Drop (discard) a staging repository
    Drop {
        /// Deployer name (defined in config)
        name: String,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Show the state of a staging repository
    Status {
        /// Deployer name (defined in config)
        name: String,

        /// Repository to inspect (default: last recorded or most recent)
        #[arg(long)]
        repository_id: Option<String>,
    },
}

/// Options shared by commands that change remote state.
#[derive(Args)]
pub struct RunArgs {
    /// Log what would happen without changing anything remotely
    #[arg(long)]
    pub dry_run: bool,

    /// Use this staging profile instead of discovering one
    #[arg(long)]
    pub profile_id: Option<String>,

    /// Use this staging repository instead of discovering or creating one
    #[arg(long)]
    pub repository_id: Option<String>,

    /// Reuse the ids recorded by the previous run of this deployer
    #[arg(long)]
    pub resume: bool,
}
