// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Bare `deckhand [STAGE]` deploys; subcommands cover init, publish, and configure.

use clap::{Args, Parser, Subcommand};
use deckhand::output::OutputMode;
use deckhand::types::Concurrency;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "deckhand")]
#[command(about = "Change-aware deployment of serverless modules")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print only the final result
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Print JSON events instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(flatten)]
    pub deploy: DeployArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    pub fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else if self.quiet {
            OutputMode::Quiet
        } else {
            OutputMode::Normal
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct DeployArgs {
    /// Target stage (defaults to default_stage from the config)
    pub stage: Option<String>,

    /// Number of modules deployed at once (1-3)
    #[arg(short, long, default_value_t = Concurrency::default())]
    pub concurrency: Concurrency,

    /// Deploy every module, ignoring change detection
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Deploy changed modules to a stage (the default command)
    Deploy(DeployArgs),

    /// Initialize a new deckhand.yml configuration file
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// Provision the package registry and publish workspace packages
    Publish,

    /// Point a consumer project at the package registry
    Configure {
        /// Project directory that receives the registry config
        target_dir: PathBuf,
    },
}
