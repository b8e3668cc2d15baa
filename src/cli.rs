use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(
    name = "vscribe",
    about = "Turn YouTube videos into WordPress draft posts",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output format: text (default), json
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Config file (defaults to ~/.config/vscribe/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Show progress and transcript source
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a draft post from a YouTube video
    Process {
        /// YouTube video URL or video ID (reads from stdin if omitted)
        url: Option<String>,
    },

    /// List recently generated posts
    Recent {
        /// Number of posts to show
        #[arg(short = 'n', long, default_value_t = 5)]
        limit: usize,
    },

    /// Check the OpenAI and WordPress credentials
    Check,
}
