//! CLI module for ytblog.

pub mod commands;
mod output;
pub mod preflight;

pub use output::{content_preview, Output};

use clap::{Parser, Subcommand};

/// ytblog - YouTube to blog post, with a human in the loop
///
/// Fetches a video's transcript, summarizes it with a language model, drafts a
/// blog post and lets you request revisions until you approve it.
#[derive(Parser, Debug)]
#[command(name = "ytblog")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a blog post from a video and review it interactively
    Generate {
        /// YouTube URL or video ID
        url: String,

        /// Write the approved post to this file
        #[arg(short, long)]
        output: Option<String>,

        /// Maximum number of revisions (overrides config)
        #[arg(long)]
        max_revisions: Option<u32>,

        /// Generator backend: ollama or openai (overrides config)
        #[arg(short, long)]
        provider: Option<String>,

        /// Model to use (overrides config)
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Start an HTTP API for reviewing drafts from other tools
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_generate() {
        let cli = Cli::try_parse_from([
            "ytblog",
            "-vv",
            "generate",
            "https://youtu.be/abc123",
            "--max-revisions",
            "3",
            "--provider",
            "openai",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Generate {
                url,
                max_revisions,
                provider,
                output,
                model,
            } => {
                assert_eq!(url, "https://youtu.be/abc123");
                assert_eq!(max_revisions, Some(3));
                assert_eq!(provider.as_deref(), Some("openai"));
                assert!(output.is_none());
                assert!(model.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
