use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::language::Language;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Translate a piece of news text
    Translate {
        /// Text to translate (HTML is accepted)
        #[arg(conflicts_with = "file")]
        text: Option<String>,

        /// Read the text from a file instead
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Target language (defaults to the configured one)
        #[arg(short, long)]
        target: Option<Language>,

        /// Use the endpoint chain (DeepL first) and fail instead of degrading
        #[arg(long)]
        strict: bool,
    },

    /// Summarize a news item in the target language with a sentiment label
    Summarize {
        /// Headline of the item
        #[arg(short, long)]
        title: String,

        /// Body text
        #[arg(short, long, conflicts_with = "content_file")]
        content: Option<String>,

        /// Read the body from a file instead
        #[arg(long)]
        content_file: Option<PathBuf>,
    },

    /// Translate many items, keeping the order
    Batch {
        /// Input file: a JSON array of strings, or one item per line
        #[arg(short, long)]
        input: PathBuf,

        /// Output JSON file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run the output validator on a candidate translation
    Validate {
        /// Candidate text
        text: String,

        /// Language the text is supposed to be in
        #[arg(short, long, default_value = "tr")]
        target: Language,
    },

    /// Start the HTTP server
    Serve {
        /// Address to bind (defaults to the configured one)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Write a configuration file with default values
    ConfigInit {
        /// Output path
        #[arg(short, long, default_value = "tercuman.toml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
