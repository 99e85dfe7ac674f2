//! Command-line interface definitions.
//!
//! Every flag overrides the matching `wiki.toml` field.

use clap::Parser;
use std::path::PathBuf;

/// Minimal personal wiki server
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Root directory; config and relative paths resolve against it
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Config file name (default: wiki.toml)
    #[arg(short = 'C', long, default_value = "wiki.toml")]
    pub config: PathBuf,

    /// Interface to bind on
    #[arg(short, long)]
    pub interface: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Number of request-handling threads
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Page storage directory
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// Static file directory
    #[arg(long)]
    pub public: Option<PathBuf>,

    /// Template override directory
    #[arg(long)]
    pub templates: Option<PathBuf>,
}
