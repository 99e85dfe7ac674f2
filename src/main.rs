//! Wiki - a minimal personal wiki server.
//!
//! Pages are plain-text files under `data/`, viewed at `/view/<title>`,
//! edited at `/edit/<title>` and saved through `/save/<title>`.
//! `[Title]` in a page body links to that page.

mod cli;
mod config;
mod form;
mod logger;
mod page;
mod render;
mod router;
mod serve;
mod static_files;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use config::Config;
use serve::serve_wiki;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli)?;
    if config.config_path.is_file() {
        crate::log!("serve"; "config {}", config.config_path.display());
    }
    serve_wiki(&config)
}
