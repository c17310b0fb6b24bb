pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "cookbook")]
#[command(about = "Cookbook - recipe collection server and checker", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the cookbook server
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "PORT")]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long, env = "HOST")]
        host: Option<String>,
    },

    /// Load every recipe and report errors and warnings
    Check {
        /// Recipe folder, defaults to COOKBOOK_LOCATION
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Search the recipe folder from the command line
    Search {
        /// Search query, e.g. `tag:vegan ingr:tofu`
        query: String,

        /// Language to search in, defaults to the cookbook default
        #[arg(short, long)]
        lang: Option<String>,

        /// Recipe folder, defaults to COOKBOOK_LOCATION
        #[arg(short, long)]
        path: Option<PathBuf>,
    },
}
