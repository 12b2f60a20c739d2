//! CLI module - Command-line interface for onboard
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

/// onboard - get-or-create user profiles for an external auth provider
#[derive(Parser)]
#[command(name = "onboard")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server (default)
    #[command(alias = "web")]
    Serve,

    /// Create default config file
    Init,

    /// Inspect stored profiles
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
}

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// List the most recently created profiles
    #[command(alias = "ls")]
    List {
        /// Number of profiles to show
        #[arg(default_value = "20")]
        limit: u64,
    },
    /// Show the profile of one identity
    Show {
        /// External user id
        user_id: String,
    },
}

pub use commands::*;
