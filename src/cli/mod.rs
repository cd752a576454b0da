//! CLI module - Command-line interface for the release resolver
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use crate::constants::limits::MAX_FEED_PAGE_SIZE;
use clap::{Parser, Subcommand};

/// Release Resolver - find feed releases for an episode
#[derive(Parser)]
#[command(name = "release-resolver")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Find release candidates for one episode of a media
    #[command(alias = "s")]
    Search {
        /// AniList media ID
        media_id: i32,

        /// Episode number
        episode: u32,

        /// Only look for whole-season batch releases
        #[arg(long)]
        batch: bool,

        /// Do not require the preferred quality token
        #[arg(long)]
        ignore_quality: bool,
    },

    /// Browse a release feed and resolve each item to its media
    #[command(alias = "f")]
    Feed {
        /// Preset name (SubsPlease, "Erai-raws [Multi-Sub]", NC-Raws) or feed URL
        source: String,

        /// Page number, starting at 1
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        page: u32,

        /// Items per page
        #[arg(
            long,
            default_value_t = 20,
            value_parser = clap::value_parser!(u16).range(1..=i64::from(MAX_FEED_PAGE_SIZE))
        )]
        per_page: u16,
    },

    /// Create default config file
    #[command(alias = "--init")]
    Init,
}

pub use commands::*;
